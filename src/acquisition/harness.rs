//! Scripted collaborators for the pipeline tests.
//!
//! Both mocks share their state behind an `Arc` so a test can keep a probe
//! clone while the session or worker consumes the original.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::acquisition::FrameBuffer;
use crate::acquisition::capture::StopToken;
use crate::camera::{CameraControl, CameraError, CameraSettings, DriverFrame};
use crate::encode::{EncodeError, FrameSink};

const TEST_WIDTH: u32 = 8;
const TEST_HEIGHT: u32 = 8;

#[derive(Default)]
struct CamState {
    total_frames: u64,
    grabs: u64,
    incomplete: HashSet<u64>,
    fail_grab_at: Option<u64>,
    stop_after: Option<(u64, StopToken)>,
    fail_begin: bool,
    released: u64,
    defaults_applied: u64,
    configures: u64,
    begins: u64,
    ends: u64,
}

/// Camera mock producing a scripted frame sequence.
#[derive(Clone, Default)]
pub(crate) struct ScriptedCamera {
    state: Arc<Mutex<CamState>>,
}

impl ScriptedCamera {
    /// A camera that can deliver `total` frames before the script runs dry.
    pub(crate) fn with_frames(total: u64) -> Self {
        let cam = Self::default();
        cam.state.lock().unwrap().total_frames = total;
        cam
    }

    /// Mark the frame at grab index `idx` as incomplete.
    pub(crate) fn mark_incomplete(&self, idx: u64) {
        self.state.lock().unwrap().incomplete.insert(idx);
    }

    /// Trip `token` once `n` frames have been grabbed.
    pub(crate) fn trigger_stop_after(&self, n: u64, token: StopToken) {
        self.state.lock().unwrap().stop_after = Some((n, token));
    }

    /// Fail the grab once `n` frames have been delivered.
    pub(crate) fn fail_grab_after(&self, n: u64) {
        self.state.lock().unwrap().fail_grab_at = Some(n);
    }

    pub(crate) fn fail_begin_acquisition(&self) {
        self.state.lock().unwrap().fail_begin = true;
    }

    pub(crate) fn released(&self) -> u64 {
        self.state.lock().unwrap().released
    }

    pub(crate) fn defaults_applied(&self) -> u64 {
        self.state.lock().unwrap().defaults_applied
    }

    pub(crate) fn begin_calls(&self) -> u64 {
        self.state.lock().unwrap().begins
    }

    pub(crate) fn end_calls(&self) -> u64 {
        self.state.lock().unwrap().ends
    }
}

impl CameraControl for ScriptedCamera {
    fn apply_defaults(&mut self) -> Result<(), CameraError> {
        self.state.lock().unwrap().defaults_applied += 1;
        Ok(())
    }

    fn configure(&mut self, _settings: &CameraSettings) -> Result<(), CameraError> {
        self.state.lock().unwrap().configures += 1;
        Ok(())
    }

    fn image_size(&self) -> (u32, u32) {
        (TEST_WIDTH, TEST_HEIGHT)
    }

    fn resulting_frame_rate(&self) -> Result<f64, CameraError> {
        Ok(100.0)
    }

    fn begin_acquisition(&mut self) -> Result<(), CameraError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_begin {
            return Err(CameraError::Driver("begin refused".into()));
        }
        state.begins += 1;
        Ok(())
    }

    fn end_acquisition(&mut self) -> Result<(), CameraError> {
        self.state.lock().unwrap().ends += 1;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<DriverFrame, CameraError> {
        let mut state = self.state.lock().unwrap();
        if let Some(at) = state.fail_grab_at
            && state.grabs >= at
        {
            return Err(CameraError::Disconnected);
        }
        if state.grabs >= state.total_frames {
            return Err(CameraError::Driver("script exhausted".into()));
        }
        let idx = state.grabs;
        state.grabs += 1;
        if let Some((n, token)) = &state.stop_after
            && state.grabs >= *n
        {
            token.trigger();
        }
        let data = vec![(idx % 256) as u8; (TEST_WIDTH * TEST_HEIGHT) as usize];
        let complete = !state.incomplete.contains(&idx);
        Ok(DriverFrame::new(TEST_WIDTH, TEST_HEIGHT, data, complete))
    }

    fn release_frame(&mut self, _frame: DriverFrame) -> Result<(), CameraError> {
        self.state.lock().unwrap().released += 1;
        Ok(())
    }
}

#[derive(Default)]
struct SinkState {
    appended: Vec<u64>,
    attempts: u64,
    fail_at: Option<u64>,
    finish_calls: u64,
}

/// Sink mock recording every append in order.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    state: Arc<Mutex<SinkState>>,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail the append attempt with this zero-based index.
    pub(crate) fn fail_on_append(&mut self, attempt: u64) {
        self.state.lock().unwrap().fail_at = Some(attempt);
    }

    pub(crate) fn appended(&self) -> Vec<u64> {
        self.state.lock().unwrap().appended.clone()
    }

    pub(crate) fn append_attempts(&self) -> u64 {
        self.state.lock().unwrap().attempts
    }

    pub(crate) fn finish_calls(&self) -> u64 {
        self.state.lock().unwrap().finish_calls
    }
}

impl FrameSink for RecordingSink {
    fn append(&mut self, frame: &FrameBuffer) -> Result<(), EncodeError> {
        let mut state = self.state.lock().unwrap();
        let attempt = state.attempts;
        state.attempts += 1;
        if state.fail_at == Some(attempt) {
            return Err(EncodeError::Append {
                seq: frame.seq(),
                reason: "scripted failure".into(),
            });
        }
        state.appended.push(frame.seq());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EncodeError> {
        self.state.lock().unwrap().finish_calls += 1;
        Ok(())
    }
}
