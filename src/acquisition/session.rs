//! Session lifecycle orchestration.
//!
//! A session moves through
//! `Idle → Configuring → Acquiring → Draining → Finalizing → Closed`.
//! An interruption or a fault moves it into Draining early, never past the
//! guarantees: queued frames are flushed before the encoder is finalized,
//! the worker is joined before the file is closed, and the device is
//! restored to its defaults exactly once on every exit path.

use std::time::Instant;

use crate::camera::{CameraControl, CameraError, CameraSettings};
use crate::encode::{EncodeError, FrameSink};

use super::capture::{self, StopToken};
use super::channel::frame_channel;
use super::worker::EncodingWorker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Configuring,
    Acquiring,
    Draining,
    Finalizing,
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("record called before configure")]
    NotConfigured,
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// How long to record: an explicit frame count, or a wall duration
/// converted through the negotiated frame rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameTarget {
    Frames(u64),
    DurationSecs(f64),
}

impl FrameTarget {
    pub fn frames(self, frame_rate: f64) -> u64 {
        match self {
            FrameTarget::Frames(n) => n,
            FrameTarget::DurationSecs(secs) => (secs * frame_rate).round() as u64,
        }
    }
}

/// Geometry and timing negotiated with the device during `configure`,
/// everything the caller needs to open an encoder.
#[derive(Debug, Clone, Copy)]
pub struct SessionPlan {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub target_frames: u64,
}

/// Final accounting for one session.
#[derive(Debug, Clone, Copy)]
pub struct SessionReport {
    pub frames_captured: u64,
    pub corrupt_frames: u64,
    pub frames_encoded: u64,
    /// Negotiated device frame rate, for the DAQ-side bookkeeping.
    pub frame_rate: f64,
    /// Wall time spent in the grab loop.
    pub capture_secs: f64,
    /// Wall time spent waiting for the encoder to drain the queue after
    /// acquisition stopped.
    pub drain_secs: f64,
    pub interrupted: bool,
}

/// Owns the camera for the duration of one recording session.
pub struct Session<C: CameraControl> {
    camera: C,
    state: SessionState,
    plan: Option<SessionPlan>,
}

impl<C: CameraControl> Session<C> {
    pub fn new(camera: C) -> Self {
        Self {
            camera,
            state: SessionState::Idle,
            plan: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// `Idle → Configuring`: load device defaults, apply the session
    /// parameters, and work out what the device will deliver.
    pub fn configure(
        &mut self,
        settings: &CameraSettings,
        target: FrameTarget,
    ) -> Result<SessionPlan, SessionError> {
        self.state = SessionState::Configuring;
        self.camera.apply_defaults()?;
        self.camera.configure(settings)?;

        let (width, height) = self.camera.image_size();
        let frame_rate = self.camera.resulting_frame_rate()?;
        let plan = SessionPlan {
            width,
            height,
            frame_rate,
            target_frames: target.frames(frame_rate),
        };
        log::info!(
            "Configured: {}x{} @ {:.2} fps, target {} frames",
            plan.width,
            plan.height,
            plan.frame_rate,
            plan.target_frames
        );
        self.plan = Some(plan);
        Ok(plan)
    }

    /// `Acquiring → Draining → Finalizing`: run the whole capture.
    ///
    /// Consumes the sink; the worker is joined before the sink is
    /// finalized, so no write is in flight when the output file is closed.
    /// A stop request is not an error — the report's `interrupted` flag
    /// carries it, and every frame queued before the stop is still
    /// written. Hardware faults outrank encoder faults when both occur.
    pub fn record<S: FrameSink + Send + 'static>(
        &mut self,
        mut sink: S,
        stop: &StopToken,
    ) -> Result<SessionReport, SessionError> {
        let Some(plan) = self.plan else {
            return Err(SessionError::NotConfigured);
        };

        self.state = SessionState::Acquiring;
        if let Err(e) = self.camera.begin_acquisition() {
            // Never leave a half-open container behind.
            self.state = SessionState::Finalizing;
            if let Err(fin) = sink.finish() {
                log::warn!("finalizing unused output failed: {fin}");
            }
            return Err(e.into());
        }

        let (tx, rx) = frame_channel();
        let worker = EncodingWorker::spawn(sink, rx);

        let capture_started = Instant::now();
        let capture_result = capture::run(&mut self.camera, plan.target_frames, &tx, stop);
        let capture_secs = capture_started.elapsed().as_secs_f64();

        // Stop the sensor before draining: the exposure-active line stays
        // live while acquisition runs. The 1-2 trailing line transitions
        // between the last grab and this call are expected noise the DAQ
        // discards.
        self.state = SessionState::Draining;
        let end_result = self.camera.end_acquisition();

        let drain_started = Instant::now();
        tx.close();
        let (mut sink, encode_result) = worker.join();
        let drain_secs = drain_started.elapsed().as_secs_f64();

        self.state = SessionState::Finalizing;
        let finish_result = sink.finish();

        let stats = capture_result?;
        end_result?;
        let frames_encoded = encode_result?;
        finish_result?;

        Ok(SessionReport {
            frames_captured: stats.captured,
            corrupt_frames: stats.corrupt,
            frames_encoded,
            frame_rate: plan.frame_rate,
            capture_secs,
            drain_secs,
            interrupted: stats.interrupted,
        })
    }

    /// `→ Closed`: restore the device to its default configuration and
    /// release it. Callable from any state and on every exit path; only
    /// the first call touches the device.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Err(e) = self.camera.apply_defaults() {
            log::warn!("device default restore failed: {e}");
        }
        self.state = SessionState::Closed;
    }
}

impl<C: CameraControl> Drop for Session<C> {
    fn drop(&mut self) {
        self.close();
    }
}
