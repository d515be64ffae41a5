//! Hardware-facing grab loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::camera::{CameraControl, CameraError};

use super::channel::FrameSender;
use super::frame::FrameBuffer;

/// Cooperative stop signal, checked once per grab iteration.
///
/// Tripping it never cancels an in-flight grab or encoder write; the loop
/// finishes its current iteration and exits cleanly with everything grabbed
/// so far still queued. A stop is control flow, not an error.
#[derive(Clone, Debug, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// What the grab loop produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Valid frames copied and queued for encoding.
    pub captured: u64,
    /// Incomplete frames dropped before the queue. Each consumed a
    /// sequence index, so the encoded sequence shows where they were.
    pub corrupt: u64,
    /// True when the loop exited on a stop request instead of reaching the
    /// target count.
    pub interrupted: bool,
}

/// Grab up to `target` frames and queue them for encoding.
///
/// Each iteration blocks on the device (no timeout — by device contract a
/// frame eventually arrives or the call fails), deep-copies the pixel data,
/// pushes the copy, and only then releases the driver slot. The push never
/// blocks, so slot-release latency is bounded by the copy alone.
///
/// Incomplete frames are dropped and counted; they never abort the
/// session. Driver errors do.
pub fn run<C: CameraControl>(
    camera: &mut C,
    target: u64,
    frames: &FrameSender,
    stop: &StopToken,
) -> Result<CaptureStats, CameraError> {
    let mut stats = CaptureStats::default();

    for seq in 0..target {
        if stop.is_triggered() {
            log::info!("stop requested after {} frames", stats.captured);
            stats.interrupted = true;
            break;
        }

        let frame = camera.next_frame()?;
        let expected = frame.width() as usize * frame.height() as usize;
        if frame.is_incomplete() || frame.data().len() != expected {
            log::warn!("dropping incomplete frame {seq}");
            stats.corrupt += 1;
            camera.release_frame(frame)?;
            continue;
        }

        frames.push(FrameBuffer::copied_from(seq, &frame));
        camera.release_frame(frame)?;
        stats.captured += 1;

        if stats.captured % 100 == 0 {
            log::debug!("{} frames grabbed", stats.captured);
        }
    }

    Ok(stats)
}
