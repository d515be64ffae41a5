//! Virtual camera backend that emits patterned Mono8 frames.
//!
//! Stands in for vendor hardware so the full grab/encode pipeline can run
//! anywhere. Frames arrive at the exposure-derived rate and carry a moving
//! gradient, which makes dropped or reordered frames visible in the output
//! video.

use std::time::Duration;

use super::{CameraControl, CameraError, CameraSettings, DriverFrame};

/// Per-frame sensor readout overhead added on top of the exposure time when
/// deriving the delivered frame rate.
const READOUT_OVERHEAD_US: f64 = 110.0;

const DEFAULT_EXPOSURE_US: f64 = 15_000.0;

/// Patterned frame source with the timing behavior of a real sensor.
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    exposure_us: f64,
    acquiring: bool,
    counter: u64,
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            exposure_us: DEFAULT_EXPOSURE_US,
            acquiring: false,
            counter: 0,
        }
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64((self.exposure_us + READOUT_OVERHEAD_US) / 1e6)
    }

    fn pattern(&self) -> Vec<u8> {
        let mut data = vec![0u8; (self.width * self.height) as usize];
        for (row, line) in data.chunks_exact_mut(self.width as usize).enumerate() {
            let base = (row as u64 + self.counter) as u8;
            for (col, px) in line.iter_mut().enumerate() {
                *px = base.wrapping_add(col as u8);
            }
        }
        data
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new(1440, 1080)
    }
}

impl CameraControl for SyntheticCamera {
    fn apply_defaults(&mut self) -> Result<(), CameraError> {
        self.exposure_us = DEFAULT_EXPOSURE_US;
        Ok(())
    }

    fn configure(&mut self, settings: &CameraSettings) -> Result<(), CameraError> {
        if settings.exposure_us <= 0.0 {
            return Err(CameraError::Driver(format!(
                "exposure must be positive, got {} us",
                settings.exposure_us
            )));
        }
        self.exposure_us = settings.exposure_us;
        Ok(())
    }

    fn image_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resulting_frame_rate(&self) -> Result<f64, CameraError> {
        Ok(1e6 / (self.exposure_us + READOUT_OVERHEAD_US))
    }

    fn begin_acquisition(&mut self) -> Result<(), CameraError> {
        self.acquiring = true;
        self.counter = 0;
        Ok(())
    }

    fn end_acquisition(&mut self) -> Result<(), CameraError> {
        self.acquiring = false;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<DriverFrame, CameraError> {
        if !self.acquiring {
            return Err(CameraError::NotAcquiring);
        }
        // Block for one exposure + readout, like a grab against real hardware.
        std::thread::sleep(self.frame_interval());
        let frame = DriverFrame::new(self.width, self.height, self.pattern(), true);
        self.counter += 1;
        Ok(frame)
    }

    fn release_frame(&mut self, _frame: DriverFrame) -> Result<(), CameraError> {
        Ok(())
    }
}
