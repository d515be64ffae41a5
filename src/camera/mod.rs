//! Camera driver abstraction
//!
//! The acquisition pipeline talks to hardware exclusively through the
//! [`CameraControl`] trait: apply defaults, push session parameters, start
//! and stop streaming, and pull frames one blocking grab at a time. Vendor
//! SDK bindings implement this trait; the built-in [`SyntheticCamera`]
//! backend lets the whole pipeline run without hardware attached.

use serde::{Deserialize, Serialize};

mod synthetic;

pub use synthetic::SyntheticCamera;

/// Errors surfaced by a camera backend.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    /// The device dropped off the bus mid-session.
    #[error("camera disconnected")]
    Disconnected,
    /// A grab or control call was made outside an active acquisition.
    #[error("acquisition is not running")]
    NotAcquiring,
    /// Anything else the driver reports.
    #[error("driver error: {0}")]
    Driver(String),
}

/// Physical output line that mirrors the exposure-active signal.
///
/// The DAQ samples this line (at 5 kHz or better) to time-align its own
/// channels to frame capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputLine {
    #[default]
    Line1,
    Line2,
}

/// Device parameters applied before acquisition starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Exposure time in microseconds. With auto-exposure off and no frame
    /// rate cap this is what determines the delivered frame rate.
    pub exposure_us: f64,
    /// Analog gain in dB.
    pub gain_db: f64,
    /// ADC bit depth. Pixel data is still delivered as Mono8.
    pub adc_bit_depth: u8,
    /// Where to route the exposure-active signal.
    pub exposure_line: OutputLine,
}

/// One frame as handed out by the driver.
///
/// The pixel data still occupies one of the driver's buffer slots; callers
/// copy what they need and hand the frame back through
/// [`CameraControl::release_frame`] so the slot can be refilled.
#[derive(Debug)]
pub struct DriverFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
    complete: bool,
}

impl DriverFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>, complete: bool) -> Self {
        Self {
            width,
            height,
            data,
            complete,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// True when the transfer was truncated or otherwise corrupt. Such
    /// frames are dropped by the grab loop, never encoded.
    pub fn is_incomplete(&self) -> bool {
        !self.complete
    }
}

/// Control surface of a machine-vision camera under software trigger.
pub trait CameraControl {
    /// Load the device's default configuration set.
    fn apply_defaults(&mut self) -> Result<(), CameraError>;

    /// Apply session parameters: timed exposure with auto-exposure off,
    /// fixed gain, ADC bit depth, Mono8 pixel format, and the
    /// exposure-active signal routed to the requested output line.
    fn configure(&mut self, settings: &CameraSettings) -> Result<(), CameraError>;

    /// Frame geometry the device will deliver. Fixed for the session.
    fn image_size(&self) -> (u32, u32);

    /// The frame rate the device will actually achieve under the applied
    /// settings, in frames per second.
    fn resulting_frame_rate(&self) -> Result<f64, CameraError>;

    /// Start streaming. The exposure-active line is electrically live from
    /// here until [`CameraControl::end_acquisition`].
    fn begin_acquisition(&mut self) -> Result<(), CameraError>;

    /// Stop streaming and deactivate the exposure-active line.
    fn end_acquisition(&mut self) -> Result<(), CameraError>;

    /// Block until the next frame arrives. No timeout: by device contract a
    /// frame eventually arrives or the call fails.
    fn next_frame(&mut self) -> Result<DriverFrame, CameraError>;

    /// Hand a frame's buffer slot back to the driver.
    fn release_frame(&mut self, frame: DriverFrame) -> Result<(), CameraError>;
}
