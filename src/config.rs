//! Session configuration and persistence.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::acquisition::FrameTarget;
use crate::camera::{CameraSettings, OutputLine};
use crate::encode::Codec;

/// Everything one capture session needs. Loadable from a JSON file; any
/// field left out falls back to its default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Exposure time in microseconds; determines the delivered frame rate.
    pub exposure_us: f64,
    /// Analog gain in dB (0-40).
    pub gain_db: f64,
    /// ADC bit depth.
    pub adc_bit_depth: u8,
    /// Digital line carrying the exposure-active signal for the DAQ.
    pub exposure_line: OutputLine,
    /// Number of frames to record. Ignored when `duration_secs` is set.
    pub frames: u64,
    /// Record for this long instead, converted through the negotiated
    /// frame rate.
    pub duration_secs: Option<f64>,
    /// Encoder constant-quantizer value; lower is better quality.
    pub quality: u32,
    /// Output codec.
    pub codec: Codec,
    /// Directory recordings are written into. Defaults to the platform
    /// Videos directory.
    pub output_root: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            exposure_us: 2150.0,
            gain_db: 25.0,
            adc_bit_depth: 10,
            exposure_line: OutputLine::default(),
            frames: 10,
            duration_secs: None,
            quality: 25,
            codec: Codec::default(),
            output_root: None,
        }
    }
}

impl CaptureConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config file: {}", path.display()))
    }

    /// The device-facing subset of this configuration.
    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            exposure_us: self.exposure_us,
            gain_db: self.gain_db,
            adc_bit_depth: self.adc_bit_depth,
            exposure_line: self.exposure_line,
        }
    }

    /// How long the session should run.
    pub fn frame_target(&self) -> FrameTarget {
        match self.duration_secs {
            Some(secs) => FrameTarget::DurationSecs(secs),
            None => FrameTarget::Frames(self.frames),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_bench_setup() {
        let config = CaptureConfig::default();
        assert_eq!(config.exposure_us, 2150.0);
        assert_eq!(config.gain_db, 25.0);
        assert_eq!(config.frames, 10);
        assert_eq!(config.quality, 25);
        assert_eq!(config.codec, Codec::H264);
        assert_eq!(config.frame_target(), FrameTarget::Frames(10));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"exposure_us": 5000.0, "duration_secs": 2.5}}"#).unwrap();

        let config = CaptureConfig::load(file.path()).unwrap();
        assert_eq!(config.exposure_us, 5000.0);
        assert_eq!(config.frame_target(), FrameTarget::DurationSecs(2.5));
        // Untouched fields keep their defaults.
        assert_eq!(config.gain_db, 25.0);
        assert_eq!(config.quality, 25);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(CaptureConfig::load(Path::new("/nonexistent/blackcap.json")).is_err());
    }
}
