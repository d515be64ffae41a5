//! Command line interface.

use clap::Parser;
use std::path::PathBuf;

use crate::config::CaptureConfig;
use crate::encode::Codec;

/// DAQ-synchronized camera capture to compressed video.
///
/// Start the DAQ first: while acquisition runs the camera mirrors its
/// exposure-active signal on a digital output line so the DAQ can
/// time-align its samples to frame capture. A couple of trailing line
/// edges after the last frame are expected; the DAQ should discard them.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Path to a JSON config file; the flags below override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Exposure time in microseconds.
    #[arg(long)]
    pub exposure_us: Option<f64>,
    /// Analog gain in dB (0-40).
    #[arg(long)]
    pub gain_db: Option<f64>,
    /// Number of frames to record.
    #[arg(long, conflicts_with = "duration")]
    pub frames: Option<u64>,
    /// Recording duration in seconds, converted through the negotiated
    /// frame rate.
    #[arg(long)]
    pub duration: Option<f64>,
    /// Encoder constant-quantizer value; lower is better quality.
    #[arg(long)]
    pub quality: Option<u32>,
    /// Output codec.
    #[arg(long, value_enum)]
    pub codec: Option<Codec>,
    /// Directory to write recordings into.
    #[arg(long)]
    pub output_root: Option<PathBuf>,
}

impl Args {
    /// Merge the config file (when given) with the flag overrides.
    pub fn into_config(self) -> anyhow::Result<CaptureConfig> {
        let mut config = match &self.config {
            Some(path) => CaptureConfig::load(path)?,
            None => CaptureConfig::default(),
        };
        if let Some(v) = self.exposure_us {
            config.exposure_us = v;
        }
        if let Some(v) = self.gain_db {
            config.gain_db = v;
        }
        if let Some(v) = self.frames {
            config.frames = v;
            config.duration_secs = None;
        }
        if let Some(v) = self.duration {
            config.duration_secs = Some(v);
        }
        if let Some(v) = self.quality {
            config.quality = v;
        }
        if let Some(v) = self.codec {
            config.codec = v;
        }
        if let Some(v) = self.output_root {
            config.output_root = Some(v);
        }
        Ok(config)
    }
}
