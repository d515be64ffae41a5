//! Video encoding backends
//!
//! The encoding worker feeds frames to a [`FrameSink`]; the GStreamer
//! pipeline in [`pipeline`] is the production implementation. Codec choice
//! is a fixed mapping to an encoder element, muxer, and file extension —
//! there is no negotiation or probing.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::acquisition::FrameBuffer;

mod pipeline;

pub use pipeline::Pipeline;

/// Errors surfaced by an encoding backend.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("encoder setup failed: {0}")]
    Setup(String),
    #[error("failed to append frame {seq}: {reason}")]
    Append { seq: u64, reason: String },
    #[error("failed to finalize output: {0}")]
    Finalize(String),
}

/// Output codec, paired with a fixed container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum Codec {
    #[default]
    H264,
    Vp9,
}

impl Codec {
    /// GStreamer encoder element for this codec.
    pub fn encoder_element(self) -> &'static str {
        match self {
            Codec::H264 => "x264enc",
            Codec::Vp9 => "vp9enc",
        }
    }

    /// GStreamer muxer element for this codec's container.
    pub fn muxer_element(self) -> &'static str {
        match self {
            Codec::H264 => "mp4mux",
            Codec::Vp9 => "matroskamux",
        }
    }

    /// File extension for the output video.
    pub fn file_extension(self) -> &'static str {
        match self {
            Codec::H264 => "mp4",
            Codec::Vp9 => "mkv",
        }
    }
}

/// Destination for encoded frames.
///
/// Implementations compress internally; callers only see per-frame
/// success/failure and a final `finish`.
pub trait FrameSink {
    /// Append one frame to the output stream.
    fn append(&mut self, frame: &FrameBuffer) -> Result<(), EncodeError>;

    /// Finalize the output file. The caller guarantees no append is in
    /// flight; after this the sink is spent.
    fn finish(&mut self) -> Result<(), EncodeError>;
}
