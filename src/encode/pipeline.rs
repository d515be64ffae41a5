//! GStreamer pipeline construction and management

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use std::path::{Path, PathBuf};

use super::{Codec, EncodeError, FrameSink};
use crate::acquisition::FrameBuffer;

/// GStreamer pipeline encoding Mono8 frames into a video file.
///
/// `open` builds and starts the pipeline; frames are appended through the
/// [`FrameSink`] impl and the file is finalized by `finish`.
pub struct Pipeline {
    pipeline: gst::Pipeline,
    appsrc: gst_app::AppSrc,
    output_path: PathBuf,
    width: u32,
    height: u32,
    frame_duration_ns: u64,
}

impl Pipeline {
    /// Open an encoding pipeline writing to `path`.
    ///
    /// # Arguments
    /// * `codec` - Codec/container pair
    /// * `quality` - Constant-quantizer value; lower is better quality
    /// * `width`, `height` - Frame geometry, fixed for the session
    /// * `frame_rate` - Negotiated camera frame rate in fps
    pub fn open(
        path: &Path,
        codec: Codec,
        quality: u32,
        width: u32,
        height: u32,
        frame_rate: f64,
    ) -> Result<Self, EncodeError> {
        gst::init().map_err(|e| EncodeError::Setup(format!("GStreamer init: {e}")))?;

        if frame_rate <= 0.0 {
            return Err(EncodeError::Setup(format!(
                "frame rate must be positive, got {frame_rate}"
            )));
        }

        let pipeline = gst::Pipeline::new();

        let appsrc = gst_app::AppSrc::builder()
            .name("camera-source")
            .is_live(true)
            .format(gst::Format::Time)
            .build();

        let videoconvert = gst::ElementFactory::make("videoconvert")
            .build()
            .map_err(|e| EncodeError::Setup(format!("videoconvert: {e}")))?;

        let encoder = gst::ElementFactory::make(codec.encoder_element())
            .build()
            .map_err(|e| EncodeError::Setup(format!("{}: {e}", codec.encoder_element())))?;
        match codec {
            Codec::H264 => {
                encoder.set_property_from_str("pass", "quant");
                encoder.set_property("quantizer", quality);
            }
            Codec::Vp9 => {
                encoder.set_property_from_str("end-usage", "cq");
                encoder.set_property("cq-level", quality as i32);
            }
        }

        let muxer = gst::ElementFactory::make(codec.muxer_element())
            .build()
            .map_err(|e| EncodeError::Setup(format!("{}: {e}", codec.muxer_element())))?;

        let filesink = gst::ElementFactory::make("filesink")
            .property("location", path.to_string_lossy().as_ref())
            .build()
            .map_err(|e| EncodeError::Setup(format!("filesink: {e}")))?;

        pipeline
            .add_many([
                appsrc.upcast_ref(),
                &videoconvert,
                &encoder,
                &muxer,
                &filesink,
            ])
            .map_err(|e| EncodeError::Setup(format!("assemble pipeline: {e}")))?;

        gst::Element::link_many([
            appsrc.upcast_ref(),
            &videoconvert,
            &encoder,
            &muxer,
            &filesink,
        ])
        .map_err(|e| EncodeError::Setup(format!("link pipeline: {e}")))?;

        let caps = gst::Caps::builder("video/x-raw")
            .field("format", gst_video::VideoFormat::Gray8.to_str())
            .field("width", width as i32)
            .field("height", height as i32)
            .field(
                "framerate",
                gst::Fraction::new((frame_rate * 1000.0).round() as i32, 1000),
            )
            .build();
        appsrc.set_caps(Some(&caps));

        pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| EncodeError::Setup(format!("start pipeline: {e}")))?;

        log::info!(
            "Encoding pipeline ready: {}x{} @ {:.2} fps, {} quantizer {} -> {}",
            width,
            height,
            frame_rate,
            codec.encoder_element(),
            quality,
            path.display()
        );

        Ok(Self {
            pipeline,
            appsrc,
            output_path: path.to_path_buf(),
            width,
            height,
            frame_duration_ns: (1e9 / frame_rate) as u64,
        })
    }

    /// Verify that the output file exists and has data.
    fn verify_output(&self) -> Result<(), EncodeError> {
        let metadata = std::fs::metadata(&self.output_path).map_err(|e| {
            EncodeError::Finalize(format!(
                "output file {} missing: {e}",
                self.output_path.display()
            ))
        })?;
        if metadata.len() == 0 {
            return Err(EncodeError::Finalize(format!(
                "output file {} is empty",
                self.output_path.display()
            )));
        }
        log::info!(
            "Output file verified: {} ({} bytes)",
            self.output_path.display(),
            metadata.len()
        );
        Ok(())
    }
}

impl FrameSink for Pipeline {
    fn append(&mut self, frame: &FrameBuffer) -> Result<(), EncodeError> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(EncodeError::Append {
                seq: frame.seq(),
                reason: format!(
                    "geometry {}x{} does not match the {}x{} stream",
                    frame.width(),
                    frame.height(),
                    self.width,
                    self.height
                ),
            });
        }

        let mut buffer = gst::Buffer::with_size(frame.pixels().len()).map_err(|e| {
            EncodeError::Append {
                seq: frame.seq(),
                reason: format!("allocate buffer: {e}"),
            }
        })?;

        {
            let buffer_mut = buffer.get_mut().unwrap();
            buffer_mut.set_pts(gst::ClockTime::from_nseconds(
                frame.seq() * self.frame_duration_ns,
            ));
            let mut map = buffer_mut.map_writable().map_err(|e| EncodeError::Append {
                seq: frame.seq(),
                reason: format!("map buffer: {e}"),
            })?;
            map.copy_from_slice(frame.pixels());
        }

        self.appsrc
            .push_buffer(buffer)
            .map_err(|flow| EncodeError::Append {
                seq: frame.seq(),
                reason: format!("push rejected: {flow:?}"),
            })?;

        Ok(())
    }

    fn finish(&mut self) -> Result<(), EncodeError> {
        self.appsrc
            .end_of_stream()
            .map_err(|flow| EncodeError::Finalize(format!("EOS rejected: {flow:?}")))?;

        // Wait for EOS to propagate so the muxer writes its trailer.
        let bus = self
            .pipeline
            .bus()
            .ok_or_else(|| EncodeError::Finalize("pipeline has no bus".into()))?;
        let mut eos_received = false;
        for msg in bus.iter_timed(gst::ClockTime::from_seconds(30)) {
            use gst::MessageView;
            match msg.view() {
                MessageView::Eos(..) => {
                    eos_received = true;
                    break;
                }
                MessageView::Error(err) => {
                    return Err(EncodeError::Finalize(format!(
                        "pipeline error: {} ({})",
                        err.error(),
                        err.debug().unwrap_or_default()
                    )));
                }
                _ => {}
            }
        }
        if !eos_received {
            log::warn!("EOS timeout reached, forcing pipeline shutdown");
        }

        self.pipeline
            .set_state(gst::State::Null)
            .map_err(|e| EncodeError::Finalize(format!("stop pipeline: {e}")))?;

        self.verify_output()
    }
}
