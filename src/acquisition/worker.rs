//! Encoding worker thread.

use std::thread::JoinHandle;

use crate::encode::{EncodeError, FrameSink};

use super::channel::{FrameMessage, FrameReceiver};

/// Background thread draining the frame queue into a [`FrameSink`].
///
/// Frames are appended in arrival order, which is push order, which is
/// capture order. After the first append failure the worker stops writing
/// but keeps draining until the end-of-stream marker, so shutdown never
/// hangs on a queue that will not empty itself.
pub struct EncodingWorker<S: FrameSink + Send + 'static> {
    handle: JoinHandle<(S, Result<u64, EncodeError>)>,
}

impl<S: FrameSink + Send + 'static> EncodingWorker<S> {
    /// Spawn the worker over `frames`.
    pub fn spawn(sink: S, frames: FrameReceiver) -> Self {
        Self {
            handle: std::thread::spawn(move || drain(sink, frames)),
        }
    }

    /// Wait for the worker to reach end-of-stream. Returns the sink — so
    /// the caller can finalize the file knowing no write is in flight —
    /// and the number of frames appended, or the first append error.
    pub fn join(self) -> (S, Result<u64, EncodeError>) {
        match self.handle.join() {
            Ok(out) => out,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

fn drain<S: FrameSink>(mut sink: S, mut frames: FrameReceiver) -> (S, Result<u64, EncodeError>) {
    let mut written = 0u64;
    let mut failure: Option<EncodeError> = None;

    loop {
        match frames.pop() {
            FrameMessage::EndOfStream => break,
            FrameMessage::Frame(frame) => {
                if failure.is_some() {
                    // Drain and discard; the file is already damaged.
                    continue;
                }
                match sink.append(&frame) {
                    Ok(()) => written += 1,
                    Err(e) => {
                        log::error!("encoder append failed on frame {}: {e}", frame.seq());
                        failure = Some(e);
                    }
                }
            }
        }
    }

    match failure {
        Some(e) => (sink, Err(e)),
        None => (sink, Ok(written)),
    }
}
