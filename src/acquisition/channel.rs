//! Unbounded frame queue between the grab and encoding threads.
//!
//! Back-pressure is deliberately absent: blocking the grab loop behind a
//! slow encoder risks overflowing the driver's buffer ring and losing
//! frames at the hardware level. Memory growth under a sustained-slow
//! encoder is the accepted trade-off, bounded in practice by session
//! length.

use crossbeam_channel::{Receiver, Sender, unbounded};

use super::frame::FrameBuffer;

/// Item traveling the channel: a frame, or the end-of-stream marker.
#[derive(Debug)]
pub enum FrameMessage {
    Frame(FrameBuffer),
    EndOfStream,
}

/// Create the single-producer single-consumer frame queue.
pub fn frame_channel() -> (FrameSender, FrameReceiver) {
    let (tx, rx) = unbounded();
    (FrameSender { tx }, FrameReceiver { rx, done: false })
}

/// Producer half, held by the grab loop.
pub struct FrameSender {
    tx: Sender<FrameMessage>,
}

impl FrameSender {
    /// Queue a frame. Never blocks.
    pub fn push(&self, frame: FrameBuffer) {
        if self.tx.send(FrameMessage::Frame(frame)).is_err() {
            // Only reachable if the worker died; the frame is lost either way.
            log::error!("frame queue receiver is gone, frame dropped");
        }
    }

    /// Push the end-of-stream marker and give up the sending half, so the
    /// marker can only ever be sent once.
    pub fn close(self) {
        let _ = self.tx.send(FrameMessage::EndOfStream);
    }
}

/// Consumer half, owned by the encoding worker.
pub struct FrameReceiver {
    rx: Receiver<FrameMessage>,
    done: bool,
}

impl FrameReceiver {
    /// Block until the next item arrives, in push order. Once the
    /// end-of-stream marker has been seen (or the producer vanished),
    /// returns `EndOfStream` immediately instead of blocking forever.
    pub fn pop(&mut self) -> FrameMessage {
        if self.done {
            return FrameMessage::EndOfStream;
        }
        match self.rx.recv() {
            Ok(FrameMessage::Frame(frame)) => FrameMessage::Frame(frame),
            Ok(FrameMessage::EndOfStream) | Err(_) => {
                self.done = true;
                FrameMessage::EndOfStream
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(seq: u64) -> FrameBuffer {
        FrameBuffer::new(seq, 2, 2, vec![0; 4])
    }

    #[test]
    fn delivers_in_push_order() {
        let (tx, mut rx) = frame_channel();
        for seq in 0..5 {
            tx.push(frame(seq));
        }
        tx.close();
        for seq in 0..5 {
            match rx.pop() {
                FrameMessage::Frame(f) => assert_eq!(f.seq(), seq),
                FrameMessage::EndOfStream => panic!("stream ended early at {seq}"),
            }
        }
        assert!(matches!(rx.pop(), FrameMessage::EndOfStream));
    }

    #[test]
    fn pop_after_end_of_stream_keeps_returning_marker() {
        let (tx, mut rx) = frame_channel();
        tx.close();
        assert!(matches!(rx.pop(), FrameMessage::EndOfStream));
        assert!(matches!(rx.pop(), FrameMessage::EndOfStream));
        assert!(matches!(rx.pop(), FrameMessage::EndOfStream));
    }

    #[test]
    fn dropped_sender_reads_as_end_of_stream() {
        let (tx, mut rx) = frame_channel();
        tx.push(frame(0));
        drop(tx);
        assert!(matches!(rx.pop(), FrameMessage::Frame(_)));
        assert!(matches!(rx.pop(), FrameMessage::EndOfStream));
    }

    #[test]
    fn queued_frames_survive_close() {
        let (tx, mut rx) = frame_channel();
        tx.push(frame(0));
        tx.push(frame(1));
        tx.close();
        assert!(matches!(rx.pop(), FrameMessage::Frame(f) if f.seq() == 0));
        assert!(matches!(rx.pop(), FrameMessage::Frame(f) if f.seq() == 1));
        assert!(matches!(rx.pop(), FrameMessage::EndOfStream));
    }
}
