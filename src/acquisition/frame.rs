//! Owned frame data decoupled from the driver's buffer pool.

use crate::camera::DriverFrame;

/// One captured frame: `width * height` single-channel 8-bit samples plus
/// the sequence index assigned at grab time.
///
/// Sequence indices are strictly increasing within a session. A corrupt
/// hardware frame consumes its index without ever becoming a `FrameBuffer`,
/// so gaps in the encoded sequence mark exactly the dropped frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    seq: u64,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(seq: u64, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            seq,
            width,
            height,
            pixels,
        }
    }

    /// Deep-copy a driver frame so its buffer slot can be released.
    pub fn copied_from(seq: u64, frame: &DriverFrame) -> Self {
        Self::new(seq, frame.width(), frame.height(), frame.data().to_vec())
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_out_of_driver_frame() {
        let driver = DriverFrame::new(4, 2, vec![7u8; 8], true);
        let frame = FrameBuffer::copied_from(3, &driver);
        assert_eq!(frame.seq(), 3);
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.pixels(), &[7u8; 8]);
        // The copy is independent of the driver slot.
        drop(driver);
        assert_eq!(frame.pixels().len(), 8);
    }
}
