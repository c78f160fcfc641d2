use std::fmt;
use std::path::Path;

use crate::FrameError;

/// A single decoded frame in packed RGB24 layout.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Position of the frame within its source.
    pub index: u64,
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes, row-major.
    pub rgb: Vec<u8>,
}

impl Frame {
    /// Creates a frame, checking that the buffer matches the dimensions.
    pub fn new(index: u64, width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, FrameError> {
        let want = width as usize * height as usize * 3;
        if rgb.len() != want {
            return Err(FrameError::Decode {
                index,
                reason: format!("expected {want} bytes, got {}", rgb.len()),
            });
        }
        Ok(Self {
            index,
            width,
            height,
            rgb,
        })
    }

    /// Returns the RGB triple at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let off = (y as usize * self.width as usize + x as usize) * 3;
        [self.rgb[off], self.rgb[off + 1], self.rgb[off + 2]]
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("index", &self.index)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rgb_len", &self.rgb.len())
            .finish()
    }
}

/// A decodable video with random frame access.
pub trait VideoSource {
    /// Total number of frames reported by the container. May be 0.
    fn frame_count(&self) -> u64;

    /// Decodes the frame at `index`.
    fn read_frame(&mut self, index: u64) -> Result<Frame, FrameError>;
}

/// Opens video sources by path.
///
/// Implementations must be safe for concurrent use.
pub trait VideoOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, FrameError>;
}
