use vidchan_frames::Frame;

use crate::EncodeError;

/// Maps single frames into a shared visual-semantic vector space.
///
/// The output is a dense f32 vector whose dimensionality is returned by
/// [`FrameEncoder::dimension`]. Vectors need not be normalized; the video
/// encoder normalizes after averaging.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use. Load the model once
/// and share the encoder; it is stateless after construction.
pub trait FrameEncoder: Send + Sync {
    /// Computes the embedding of one frame.
    fn encode(&self, frame: &Frame) -> Result<Vec<f32>, EncodeError>;

    /// Computes embeddings for several frames, one vector per frame, in
    /// input order. Frames are encoded independently.
    fn encode_batch(&self, frames: &[Frame]) -> Result<Vec<Vec<f32>>, EncodeError> {
        frames.iter().map(|f| self.encode(f)).collect()
    }

    /// Returns the dimensionality of the embedding vectors (e.g., 512).
    fn dimension(&self) -> usize;
}
