use std::fmt;
use std::path::Path;

use tracing::debug;
use vidchan_frames::{Frame, FrameSampler, VideoOpener};

use crate::model::FrameEncoder;
use crate::vector::mean_normalized;

/// Why a video produced no embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The source could not be opened, reported zero frames, or every
    /// sampled frame failed to decode.
    NoFrames,
    /// The frame encoder failed.
    Encoder(String),
    /// A frame vector did not match the encoder's dimension.
    DimensionMismatch { expected: usize, got: usize },
    /// The averaged vector had zero length and cannot be normalized.
    ZeroNorm,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFrames => write!(f, "no decodable frames"),
            Self::Encoder(msg) => write!(f, "encoder failed: {msg}"),
            Self::DimensionMismatch { expected, got } => {
                write!(f, "dimension mismatch: expected {expected}, got {got}")
            }
            Self::ZeroNorm => write!(f, "zero-norm embedding"),
        }
    }
}

/// Result of embedding one video.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedOutcome {
    /// Unit-norm embedding.
    Embedded(Vec<f32>),
    /// No embedding possible; the video is left out of the matrix.
    Skipped(SkipReason),
}

impl EmbedOutcome {
    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }

    /// Returns the vector if embedded.
    pub fn into_vector(self) -> Option<Vec<f32>> {
        match self {
            Self::Embedded(v) => Some(v),
            Self::Skipped(_) => None,
        }
    }
}

/// Computes one embedding per video from sampled frames.
///
/// Construct once per run and pass by reference; it holds the loaded model.
pub struct VideoEncoder {
    model: Box<dyn FrameEncoder>,
    sampler: FrameSampler,
}

impl VideoEncoder {
    pub fn new(model: Box<dyn FrameEncoder>, sampler: FrameSampler) -> Self {
        Self { model, sampler }
    }

    /// Returns the embedding dimensionality.
    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }

    /// Embeds the video at `path`.
    pub fn embed(&self, opener: &dyn VideoOpener, path: &Path) -> EmbedOutcome {
        let mut frames = self.sampler.sample(opener, path);
        let decoded: Vec<Frame> = frames.by_ref().collect();
        if frames.skipped() > 0 {
            debug!(
                path = %path.display(),
                skipped = frames.skipped(),
                planned = frames.planned(),
                "some sampled frames failed to decode"
            );
        }
        self.embed_frames(&decoded)
    }

    /// Embeds already decoded frames.
    pub fn embed_frames(&self, frames: &[Frame]) -> EmbedOutcome {
        if frames.is_empty() {
            return EmbedOutcome::Skipped(SkipReason::NoFrames);
        }

        let vectors = match self.model.encode_batch(frames) {
            Ok(v) => v,
            Err(e) => return EmbedOutcome::Skipped(SkipReason::Encoder(e.to_string())),
        };

        let expected = self.model.dimension();
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return EmbedOutcome::Skipped(SkipReason::DimensionMismatch {
                expected,
                got: bad.len(),
            });
        }
        if vectors.len() != frames.len() {
            return EmbedOutcome::Skipped(SkipReason::Encoder(format!(
                "{} vectors for {} frames",
                vectors.len(),
                frames.len()
            )));
        }

        match mean_normalized(&vectors) {
            Some(v) => EmbedOutcome::Embedded(v),
            None => EmbedOutcome::Skipped(SkipReason::ZeroNorm),
        }
    }
}
