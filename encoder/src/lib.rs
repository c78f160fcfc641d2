//! Visual embedding of videos.
//!
//! # Pipeline
//!
//! 1. [`FrameSampler`](vidchan_frames::FrameSampler): video -> up to k frames
//! 2. [`FrameEncoder::encode_batch`]: frames -> one vector per frame
//! 3. [`mean_normalized`]: arithmetic mean, then L2 normalization
//!
//! The result is a single unit-norm point per video. A video that yields
//! no usable frame produces [`EmbedOutcome::Skipped`], never an error.

mod encoder;
mod error;
mod model;
#[cfg(feature = "clip")]
mod model_clip;
mod vector;

pub use encoder::{EmbedOutcome, SkipReason, VideoEncoder};
pub use error::EncodeError;
pub use model::FrameEncoder;
#[cfg(feature = "clip")]
pub use model_clip::{ClipEncoder, CLIP_DIMENSION};
pub use vector::{l2_norm, l2_normalize, mean_normalized};
