//! Frame sampling for video embedding.
//!
//! A [`VideoSource`] exposes a frame count and random access to decoded
//! RGB frames. [`FrameSampler`] picks `k` evenly spaced indices across the
//! source and decodes them lazily:
//!
//! ```text
//! total = 100, k = 5  ->  0, 24, 49, 74, 99
//! ```
//!
//! Sources that fail to open or report zero frames yield an empty sequence.
//! A single undecodable frame is skipped; the sequence just gets shorter.
//!
//! [`FfmpegOpener`] is the production source, backed by the `ffprobe` and
//! `ffmpeg` binaries.

mod error;
mod ffmpeg;
mod frame;
mod sampler;

pub use error::FrameError;
pub use ffmpeg::{FfmpegConfig, FfmpegOpener, FfmpegSource};
pub use frame::{Frame, VideoOpener, VideoSource};
pub use sampler::{sample_indices, FrameSampler, Frames, DEFAULT_FRAMES_PER_VIDEO};
