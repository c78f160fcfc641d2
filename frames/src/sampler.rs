use std::path::Path;

use tracing::debug;

use crate::frame::{Frame, VideoOpener, VideoSource};

/// Frames sampled per video when not configured otherwise.
pub const DEFAULT_FRAMES_PER_VIDEO: usize = 5;

/// Returns `k` frame indices evenly spaced over `[0, total - 1]`.
///
/// Positions are interpolated linearly from the first to the last frame
/// (both inclusive) and truncated toward zero. When `total < k` some
/// indices repeat.
pub fn sample_indices(total: u64, k: usize) -> Vec<u64> {
    if total == 0 || k == 0 {
        return Vec::new();
    }
    if k == 1 {
        return vec![0];
    }
    let last = (total - 1) as f64;
    let step = last / (k - 1) as f64;
    (0..k)
        .map(|i| {
            let pos = if i == k - 1 { last } else { i as f64 * step };
            (pos as u64).min(total - 1)
        })
        .collect()
}

/// Picks a fixed number of evenly spaced frames from each video.
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler {
    frames_per_video: usize,
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAMES_PER_VIDEO)
    }
}

impl FrameSampler {
    /// Creates a sampler. A count of 0 falls back to
    /// [`DEFAULT_FRAMES_PER_VIDEO`].
    pub fn new(frames_per_video: usize) -> Self {
        let frames_per_video = if frames_per_video == 0 {
            DEFAULT_FRAMES_PER_VIDEO
        } else {
            frames_per_video
        };
        Self { frames_per_video }
    }

    pub fn frames_per_video(&self) -> usize {
        self.frames_per_video
    }

    /// Opens `path` and returns a lazy sequence of sampled frames.
    ///
    /// Open failures are not errors here: the returned sequence is empty.
    pub fn sample(&self, opener: &dyn VideoOpener, path: &Path) -> Frames {
        match opener.open(path) {
            Ok(source) => self.sample_source(source),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "video source unavailable");
                Frames::empty()
            }
        }
    }

    /// Returns a lazy sequence of sampled frames from an open source.
    pub fn sample_source(&self, source: Box<dyn VideoSource>) -> Frames {
        let total = source.frame_count();
        let indices = sample_indices(total, self.frames_per_video);
        if indices.is_empty() {
            debug!("video source reports zero frames");
            return Frames::empty();
        }
        Frames {
            source: Some(source),
            indices,
            pos: 0,
            skipped: 0,
        }
    }
}

/// Lazy, finite, single-pass iterator over sampled frames.
///
/// Each call to `next` decodes one frame. Indices that fail to decode are
/// skipped and counted in [`Frames::skipped`].
pub struct Frames {
    source: Option<Box<dyn VideoSource>>,
    indices: Vec<u64>,
    pos: usize,
    skipped: usize,
}

impl Frames {
    fn empty() -> Self {
        Self {
            source: None,
            indices: Vec::new(),
            pos: 0,
            skipped: 0,
        }
    }

    /// Number of indices this sequence will attempt.
    pub fn planned(&self) -> usize {
        self.indices.len()
    }

    /// Number of indices that failed to decode so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for Frames {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let source = self.source.as_mut()?;
        while self.pos < self.indices.len() {
            let index = self.indices[self.pos];
            self.pos += 1;
            match source.read_frame(index) {
                Ok(frame) => return Some(frame),
                Err(e) => {
                    debug!(index, error = %e, "skipping undecodable frame");
                    self.skipped += 1;
                }
            }
        }
        // Release the decoder once exhausted.
        self.source = None;
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.source.is_none() {
            return (0, Some(0));
        }
        (0, Some(self.indices.len() - self.pos))
    }
}
