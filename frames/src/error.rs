use thiserror::Error;

/// Errors returned by frame operations.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frames: cannot open {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("frames: probe failed: {0}")]
    Probe(String),

    #[error("frames: decode failed at frame {index}: {reason}")]
    Decode { index: u64, reason: String },

    #[error("frames: io: {0}")]
    Io(#[from] std::io::Error),
}
