use thiserror::Error;

/// Errors returned by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store: io: {0}")]
    Io(#[from] std::io::Error),

    #[error("store: corrupt snapshot at {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("store: encode: {0}")]
    Encode(String),

    #[error("store: misaligned snapshot: {records} records, {vectors} vectors")]
    Misaligned { records: usize, vectors: usize },

    #[error("store: dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("store: duplicate identity {0}")]
    DuplicateIdentity(String),
}
