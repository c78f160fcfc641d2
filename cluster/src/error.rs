use thiserror::Error;

/// Errors returned by cluster operations.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cluster: {0} unavailable")]
    Unavailable(String),

    #[error("cluster: invalid params: {0}")]
    InvalidParams(String),

    #[error("cluster: dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("cluster: {0} points still noise after reassignment")]
    NoiseRemaining(usize),
}
