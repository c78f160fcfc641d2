use thiserror::Error;

/// Errors returned by frame encoders.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("encoder: model error: {0}")]
    Model(String),

    #[error("encoder: {0} unavailable")]
    Unavailable(String),
}
