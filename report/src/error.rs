use thiserror::Error;

/// Errors returned while building reports.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report: {what}: expected {expected} rows, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
}
