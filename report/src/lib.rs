//! Read-only views over a clustering result.
//!
//! - [`ClusterReport`]: summary, per-cluster sizes, source-group
//!   histograms and full member lists
//! - [`ChannelConfig`]: one playable channel per cluster folder
//! - [`EmbeddingExport`] / [`ProjectionExport`]: inputs for external viewers
//!
//! Every type serializes with serde; writing files is up to the caller.

mod channel;
mod error;
mod export;
mod report;

pub use channel::{cluster_folder, Channel, ChannelConfig, NOISE_FOLDER};
pub use error::ReportError;
pub use export::{EmbeddingExport, ExportedEmbedding, ExportedPoint, ProjectionExport};
pub use report::{
    ClusterEntry, ClusterPreview, ClusterReport, SourceCount, Summary, PREVIEW_SAMPLES,
    PREVIEW_TOP_SOURCES,
};

fn check_len(what: &'static str, expected: usize, got: usize) -> Result<(), ReportError> {
    if expected == got {
        Ok(())
    } else {
        Err(ReportError::LengthMismatch {
            what,
            expected,
            got,
        })
    }
}
