use thiserror::Error;
use vidchan_cluster::ClusterError;
use vidchan_encoder::EncodeError;
use vidchan_report::ReportError;
use vidchan_store::StoreError;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline: config: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Report(#[from] ReportError),
}
