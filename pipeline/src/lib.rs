//! End-to-end runs over a video collection.
//!
//! ```text
//! records -> encode_collection -> Snapshot (cached) -> cluster -> ClusterOutcome
//! ```
//!
//! The snapshot store is the only state shared between runs. Encoding is
//! incremental; clustering always covers the whole cached snapshot.

mod config;
mod error;
mod pipeline;

pub use config::{
    load_config, save_config, Config, DEFAULT_BASE_DIR, DEFAULT_CACHE_DIR,
    DEFAULT_CHECKPOINT_EVERY, DEFAULT_CONFIG_FILE,
};
pub use error::PipelineError;
pub use pipeline::{cluster_snapshot, Capabilities, ClusterOutcome, EncodeSummary, Pipeline};
