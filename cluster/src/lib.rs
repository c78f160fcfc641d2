//! Unsupervised grouping of embedding vectors.
//!
//! [`ClusterEngine::run`] takes the full embedding matrix and
//!
//! 1. reduces it with a UMAP-style manifold reduction under cosine distance
//!    ([`umap`])
//! 2. clusters the reduced points with HDBSCAN under Euclidean distance
//!    ([`hdbscan`])
//! 3. optionally reassigns every noise point ([`reassign_outliers`])
//! 4. optionally computes a separate 2-D projection for visualization
//!
//! Labels are dense cluster ids starting at 0, or [`NOISE`].
//!
//! ```
//! use vidchan_cluster::{Capability, ClusterEngine, ClusterParams};
//!
//! let params = ClusterParams { min_cluster_size: 2, ..ClusterParams::default() };
//! let engine = ClusterEngine::new(params, Capability::Available);
//! let run = engine
//!     .cluster_reduced(vec![vec![0.0], vec![0.01], vec![2.0]])
//!     .unwrap();
//! assert_eq!(run.raw_labels, vec![0, 0, -1]);
//! assert_eq!(run.labels, vec![0, 0, 0]);
//! ```

mod distance;
mod engine;
mod error;
pub mod hdbscan;
mod reassign;
pub mod umap;

pub use distance::{cosine_distance, euclidean};
pub use engine::{Capability, ClusterEngine, ClusterParams, ClusterRun, RunStats};
pub use error::ClusterError;
pub use hdbscan::{Hdbscan, HdbscanParams};
pub use reassign::{reassign_outliers, Reassignment};
pub use umap::UmapParams;

/// Label of a point that belongs to no cluster.
pub const NOISE: i32 = -1;
