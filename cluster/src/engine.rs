use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::hdbscan::{Hdbscan, HdbscanParams};
use crate::reassign::reassign_outliers;
use crate::umap::{reduce, UmapParams};
use crate::{ClusterError, NOISE};

/// Tuning for reduction, clustering and reassignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    pub n_neighbors: usize,
    pub n_components: usize,
    pub min_dist: f32,
    pub min_cluster_size: usize,
    pub min_samples: usize,
    pub seed: u64,
    /// Reassign every noise point to a cluster.
    pub assign_all: bool,
    /// Select the whole collection as one cluster when nothing else is.
    pub single_cluster_fallback: bool,
    /// Compute the 2-D projection for visualization.
    pub projection: bool,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            n_neighbors: 15,
            n_components: 5,
            min_dist: 0.0,
            min_cluster_size: 10,
            min_samples: 1,
            seed: 42,
            assign_all: true,
            single_cluster_fallback: true,
            projection: true,
        }
    }
}

impl ClusterParams {
    pub fn validate(&self) -> Result<(), ClusterError> {
        let bad = |msg: String| Err(ClusterError::InvalidParams(msg));
        if self.min_cluster_size < 2 {
            return bad(format!("min_cluster_size {} < 2", self.min_cluster_size));
        }
        if self.min_samples < 1 {
            return bad("min_samples must be at least 1".into());
        }
        if self.n_neighbors < 2 {
            return bad(format!("n_neighbors {} < 2", self.n_neighbors));
        }
        if self.n_components < 1 {
            return bad("n_components must be at least 1".into());
        }
        if !(self.min_dist >= 0.0 && self.min_dist.is_finite()) {
            return bad(format!("min_dist {} out of range", self.min_dist));
        }
        Ok(())
    }

    fn umap(&self, n_components: usize) -> UmapParams {
        UmapParams {
            n_neighbors: self.n_neighbors,
            n_components,
            min_dist: self.min_dist,
            spread: 1.0,
            n_epochs: None,
            seed: self.seed,
        }
    }

    fn hdbscan(&self) -> HdbscanParams {
        HdbscanParams {
            min_cluster_size: self.min_cluster_size,
            min_samples: self.min_samples,
            allow_single_cluster: false,
            single_cluster_fallback: self.single_cluster_fallback,
        }
    }
}

/// Whether an optional stage can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Available,
    Unavailable(String),
}

impl Capability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub num_clusters: usize,
    pub pre_reassignment_noise: usize,
    pub soft_assigned: usize,
    pub nearest_assigned: usize,
    pub remaining_noise: usize,
}

/// Output of [`ClusterEngine::run`]. All vectors are aligned with the
/// input rows.
#[derive(Debug, Clone)]
pub struct ClusterRun {
    /// Coordinates the clustering ran on.
    pub reduced: Vec<Vec<f32>>,
    /// 2-D layout for visualization; `None` when not computed.
    pub projection: Option<Vec<[f32; 2]>>,
    /// Labels as clustered, before reassignment.
    pub raw_labels: Vec<i32>,
    pub labels: Vec<i32>,
    pub stats: RunStats,
}

impl ClusterRun {
    /// Returns the projection, or why there is none.
    pub fn projection(&self) -> Result<&[[f32; 2]], ClusterError> {
        self.projection
            .as_deref()
            .ok_or_else(|| ClusterError::Unavailable("projection".into()))
    }
}

/// Runs reduction, HDBSCAN and outlier reassignment over a full matrix.
#[derive(Debug, Clone)]
pub struct ClusterEngine {
    params: ClusterParams,
    clustering: Capability,
    projection: Capability,
}

impl ClusterEngine {
    pub fn new(params: ClusterParams, clustering: Capability) -> Self {
        Self {
            params,
            clustering,
            projection: Capability::Available,
        }
    }

    /// Sets the projection capability.
    pub fn with_projection(mut self, projection: Capability) -> Self {
        self.projection = projection;
        self
    }

    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    /// Clusters every row of `vectors`.
    pub fn run(&self, vectors: &[Vec<f32>]) -> Result<ClusterRun, ClusterError> {
        self.check()?;
        if let Some(first) = vectors.first() {
            let expected = first.len();
            if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
                return Err(ClusterError::DimensionMismatch {
                    expected,
                    got: bad.len(),
                });
            }
        }

        info!(videos = vectors.len(), dim = self.params.n_components, "reducing embeddings");
        let reduced = reduce(vectors, &self.params.umap(self.params.n_components));
        let mut run = self.cluster_reduced(reduced)?;
        run.projection = self.project(vectors);
        Ok(run)
    }

    /// Clusters already reduced coordinates. The returned run has no
    /// projection.
    pub fn cluster_reduced(&self, reduced: Vec<Vec<f32>>) -> Result<ClusterRun, ClusterError> {
        self.check()?;

        let model = Hdbscan::fit(reduced.clone(), self.params.hdbscan());
        let raw_labels = model.labels().to_vec();
        let noise = count_noise(&raw_labels);
        info!(
            clusters = model.num_clusters(),
            noise,
            "density clustering done"
        );

        let mut stats = RunStats {
            num_clusters: model.num_clusters(),
            pre_reassignment_noise: noise,
            ..RunStats::default()
        };
        let labels = if self.params.assign_all && noise > 0 {
            let r = reassign_outliers(&model, &raw_labels, &reduced)?;
            stats.soft_assigned = r.soft_assigned;
            stats.nearest_assigned = r.nearest_assigned;
            info!(
                soft = r.soft_assigned,
                nearest = r.nearest_assigned,
                "noise points reassigned"
            );
            r.labels
        } else {
            raw_labels.clone()
        };
        stats.remaining_noise = count_noise(&labels);

        Ok(ClusterRun {
            reduced,
            projection: None,
            raw_labels,
            labels,
            stats,
        })
    }

    fn check(&self) -> Result<(), ClusterError> {
        if let Capability::Unavailable(reason) = &self.clustering {
            warn!(reason = %reason, "clustering unavailable");
            return Err(ClusterError::Unavailable("clustering".into()));
        }
        self.params.validate()
    }

    fn project(&self, vectors: &[Vec<f32>]) -> Option<Vec<[f32; 2]>> {
        if !self.params.projection {
            return None;
        }
        if let Capability::Unavailable(reason) = &self.projection {
            warn!(reason = %reason, "projection unavailable");
            return None;
        }
        let coords = reduce(vectors, &self.params.umap(2));
        Some(coords.into_iter().map(|c| [c[0], c[1]]).collect())
    }
}

fn count_noise(labels: &[i32]) -> usize {
    labels.iter().filter(|&&l| l == NOISE).count()
}
