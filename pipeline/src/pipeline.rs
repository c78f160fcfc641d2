use std::collections::HashSet;

use tracing::{info, warn};
use vidchan_cluster::{Capability, ClusterEngine, ClusterParams, ClusterRun};
use vidchan_encoder::{EmbedOutcome, SkipReason, VideoEncoder};
use vidchan_frames::VideoOpener;
use vidchan_report::{ClusterReport, EmbeddingExport, ProjectionExport};
use vidchan_store::{FileStore, Snapshot, SnapshotStore, VideoRecord};

use crate::config::Config;
use crate::PipelineError;

/// Which optional stages this process can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub clustering: Capability,
    pub projection: Capability,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            clustering: Capability::Available,
            projection: Capability::Available,
        }
    }
}

impl Capabilities {
    pub fn engine(&self, params: ClusterParams) -> ClusterEngine {
        ClusterEngine::new(params, self.clustering.clone()).with_projection(self.projection.clone())
    }
}

/// What an encode pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodeSummary {
    /// Videos already in the cache.
    pub cached: usize,
    /// Videos embedded in this pass.
    pub embedded: usize,
    /// Videos without an embedding, by identity.
    pub skipped: Vec<(String, SkipReason)>,
    /// Repeated identities in the input, ignored.
    pub duplicates: usize,
    /// Snapshots saved during the pass, the final one included.
    pub checkpoints: usize,
}

/// Result of clustering the cached collection.
#[derive(Debug, Clone)]
pub struct ClusterOutcome {
    pub snapshot: Snapshot,
    pub run: ClusterRun,
    pub report: ClusterReport,
}

impl ClusterOutcome {
    pub fn embedding_export(&self) -> EmbeddingExport {
        EmbeddingExport::from_snapshot(&self.snapshot)
    }

    /// Fails when the projection was not computed.
    pub fn projection_export(&self) -> Result<ProjectionExport, PipelineError> {
        let projection = self.run.projection()?;
        Ok(ProjectionExport::build(
            self.snapshot.records(),
            &self.run.labels,
            projection,
        )?)
    }
}

/// Drives encode and cluster runs against one snapshot store.
pub struct Pipeline {
    store: Box<dyn SnapshotStore>,
    checkpoint_every: usize,
}

impl Pipeline {
    pub fn new(store: Box<dyn SnapshotStore>, checkpoint_every: usize) -> Self {
        Self {
            store,
            checkpoint_every: checkpoint_every.max(1),
        }
    }

    /// Uses the file cache named by `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Box::new(FileStore::new(config.cache_path.clone())),
            config.checkpoint_every,
        )
    }

    pub fn store(&self) -> &dyn SnapshotStore {
        self.store.as_ref()
    }

    /// Returns the cached snapshot, empty when nothing is cached.
    pub fn load(&self) -> Result<Snapshot, PipelineError> {
        Ok(self.store.load()?.unwrap_or_default())
    }

    /// Embeds every record not yet cached and grows the cache.
    ///
    /// With `force`, the cache is ignored (even when unreadable) and all
    /// records are embedded again. Progress is saved every
    /// `checkpoint_every` new embeddings, so an interrupted pass resumes
    /// where the last checkpoint left off.
    pub fn encode_collection(
        &self,
        encoder: &VideoEncoder,
        opener: &dyn VideoOpener,
        records: &[VideoRecord],
        force: bool,
    ) -> Result<(Snapshot, EncodeSummary), PipelineError> {
        let mut snapshot = if force {
            info!("forced recomputation, ignoring cache");
            Snapshot::empty()
        } else {
            self.load()?
        };
        info!(
            videos = records.len(),
            cached = snapshot.len(),
            dim = encoder.dimension(),
            "encode pass started"
        );

        let mut summary = EncodeSummary::default();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut pending: (Vec<VideoRecord>, Vec<Vec<f32>>) = (Vec::new(), Vec::new());

        for record in records {
            if !seen.insert(record.id.as_str()) {
                warn!(id = %record.id, "duplicate video identity, ignored");
                summary.duplicates += 1;
                continue;
            }
            if snapshot.contains(&record.id) {
                summary.cached += 1;
                continue;
            }

            match encoder.embed(opener, &record.path) {
                EmbedOutcome::Embedded(vector) => {
                    pending.0.push(record.clone());
                    pending.1.push(vector);
                    summary.embedded += 1;
                }
                EmbedOutcome::Skipped(reason) => {
                    warn!(id = %record.id, reason = %reason, "video skipped");
                    summary.skipped.push((record.id.clone(), reason));
                }
            }

            if pending.0.len() >= self.checkpoint_every {
                let (recs, vecs) = std::mem::take(&mut pending);
                snapshot = snapshot.merge(recs, vecs)?;
                self.store.save(&snapshot)?;
                summary.checkpoints += 1;
                info!(rows = snapshot.len(), "checkpoint saved");
            }
        }

        if !pending.0.is_empty() || force {
            let (recs, vecs) = pending;
            snapshot = snapshot.merge(recs, vecs)?;
            self.store.save(&snapshot)?;
            summary.checkpoints += 1;
        }

        info!(
            cached = summary.cached,
            embedded = summary.embedded,
            skipped = summary.skipped.len(),
            rows = snapshot.len(),
            "encode pass finished"
        );
        Ok((snapshot, summary))
    }

    /// Clusters the whole cached collection.
    pub fn cluster(&self, engine: &ClusterEngine) -> Result<ClusterOutcome, PipelineError> {
        let snapshot = self.load()?;
        cluster_snapshot(snapshot, engine)
    }
}

/// Clusters `snapshot` and builds its report.
pub fn cluster_snapshot(
    snapshot: Snapshot,
    engine: &ClusterEngine,
) -> Result<ClusterOutcome, PipelineError> {
    info!(videos = snapshot.len(), "clustering collection");
    let run = engine.run(snapshot.vectors())?;
    let report = ClusterReport::build(snapshot.records(), &run.labels, &run.stats)?;
    info!(
        clusters = report.summary.num_clusters,
        noise = report.summary.num_noise,
        "clustering finished"
    );
    Ok(ClusterOutcome {
        snapshot,
        run,
        report,
    })
}
