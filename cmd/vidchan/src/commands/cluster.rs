use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use vidchan_pipeline::{Capabilities, Pipeline};

use super::{get_config, print_info, print_success, print_warning, write_json};
use crate::Cli;

const REPORT_FILE: &str = "cluster_analysis.json";
const ASSIGNMENTS_FILE: &str = "video_assignments.json";
const CHANNELS_FILE: &str = "channels.json";
const PREVIEW_FILE: &str = "reorganization_preview.json";
const EMBEDDINGS_FILE: &str = "embeddings.json";
const PROJECTION_FILE: &str = "projection.json";

/// Cluster the cached collection and write the reports.
#[derive(Args)]
pub struct ClusterCommand {
    /// Directory the reports are written to
    #[arg(short = 'o', long, default_value = "cluster_results")]
    output_dir: PathBuf,

    /// Embedding cache file (overrides config)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Minimum cluster size (overrides config)
    #[arg(long)]
    min_cluster_size: Option<usize>,

    /// Neighborhood size for the reduction (overrides config)
    #[arg(long)]
    n_neighbors: Option<usize>,

    /// Keep noise instead of assigning every video
    #[arg(long)]
    keep_noise: bool,

    /// Skip the 2-D projection and its export
    #[arg(long)]
    no_projection: bool,

    /// Also export raw embeddings
    #[arg(long)]
    export_embeddings: bool,
}

impl ClusterCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut cfg = get_config(cli)?;
        if let Some(cache) = &self.cache {
            cfg.cache_path = cache.clone();
        }
        if let Some(mcs) = self.min_cluster_size {
            cfg.cluster.min_cluster_size = mcs;
        }
        if let Some(k) = self.n_neighbors {
            cfg.cluster.n_neighbors = k;
        }
        if self.keep_noise {
            cfg.cluster.assign_all = false;
        }
        if self.no_projection {
            cfg.cluster.projection = false;
        }
        cfg.validate()?;

        let engine = Capabilities::default().engine(cfg.cluster.clone());

        let pipeline = Pipeline::from_config(&cfg);
        let outcome = pipeline
            .cluster(&engine)
            .with_context(|| format!("cluster {}", cfg.cache_path.display()))?;
        let summary = &outcome.report.summary;
        print_info(&format!(
            "{} videos, {} clusters, {} noise before reassignment ({} soft, {} nearest)",
            summary.total_videos,
            summary.num_clusters,
            summary.pre_reassignment_noise,
            summary.soft_assigned,
            summary.nearest_assigned
        ));

        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("create {}", self.output_dir.display()))?;
        let out = |name: &str| self.output_dir.join(name);

        write_json(&out(REPORT_FILE), &outcome.report)?;
        write_json(&out(ASSIGNMENTS_FILE), &outcome.report.assignments())?;
        write_json(&out(CHANNELS_FILE), &outcome.report.channel_config())?;

        let preview = outcome.report.reorganization_preview();
        for p in &preview {
            let sources: Vec<String> = p
                .top_sources
                .iter()
                .map(|s| format!("{} ({})", s.source_group, s.count))
                .collect();
            eprintln!("  {}: {} videos, from {}", p.folder, p.size, sources.join(", "));
        }
        write_json(&out(PREVIEW_FILE), &preview)?;

        if self.export_embeddings {
            write_json(&out(EMBEDDINGS_FILE), &outcome.embedding_export())?;
        }
        match outcome.projection_export() {
            Ok(projection) => write_json(&out(PROJECTION_FILE), &projection)?,
            Err(e) => print_warning(&format!("no projection export: {e}")),
        }

        print_success(&format!("reports written to {}", self.output_dir.display()));
        Ok(())
    }
}
