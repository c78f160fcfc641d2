use std::collections::BTreeMap;

use serde::Serialize;
use vidchan_cluster::{RunStats, NOISE};
use vidchan_store::VideoRecord;

use crate::channel::{cluster_folder, ChannelConfig};
use crate::{check_len, ReportError};

/// Source groups listed per cluster by [`ClusterReport::reorganization_preview`].
pub const PREVIEW_TOP_SOURCES: usize = 5;
/// Member names listed per cluster by [`ClusterReport::reorganization_preview`].
pub const PREVIEW_SAMPLES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_videos: usize,
    pub num_clusters: usize,
    /// Noise left in the final labels.
    pub num_noise: usize,
    /// Noise before outlier reassignment.
    pub pre_reassignment_noise: usize,
    pub soft_assigned: usize,
    pub nearest_assigned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCount {
    pub source_group: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterEntry {
    pub id: i32,
    /// `cluster_{id}`, or `noise`.
    pub name: String,
    pub size: usize,
    /// Source groups by member count, largest first.
    pub channel_distribution: Vec<SourceCount>,
    /// Members in snapshot order.
    pub members: Vec<VideoRecord>,
}

/// Short description of one cluster for an operator preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterPreview {
    /// Folder-style name, `{id+1:02}_Cluster_{id}`.
    pub folder: String,
    pub id: i32,
    pub size: usize,
    pub top_sources: Vec<SourceCount>,
    pub samples: Vec<String>,
}

/// Cluster membership report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterReport {
    pub summary: Summary,
    /// Ordered by id; noise, if any, comes first.
    pub clusters: Vec<ClusterEntry>,
}

impl ClusterReport {
    /// Groups `records` by `labels`, which must be aligned with them.
    pub fn build(
        records: &[VideoRecord],
        labels: &[i32],
        stats: &RunStats,
    ) -> Result<Self, ReportError> {
        check_len("labels", records.len(), labels.len())?;

        let mut groups: BTreeMap<i32, Vec<VideoRecord>> = BTreeMap::new();
        for (record, &label) in records.iter().zip(labels) {
            groups.entry(label).or_default().push(record.clone());
        }

        let clusters: Vec<ClusterEntry> = groups
            .into_iter()
            .map(|(id, members)| ClusterEntry {
                id,
                name: if id == NOISE {
                    "noise".to_string()
                } else {
                    format!("cluster_{id}")
                },
                size: members.len(),
                channel_distribution: distribution(&members),
                members,
            })
            .collect();

        let num_noise = clusters
            .iter()
            .find(|c| c.id == NOISE)
            .map_or(0, |c| c.size);
        let summary = Summary {
            total_videos: records.len(),
            num_clusters: clusters.iter().filter(|c| c.id != NOISE).count(),
            num_noise,
            pre_reassignment_noise: stats.pre_reassignment_noise,
            soft_assigned: stats.soft_assigned,
            nearest_assigned: stats.nearest_assigned,
        };
        Ok(Self { summary, clusters })
    }

    /// Maps every video identity to its cluster id.
    pub fn assignments(&self) -> BTreeMap<String, i32> {
        self.clusters
            .iter()
            .flat_map(|c| c.members.iter().map(move |m| (m.id.clone(), c.id)))
            .collect()
    }

    pub fn cluster(&self, id: i32) -> Option<&ClusterEntry> {
        self.clusters.iter().find(|c| c.id == id)
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig::from_report(self)
    }

    /// Lists non-noise clusters with their `top_sources` largest source
    /// groups and the first `samples` member names.
    pub fn preview(&self, top_sources: usize, samples: usize) -> Vec<ClusterPreview> {
        self.clusters
            .iter()
            .filter(|c| c.id != NOISE)
            .map(|c| ClusterPreview {
                folder: cluster_folder(c.id),
                id: c.id,
                size: c.size,
                top_sources: c.channel_distribution.iter().take(top_sources).cloned().collect(),
                samples: c.members.iter().take(samples).map(|m| m.name.clone()).collect(),
            })
            .collect()
    }

    /// [`preview`](Self::preview) with the operator defaults: the
    /// [`PREVIEW_TOP_SOURCES`] largest source groups and [`PREVIEW_SAMPLES`]
    /// member names per cluster.
    pub fn reorganization_preview(&self) -> Vec<ClusterPreview> {
        self.preview(PREVIEW_TOP_SOURCES, PREVIEW_SAMPLES)
    }
}

fn distribution(members: &[VideoRecord]) -> Vec<SourceCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for m in members {
        *counts.entry(m.source_group.as_str()).or_default() += 1;
    }
    let mut out: Vec<SourceCount> = counts
        .into_iter()
        .map(|(group, count)| SourceCount {
            source_group: group.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps name order among equal counts.
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}
