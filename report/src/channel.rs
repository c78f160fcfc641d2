use serde::{Deserialize, Serialize};
use vidchan_cluster::NOISE;

use crate::report::ClusterReport;

/// Folder holding the videos no cluster claimed.
pub const NOISE_FOLDER: &str = "00_Uncategorized";

/// One playable channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Folder name with underscores as spaces, title-cased.
    pub name: String,
    pub folder: String,
    pub cluster: i32,
    /// Video file names in snapshot order.
    pub videos: Vec<String>,
    pub video_count: usize,
}

/// Channel list consumed by the player, in `{"channels": [...]}` form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub channels: Vec<Channel>,
}

/// Folder for cluster `id`: `{id+1:02}_Cluster_{id}`, or [`NOISE_FOLDER`].
pub fn cluster_folder(id: i32) -> String {
    if id == NOISE {
        NOISE_FOLDER.to_string()
    } else {
        format!("{:02}_Cluster_{}", id + 1, id)
    }
}

/// `01_Cluster_0` -> `01 Cluster 0`.
fn channel_name(folder: &str) -> String {
    folder
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

impl ChannelConfig {
    /// One channel per cluster, ordered by folder name. Noise members,
    /// present only when outliers were kept, form the `00_Uncategorized`
    /// channel, which sorts first.
    pub fn from_report(report: &ClusterReport) -> Self {
        let mut channels: Vec<Channel> = report
            .clusters
            .iter()
            .filter(|c| c.size > 0)
            .map(|c| {
                let folder = cluster_folder(c.id);
                let videos: Vec<String> = c.members.iter().map(|m| m.name.clone()).collect();
                Channel {
                    name: channel_name(&folder),
                    folder,
                    cluster: c.id,
                    video_count: videos.len(),
                    videos,
                }
            })
            .collect();
        channels.sort_by(|a, b| a.folder.cmp(&b.folder));
        Self { channels }
    }

    /// Total number of videos over all channels.
    pub fn total_videos(&self) -> usize {
        self.channels.iter().map(|c| c.video_count).sum()
    }
}
