use serde::Serialize;
use vidchan_store::{Snapshot, VideoRecord};

use crate::{check_len, ReportError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedEmbedding {
    pub id: String,
    pub filename: String,
    pub embedding: Vec<f32>,
}

/// Every cached embedding, for external analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingExport {
    pub videos: Vec<ExportedEmbedding>,
    pub embedding_dim: usize,
    pub total_videos: usize,
}

impl EmbeddingExport {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let videos = snapshot
            .iter()
            .map(|(r, v)| ExportedEmbedding {
                id: r.id.clone(),
                filename: r.name.clone(),
                embedding: v.to_vec(),
            })
            .collect();
        Self {
            videos,
            embedding_dim: snapshot.dim().unwrap_or(0),
            total_videos: snapshot.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedPoint {
    pub id: String,
    pub filename: String,
    pub source_group: String,
    pub cluster: i32,
    pub x: f32,
    pub y: f32,
}

/// 2-D layout with labels, for the external viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionExport {
    pub videos: Vec<ExportedPoint>,
}

impl ProjectionExport {
    pub fn build(
        records: &[VideoRecord],
        labels: &[i32],
        projection: &[[f32; 2]],
    ) -> Result<Self, ReportError> {
        check_len("labels", records.len(), labels.len())?;
        check_len("projection", records.len(), projection.len())?;

        let videos = records
            .iter()
            .zip(labels)
            .zip(projection)
            .map(|((r, &cluster), &[x, y])| ExportedPoint {
                id: r.id.clone(),
                filename: r.name.clone(),
                source_group: r.source_group.clone(),
                cluster,
                x,
                y,
            })
            .collect();
        Ok(Self { videos })
    }
}
