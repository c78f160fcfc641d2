use tracing::debug;

use crate::distance::squared_euclidean;
use crate::hdbscan::Hdbscan;
use crate::{ClusterError, NOISE};

/// Labels after outlier reassignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Reassignment {
    pub labels: Vec<i32>,
    /// Points labeled by soft prediction.
    pub soft_assigned: usize,
    /// Points labeled by the nearest labeled point.
    pub nearest_assigned: usize,
}

/// Gives every noise point a cluster.
///
/// Noise points are first run through
/// [`Hdbscan::approximate_predict_excluding`]. Whatever is still noise then
/// takes the label of the nearest point labeled so far; ties go to the
/// lowest index. Points labeled by this second pass never serve as targets.
///
/// Fails with [`ClusterError::NoiseRemaining`] when noise is left and no
/// point carries a label.
pub fn reassign_outliers(
    model: &Hdbscan,
    labels: &[i32],
    points: &[Vec<f32>],
) -> Result<Reassignment, ClusterError> {
    if labels.len() != points.len() {
        return Err(ClusterError::InvalidParams(format!(
            "{} labels for {} points",
            labels.len(),
            points.len()
        )));
    }

    let mut out = labels.to_vec();
    let mut soft_assigned = 0;
    for (i, label) in out.iter_mut().enumerate() {
        if *label != NOISE {
            continue;
        }
        let predicted = model.approximate_predict_excluding(&points[i], i);
        if predicted != NOISE {
            *label = predicted;
            soft_assigned += 1;
        }
    }

    let labeled: Vec<usize> = (0..out.len()).filter(|&i| out[i] != NOISE).collect();
    let noise: Vec<usize> = (0..out.len()).filter(|&i| out[i] == NOISE).collect();
    if !noise.is_empty() && labeled.is_empty() {
        return Err(ClusterError::NoiseRemaining(noise.len()));
    }

    let mut nearest_assigned = 0;
    for i in noise {
        let mut best = labeled[0];
        let mut best_d = f64::INFINITY;
        for &j in &labeled {
            let d = squared_euclidean(&points[i], &points[j]);
            if d < best_d {
                best_d = d;
                best = j;
            }
        }
        out[i] = out[best];
        nearest_assigned += 1;
    }

    debug!(soft_assigned, nearest_assigned, "outliers reassigned");
    Ok(Reassignment {
        labels: out,
        soft_assigned,
        nearest_assigned,
    })
}
