//! UMAP-style manifold reduction.
//!
//! 1. exact kNN graph under cosine distance
//! 2. per-point bandwidth search so each neighborhood sums to `log2(k)`
//! 3. fuzzy union `w + wᵀ - w∘wᵀ`
//! 4. spectral initialization, random when the graph is too small
//! 5. SGD with negative sampling on the low-dimensional layout
//!
//! Inputs with fewer than [`MIN_GRAPH_POINTS`] rows, or no more rows than
//! `n_components + 1`, skip the graph and use classical scaling of the
//! cosine geometry instead. With so few points every neighbor is pulled to
//! membership close to 1, and the layout no longer reflects distances.
//!
//! Every random draw comes from one seeded [`StdRng`]. Graph rows are
//! `BTreeMap`s so iteration order never depends on hashing.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::distance::{cosine_distance, squared_euclidean};

const SMOOTH_K_ITERS: usize = 64;
const SMOOTH_K_TOLERANCE: f64 = 1e-5;
const MIN_K_DIST_SCALE: f64 = 1e-3;
const NEGATIVE_SAMPLE_RATE: f64 = 5.0;
const REPULSION_STRENGTH: f64 = 1.0;
const INITIAL_ALPHA: f64 = 1.0;
const GRADIENT_CLIP: f64 = 4.0;
const SPECTRAL_ITERS: usize = 300;
const LAYOUT_SCALE: f64 = 10.0;
const AB_SAMPLES: usize = 300;
const SCALING_ITERS: usize = 300;

/// Smallest input reduced through the neighbor graph.
pub const MIN_GRAPH_POINTS: usize = 4;

/// Reduction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct UmapParams {
    pub n_neighbors: usize,
    pub n_components: usize,
    pub min_dist: f32,
    pub spread: f32,
    /// `None` picks 500 epochs up to 10 000 points and 200 above.
    pub n_epochs: Option<usize>,
    pub seed: u64,
}

impl Default for UmapParams {
    fn default() -> Self {
        Self {
            n_neighbors: 15,
            n_components: 2,
            min_dist: 0.1,
            spread: 1.0,
            n_epochs: None,
            seed: 42,
        }
    }
}

/// Symmetric sparse weights, one ordered row per vertex.
pub(crate) type Graph = Vec<BTreeMap<usize, f64>>;

/// Reduces `data` to `params.n_components` dimensions.
pub fn reduce(data: &[Vec<f32>], params: &UmapParams) -> Vec<Vec<f32>> {
    let n = data.len();
    let dim = params.n_components;
    if n == 0 {
        return Vec::new();
    }
    if n == 1 || dim == 0 {
        return vec![vec![0.0; dim]; n];
    }
    if n < MIN_GRAPH_POINTS || n <= dim + 1 {
        debug!(n, dim, "too few points for a neighbor graph, classical scaling");
        return classical_scaling(data, dim);
    }

    let k = params.n_neighbors.clamp(1, n);
    let (indices, dists) = knn(data, k);
    let (sigmas, rhos) = smooth_knn_dist(&dists, k as f64);
    let graph = fuzzy_union(&membership_strengths(&indices, &dists, &sigmas, &rhos));

    let n_epochs = params
        .n_epochs
        .unwrap_or(if n <= 10_000 { 500 } else { 200 });
    let (a, b) = find_ab_params(params.spread as f64, params.min_dist as f64);
    let mut rng = StdRng::seed_from_u64(params.seed);

    let mut embedding = initialize(&graph, dim, &mut rng);
    let edges = sample_edges(&graph, n_epochs);
    debug!(n, k, dim, n_epochs, edges = edges.len(), a, b, "umap layout");
    optimize_layout(&mut embedding, dim, &edges, n_epochs, a, b, &mut rng);

    embedding.chunks(dim).map(|row| row.to_vec()).collect()
}

/// Top principal coordinates of the L2-normalized rows, scaled so the
/// largest magnitude is [`LAYOUT_SCALE`].
///
/// Eigenvectors of the centered Gram matrix come from deflated power
/// iteration with a fixed start vector, so the result is deterministic.
/// Each axis is signed so its largest entry is positive.
fn classical_scaling(data: &[Vec<f32>], dim: usize) -> Vec<Vec<f32>> {
    let n = data.len();
    let rows: Vec<Vec<f64>> = data
        .iter()
        .map(|r| {
            let mut v: Vec<f64> = r.iter().map(|&x| x as f64).collect();
            normalize(&mut v);
            v
        })
        .collect();
    let width = rows.first().map_or(0, Vec::len);
    let mean: Vec<f64> = (0..width)
        .map(|d| rows.iter().map(|r| r[d]).sum::<f64>() / n as f64)
        .collect();
    let centered: Vec<Vec<f64>> = rows
        .iter()
        .map(|r| r.iter().zip(&mean).map(|(x, m)| x - m).collect())
        .collect();
    let gram: Vec<Vec<f64>> = centered
        .iter()
        .map(|a| {
            centered
                .iter()
                .map(|b| a.iter().zip(b).map(|(x, y)| x * y).sum())
                .collect()
        })
        .collect();
    let apply = |v: &[f64]| -> Vec<f64> {
        gram.iter()
            .map(|row| row.iter().zip(v).map(|(g, x)| g * x).sum())
            .collect()
    };

    let mut axes: Vec<Vec<f64>> = Vec::with_capacity(dim);
    let mut coords = vec![vec![0.0_f64; dim]; n];
    for c in 0..dim {
        let mut v: Vec<f64> = (0..n)
            .map(|i| ((i as f64 + 1.0) * 0.754_877_666_2 + c as f64 * 0.569_840_290_9).fract() - 0.5)
            .collect();
        let mut converged = false;
        for _ in 0..SCALING_ITERS {
            let mut w = apply(&v);
            for u in &axes {
                let dot: f64 = w.iter().zip(u).map(|(a, b)| a * b).sum();
                w.iter_mut().zip(u).for_each(|(a, b)| *a -= dot * b);
            }
            if !normalize(&mut w) {
                converged = false;
                break;
            }
            v = w;
            converged = true;
        }
        if !converged {
            // Remaining axes carry no variance.
            break;
        }
        let eigenvalue: f64 = apply(&v).iter().zip(&v).map(|(a, b)| a * b).sum();
        let scale = eigenvalue.max(0.0).sqrt();
        let pivot = (0..n).fold(0, |best, i| if v[i].abs() > v[best].abs() { i } else { best });
        let sign = if v[pivot] < 0.0 { -1.0 } else { 1.0 };
        for (i, row) in coords.iter_mut().enumerate() {
            row[c] = sign * v[i] * scale;
        }
        axes.push(v);
    }

    let max = coords.iter().flatten().fold(0.0_f64, |m, x| m.max(x.abs()));
    let expansion = if max > 0.0 { LAYOUT_SCALE / max } else { 0.0 };
    coords
        .into_iter()
        .map(|row| row.into_iter().map(|x| (x * expansion) as f32).collect())
        .collect()
}

/// Exact k nearest neighbors under cosine distance, self first.
///
/// Rows are sorted by `(distance, index)`.
pub(crate) fn knn(data: &[Vec<f32>], k: usize) -> (Vec<Vec<usize>>, Vec<Vec<f64>>) {
    let n = data.len();
    let keep = k.saturating_sub(1);
    let by_dist = |x: &(f64, usize), y: &(f64, usize)| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1));

    let mut indices = Vec::with_capacity(n);
    let mut dists = Vec::with_capacity(n);
    for i in 0..n {
        let mut row: Vec<(f64, usize)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (cosine_distance(&data[i], &data[j]) as f64, j))
            .collect();
        if row.len() > keep {
            row.select_nth_unstable_by(keep, by_dist);
            row.truncate(keep);
        }
        row.sort_by(by_dist);

        let mut idx = Vec::with_capacity(keep + 1);
        let mut d = Vec::with_capacity(keep + 1);
        idx.push(i);
        d.push(0.0);
        for (dist, j) in row {
            idx.push(j);
            d.push(dist);
        }
        indices.push(idx);
        dists.push(d);
    }
    (indices, dists)
}

/// Binary-searches a bandwidth per row so that
/// `sum(exp(-(d - rho) / sigma)) == log2(k)` over the non-self neighbors.
///
/// Returns `(sigmas, rhos)`; `rho` is the distance to the nearest neighbor
/// at non-zero distance.
pub(crate) fn smooth_knn_dist(dists: &[Vec<f64>], k: f64) -> (Vec<f64>, Vec<f64>) {
    let target = k.log2();
    let total: usize = dists.iter().map(Vec::len).sum();
    let mean_all = if total > 0 {
        dists.iter().flatten().sum::<f64>() / total as f64
    } else {
        0.0
    };

    let mut sigmas = Vec::with_capacity(dists.len());
    let mut rhos = Vec::with_capacity(dists.len());
    for row in dists {
        let rho = row.iter().copied().find(|&d| d > 0.0).unwrap_or(0.0);

        let (mut lo, mut hi, mut mid) = (0.0_f64, f64::INFINITY, 1.0_f64);
        for _ in 0..SMOOTH_K_ITERS {
            let psum: f64 = row
                .iter()
                .skip(1)
                .map(|&d| {
                    let d = d - rho;
                    if d > 0.0 { (-d / mid).exp() } else { 1.0 }
                })
                .sum();
            if (psum - target).abs() < SMOOTH_K_TOLERANCE {
                break;
            }
            if psum > target {
                hi = mid;
                mid = (lo + hi) / 2.0;
            } else {
                lo = mid;
                mid = if hi.is_infinite() { mid * 2.0 } else { (lo + hi) / 2.0 };
            }
        }

        let floor = if rho > 0.0 {
            let mean_row = row.iter().sum::<f64>() / row.len().max(1) as f64;
            MIN_K_DIST_SCALE * mean_row
        } else {
            MIN_K_DIST_SCALE * mean_all
        };
        sigmas.push(mid.max(floor));
        rhos.push(rho);
    }
    (sigmas, rhos)
}

/// Directed membership strengths `exp(-(d - rho) / sigma)`.
pub(crate) fn membership_strengths(
    indices: &[Vec<usize>],
    dists: &[Vec<f64>],
    sigmas: &[f64],
    rhos: &[f64],
) -> Graph {
    let mut rows: Graph = vec![BTreeMap::new(); indices.len()];
    for (i, (idx, d)) in indices.iter().zip(dists).enumerate() {
        for (&j, &dist) in idx.iter().zip(d) {
            if j == i {
                continue;
            }
            let w = if dist - rhos[i] <= 0.0 || sigmas[i] == 0.0 {
                1.0
            } else {
                (-(dist - rhos[i]) / sigmas[i]).exp()
            };
            rows[i].insert(j, w);
        }
    }
    rows
}

/// Probabilistic union `w + wᵀ - w∘wᵀ`.
pub(crate) fn fuzzy_union(directed: &Graph) -> Graph {
    let mut graph: Graph = vec![BTreeMap::new(); directed.len()];
    for (i, row) in directed.iter().enumerate() {
        for (&j, &w) in row {
            let wt = directed[j].get(&i).copied().unwrap_or(0.0);
            let s = w + wt - w * wt;
            if s > 0.0 {
                graph[i].insert(j, s);
                graph[j].insert(i, s);
            }
        }
    }
    graph
}

/// Initial layout scaled to `[0, 10]` per column, row-major.
fn initialize(graph: &Graph, dim: usize, rng: &mut StdRng) -> Vec<f32> {
    let n = graph.len();
    let spectral = if n > dim + 1 {
        spectral_layout(graph, dim, rng)
    } else {
        None
    };

    let mut layout: Vec<f64> = match spectral {
        Some(coords) => {
            let max = coords.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
            let expansion = LAYOUT_SCALE / max;
            coords
                .iter()
                .map(|&x| x * expansion + rng.gen_range(-1e-4..1e-4))
                .collect()
        }
        None => {
            debug!(n, dim, "random layout initialization");
            (0..n * dim).map(|_| rng.gen_range(-10.0..10.0)).collect()
        }
    };

    for c in 0..dim {
        let column = layout.iter().skip(c).step_by(dim);
        let (min, max) = column.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
        let span = max - min;
        for x in layout.iter_mut().skip(c).step_by(dim) {
            *x = if span > 0.0 { LAYOUT_SCALE * (*x - min) / span } else { 0.0 };
        }
    }
    layout.into_iter().map(|x| x as f32).collect()
}

/// Leading non-trivial eigenvectors of `D^-1/2 W D^-1/2` by subspace
/// iteration on `(I + M) / 2`, deflated against `sqrt(degree)`.
///
/// Returns `None` when the iteration degenerates.
fn spectral_layout(graph: &Graph, dim: usize, rng: &mut StdRng) -> Option<Vec<f64>> {
    let n = graph.len();
    let degree: Vec<f64> = graph.iter().map(|row| row.values().sum()).collect();
    let inv_sqrt: Vec<f64> = degree
        .iter()
        .map(|&d| if d > 0.0 { 1.0 / d.sqrt() } else { 0.0 })
        .collect();
    let mut trivial: Vec<f64> = degree.iter().map(|d| d.sqrt()).collect();
    if !normalize(&mut trivial) {
        return None;
    }

    let mut basis: Vec<Vec<f64>> = (0..dim)
        .map(|_| (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect();
    if !orthonormalize(&mut basis, &trivial) {
        return None;
    }

    for _ in 0..SPECTRAL_ITERS {
        basis = basis
            .iter()
            .map(|v| {
                (0..n)
                    .map(|i| {
                        let mv: f64 = graph[i]
                            .iter()
                            .map(|(&j, &w)| inv_sqrt[i] * w * inv_sqrt[j] * v[j])
                            .sum();
                        (v[i] + mv) / 2.0
                    })
                    .collect()
            })
            .collect();
        if !orthonormalize(&mut basis, &trivial) {
            return None;
        }
    }

    let mut coords = vec![0.0; n * dim];
    for (c, v) in basis.iter().enumerate() {
        for (i, &x) in v.iter().enumerate() {
            coords[i * dim + c] = x;
        }
    }
    if coords.iter().all(|x| x.is_finite()) && coords.iter().any(|&x| x != 0.0) {
        Some(coords)
    } else {
        None
    }
}

fn normalize(v: &mut [f64]) -> bool {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if !(norm > 1e-12) {
        return false;
    }
    v.iter_mut().for_each(|x| *x /= norm);
    true
}

/// Modified Gram-Schmidt against `trivial` and the preceding vectors.
fn orthonormalize(basis: &mut [Vec<f64>], trivial: &[f64]) -> bool {
    for k in 0..basis.len() {
        let (done, rest) = basis.split_at_mut(k);
        let v = &mut rest[0];
        for u in std::iter::once(trivial).chain(done.iter().map(Vec::as_slice)) {
            let dot: f64 = v.iter().zip(u).map(|(a, b)| a * b).sum();
            v.iter_mut().zip(u).for_each(|(a, b)| *a -= dot * b);
        }
        if !normalize(v) {
            return false;
        }
    }
    true
}

/// Fits `1 / (1 + a * x^(2b))` to the target membership curve over
/// `[0, 3 * spread]` with Levenberg-Marquardt.
pub fn find_ab_params(spread: f64, min_dist: f64) -> (f64, f64) {
    let xs: Vec<f64> = (0..AB_SAMPLES)
        .map(|i| 3.0 * spread * i as f64 / (AB_SAMPLES - 1) as f64)
        .collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|&x| if x < min_dist { 1.0 } else { (-(x - min_dist) / spread).exp() })
        .collect();

    let sse = |a: f64, b: f64| -> f64 {
        xs.iter()
            .zip(&ys)
            .map(|(&x, &y)| {
                let r = 1.0 / (1.0 + a * x.powf(2.0 * b)) - y;
                r * r
            })
            .sum()
    };

    let (mut a, mut b) = (1.0_f64, 1.0_f64);
    let mut cost = sse(a, b);
    let mut damping = 1e-3;
    for _ in 0..500 {
        let (mut h00, mut h01, mut h11, mut g0, mut g1) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (&x, &y) in xs.iter().zip(&ys) {
            if x <= 0.0 {
                continue;
            }
            let p = x.powf(2.0 * b);
            let denom = 1.0 + a * p;
            let r = 1.0 / denom - y;
            let da = -p / (denom * denom);
            let db = -a * p * 2.0 * x.ln() / (denom * denom);
            h00 += da * da;
            h01 += da * db;
            h11 += db * db;
            g0 += da * r;
            g1 += db * r;
        }

        let m00 = h00 * (1.0 + damping);
        let m11 = h11 * (1.0 + damping);
        let det = m00 * m11 - h01 * h01;
        if det.abs() < 1e-300 {
            break;
        }
        let step_a = (-g0 * m11 + h01 * g1) / det;
        let step_b = (-g1 * m00 + h01 * g0) / det;
        let (na, nb) = (a + step_a, b + step_b);

        if na > 0.0 && nb > 0.0 {
            let next = sse(na, nb);
            if next < cost {
                let gain = cost - next;
                a = na;
                b = nb;
                cost = next;
                damping *= 0.1;
                if gain < 1e-14 {
                    break;
                }
                continue;
            }
        }
        damping *= 10.0;
        if damping > 1e10 {
            break;
        }
    }
    (a, b)
}

struct Edge {
    head: usize,
    tail: usize,
    epochs_per_sample: f64,
}

/// Drops edges too weak to be sampled within `n_epochs` and computes the
/// sampling period of the rest.
fn sample_edges(graph: &Graph, n_epochs: usize) -> Vec<Edge> {
    let max_w = graph
        .iter()
        .flat_map(|row| row.values().copied())
        .fold(0.0_f64, f64::max);
    if max_w <= 0.0 || n_epochs == 0 {
        return Vec::new();
    }
    let floor = max_w / n_epochs as f64;
    graph
        .iter()
        .enumerate()
        .flat_map(|(i, row)| {
            row.iter()
                .filter(move |&(_, &w)| w >= floor)
                .map(move |(&j, &w)| Edge {
                    head: i,
                    tail: j,
                    epochs_per_sample: max_w / w,
                })
        })
        .collect()
}

fn clip(g: f64) -> f64 {
    g.clamp(-GRADIENT_CLIP, GRADIENT_CLIP)
}

fn optimize_layout(
    emb: &mut [f32],
    dim: usize,
    edges: &[Edge],
    n_epochs: usize,
    a: f64,
    b: f64,
    rng: &mut StdRng,
) {
    let n = emb.len() / dim;
    let mut next_sample: Vec<f64> = edges.iter().map(|e| e.epochs_per_sample).collect();
    let neg_period: Vec<f64> = edges
        .iter()
        .map(|e| e.epochs_per_sample / NEGATIVE_SAMPLE_RATE)
        .collect();
    let mut next_negative = neg_period.clone();

    for epoch in 0..n_epochs {
        let alpha = INITIAL_ALPHA * (1.0 - epoch as f64 / n_epochs as f64);
        let now = epoch as f64;

        for (e, edge) in edges.iter().enumerate() {
            if next_sample[e] > now {
                continue;
            }
            let (j, k) = (edge.head, edge.tail);

            let dsq = squared_euclidean(&emb[j * dim..(j + 1) * dim], &emb[k * dim..(k + 1) * dim]);
            let coeff = if dsq > 0.0 {
                -2.0 * a * b * dsq.powf(b - 1.0) / (a * dsq.powf(b) + 1.0)
            } else {
                0.0
            };
            for d in 0..dim {
                let diff = emb[j * dim + d] as f64 - emb[k * dim + d] as f64;
                let step = (clip(coeff * diff) * alpha) as f32;
                emb[j * dim + d] += step;
                emb[k * dim + d] -= step;
            }
            next_sample[e] += edge.epochs_per_sample;

            let n_neg = ((now - next_negative[e]) / neg_period[e]).floor().max(0.0) as usize;
            for _ in 0..n_neg {
                let k = rng.gen_range(0..n);
                if k == j {
                    continue;
                }
                let dsq =
                    squared_euclidean(&emb[j * dim..(j + 1) * dim], &emb[k * dim..(k + 1) * dim]);
                let coeff = if dsq > 0.0 {
                    2.0 * REPULSION_STRENGTH * b / ((0.001 + dsq) * (a * dsq.powf(b) + 1.0))
                } else {
                    0.0
                };
                if coeff <= 0.0 {
                    continue;
                }
                for d in 0..dim {
                    let diff = emb[j * dim + d] as f64 - emb[k * dim + d] as f64;
                    emb[j * dim + d] += (clip(coeff * diff) * alpha) as f32;
                }
            }
            next_negative[e] += n_neg as f64 * neg_period[e];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(v: &[f32]) -> Vec<f32> {
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.iter().map(|x| x / norm).collect()
    }

    /// Two groups of points near orthogonal axes in 8 dimensions.
    fn two_blobs(per: usize) -> Vec<Vec<f32>> {
        let mut out = Vec::new();
        for axis in [0usize, 4] {
            for i in 0..per {
                let mut v = vec![0.02_f32; 8];
                v[axis] = 1.0;
                v[axis + 1] = 0.05 * (i % 5) as f32;
                v[axis + 2] = 0.04 * (i / 5) as f32;
                out.push(unit(&v));
            }
        }
        out
    }

    #[test]
    fn ab_params_match_reference_curve() {
        let (a, b) = find_ab_params(1.0, 0.1);
        assert!((a - 1.577).abs() < 0.05, "a = {a}");
        assert!((b - 0.895).abs() < 0.05, "b = {b}");
    }

    #[test]
    fn ab_params_fit_zero_min_dist() {
        let (a, b) = find_ab_params(1.0, 0.0);
        assert!(a > 0.0 && b > 0.0);
        for i in 1..30 {
            let x = i as f64 * 0.1;
            let fit = 1.0 / (1.0 + a * x.powf(2.0 * b));
            assert!((fit - (-x).exp()).abs() < 0.1, "x = {x}: {fit}");
        }
    }

    #[test]
    fn knn_lists_self_first_then_sorted() {
        let data = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.9, 0.1], vec![-1.0, 0.0]];
        let (idx, d) = knn(&data, 3);
        assert_eq!(idx[0], vec![0, 2, 1]);
        assert_eq!(d[0][0], 0.0);
        assert!(d[0][1] <= d[0][2]);
        assert!(idx.iter().all(|row| row.len() == 3));
    }

    #[test]
    fn smooth_knn_hits_target_sum() {
        let dists = vec![vec![0.0, 0.1, 0.2, 0.4, 0.8]];
        let (sigmas, rhos) = smooth_knn_dist(&dists, 5.0);
        assert!((rhos[0] - 0.1).abs() < 1e-12);
        let psum: f64 = dists[0][1..]
            .iter()
            .map(|&d| {
                let d = d - rhos[0];
                if d > 0.0 { (-d / sigmas[0]).exp() } else { 1.0 }
            })
            .sum();
        assert!((psum - 5f64.log2()).abs() < 1e-3, "psum = {psum}");
    }

    #[test]
    fn fuzzy_union_is_symmetric() {
        let data = two_blobs(6);
        let (idx, d) = knn(&data, 4);
        let (s, r) = smooth_knn_dist(&d, 4.0);
        let g = fuzzy_union(&membership_strengths(&idx, &d, &s, &r));
        for (i, row) in g.iter().enumerate() {
            for (&j, &w) in row {
                assert!(w > 0.0 && w <= 1.0);
                assert_eq!(g[j].get(&i), Some(&w));
            }
        }
    }

    #[test]
    fn reduce_shape_and_finite() {
        let data = two_blobs(10);
        let out = reduce(&data, &UmapParams { n_neighbors: 5, n_components: 3, ..UmapParams::default() });
        assert_eq!(out.len(), 20);
        assert!(out.iter().all(|r| r.len() == 3 && r.iter().all(|x| x.is_finite())));
    }

    #[test]
    fn reduce_is_deterministic() {
        let data = two_blobs(10);
        let p = UmapParams { n_neighbors: 5, ..UmapParams::default() };
        assert_eq!(reduce(&data, &p), reduce(&data, &p));
    }

    #[test]
    fn reduce_separates_blobs() {
        let data = two_blobs(20);
        let out = reduce(&data, &UmapParams { n_neighbors: 10, ..UmapParams::default() });
        let mean = |pairs: Vec<(usize, usize)>| {
            let n = pairs.len() as f64;
            pairs
                .into_iter()
                .map(|(i, j)| squared_euclidean(&out[i], &out[j]).sqrt())
                .sum::<f64>()
                / n
        };
        let intra = mean((0..20).flat_map(|i| (0..20).filter(move |&j| j != i).map(move |j| (i, j))).collect());
        let inter = mean((0..20).flat_map(|i| (20..40).map(move |j| (i, j))).collect());
        assert!(inter > intra, "inter {inter} <= intra {intra}");
    }

    #[test]
    fn reduce_tiny_inputs() {
        let p = UmapParams::default();
        assert!(reduce(&[], &p).is_empty());
        assert_eq!(reduce(&[vec![1.0, 0.0]], &p), vec![vec![0.0, 0.0]]);

        let three = vec![vec![1.0, 0.0], vec![0.99, 0.14], vec![-1.0, 0.0]];
        let out = reduce(&three, &p);
        assert_eq!(out.len(), 3);
        assert!(out.iter().flatten().all(|x| x.is_finite()));
    }

    #[test]
    fn tiny_input_keeps_nearest_pair_together() {
        let three = vec![vec![1.0, 0.0], vec![0.99, 0.14], vec![-1.0, 0.0]];
        let p = UmapParams { n_components: 1, ..UmapParams::default() };
        let out = reduce(&three, &p);
        let gap = |i: usize, j: usize| (out[i][0] - out[j][0]).abs();
        assert!(gap(0, 1) < gap(0, 2) / 10.0, "{out:?}");
        assert!(gap(0, 1) < gap(1, 2) / 10.0, "{out:?}");
        assert_eq!(out, reduce(&three, &p));

        let max = out.iter().flatten().fold(0.0_f32, |m, x| m.max(x.abs()));
        assert!((max - 10.0).abs() < 1e-4);
    }

    #[test]
    fn tiny_input_extra_axes_are_zero() {
        // Three points span at most two axes.
        let three = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]];
        let out = reduce(&three, &UmapParams { n_components: 4, ..UmapParams::default() });
        assert!(out.iter().all(|r| r.len() == 4 && r[3].abs() < 1e-3));
        assert!(out.iter().flatten().all(|x| x.is_finite()));
    }
}
