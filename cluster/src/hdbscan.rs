//! HDBSCAN density clustering under Euclidean distance.
//!
//! Steps, all dense and single-threaded:
//!
//! ```text
//! core distances -> mutual-reachability MST (Prim) -> single linkage
//!   -> condensed tree (min_cluster_size) -> excess-of-mass selection
//! ```
//!
//! Condensed-tree cluster ids start at `n` (the root); points keep their
//! row index. Selected clusters are numbered densely in id order.

use std::collections::VecDeque;

use tracing::debug;

use crate::distance::euclidean;
use crate::NOISE;

/// Distance floor used when converting merge distances to lambdas.
const MIN_DISTANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct HdbscanParams {
    pub min_cluster_size: usize,
    pub min_samples: usize,
    /// Lets excess-of-mass pick the root itself.
    pub allow_single_cluster: bool,
    /// Selects the root when excess-of-mass selects nothing.
    pub single_cluster_fallback: bool,
}

impl Default for HdbscanParams {
    fn default() -> Self {
        Self {
            min_cluster_size: 10,
            min_samples: 1,
            allow_single_cluster: false,
            single_cluster_fallback: true,
        }
    }
}

/// One edge of the condensed tree. `child < n` is a point falling out of
/// `parent`; otherwise `child` is a cluster split off at `lambda`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CondensedEdge {
    pub parent: usize,
    pub child: usize,
    pub lambda: f64,
    pub size: usize,
}

#[derive(Debug, Clone, Copy)]
struct Merge {
    left: usize,
    right: usize,
    dist: f64,
    size: usize,
}

/// A fitted HDBSCAN model, kept for out-of-sample prediction.
#[derive(Debug, Clone)]
pub struct Hdbscan {
    params: HdbscanParams,
    points: Vec<Vec<f32>>,
    core: Vec<f64>,
    tree: Vec<CondensedEdge>,
    point_parent: Vec<usize>,
    point_lambda: Vec<f64>,
    // Indexed by `cluster - n`.
    cluster_parent: Vec<usize>,
    cluster_birth: Vec<f64>,
    selected: Vec<bool>,
    cluster_label: Vec<i32>,
    labels: Vec<i32>,
    num_clusters: usize,
}

impl Hdbscan {
    /// Clusters `points`, which must share one dimension.
    pub fn fit(points: Vec<Vec<f32>>, params: HdbscanParams) -> Self {
        let n = points.len();
        let mcs = params.min_cluster_size.max(2);
        let mut model = Self {
            params,
            points,
            core: Vec::new(),
            tree: Vec::new(),
            point_parent: vec![n; n],
            point_lambda: vec![0.0; n],
            cluster_parent: vec![n],
            cluster_birth: vec![0.0],
            selected: vec![false],
            cluster_label: vec![NOISE],
            labels: vec![NOISE; n],
            num_clusters: 0,
        };
        match n {
            0 => return model,
            1 => {
                model.core = vec![0.0];
                model.point_lambda = vec![f64::INFINITY];
                model.tree.push(CondensedEdge {
                    parent: 1,
                    child: 0,
                    lambda: f64::INFINITY,
                    size: 1,
                });
                model.selected = vec![true];
                model.cluster_label = vec![0];
                model.labels = vec![0];
                model.num_clusters = 1;
                return model;
            }
            _ => {}
        }

        model.core = core_distances(&model.points, model.params.min_samples);
        let mst = prim_mst(&model.points, &model.core);
        let merges = single_linkage(n, mst);
        model.tree = condense(n, &merges, mcs);
        model.index_tree();
        model.select_clusters();
        model.assign_labels();

        debug!(
            n,
            clusters = model.num_clusters,
            noise = model.labels.iter().filter(|&&l| l == NOISE).count(),
            "hdbscan fit"
        );
        model
    }

    /// Labels for the training points, `NOISE` for outliers.
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    pub fn condensed_tree(&self) -> &[CondensedEdge] {
        &self.tree
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Predicts a label for a new point.
    pub fn approximate_predict(&self, point: &[f32]) -> i32 {
        self.predict(point, None)
    }

    /// Predicts a label for training point `self_idx` as if it were new,
    /// leaving it out of its own neighborhood.
    pub fn approximate_predict_excluding(&self, point: &[f32], self_idx: usize) -> i32 {
        self.predict(point, Some(self_idx))
    }

    fn root(&self) -> usize {
        self.points.len()
    }

    fn index_tree(&mut self) {
        let n = self.root();
        let clusters = 1 + self
            .tree
            .iter()
            .filter(|e| e.child >= n)
            .map(|e| e.child - n)
            .max()
            .unwrap_or(0);
        self.cluster_parent = vec![n; clusters];
        self.cluster_birth = vec![0.0; clusters];
        for e in &self.tree {
            if e.child < n {
                self.point_parent[e.child] = e.parent;
                self.point_lambda[e.child] = e.lambda;
            } else {
                self.cluster_parent[e.child - n] = e.parent;
                self.cluster_birth[e.child - n] = e.lambda;
            }
        }
    }

    /// Excess-of-mass selection over clusters in descending id order.
    fn select_clusters(&mut self) {
        let n = self.root();
        let total = self.cluster_parent.len();

        let mut stability = vec![0.0_f64; total];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); total];
        for e in &self.tree {
            let p = e.parent - n;
            stability[p] += (e.lambda - self.cluster_birth[p]) * e.size as f64;
            if e.child >= n {
                children[p].push(e.child - n);
            }
        }

        let mut selected = vec![false; total];
        let lowest = if self.params.allow_single_cluster { 0 } else { 1 };
        for c in (lowest..total).rev() {
            let subtree: f64 = children[c].iter().map(|&ch| stability[ch]).sum();
            if subtree > stability[c] {
                stability[c] = subtree;
            } else {
                selected[c] = true;
                let mut stack = children[c].clone();
                while let Some(d) = stack.pop() {
                    selected[d] = false;
                    stack.extend_from_slice(&children[d]);
                }
            }
        }

        if !selected.iter().any(|&s| s) && self.params.single_cluster_fallback {
            debug!(n, "no cluster selected, falling back to the root");
            selected[0] = true;
        }

        let mut next = 0;
        self.cluster_label = selected
            .iter()
            .map(|&s| {
                if s {
                    next += 1;
                    next - 1
                } else {
                    NOISE
                }
            })
            .collect();
        self.num_clusters = next as usize;
        self.selected = selected;
    }

    fn assign_labels(&mut self) {
        let n = self.root();
        let root_max = self
            .tree
            .iter()
            .filter(|e| e.parent == n)
            .map(|e| e.lambda)
            .fold(0.0_f64, f64::max);

        for p in 0..n {
            let Some(c) = self.selected_ancestor(self.point_parent[p]) else {
                continue;
            };
            if c == n && self.point_lambda[p] < root_max {
                continue;
            }
            self.labels[p] = self.cluster_label[c - n];
        }
    }

    /// Nearest selected cluster at or above `c`.
    fn selected_ancestor(&self, mut c: usize) -> Option<usize> {
        let root = self.root();
        loop {
            if self.selected[c - root] {
                return Some(c);
            }
            if c == root {
                return None;
            }
            c = self.cluster_parent[c - root];
        }
    }

    fn predict(&self, point: &[f32], exclude: Option<usize>) -> i32 {
        let n = self.root();
        if n == 0 || point.len() != self.points[0].len() {
            return NOISE;
        }

        let ms = self.params.min_samples.max(1);
        let mut neighbors: Vec<(f64, usize)> = self
            .points
            .iter()
            .enumerate()
            .filter(|&(j, _)| Some(j) != exclude)
            .map(|(j, p)| (euclidean(point, p), j))
            .collect();
        if neighbors.is_empty() {
            return NOISE;
        }
        let by_dist = |x: &(f64, usize), y: &(f64, usize)| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1));
        let k = (2 * ms).min(neighbors.len());
        if neighbors.len() > k {
            neighbors.select_nth_unstable_by(k, by_dist);
            neighbors.truncate(k);
        }
        neighbors.sort_by(by_dist);

        let core = neighbors[ms.min(k) - 1].0;
        let (mut nearest, mut best) = (neighbors[0].1, f64::INFINITY);
        for &(d, j) in &neighbors {
            let mr = self.core[j].max(core).max(d);
            if mr < best {
                best = mr;
                nearest = j;
            }
        }
        let lambda = if best > 0.0 { 1.0 / best } else { f64::INFINITY };

        let mut c = self.point_parent[nearest];
        if self.point_lambda[nearest] > lambda {
            while c != n && self.cluster_birth[c - n] >= lambda {
                c = self.cluster_parent[c - n];
            }
        }
        match self.selected_ancestor(c) {
            Some(c) => self.cluster_label[c - n],
            None => NOISE,
        }
    }
}

/// Distance to the `min_samples`-th nearest other point.
fn core_distances(points: &[Vec<f32>], min_samples: usize) -> Vec<f64> {
    let n = points.len();
    let k = min_samples.clamp(1, n - 1);
    (0..n)
        .map(|i| {
            let mut d: Vec<f64> = (0..n)
                .filter(|&j| j != i)
                .map(|j| euclidean(&points[i], &points[j]))
                .collect();
            let (_, kth, _) = d.select_nth_unstable_by(k - 1, f64::total_cmp);
            *kth
        })
        .collect()
}

/// Dense Prim over mutual reachability `max(core_i, core_j, d_ij)`.
/// Ties pick the lowest index.
fn prim_mst(points: &[Vec<f32>], core: &[f64]) -> Vec<(usize, usize, f64)> {
    let n = points.len();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut from = vec![0usize; n];
    let mut edges = Vec::with_capacity(n - 1);

    let mut current = 0;
    in_tree[0] = true;
    for _ in 1..n {
        for j in 0..n {
            if in_tree[j] {
                continue;
            }
            let mr = core[current]
                .max(core[j])
                .max(euclidean(&points[current], &points[j]));
            if mr < best[j] {
                best[j] = mr;
                from[j] = current;
            }
        }

        let mut next = usize::MAX;
        for j in 0..n {
            if !in_tree[j] && (next == usize::MAX || best[j] < best[next]) {
                next = j;
            }
        }
        in_tree[next] = true;
        edges.push((from[next], next, best[next]));
        current = next;
    }
    edges
}

/// Builds the single-linkage dendrogram. Merge `k` creates node `n + k`.
fn single_linkage(n: usize, mut mst: Vec<(usize, usize, f64)>) -> Vec<Merge> {
    mst.sort_by(|x, y| x.2.total_cmp(&y.2));

    let mut parent: Vec<usize> = (0..n).collect();
    let mut node: Vec<usize> = (0..n).collect();
    let mut size = vec![1usize; 2 * n - 1];
    let mut merges = Vec::with_capacity(n - 1);

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    for (k, (a, b, dist)) in mst.into_iter().enumerate() {
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        let (left, right) = (node[ra], node[rb]);
        let merged = size[left] + size[right];
        merges.push(Merge {
            left,
            right,
            dist,
            size: merged,
        });
        size[n + k] = merged;
        parent[rb] = ra;
        node[ra] = n + k;
    }
    merges
}

/// Condenses the dendrogram: a split only creates two clusters when both
/// sides hold at least `mcs` points, otherwise the small side's points fall
/// out of the current cluster.
fn condense(n: usize, merges: &[Merge], mcs: usize) -> Vec<CondensedEdge> {
    let root = 2 * n - 2;
    let size = |node: usize| if node < n { 1 } else { merges[node - n].size };
    let leaves = |node: usize| -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(x) = stack.pop() {
            if x < n {
                out.push(x);
            } else {
                let m = merges[x - n];
                stack.push(m.right);
                stack.push(m.left);
            }
        }
        out
    };

    let mut relabel = vec![0usize; 2 * n - 1];
    relabel[root] = n;
    let mut next_label = n + 1;
    let mut out = Vec::with_capacity(2 * n);

    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        if node < n {
            continue;
        }
        let m = merges[node - n];
        let lambda = 1.0 / m.dist.max(MIN_DISTANCE);
        let parent = relabel[node];
        let (ls, rs) = (size(m.left), size(m.right));

        let fall_out = |sub: usize, out: &mut Vec<CondensedEdge>| {
            for p in leaves(sub) {
                out.push(CondensedEdge {
                    parent,
                    child: p,
                    lambda,
                    size: 1,
                });
            }
        };

        match (ls >= mcs, rs >= mcs) {
            (true, true) => {
                for (child, sz) in [(m.left, ls), (m.right, rs)] {
                    relabel[child] = next_label;
                    out.push(CondensedEdge {
                        parent,
                        child: next_label,
                        lambda,
                        size: sz,
                    });
                    next_label += 1;
                    queue.push_back(child);
                }
            }
            (false, false) => {
                fall_out(m.left, &mut out);
                fall_out(m.right, &mut out);
            }
            (false, true) => {
                fall_out(m.left, &mut out);
                relabel[m.right] = parent;
                queue.push_back(m.right);
            }
            (true, false) => {
                fall_out(m.right, &mut out);
                relabel[m.left] = parent;
                queue.push_back(m.left);
            }
        }
    }
    out
}
