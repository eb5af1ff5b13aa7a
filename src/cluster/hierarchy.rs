//! Hierarchical agglomerative clustering with Ward linkage.
//!
//! Works directly on a supplied distance matrix — distances are never
//! re-derived from coordinates. The hierarchy is an arena-indexed binary
//! tree ([`Dendrogram`]); merging uses the Lance-Williams update for Ward
//! linkage, and the fixed cut repeatedly splits the tallest subtree until
//! the configured number of top-level clusters remains.
//!
//! Ties (equal merge distances, equal split heights) break toward the lowest
//! index, so results are fully deterministic.

use std::collections::HashMap;

use crate::distance::DistanceMatrix;
use crate::error::ClusterError;
use crate::ident::PosterId;

use super::{format_clusters, Grouping, NoisePolicy, HAC_CUT, NOISE};

/// One node in the dendrogram arena.
#[derive(Debug, Clone)]
enum Node {
    /// Original point, holding its index in the input list.
    Leaf { point: usize },
    /// Merge of two subtrees at a given linkage height.
    Merge {
        left: usize,
        right: usize,
        height: f64,
        size: usize,
    },
}

/// Arena-indexed merge tree over the original points.
#[derive(Debug, Clone)]
pub(crate) struct Dendrogram {
    nodes: Vec<Node>,
    root: usize,
}

impl Dendrogram {
    /// Collect the original point indices under `node`, left to right.
    fn leaf_points(&self, node: usize) -> Vec<usize> {
        let mut points = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            match self.nodes[current] {
                Node::Leaf { point } => points.push(point),
                Node::Merge { left, right, .. } => {
                    // Right first so the left subtree is visited first.
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        points
    }

    /// Split into at most `count` top-level subtrees by repeatedly breaking
    /// open the merge with the greatest height.
    fn cut(&self, count: usize) -> Vec<usize> {
        let mut roots = vec![self.root];
        while roots.len() < count {
            let tallest = roots
                .iter()
                .enumerate()
                .filter_map(|(pos, &node)| match self.nodes[node] {
                    Node::Merge { height, .. } => Some((pos, height)),
                    Node::Leaf { .. } => None,
                })
                .max_by(|(pos_a, h_a), (pos_b, h_b)| {
                    h_a.partial_cmp(h_b)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(pos_b.cmp(pos_a))
                });
            let Some((pos, _)) = tallest else {
                // Only leaves remain; the input had fewer points than `count`.
                break;
            };
            let Node::Merge { left, right, .. } = self.nodes[roots[pos]] else {
                unreachable!("cut only selects merge nodes");
            };
            roots[pos] = left;
            roots.insert(pos + 1, right);
        }
        roots
    }
}

/// Build the Ward-linkage dendrogram for `n` points (`n >= 1`).
///
/// This is the single seam between the rest of the engine and the concrete
/// hierarchy algorithm.
pub(crate) fn build_dendrogram(
    n: usize,
    matrix: &DistanceMatrix,
) -> Result<Dendrogram, ClusterError> {
    if matrix.len() != n {
        return Err(ClusterError::ShapeMismatch {
            expected: n,
            actual: matrix.len(),
        });
    }

    let mut nodes: Vec<Node> = (0..n).map(|point| Node::Leaf { point }).collect();
    let mut active: Vec<usize> = (0..n).collect();
    let mut dist: HashMap<(usize, usize), f64> = HashMap::new();
    for i in 0..n {
        for j in (i + 1)..n {
            dist.insert((i, j), matrix.get(i, j));
        }
    }

    let pair_key = |a: usize, b: usize| if a < b { (a, b) } else { (b, a) };

    while active.len() > 1 {
        // Lowest-index pair wins ties: strict less-than over in-order pairs.
        let mut a = active[0];
        let mut b = active[1];
        let mut height = dist[&pair_key(a, b)];
        for (ci, &c) in active.iter().enumerate() {
            for &d in &active[ci + 1..] {
                let cd = dist[&pair_key(c, d)];
                if cd < height {
                    a = c;
                    b = d;
                    height = cd;
                }
            }
        }

        let merged = nodes.len();
        let size_a = size_of(&nodes, a);
        let size_b = size_of(&nodes, b);
        nodes.push(Node::Merge {
            left: a,
            right: b,
            height,
            size: size_a + size_b,
        });

        // Lance-Williams update for Ward linkage.
        for &k in &active {
            if k == a || k == b {
                continue;
            }
            let size_k = size_of(&nodes, k);
            let d_ak = dist[&pair_key(a, k)];
            let d_bk = dist[&pair_key(b, k)];
            let total = (size_a + size_b + size_k) as f64;
            let merged_sq = ((size_a + size_k) as f64 * d_ak * d_ak
                + (size_b + size_k) as f64 * d_bk * d_bk
                - size_k as f64 * height * height)
                / total;
            dist.insert(pair_key(merged, k), merged_sq.max(0.0).sqrt());
        }

        active.retain(|&node| node != a && node != b);
        active.push(merged);
    }

    let root = active[0];
    Ok(Dendrogram { nodes, root })
}

fn size_of(nodes: &[Node], node: usize) -> usize {
    match nodes[node] {
        Node::Leaf { .. } => 1,
        Node::Merge { size, .. } => size,
    }
}

/// Assign a cluster label to every point by cutting the dendrogram.
fn hac_labels(n: usize, matrix: &DistanceMatrix) -> Result<Vec<i32>, ClusterError> {
    let tree = build_dendrogram(n, matrix)?;
    let mut labels = vec![NOISE; n];
    for (cluster, root) in tree.cut(HAC_CUT).into_iter().enumerate() {
        for point in tree.leaf_points(root) {
            labels[point] = cluster as i32;
        }
    }
    Ok(labels)
}

/// Hierarchical agglomerative clustering over a precomputed distance matrix.
///
/// Cuts the Ward-linkage hierarchy into a fixed number of top-level clusters
/// (fewer only when there are fewer points). Empty input yields an empty
/// grouping; any internal failure is caught here and likewise degrades to an
/// empty grouping rather than propagating.
pub fn perform_hac(ids: &[PosterId], matrix: &DistanceMatrix) -> Grouping {
    if ids.is_empty() {
        return Grouping::empty();
    }

    let labels = match hac_labels(ids.len(), matrix) {
        Ok(labels) => labels,
        Err(err) => {
            tracing::warn!(error = %err, "hierarchical clustering failed, returning empty grouping");
            return Grouping::empty();
        }
    };

    // A complete cut labels every leaf, so no noise survives to drop.
    match format_clusters(ids, &labels, NoisePolicy::Drop) {
        Ok(grouping) => grouping,
        Err(err) => {
            tracing::warn!(error = %err, "cluster formatting failed, returning empty grouping");
            Grouping::empty()
        }
    }
}
