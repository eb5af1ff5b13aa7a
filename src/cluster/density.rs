//! Density-based clustering (DBSCAN) over a precomputed distance matrix.
//!
//! Points are visited in index order and neighborhoods are expanded
//! breadth-first, so the result is deterministic for fixed inputs. A point's
//! epsilon neighborhood includes the point itself — the tuned `MIN_POINTS`
//! accounting assumes that, so two points within epsilon of each other
//! already form a cluster.

use std::collections::VecDeque;

use crate::distance::DistanceMatrix;
use crate::ident::PosterId;

use super::{format_clusters, Grouping, NoisePolicy, DBSCAN_EPSILON, DBSCAN_MIN_POINTS, NOISE};

/// Indices of every point within `epsilon` of `point`, itself included.
fn region_query(matrix: &DistanceMatrix, point: usize, epsilon: f64) -> Vec<usize> {
    (0..matrix.len())
        .filter(|&other| matrix.get(point, other) <= epsilon)
        .collect()
}

/// Assign density labels to every point; `NOISE` marks unclaimed points.
fn dbscan_labels(matrix: &DistanceMatrix, epsilon: f64, min_points: usize) -> Vec<i32> {
    let n = matrix.len();
    let mut labels = vec![NOISE; n];
    let mut visited = vec![false; n];
    let mut next_cluster = 0i32;

    for point in 0..n {
        if visited[point] {
            continue;
        }
        visited[point] = true;

        let neighbors = region_query(matrix, point, epsilon);
        if neighbors.len() < min_points {
            continue; // stays noise unless a later cluster absorbs it
        }

        labels[point] = next_cluster;
        let mut frontier: VecDeque<usize> = neighbors.into();
        while let Some(current) = frontier.pop_front() {
            if labels[current] == NOISE {
                labels[current] = next_cluster;
            }
            if visited[current] {
                continue;
            }
            visited[current] = true;
            let reachable = region_query(matrix, current, epsilon);
            if reachable.len() >= min_points {
                frontier.extend(reachable);
            }
        }
        next_cluster += 1;
    }

    labels
}

/// Density-based clustering over a precomputed distance matrix.
///
/// Runs DBSCAN with the module's tuned epsilon and minimum-points policy.
/// Empty input yields an empty grouping. Noise points are not part of the
/// returned grouping — this strategy drops them rather than folding them
/// into a trailing group.
pub fn perform_dbscan(ids: &[PosterId], matrix: &DistanceMatrix) -> Grouping {
    if ids.is_empty() {
        return Grouping::empty();
    }
    if matrix.len() != ids.len() {
        tracing::warn!(
            ids = ids.len(),
            matrix = matrix.len(),
            "distance matrix shape disagrees with identifier list, returning empty grouping"
        );
        return Grouping::empty();
    }

    let labels = dbscan_labels(matrix, DBSCAN_EPSILON, DBSCAN_MIN_POINTS);
    match format_clusters(ids, &labels, NoisePolicy::Drop) {
        Ok(grouping) => grouping,
        Err(err) => {
            tracing::warn!(error = %err, "cluster formatting failed, returning empty grouping");
            Grouping::empty()
        }
    }
}
