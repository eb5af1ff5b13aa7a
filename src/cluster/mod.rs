//! Clustering engine: turns a distance matrix into groups of poster IDs.
//!
//! Two interchangeable strategies share one formatting pass:
//!
//! - [`perform_hac`] (`hierarchy`): Ward-linkage agglomerative clustering,
//!   cut to a fixed number of top-level clusters.
//! - [`perform_dbscan`] (`density`): density-based clustering tuned for
//!   Jaccard distances in `[0, 1]`.
//!
//! Tuning values are clustering policy owned by this module, not by callers.
//! Both strategies are deterministic for fixed inputs and never propagate an
//! error: internal failures degrade to an empty grouping.

use serde::Serialize;

use crate::error::ClusterError;
use crate::ident::PosterId;

pub mod density;
pub mod hierarchy;

pub use density::perform_dbscan;
pub use hierarchy::perform_hac;

/// Label marking a point no cluster claimed.
pub const NOISE: i32 = -1;

/// Number of top-level clusters the hierarchical cut produces.
pub(crate) const HAC_CUT: usize = 3;

/// DBSCAN neighborhood radius, tuned for Jaccard distances in `[0, 1]`.
pub(crate) const DBSCAN_EPSILON: f64 = 0.21;

/// Minimum neighborhood size (the point itself included) for a core point.
pub(crate) const DBSCAN_MIN_POINTS: usize = 2;

/// Final result of a clustering strategy: an ordered list of non-empty
/// ID groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Grouping {
    /// Groups in first-seen label order; members in input order.
    pub groups: Vec<Vec<PosterId>>,
}

impl Grouping {
    /// The empty grouping.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of IDs across all groups.
    pub fn member_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }
}

/// What to do with noise-labeled points when forming groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoisePolicy {
    /// Leave noise points out of the grouping entirely.
    Drop,
    /// Collect noise points into one trailing group.
    Trailing,
}

/// Group IDs by cluster label.
///
/// Groups appear in first-seen label order; within a group, IDs keep input
/// order. An ID with a non-negative label is never dropped. Label `-1` is
/// handled per `policy`.
pub(crate) fn format_clusters(
    ids: &[PosterId],
    labels: &[i32],
    policy: NoisePolicy,
) -> Result<Grouping, ClusterError> {
    if ids.len() != labels.len() {
        return Err(ClusterError::LabelMismatch {
            ids: ids.len(),
            labels: labels.len(),
        });
    }

    let mut groups: Vec<(i32, Vec<PosterId>)> = Vec::new();
    let mut noise: Vec<PosterId> = Vec::new();

    for (id, &label) in ids.iter().zip(labels) {
        if label == NOISE {
            noise.push(id.clone());
            continue;
        }
        match groups.iter_mut().find(|(l, _)| *l == label) {
            Some((_, members)) => members.push(id.clone()),
            None => groups.push((label, vec![id.clone()])),
        }
    }

    let mut groups: Vec<Vec<PosterId>> = groups.into_iter().map(|(_, members)| members).collect();
    if policy == NoisePolicy::Trailing && !noise.is_empty() {
        groups.push(noise);
    }
    Ok(Grouping { groups })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<PosterId> {
        names.iter().map(|n| PosterId::new(*n)).collect()
    }

    fn names(group: &[PosterId]) -> Vec<&str> {
        group.iter().map(PosterId::as_str).collect()
    }

    #[test]
    fn groups_follow_first_seen_label_order() {
        let ids = ids(&["a", "b", "c", "d"]);
        let grouping = format_clusters(&ids, &[2, 0, 2, 1], NoisePolicy::Drop).unwrap();

        assert_eq!(grouping.len(), 3);
        assert_eq!(names(&grouping.groups[0]), vec!["a", "c"]);
        assert_eq!(names(&grouping.groups[1]), vec!["b"]);
        assert_eq!(names(&grouping.groups[2]), vec!["d"]);
    }

    #[test]
    fn drop_policy_omits_noise() {
        let ids = ids(&["a", "b", "c"]);
        let grouping = format_clusters(&ids, &[0, NOISE, 0], NoisePolicy::Drop).unwrap();

        assert_eq!(grouping.len(), 1);
        assert_eq!(grouping.member_count(), 2);
    }

    #[test]
    fn trailing_policy_appends_noise_group() {
        let ids = ids(&["a", "b", "c"]);
        let grouping = format_clusters(&ids, &[0, NOISE, NOISE], NoisePolicy::Trailing).unwrap();

        assert_eq!(grouping.len(), 2);
        assert_eq!(names(&grouping.groups[1]), vec!["b", "c"]);
    }

    #[test]
    fn never_drops_a_labeled_id() {
        let ids = ids(&["a", "b", "c", "d", "e"]);
        let labels = [0, 1, NOISE, 1, 0];
        let grouping = format_clusters(&ids, &labels, NoisePolicy::Drop).unwrap();

        let labeled = labels.iter().filter(|&&l| l >= 0).count();
        assert_eq!(grouping.member_count(), labeled);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let ids = ids(&["a", "b"]);
        let result = format_clusters(&ids, &[0], NoisePolicy::Drop);
        assert!(matches!(result, Err(ClusterError::LabelMismatch { .. })));
    }
}
