//! Distance metric providers: pairwise dissimilarity between poster IDs.
//!
//! Two interchangeable strategies produce a [`DistanceMatrix`]:
//!
//! - [`uniform_distance`] — placeholder signal: 0 on the diagonal, 1.0
//!   everywhere else. Stands in until a richer similarity source exists.
//! - [`jaccard_distance`] — the real metric, over each poster's set of
//!   thread keys: `1 - |∩| / |∪|`.
//!
//! Both are pure, deterministic, and never fail; degenerate inputs yield an
//! empty matrix.

use crate::ident::PosterId;
use crate::keyset::KeysetMap;

/// Off-diagonal value of the placeholder uniform metric.
const UNIFORM_OFF_DIAGONAL: f64 = 1.0;

/// Square, symmetric, non-negative pairwise distance matrix.
///
/// Indexed by the position of each poster in the list handed to the metric
/// provider; callers retain that ordering to interpret rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    cells: Vec<f64>,
}

impl DistanceMatrix {
    /// Create an `n x n` matrix of zeros.
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            cells: vec![0.0; n * n],
        }
    }

    /// Number of rows (and columns).
    pub fn len(&self) -> usize {
        self.n
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between points `i` and `j`.
    ///
    /// # Panics
    /// Panics if `i` or `j` is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n && j < self.n, "matrix index out of bounds");
        self.cells[i * self.n + j]
    }

    /// Write `value` to both `(i, j)` and `(j, i)`, keeping the matrix
    /// symmetric by construction.
    pub fn set_symmetric(&mut self, i: usize, j: usize, value: f64) {
        assert!(i < self.n && j < self.n, "matrix index out of bounds");
        self.cells[i * self.n + j] = value;
        self.cells[j * self.n + i] = value;
    }

    /// Copy out as nested rows, for serialization and display.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.n)
            .map(|i| self.cells[i * self.n..(i + 1) * self.n].to_vec())
            .collect()
    }
}

/// Placeholder metric: zero diagonal, constant off-diagonal.
///
/// Kept pluggable so a future similarity signal can replace it without
/// touching callers. An empty ID list yields an empty matrix.
pub fn uniform_distance(ids: &[PosterId]) -> DistanceMatrix {
    let n = ids.len();
    let mut matrix = DistanceMatrix::zeros(n);
    for i in 0..n {
        for j in (i + 1)..n {
            matrix.set_symmetric(i, j, UNIFORM_OFF_DIAGONAL);
        }
    }
    matrix
}

/// Jaccard distance over posting-history key sets.
///
/// The matrix is indexed by the map's insertion order. Two posters with no
/// recorded threads at all are incomparable, not identical: their distance
/// is reported as the maximum 1.0. That policy is deliberate — absence of
/// evidence must not read as a perfect match.
pub fn jaccard_distance(keysets: &KeysetMap) -> DistanceMatrix {
    let n = keysets.len();
    let entries: Vec<_> = keysets.iter().collect();
    let mut matrix = DistanceMatrix::zeros(n);

    for i in 0..n {
        for j in (i + 1)..n {
            let (_, keys_i) = entries[i];
            let (_, keys_j) = entries[j];

            let common = keys_i.intersection(keys_j).count();
            let union = keys_i.union(keys_j).count();

            let distance = if union == 0 {
                1.0
            } else {
                1.0 - common as f64 / union as f64
            };
            matrix.set_symmetric(i, j, distance);
        }
    }
    matrix
}
