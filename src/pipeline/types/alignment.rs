use serde::{Deserialize, Serialize};

/// Outcome of one DTW comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    pub total_cost: f64,
    /// `total_cost / path.len()`, lower is more similar.
    pub similarity_score: f64,
    /// Index pairs from `(0, 0)` to `(m - 1, n - 1)`.
    pub path: Vec<(usize, usize)>,
}
