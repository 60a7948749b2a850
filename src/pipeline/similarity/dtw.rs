use serde::{Deserialize, Serialize};

use crate::error::SeriesError;
use crate::pipeline::types::AlignmentResult;

/// Knobs for the alignment. The default is the unconstrained classical recurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtwOptions {
    /// Sakoe-Chiba band half-width: cells with `|i - j| > window` are never visited.
    /// Widened to at least `|m - n|` so the final cell stays reachable.
    pub window: Option<usize>,
}

impl DtwOptions {
    pub fn with_window(window: usize) -> Self {
        Self {
            window: Some(window),
        }
    }
}

pub fn dtw(a: &[f64], b: &[f64]) -> Result<AlignmentResult, SeriesError> {
    dtw_with(a, b, &DtwOptions::default())
}

/// Dynamic time warping with absolute-difference local cost.
///
/// `cost(i, j) = |a[i] - b[j]| + min(cost(i-1, j), cost(i, j-1), cost(i-1, j-1))`, cells
/// outside the grid (or the band) counting as infinite. The warping path is recovered by
/// walking back from `(m-1, n-1)` through the cheapest predecessor, preferring the
/// diagonal, then `(i-1, j)`, then `(i, j-1)` on ties.
pub fn dtw_with(
    a: &[f64],
    b: &[f64],
    options: &DtwOptions,
) -> Result<AlignmentResult, SeriesError> {
    for series in [a, b] {
        if series.len() < 2 {
            return Err(SeriesError::InsufficientSequenceLength {
                required: 2,
                actual: series.len(),
            });
        }
    }

    let grid = CostGrid::fill(a, b, options);
    let path = grid.backtrack();
    let total_cost = grid.at(a.len() - 1, b.len() - 1);
    Ok(AlignmentResult {
        total_cost,
        similarity_score: total_cost / path.len() as f64,
        path,
    })
}

struct CostGrid {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
}

impl CostGrid {
    fn fill(a: &[f64], b: &[f64], options: &DtwOptions) -> Self {
        let (rows, cols) = (a.len(), b.len());
        let window = options.window.map(|w| w.max(rows.abs_diff(cols)));
        let mut grid = Self {
            rows,
            cols,
            cells: vec![f64::INFINITY; rows * cols],
        };

        for i in 0..rows {
            for j in 0..cols {
                if window.is_some_and(|w| i.abs_diff(j) > w) {
                    continue;
                }
                let previous = if i == 0 && j == 0 {
                    0.0
                } else {
                    grid.get(i.checked_sub(1), Some(j))
                        .min(grid.get(Some(i), j.checked_sub(1)))
                        .min(grid.get(i.checked_sub(1), j.checked_sub(1)))
                };
                grid.cells[i * cols + j] = (a[i] - b[j]).abs() + previous;
            }
        }
        grid
    }

    fn at(&self, i: usize, j: usize) -> f64 {
        self.cells[i * self.cols + j]
    }

    fn get(&self, i: Option<usize>, j: Option<usize>) -> f64 {
        match (i, j) {
            (Some(i), Some(j)) => self.at(i, j),
            _ => f64::INFINITY,
        }
    }

    fn backtrack(&self) -> Vec<(usize, usize)> {
        let (mut i, mut j) = (self.rows - 1, self.cols - 1);
        let mut path = vec![(i, j)];
        while (i, j) != (0, 0) {
            let candidates = [
                (i.checked_sub(1), j.checked_sub(1)),
                (i.checked_sub(1), Some(j)),
                (Some(i), j.checked_sub(1)),
            ];
            let mut best: Option<(usize, usize, f64)> = None;
            for (ci, cj) in candidates {
                if let (Some(ci), Some(cj)) = (ci, cj) {
                    let cost = self.at(ci, cj);
                    if best.map_or(true, |(_, _, c)| cost < c) {
                        best = Some((ci, cj, cost));
                    }
                }
            }
            // (i, j) != (0, 0) so at least one predecessor exists.
            if let Some((ci, cj, _)) = best {
                i = ci;
                j = cj;
            }
            path.push((i, j));
        }
        path.reverse();
        path
    }
}
