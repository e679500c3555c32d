//! Hungarian (Kuhn-Munkres) solver for the courier-bundle assignment.
//!
//! Maximizes the total score over all selected pairs, which is the min-cost
//! matching over `cost = -score`. Rectangular matrices are handled by running
//! the algorithm over the smaller side; infeasible pairs carry a sentinel
//! weight that can never win a feasible alternative.

use pathfinding::kuhn_munkres::{kuhn_munkres, Weights};

use super::algorithm::{AssignmentPair, AssignmentSolver};

/// Scale factor to convert f64 scores to i64 for the assignment algorithm.
const SCALE: f64 = 1_000_000.0;

/// Weight for infeasible pairs (never selected).
/// Must be worse than any feasible score but not so extreme that negating and
/// summing (e.g. in pathfinding's internal use of neg()) overflows i64.
const INFEASIBLE: i64 = -1_000_000_000_000_i64;

/// Simple matrix type implementing pathfinding's Weights for i64.
struct I64Weights(Vec<Vec<i64>>);

impl Weights<i64> for I64Weights {
    fn rows(&self) -> usize {
        self.0.len()
    }

    fn columns(&self) -> usize {
        self.0.first().map_or(0, |r| r.len())
    }

    fn at(&self, row: usize, col: usize) -> i64 {
        self.0[row][col]
    }

    fn neg(&self) -> Self {
        I64Weights(
            self.0
                .iter()
                .map(|r| r.iter().map(|&x| x.saturating_neg()).collect())
                .collect(),
        )
    }
}

/// Deterministic global assignment via maximum-weight bipartite matching.
#[derive(Debug, Default)]
pub struct HungarianSolver;

impl HungarianSolver {
    /// Convert an f64 score to an i64 weight (scale and clamp).
    fn score_to_weight(score: f64) -> i64 {
        if score == f64::NEG_INFINITY {
            return INFEASIBLE;
        }
        let w = score * SCALE;
        if w >= i64::MAX as f64 {
            i64::MAX
        } else if w <= INFEASIBLE as f64 {
            INFEASIBLE
        } else {
            w as i64
        }
    }
}

impl AssignmentSolver for HungarianSolver {
    fn solve(&self, scores: &[Vec<f64>]) -> Vec<AssignmentPair> {
        let n_rows = scores.len();
        let n_cols = scores.first().map_or(0, |r| r.len());
        if n_rows == 0 || n_cols == 0 {
            return Vec::new();
        }

        // Kuhn-Munkres requires rows <= columns, so run over the smaller set.
        let transposed = n_rows > n_cols;
        let (rows, cols) = if transposed {
            (n_cols, n_rows)
        } else {
            (n_rows, n_cols)
        };

        let mut matrix = vec![vec![INFEASIBLE; cols]; rows];
        for (i, row) in scores.iter().enumerate() {
            for (j, &score) in row.iter().enumerate() {
                let weight = Self::score_to_weight(score);
                if transposed {
                    matrix[j][i] = weight;
                } else {
                    matrix[i][j] = weight;
                }
            }
        }

        let weights = I64Weights(matrix);

        // Only run if at least one feasible pair exists (avoid an all-sentinel solve).
        let has_feasible = (0..weights.rows())
            .any(|r| (0..weights.columns()).any(|c| weights.at(r, c) > INFEASIBLE));
        if !has_feasible {
            return Vec::new();
        }

        let (_total, assignments) = kuhn_munkres(&weights);

        let mut results = Vec::new();
        for (i, &j) in assignments.iter().enumerate() {
            if weights.at(i, j) <= INFEASIBLE {
                continue;
            }
            let pair = if transposed {
                AssignmentPair { row: j, col: i }
            } else {
                AssignmentPair { row: i, col: j }
            };
            results.push(pair);
        }
        results.sort_by_key(|p| (p.row, p.col));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INF: f64 = f64::NEG_INFINITY;

    #[test]
    fn picks_the_globally_best_assignment() {
        // Greedy would give row 0 its best column (0), forcing row 1 into a
        // poor cell; the global optimum swaps them.
        let scores = vec![vec![10.0, 9.0], vec![10.0, 1.0]];
        let solver = HungarianSolver;
        let pairs = solver.solve(&scores);
        assert_eq!(
            pairs,
            vec![
                AssignmentPair { row: 0, col: 1 },
                AssignmentPair { row: 1, col: 0 },
            ]
        );
    }

    #[test]
    fn never_selects_infeasible_cells() {
        let scores = vec![vec![INF, 5.0], vec![INF, 3.0]];
        let solver = HungarianSolver;
        let pairs = solver.solve(&scores);
        // Only one column is feasible, so only one row can be matched.
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].col, 1);
    }

    #[test]
    fn all_infeasible_matrix_yields_no_pairs() {
        let scores = vec![vec![INF, INF], vec![INF, INF]];
        assert!(HungarianSolver.solve(&scores).is_empty());
    }

    #[test]
    fn handles_rectangular_matrices_both_ways() {
        let solver = HungarianSolver;

        // More couriers than bundles: one courier stays unmatched.
        let tall = vec![vec![1.0], vec![5.0], vec![3.0]];
        let pairs = solver.solve(&tall);
        assert_eq!(pairs, vec![AssignmentPair { row: 1, col: 0 }]);

        // More bundles than couriers: one bundle stays unmatched.
        let wide = vec![vec![1.0, 5.0, 3.0]];
        let pairs = solver.solve(&wide);
        assert_eq!(pairs, vec![AssignmentPair { row: 0, col: 1 }]);
    }

    #[test]
    fn empty_matrix_yields_no_pairs() {
        assert!(HungarianSolver.solve(&[]).is_empty());
        assert!(HungarianSolver.solve(&[Vec::new()]).is_empty());
    }
}
