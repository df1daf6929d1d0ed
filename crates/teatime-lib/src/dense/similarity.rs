/*!
Cosine similarity kernels for the dense ranker.

- Row L2 norms of the embedding matrix (computed once at load time)
- Query-vs-matrix cosine scores with an epsilon-guarded denominator
- Stable descending ordering of scores
*/

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;

/// L2 norm of every row of `x` (n × d).
///
/// # Returns
///
/// An `Array1<f32>` of length `n`.
pub fn row_norms(x: &Array2<f32>) -> Array1<f32> {
    x.map_axis(Axis(1), |row| row.dot(&row).sqrt())
}

/// Cosine similarity of `query` against every row of `matrix`.
///
/// # Arguments
///
/// * `matrix` - embedding matrix (n × d)
/// * `norms` - precomputed row norms from [`row_norms`]
/// * `query` - query vector of length d
/// * `eps` - added to each norm before division
///
/// # Returns
///
/// One score per row, in row order. Zero vectors (query or row) score `0.0`.
///
/// # Panics
///
/// Panics if `query.len()` differs from the matrix width; callers check first.
pub fn cosine_scores(
    matrix: &Array2<f32>,
    norms: &Array1<f32>,
    query: ArrayView1<'_, f32>,
    eps: f32,
) -> Vec<f32> {
    let q_norm = query.dot(&query).sqrt();
    let q = query.mapv(|v| v / (q_norm + eps));

    matrix
        .axis_iter(Axis(0))
        .into_par_iter()
        .enumerate()
        .map(|(i, row)| row.dot(&q) / (norms[i] + eps))
        .collect()
}

/// Row indices ordered by descending score.
///
/// NaN scores (from corrupt rows) sort after every real score. The sort is
/// stable: equal scores keep row order.
pub fn rank_descending(scores: &[f32]) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| {
        a.1.is_nan()
            .cmp(&b.1.is_nan())
            .then_with(|| b.1.total_cmp(&a.1))
    });
    ranked
}
