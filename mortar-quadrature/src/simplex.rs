//! Rules for the unit triangle obtained by collapsing the reference square.

use crate::univariate::gauss;
use crate::Rule;

/// Collapsed (Duffy) Gauss rule for the unit triangle `{(0, 0), (1, 0), (0, 1)}`.
///
/// The square `[-1, 1]^2` is mapped onto the triangle by
/// `x = (1 + u)(1 - v) / 4`, `y = (1 + v) / 2`, whose Jacobian determinant is `(1 - v) / 8`.
/// With `n` points per direction, polynomials of total degree `2n - 2` are integrated exactly.
/// The weights sum to the triangle area `1/2`.
pub fn triangle_collapsed_gauss(num_points_per_dim: usize) -> Rule<2> {
    let (weights1d, points1d) = gauss(num_points_per_dim);
    let n = weights1d.len();
    let mut weights = Vec::with_capacity(n * n);
    let mut points = Vec::with_capacity(n * n);

    for (&wv, &[v]) in weights1d.iter().zip(&points1d) {
        for (&wu, &[u]) in weights1d.iter().zip(&points1d) {
            let x = (1.0 + u) * (1.0 - v) / 4.0;
            let y = (1.0 + v) / 2.0;
            weights.push(wu * wv * (1.0 - v) / 8.0);
            points.push([x, y]);
        }
    }

    (weights, points)
}
