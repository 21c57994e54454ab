//! Quadrature rules for the reference square `[-1, 1]^2` formed as tensor products of 1D rules.

use crate::univariate::gauss;
use crate::Rule;

/// A Gauss quadrature rule for the reference quadrilateral.
///
/// The rule is constructed as a tensor product from 1D rules, with the provided number of
/// points per dimension.
pub fn quadrilateral_gauss(num_points_per_dim: usize) -> Rule<2> {
    tensor_product(&gauss(num_points_per_dim))
}

/// Tensor product of a 1D rule with itself.
///
/// The first coordinate varies slowest.
pub fn tensor_product(rule: &Rule<1>) -> Rule<2> {
    let (weights1d, points1d) = rule;
    let n = weights1d.len();
    let mut weights2d = Vec::with_capacity(n * n);
    let mut points2d = Vec::with_capacity(n * n);

    let rule1d_iter = || weights1d.iter().zip(points1d);

    for (&wx, &[x]) in rule1d_iter() {
        for (&wy, &[y]) in rule1d_iter() {
            weights2d.push(wx * wy);
            points2d.push([x, y]);
        }
    }

    (weights2d, points2d)
}
