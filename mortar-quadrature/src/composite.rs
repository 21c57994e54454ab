//! Composite Gauss rules.
//!
//! Rational basis functions are not polynomials, so element integrals over NURBS elements are
//! computed with Gauss rules repeated over several sub-intervals.

use crate::tensor::tensor_product;
use crate::univariate::gauss;
use crate::Rule;

/// Gauss rule with `num_points` points repeated on `num_subintervals` equal sub-intervals of
/// `[-1, 1]`.
///
/// # Panics
///
/// Panics if either argument is zero.
pub fn composite_gauss(num_points: usize, num_subintervals: usize) -> Rule<1> {
    assert!(num_subintervals > 0, "number of sub-intervals must be positive");
    let (weights1d, points1d) = gauss(num_points);
    let h = 2.0 / num_subintervals as f64;

    let mut weights = Vec::with_capacity(num_points * num_subintervals);
    let mut points = Vec::with_capacity(num_points * num_subintervals);
    for k in 0..num_subintervals {
        let a = -1.0 + k as f64 * h;
        for (&w, &[x]) in weights1d.iter().zip(&points1d) {
            weights.push(w * h / 2.0);
            points.push([a + (x + 1.0) * h / 2.0]);
        }
    }
    (weights, points)
}

/// Tensor product of [`composite_gauss`] rules on the reference square.
pub fn quadrilateral_composite_gauss(num_points: usize, num_subintervals: usize) -> Rule<2> {
    tensor_product(&composite_gauss(num_points, num_subintervals))
}
