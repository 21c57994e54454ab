//! Quadrature rules for the one-dimensional domain `[-1, 1]`.

use crate::{Error, Rule};
use std::f64::consts::PI;

/// Maximum number of Newton steps when refining a root of a Legendre polynomial.
const MAX_ROOT_ITERATIONS: usize = 100;

/// Evaluates the Legendre polynomial `P_n` and its derivative at `x`.
///
/// The derivative is computed from `P_n` and `P_{n-1}`, which is singular at `|x| = 1`. Only
/// call this in the open interval `(-1, 1)`.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    // m P_m(x) = (2m - 1) x P_{m-1}(x) - (m - 1) P_{m-2}(x)
    let (current, previous) = (1..=n).fold((1.0, 0.0), |(p_m1, p_m2), m| {
        let m = m as f64;
        (((2.0 * m - 1.0) * x * p_m1 - (m - 1.0) * p_m2) / m, p_m1)
    });
    let n = n as f64;
    (current, n * (x * current - previous) / (x * x - 1.0))
}

/// Refines the `i`-th largest root of `P_n` with Newton's method and returns it together with
/// `P_n'` at the root.
fn legendre_root(n: usize, i: usize) -> (f64, f64) {
    let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
    let (mut p, mut dp) = legendre(n, x);
    for _ in 0..MAX_ROOT_ITERATIONS {
        let dx = -p / dp;
        x += dx;
        (p, dp) = legendre(n, x);
        if dx.abs() <= 1e-15 {
            break;
        }
    }
    (x, dp)
}

/// Gauss quadrature for the reference interval [-1, 1].
///
/// Returns the [Gauss quadrature rule] with the given number of points. Given `n` points,
/// the rule integrates polynomials of order up to `2 n - 1` exactly. Points are ordered from
/// right to left.
///
/// # Panics
///
/// Panics if zero points are requested. See [`try_gauss`] for a non-panicking variant.
///
/// [Gauss quadrature rule]: https://en.wikipedia.org/wiki/Gaussian_quadrature
pub fn gauss(num_points: usize) -> Rule<1> {
    try_gauss(num_points).expect("number of points must be positive")
}

/// Same as [`gauss`], but returns an error instead of panicking when no points are requested.
pub fn try_gauss(num_points: usize) -> Result<Rule<1>, Error> {
    let n = num_points;
    if n == 0 {
        return Err(Error::NoRuleAvailable);
    }

    // Roots in the right half, the left half follows by symmetry
    let half: Vec<(f64, f64)> = (0..(n + 1) / 2)
        .map(|i| {
            let (x, dp) = legendre_root(n, i);
            (x, 2.0 / ((1.0 - x * x) * dp * dp))
        })
        .collect();
    let mirrored = half[..n / 2].iter().rev().map(|&(x, w)| (-x, w));

    let (points, weights): (Vec<[f64; 1]>, Vec<f64>) = half
        .iter()
        .copied()
        .chain(mirrored)
        .map(|(x, w)| ([x], w))
        .unzip();
    debug_assert_eq!(points.len(), n);
    Ok((weights, points))
}
