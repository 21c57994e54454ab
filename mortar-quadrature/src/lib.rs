//! Quadrature rules for the reference domains of mortar surface elements and integration cells.
//!
//! Three reference domains are covered:
//!
//! - the interval `[-1, 1]` (line elements and 1D overlap segments),
//! - the square `[-1, 1]^2` (quadrilateral elements),
//! - the unit triangle with vertices `(0, 0)`, `(1, 0)`, `(0, 1)` (triangular elements and
//!   triangulated clip cells).
//!
//! Rules are returned as plain `f64` weights and points so that the crate is independent of any
//! particular scalar type or linear algebra library.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod composite;
pub mod simplex;
pub mod tensor;
pub mod univariate;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable => {
                write!(
                    f,
                    "There is no quadrature rule satisfying the requirements available"
                )
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A two-dimensional point.
pub type Point2 = Point<2>;

/// A D-dimensional rule.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A two-dimensional quadrature rule.
pub type Rule2d = Rule<2>;

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights
        .iter()
        .zip(points)
        .map(|(w, x)| w * f(x))
        .sum()
}

/// Number of Gauss points per dimension needed to integrate polynomials of the given degree
/// exactly.
pub fn gauss_points_for_degree(degree: usize) -> usize {
    (degree + 2) / 2
}
