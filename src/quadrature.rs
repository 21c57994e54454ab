//! Quadrature rules in the scalar type of the evaluation.
use crate::config::CoreConfig;
use crate::element::CellType;
use crate::error::MortarError;
use mortar_quadrature::composite::{composite_gauss, quadrilateral_composite_gauss};
use mortar_quadrature::simplex::triangle_collapsed_gauss;
use mortar_quadrature::tensor::quadrilateral_gauss;
use mortar_quadrature::univariate::try_gauss;
use mortar_traits::Real;
use nalgebra::Vector2;

/// Number of sub-intervals per direction of the composite rules used on NURBS elements.
const NURBS_SUBINTERVALS: usize = 2;

/// Quadrature rule with points stored as reference coordinates.
///
/// Points of 1D rules have a zero second component.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule<T> {
    pub weights: Vec<T>,
    pub points: Vec<Vector2<T>>,
}

impl<T: Real> QuadratureRule<T> {
    fn from_1d((weights, points): (Vec<f64>, Vec<[f64; 1]>)) -> Self {
        Self {
            weights: weights.into_iter().map(nalgebra::convert).collect(),
            points: points
                .into_iter()
                .map(|[x]| Vector2::new(nalgebra::convert(x), T::zero()))
                .collect(),
        }
    }

    fn from_2d((weights, points): (Vec<f64>, Vec<[f64; 2]>)) -> Self {
        Self {
            weights: weights.into_iter().map(nalgebra::convert).collect(),
            points: points
                .into_iter()
                .map(|[x, y]| Vector2::new(nalgebra::convert(x), nalgebra::convert(y)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (T, &Vector2<T>)> + '_ {
        self.weights.iter().copied().zip(&self.points)
    }

    /// Gauss rule on `[-1, 1]`.
    pub fn interval(num_points: usize) -> Result<Self, MortarError> {
        Ok(Self::from_1d(try_gauss(num_points)?))
    }

    /// Collapsed Gauss rule on the unit triangle.
    pub fn triangle(num_points_per_dim: usize) -> Result<Self, MortarError> {
        try_gauss(num_points_per_dim)?;
        Ok(Self::from_2d(triangle_collapsed_gauss(num_points_per_dim)))
    }

    /// Rule over the whole reference domain of the given cell.
    pub fn element(cell: CellType, num_points_per_dim: usize) -> Result<Self, MortarError> {
        try_gauss(num_points_per_dim)?;
        let rule = match (cell.parametric_dim(), cell.is_triangle(), cell.is_nurbs()) {
            (1, _, false) => Self::interval(num_points_per_dim)?,
            (1, _, true) => Self::from_1d(composite_gauss(num_points_per_dim, NURBS_SUBINTERVALS)),
            (_, true, _) => Self::triangle(num_points_per_dim)?,
            (_, false, false) => Self::from_2d(quadrilateral_gauss(num_points_per_dim)),
            (_, false, true) => Self::from_2d(quadrilateral_composite_gauss(
                num_points_per_dim,
                NURBS_SUBINTERVALS,
            )),
        };
        Ok(rule)
    }
}

/// Number of Gauss points per direction used for cells on the given slave element.
pub fn points_per_direction(cell: CellType, config: &CoreConfig) -> usize {
    config
        .gauss_points_1d
        .unwrap_or(if cell.is_quadratic() || cell.is_nurbs() { 6 } else { 4 })
}
