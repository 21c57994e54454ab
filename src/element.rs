//! Shape-function kernel for mortar surface elements.
//!
//! Every surface element is described by its [`CellType`], a closed set of Lagrange and NURBS
//! variants. Evaluation produces values, first and second parametric derivatives of all basis
//! functions in a single [`ShapeFunctions`] record. Geometric quantities (positions, tangents,
//! normals, Jacobians and their linearisations) are computed from such a record by
//! [`ElementView`](geometry::ElementView).
//!
//! Reference domains:
//!
//! - lines: `[-1, 1]`,
//! - triangles: the unit triangle `{(0, 0), (1, 0), (0, 1)}`,
//! - quadrilaterals: `[-1, 1]^2`.
//!
//! Parametric coordinates are always stored as `Vector2`, lines ignore the second component.
use mortar_traits::Real;
use nalgebra::{DVector, Matrix2xX, Matrix3xX, Point2, Scalar, Vector2};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

pub mod geometry;
pub mod lagmult;
mod lagrange;
pub mod nurbs;
pub mod volume;

pub use geometry::ElementView;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    Line2,
    Line3,
    Tri3,
    Tri6,
    Quad4,
    Quad8,
    Quad9,
    /// Linear NURBS curve.
    Nurbs2,
    /// Quadratic NURBS curve.
    Nurbs3,
    /// Bilinear NURBS surface.
    Nurbs4,
    /// Biquadratic NURBS surface.
    Nurbs9,
}

impl CellType {
    pub fn num_nodes(&self) -> usize {
        use CellType::*;
        match self {
            Line2 | Nurbs2 => 2,
            Line3 | Nurbs3 => 3,
            Tri3 => 3,
            Tri6 => 6,
            Quad4 | Nurbs4 => 4,
            Quad8 => 8,
            Quad9 | Nurbs9 => 9,
        }
    }

    /// Dimension of the reference domain, 1 for curves and 2 for surfaces.
    pub fn parametric_dim(&self) -> usize {
        use CellType::*;
        match self {
            Line2 | Line3 | Nurbs2 | Nurbs3 => 1,
            _ => 2,
        }
    }

    /// Number of vertices of the reference domain.
    pub fn num_corners(&self) -> usize {
        use CellType::*;
        match self {
            Line2 | Line3 | Nurbs2 | Nurbs3 => 2,
            Tri3 | Tri6 => 3,
            Quad4 | Quad8 | Quad9 | Nurbs4 | Nurbs9 => 4,
        }
    }

    pub fn is_triangle(&self) -> bool {
        matches!(self, CellType::Tri3 | CellType::Tri6)
    }

    pub fn is_nurbs(&self) -> bool {
        use CellType::*;
        matches!(self, Nurbs2 | Nurbs3 | Nurbs4 | Nurbs9)
    }

    /// Polynomial degree per parametric direction.
    pub fn degree(&self) -> usize {
        use CellType::*;
        match self {
            Line2 | Tri3 | Quad4 | Nurbs2 | Nurbs4 => 1,
            Line3 | Tri6 | Quad8 | Quad9 | Nurbs3 | Nurbs9 => 2,
        }
    }

    pub fn is_quadratic(&self) -> bool {
        self.degree() == 2
    }

    /// The Lagrange cell spanned by the corner nodes of a quadratic Lagrange cell.
    pub fn linear_counterpart(&self) -> Option<CellType> {
        use CellType::*;
        match self {
            Line3 => Some(Line2),
            Tri6 => Some(Tri3),
            Quad8 | Quad9 => Some(Quad4),
            _ => None,
        }
    }

    /// Parametric coordinates associated with node `k`.
    ///
    /// For NURBS elements the control points are associated with the Greville-like positions
    /// `-1, (0,) 1` per direction, with the first direction varying fastest.
    pub fn node_parametric_coords<T: Real>(&self, k: usize) -> Vector2<T> {
        use CellType::*;
        assert!(k < self.num_nodes(), "node index out of bounds");
        let (x, y): (f64, f64) = match self {
            Line2 | Nurbs2 => ([-1.0, 1.0][k], 0.0),
            Line3 => ([-1.0, 1.0, 0.0][k], 0.0),
            Nurbs3 => ([-1.0, 0.0, 1.0][k], 0.0),
            Tri3 | Tri6 => [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (0.5, 0.0), (0.5, 0.5), (0.0, 0.5)][k],
            Quad4 | Quad8 | Quad9 => [
                (-1.0, -1.0),
                (1.0, -1.0),
                (1.0, 1.0),
                (-1.0, 1.0),
                (0.0, -1.0),
                (1.0, 0.0),
                (0.0, 1.0),
                (-1.0, 0.0),
                (0.0, 0.0),
            ][k],
            Nurbs4 => ([-1.0, 1.0][k % 2], [-1.0, 1.0][k / 2]),
            Nurbs9 => ([-1.0, 0.0, 1.0][k % 3], [-1.0, 0.0, 1.0][k / 3]),
        };
        Vector2::new(nalgebra::convert(x), nalgebra::convert(y))
    }

    /// Indices of the nodes located at the corners of the reference domain, in
    /// counter-clockwise order.
    pub fn corner_nodes(&self) -> &'static [usize] {
        use CellType::*;
        match self {
            Line2 | Line3 | Nurbs2 => &[0, 1],
            Nurbs3 => &[0, 2],
            Tri3 | Tri6 => &[0, 1, 2],
            Quad4 | Quad8 | Quad9 => &[0, 1, 2, 3],
            Nurbs4 => &[0, 1, 3, 2],
            Nurbs9 => &[0, 2, 8, 6],
        }
    }

    /// The reference-domain vertices in counter-clockwise order (surfaces only).
    pub fn corner_polygon<T: Real>(&self) -> Vec<Point2<T>> {
        self.corner_nodes()
            .iter()
            .map(|&k| Point2::from(self.node_parametric_coords(k)))
            .collect()
    }

    /// Centre of the reference domain.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn centre<T: Real>(&self) -> Vector2<T> {
        if self.is_triangle() {
            Vector2::new(1.0 / 3.0, 1.0 / 3.0)
        } else {
            Vector2::zeros()
        }
    }

    /// Length or area of the reference domain.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn reference_measure<T: Real>(&self) -> T {
        match (self.parametric_dim(), self.is_triangle()) {
            (1, _) => 2.0,
            (_, true) => 0.5,
            _ => 4.0,
        }
    }

    /// Whether `xi` lies in the reference domain enlarged by `tol`.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn is_inside<T: Real>(&self, xi: &Vector2<T>, tol: T) -> bool {
        let bound = 1.0 + tol;
        if self.parametric_dim() == 1 {
            xi.x.abs() <= bound
        } else if self.is_triangle() {
            xi.x >= -tol && xi.y >= -tol && xi.x + xi.y <= bound
        } else {
            xi.x.abs() <= bound && xi.y.abs() <= bound
        }
    }
}

/// Basis function values and parametric derivatives at a single point.
///
/// Column `k` of `gradients` holds `(dN_k/dxi, dN_k/deta)` and column `k` of `hessians` holds
/// `(d2N_k/dxi2, d2N_k/deta2, d2N_k/dxi deta)`. For curves, all `eta` entries are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeFunctions<T: Scalar> {
    pub values: DVector<T>,
    pub gradients: Matrix2xX<T>,
    pub hessians: Matrix3xX<T>,
}

impl<T: Real> ShapeFunctions<T> {
    pub fn zeros(num_nodes: usize) -> Self {
        Self {
            values: DVector::zeros(num_nodes),
            gradients: Matrix2xX::zeros(num_nodes),
            hessians: Matrix3xX::zeros(num_nodes),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.values.len()
    }

    pub fn gradient(&self, k: usize) -> Vector2<T> {
        self.gradients.column(k).into_owned()
    }
}

/// Evaluates the Lagrange basis of the given cell at `xi`.
///
/// # Panics
///
/// Panics if `cell` is a NURBS cell, see [`nurbs::evaluate`] instead.
pub fn evaluate_lagrange<T: Real>(cell: CellType, xi: &Vector2<T>) -> ShapeFunctions<T> {
    lagrange::evaluate(cell, xi)
}
