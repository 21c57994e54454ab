//! Lagrange multiplier bases on slave elements.
//!
//! Every LM basis is built from the displacement basis `N` of the slave element in two stages.
//! First, a *base* `B = T N` is formed, where `T` reduces quadratic elements to their linear
//! counterpart (linear LM) and removes the multipliers of boundary nodes (boundary
//! transformation). Second, dual bases apply the coefficient matrix `Ae`, `Λ = Ae B`, which is
//! built by the dual-basis builder. The piecewise linear LM replaces the whole construction by
//! hat functions on a subdivision of the element.
//!
//! [`evaluate_lagrange_multiplier`] evaluates the basis selected by a [`CoreConfig`] on a slave
//! element, building the dual coefficients into the element's [`MortarData`] on first use.
use super::{evaluate_lagrange, CellType, ElementView, ShapeFunctions};
use crate::config::{CoreConfig, LagrangeMultiplierOrder, LagrangeMultiplierShape};
use crate::coupling::MortarData;
use crate::dual::DualBasis;
use crate::error::MortarError;
use crate::mesh::NodeFlags;
use mortar_traits::Real;
use nalgebra::{DMatrix, DVector, Matrix2, Matrix2xX, Point2, Scalar, Vector2};

/// Values and parametric gradients of a set of basis functions.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisValues<T: Scalar> {
    pub values: DVector<T>,
    pub gradients: Matrix2xX<T>,
}

impl<T: Real> BasisValues<T> {
    pub fn zeros(n: usize) -> Self {
        Self {
            values: DVector::zeros(n),
            gradients: Matrix2xX::zeros(n),
        }
    }

    pub fn from_shape(sf: &ShapeFunctions<T>) -> Self {
        Self {
            values: sf.values.clone(),
            gradients: sf.gradients.clone(),
        }
    }

    /// The basis `matrix * self`.
    pub fn transformed(&self, matrix: &DMatrix<T>) -> Self {
        Self {
            values: matrix * &self.values,
            gradients: &self.gradients * matrix.transpose(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The transformation `T` from the displacement basis to the LM base functions.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseTransformation<T: Scalar> {
    pub matrix: DMatrix<T>,
    /// Rows of `matrix` that are not identically zero, in increasing order.
    pub active: Vec<usize>,
}

impl<T: Real> BaseTransformation<T> {
    pub fn identity(n: usize) -> Self {
        Self {
            matrix: DMatrix::identity(n, n),
            active: (0..n).collect(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.matrix == DMatrix::identity(self.matrix.nrows(), self.matrix.ncols())
    }

    pub fn apply(&self, sf: &ShapeFunctions<T>) -> BasisValues<T> {
        BasisValues::from_shape(sf).transformed(&self.matrix)
    }
}

/// Flags identifying the nodes that carry no LM in the boundary transformation.
pub fn boundary_flags(dim: usize) -> NodeFlags {
    if dim == 3 {
        NodeFlags::ON_BOUNDARY | NodeFlags::ON_CORNER | NodeFlags::ON_EDGE
    } else {
        NodeFlags::ON_BOUNDARY | NodeFlags::ON_CORNER
    }
}

/// Checks whether the requested LM basis is available on the given slave element.
pub fn check_supported<T: Real>(view: &ElementView<T>, config: &CoreConfig) -> Result<(), MortarError> {
    use CellType::*;
    let cell = view.cell();
    let id = view.id();
    match config.lm_shape {
        LagrangeMultiplierShape::PiecewiseLinear => {
            piecewise_linear_subelements(cell).map_err(|msg| MortarError::usage(id, msg))?;
        }
        LagrangeMultiplierShape::Dual | LagrangeMultiplierShape::PetrovGalerkin => {
            if matches!(cell, Nurbs2 | Nurbs4) {
                return Err(MortarError::usage(id, format!("dual LM is not available on {:?}", cell)));
            }
            let quadratic_lm = config.lm_quad == LagrangeMultiplierOrder::Quadratic;
            if quadratic_lm && matches!(cell, Tri6 | Quad8) {
                return Err(MortarError::usage(
                    id,
                    format!("quadratic dual LM is not available on {:?}", cell),
                ));
            }
        }
        LagrangeMultiplierShape::Standard => {}
    }
    if config.lm_quad == LagrangeMultiplierOrder::Linear && cell.is_nurbs() && cell.is_quadratic() {
        return Err(MortarError::usage(id, format!("linear LM is not available on {:?}", cell)));
    }
    Ok(())
}

/// Builds the transformation `T = T_bound T_lin` of a slave element.
pub fn base_transformation<T: Real>(
    view: &ElementView<T>,
    config: &CoreConfig,
) -> Result<BaseTransformation<T>, MortarError> {
    let n = view.num_nodes();
    let mut transformation = BaseTransformation::identity(n);

    if config.lm_quad == LagrangeMultiplierOrder::Linear && view.cell().is_quadratic() {
        let linear = view.cell().linear_counterpart().ok_or_else(|| {
            MortarError::usage(view.id(), format!("linear LM is not available on {:?}", view.cell()))
        })?;
        let mut t_lin = DMatrix::zeros(n, n);
        for j in 0..n {
            let lin = evaluate_lagrange(linear, &view.cell().node_parametric_coords(j));
            for (row, &corner) in view.cell().corner_nodes().iter().enumerate() {
                t_lin[(corner, j)] = lin.values[row];
            }
        }
        transformation = BaseTransformation {
            matrix: t_lin,
            active: view.cell().corner_nodes().to_vec(),
        };
        transformation.active.sort_unstable();
    }

    if config.boundary_trafo {
        let flags = boundary_flags(view.dim());
        let (boundary, interior): (Vec<usize>, Vec<usize>) = transformation
            .active
            .iter()
            .copied()
            .partition(|&k| view.node(k).flags.intersects(flags));
        if !boundary.is_empty() {
            if interior.is_empty() {
                return Err(MortarError::usage(
                    view.id(),
                    "all Lagrange multiplier nodes of the element are boundary nodes",
                ));
            }
            let share = T::one() / nalgebra::convert::<_, T>(interior.len() as f64);
            let mut t_bound = DMatrix::zeros(n, n);
            for &i in &interior {
                t_bound[(i, i)] = T::one();
                for &b in &boundary {
                    t_bound[(i, b)] = share;
                }
            }
            transformation = BaseTransformation {
                matrix: t_bound * transformation.matrix,
                active: interior,
            };
        }
    }
    Ok(transformation)
}

/// Node lists of the linear sub-elements used by the piecewise linear LM.
pub fn piecewise_linear_subelements(cell: CellType) -> Result<&'static [&'static [usize]], String> {
    use CellType::*;
    match cell {
        Tri3 => Ok(&[&[0, 1, 2]]),
        Quad4 => Ok(&[&[0, 1, 2, 3]]),
        Tri6 => Ok(&[&[0, 3, 5], &[3, 1, 4], &[5, 4, 2], &[3, 4, 5]]),
        Quad9 => Ok(&[&[0, 4, 8, 7], &[4, 1, 5, 8], &[8, 5, 2, 6], &[7, 8, 6, 3]]),
        _ => Err(format!("piecewise linear LM is not available on {:?}", cell)),
    }
}

/// Reference-domain polygon of a sub-element, counter-clockwise.
pub fn subelement_polygon<T: Real>(cell: CellType, nodes: &[usize]) -> Vec<Point2<T>> {
    nodes
        .iter()
        .map(|&k| Point2::from(cell.node_parametric_coords(k)))
        .collect()
}

/// Evaluates the piecewise linear LM of sub-element `sub` at the slave coordinate `xi`.
///
/// Only the nodes of the sub-element have non-zero values.
pub fn evaluate_piecewise_linear<T: Real>(
    cell: CellType,
    sub: usize,
    xi: &Vector2<T>,
) -> Result<BasisValues<T>, String> {
    let nodes = piecewise_linear_subelements(cell)?[sub];
    let polygon: Vec<Point2<T>> = subelement_polygon(cell, nodes);
    let mut basis = BasisValues::zeros(cell.num_nodes());
    let origin = polygon[0].coords;
    let (local_cell, edges) = if nodes.len() == 3 {
        let edges = Matrix2::from_columns(&[polygon[1].coords - origin, polygon[2].coords - origin]);
        (CellType::Tri3, edges)
    } else {
        // Axis-aligned sub-squares, local coordinates in [-1, 1]^2
        let edges = Matrix2::from_columns(&[
            (polygon[1].coords - origin) * nalgebra::convert::<_, T>(0.5),
            (polygon[3].coords - origin) * nalgebra::convert::<_, T>(0.5),
        ]);
        (CellType::Quad4, edges)
    };
    let inverse = edges
        .try_inverse()
        .ok_or_else(|| "degenerate sub-element".to_string())?;
    let local_origin = if local_cell == CellType::Tri3 {
        Vector2::zeros()
    } else {
        Vector2::new(-T::one(), -T::one())
    };
    let local_xi = local_origin + inverse * (xi - origin);
    let local = evaluate_lagrange(local_cell, &local_xi);
    for (k, &node) in nodes.iter().enumerate() {
        basis.values[node] = local.values[k];
        let gradient = inverse.transpose() * local.gradient(k);
        basis.gradients.set_column(node, &gradient);
    }
    Ok(basis)
}

/// Index of the sub-element of `cell` containing the slave coordinate `xi`.
///
/// Points outside the reference domain are assigned to the sub-element they are least outside
/// of. On shared edges the sub-element with the lower index wins.
pub fn locate_subelement<T: Real>(cell: CellType, xi: &Vector2<T>) -> Result<usize, String> {
    let subelements = piecewise_linear_subelements(cell)?;
    let mut best: Option<(usize, T)> = None;
    for (sub, nodes) in subelements.iter().enumerate() {
        let basis = evaluate_piecewise_linear(cell, sub, xi)?;
        let smallest = nodes.iter().map(|&k| basis.values[k]).reduce(|a, b| a.min(b));
        if let Some(smallest) = smallest {
            if best.map_or(true, |(_, value)| smallest > value) {
                best = Some((sub, smallest));
            }
        }
    }
    best.map(|(sub, _)| sub)
        .ok_or_else(|| format!("{:?} has no sub-elements", cell))
}

/// Lagrange multiplier basis of one slave element.
#[derive(Debug, Copy, Clone)]
pub enum LagrangeMultiplierBasis<'a, T: Scalar> {
    /// `Λ = T N`.
    Standard(&'a BaseTransformation<T>),
    /// `Λ = Ae T N`, also used for the Petrov-Galerkin variant.
    Dual(&'a BaseTransformation<T>, &'a DualBasis<T>),
    /// Hat functions on the linear sub-elements.
    PiecewiseLinear,
}

impl<'a, T: Real> LagrangeMultiplierBasis<'a, T> {
    /// Element nodes that carry a multiplier.
    pub fn active(&self, num_nodes: usize) -> Vec<usize> {
        match self {
            Self::Standard(t) | Self::Dual(t, _) => t.active.clone(),
            Self::PiecewiseLinear => (0..num_nodes).collect(),
        }
    }

    /// Values and parametric gradients of the multipliers at `xi`, given the shape functions
    /// `sf` of the slave element at `xi`.
    ///
    /// The piecewise linear basis needs the sub-element containing `xi`.
    pub fn evaluate(
        &self,
        slave: &ElementView<T>,
        sf: &ShapeFunctions<T>,
        xi: &Vector2<T>,
        subelement: Option<usize>,
    ) -> Result<BasisValues<T>, MortarError> {
        match self {
            Self::Standard(t) => Ok(t.apply(sf)),
            Self::Dual(t, dual) => Ok(dual.apply(&t.apply(sf))),
            Self::PiecewiseLinear => {
                let sub = subelement.ok_or_else(|| {
                    MortarError::integration(slave.id(), "piecewise linear LM on a cell without sub-element")
                })?;
                evaluate_piecewise_linear(slave.cell(), sub, xi).map_err(|msg| MortarError::usage(slave.id(), msg))
            }
        }
    }
}

/// Evaluates the Lagrange multiplier basis selected by `config` on a slave element at `xi`.
///
/// The dual coefficients are taken from `data`, and built over the whole element if `data` has
/// none yet. The boundary transformation of `data` is applied according to the node flags the
/// data was created with.
pub fn evaluate_lagrange_multiplier<T: Real>(
    view: &ElementView<T>,
    config: &CoreConfig,
    data: &mut MortarData<T>,
    xi: &Vector2<T>,
) -> Result<BasisValues<T>, MortarError> {
    if !view.element().is_slave() {
        return Err(MortarError::usage(
            view.id(),
            "Lagrange multipliers are only defined on slave elements",
        ));
    }
    check_supported(view, config)?;
    data.ensure_element_dual(view, config)?;
    let subelement = if config.lm_shape == LagrangeMultiplierShape::PiecewiseLinear {
        Some(locate_subelement(view.cell(), xi).map_err(|msg| MortarError::usage(view.id(), msg))?)
    } else {
        None
    };
    data.basis(view, config, None)?
        .evaluate(view, &view.shape(xi), xi, subelement)
}
