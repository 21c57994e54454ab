//! Projection of points onto opposing elements.
//!
//! A point `p` is projected onto an element `E` along the interpolated nodal normal field of `E`
//! by solving
//!
//! ```text
//! F(xi, alpha) = x_E(xi) + alpha * n_E(xi) - p = 0
//! ```
//!
//! for the parametric foot point `xi` and the distance parameter `alpha` with Newton's method,
//! where `n_E = sum_k N_k n_k` is the unnormalised interpolation of the nodal normals. The
//! iteration starts at the centre of the reference domain with `alpha = 0`.
use crate::config::CoreConfig;
use crate::element::ElementView;
use crate::error::MortarError;
use crate::paired::PairedVector;
use log::{debug, trace};
use mortar_optimize::calculus::{DifferentiableVectorFunction, VectorFunction};
use mortar_optimize::newton::{newton, NewtonSettings};
use mortar_traits::Real;
use nalgebra::{DMatrix, DVector, DVectorView, DVectorViewMut, Scalar, Vector2, Vector3};
use std::error::Error;

/// Result of projecting a single point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection<T: Scalar> {
    /// Parametric foot point on the target element.
    pub xi: Vector2<T>,
    pub alpha: T,
    pub converged: bool,
    /// Converged and inside the reference domain enlarged by the projection tolerance.
    pub feasible: bool,
    /// Converged and inside the reference domain enlarged by the exact projection limit.
    pub exact: bool,
}

impl<T: Real> Projection<T> {
    fn failed(xi: Vector2<T>) -> Self {
        Self {
            xi,
            alpha: T::zero(),
            converged: false,
            feasible: false,
            exact: false,
        }
    }
}

/// Whether the outward normals at the element centres point against each other.
///
/// Pairs failing this check are never projected.
pub fn orientation_compatible<T: Real>(slave: &ElementView<T>, master: &ElementView<T>) -> bool {
    slave.centre_normal().dot(&master.centre_normal()) < T::zero()
}

/// Residual and Jacobian of the projection equations, with unknowns `(xi, [eta,] alpha)`.
struct ProjectionFunction<'a, T: Real> {
    target: ElementView<'a, T>,
    point: Vector3<T>,
}

impl<'a, T: Real> ProjectionFunction<'a, T> {
    fn pdim(&self) -> usize {
        self.target.cell().parametric_dim()
    }

    fn unpack(&self, x: &DVectorView<T>) -> (Vector2<T>, T) {
        let pdim = self.pdim();
        let xi = if pdim == 1 {
            Vector2::new(x[0], T::zero())
        } else {
            Vector2::new(x[0], x[1])
        };
        (xi, x[pdim])
    }
}

/// Jacobian of `F` with respect to `(xi, [eta,] alpha)` at the given point.
fn projection_jacobian<T: Real>(target: &ElementView<T>, xi: &Vector2<T>, alpha: T) -> DMatrix<T> {
    let dim = target.dim();
    let pdim = target.cell().parametric_dim();
    let sf = target.shape(xi);
    let tangents = target.tangents(&sf);
    let normal_derivs = target.nodal_normal_field_xi_deriv(&sf);
    let normal = target.nodal_normal_field(&sf);
    let mut jacobian = DMatrix::zeros(dim, dim);
    for a in 0..pdim {
        let column = tangents[a] + normal_derivs[a] * alpha;
        jacobian.column_mut(a).copy_from(&column.rows(0, dim));
    }
    jacobian.column_mut(pdim).copy_from(&normal.rows(0, dim));
    jacobian
}

impl<'a, T: Real> VectorFunction<T> for ProjectionFunction<'a, T> {
    fn dimension(&self) -> usize {
        self.target.dim()
    }

    fn eval_into(&mut self, f: &mut DVectorViewMut<T>, x: &DVectorView<T>) {
        let (xi, alpha) = self.unpack(x);
        let sf = self.target.shape(&xi);
        let residual = self.target.position(&sf) + self.target.nodal_normal_field(&sf) * alpha - self.point;
        let dim = self.dimension();
        f.copy_from(&residual.rows(0, dim));
    }
}

impl<'a, T: Real> DifferentiableVectorFunction<T> for ProjectionFunction<'a, T> {
    fn solve_jacobian_system(
        &mut self,
        sol: &mut DVectorViewMut<T>,
        x: &DVectorView<T>,
        rhs: &DVectorView<T>,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let (xi, alpha) = self.unpack(x);
        let jacobian = projection_jacobian(&self.target, &xi, alpha);
        let solution = jacobian
            .lu()
            .solve(rhs)
            .ok_or("singular projection Jacobian")?;
        sol.copy_from(&solution);
        Ok(())
    }
}

/// Projects `point` onto `target` along the nodal normal field of `target`.
///
/// Non-convergence is not an error: the returned projection is then marked infeasible.
pub fn project_point<T: Real>(target: &ElementView<T>, point: &Vector3<T>, config: &CoreConfig) -> Projection<T> {
    let dim = target.dim();
    let pdim = target.cell().parametric_dim();
    let centre = target.cell().centre::<T>();

    let mut x = DVector::zeros(dim);
    x[0] = centre.x;
    if pdim == 2 {
        x[1] = centre.y;
    }
    let mut f = DVector::zeros(dim);
    let mut dx = DVector::zeros(dim);
    let settings = NewtonSettings {
        max_iterations: Some(config.newton_max_iterations),
        tolerance: nalgebra::convert(config.newton_tolerance),
    };
    let function = ProjectionFunction {
        target: *target,
        point: *point,
    };
    let xi = |x: &DVector<T>| if pdim == 1 { Vector2::new(x[0], T::zero()) } else { Vector2::new(x[0], x[1]) };

    match newton(function, &mut x, &mut f, &mut dx, settings) {
        Ok(iterations) => {
            let xi = xi(&x);
            let cell = target.cell();
            let projection = Projection {
                xi,
                alpha: x[pdim],
                converged: true,
                feasible: cell.is_inside(&xi, nalgebra::convert(config.projection_tolerance)),
                exact: cell.is_inside(&xi, nalgebra::convert(config.exact_projection_limit)),
            };
            trace!(
                "Projected onto element {} in {} iterations: xi = {:?}, feasible = {}",
                target.id(),
                iterations,
                projection.xi,
                projection.feasible
            );
            projection
        }
        Err(err) => {
            debug!("Projection onto element {} did not converge: {}", target.id(), err);
            Projection::failed(xi(&x))
        }
    }
}

/// Directional derivative of the foot point of a converged projection.
///
/// `point_deriv` is the directional derivative of the projected point. The result is keyed by
/// the coordinate DOFs of the target element and those of `point_deriv`.
pub fn projection_deriv<T: Real>(
    target: &ElementView<T>,
    projection: &Projection<T>,
    point_deriv: &PairedVector<Vector3<T>>,
) -> Result<PairedVector<Vector2<T>>, MortarError> {
    let dim = target.dim();
    let pdim = target.cell().parametric_dim();
    let sf = target.shape(&projection.xi);

    let mut residual_deriv = target.position_deriv(&sf);
    residual_deriv.add_scaled(&target.nodal_normal_field_deriv(&sf), projection.alpha);
    residual_deriv.add_scaled(point_deriv, -T::one());

    let inverse = projection_jacobian(target, &projection.xi, projection.alpha)
        .try_inverse()
        .ok_or_else(|| MortarError::integration(target.id(), "singular projection Jacobian"))?;

    Ok(residual_deriv.map(|df| {
        let solution = -(&inverse * df.rows(0, dim));
        if pdim == 1 {
            Vector2::new(solution[0], T::zero())
        } else {
            Vector2::new(solution[0], solution[1])
        }
    }))
}
