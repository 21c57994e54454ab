//! Biorthogonal (dual) Lagrange multiplier bases.
//!
//! The dual basis `Λ_i = Ae_ij B_j` of a slave element is biorthogonal to the base functions
//! `B = T N`: with
//!
//! ```text
//! M_ij = ∫ B_i B_j dΓ,    D_ij = δ_ij ∫ B_i dΓ,
//! ```
//!
//! the coefficients are `Ae = D M⁻¹`. Rows of `T` that vanish (boundary nodes, midside nodes of
//! a linear LM) are excluded: `M` is inverted on the remaining rows and padded with zeros. The
//! directional derivative follows from differentiating `Ae M = D`:
//!
//! ```text
//! ∂Ae = (∂D - Ae ∂M) M⁻¹.
//! ```
//!
//! The integrals run either over the full slave element or, for the consistent dual, over the
//! integration cells of the slave element.
use crate::config::CoreConfig;
use crate::element::lagmult::{BaseTransformation, BasisValues};
use crate::element::ElementView;
use crate::error::MortarError;
use crate::overlap::IntegrationCell;
use crate::paired::PairedVector;
use crate::quadrature::{points_per_direction, QuadratureRule};
use mortar_traits::Real;
use nalgebra::{DMatrix, DVector, Scalar, Vector2};

/// Dual coefficient matrix of a slave element with its directional derivative.
#[derive(Debug, Clone, PartialEq)]
pub struct DualBasis<T: Scalar> {
    pub ae: DMatrix<T>,
    pub ae_deriv: PairedVector<DMatrix<T>>,
}

impl<T: Real> DualBasis<T> {
    /// Evaluates `Λ = Ae B`.
    pub fn apply(&self, base: &BasisValues<T>) -> BasisValues<T> {
        base.transformed(&self.ae)
    }
}

/// Accumulates the integrals of the biorthogonality system and their derivatives.
#[derive(Debug, Clone)]
pub struct BiorthogonalitySystem<T: Scalar> {
    m: DMatrix<T>,
    d: DVector<T>,
    m_deriv: PairedVector<DMatrix<T>>,
    d_deriv: PairedVector<DVector<T>>,
}

impl<T: Real> BiorthogonalitySystem<T> {
    pub fn new(n: usize) -> Self {
        Self {
            m: DMatrix::zeros(n, n),
            d: DVector::zeros(n),
            m_deriv: PairedVector::new(),
            d_deriv: PairedVector::new(),
        }
    }

    /// Adds the contribution of one quadrature point with weight `w`.
    ///
    /// `xi_deriv` is the directional derivative of the slave coordinate of the point, empty for
    /// points fixed in the reference domain.
    pub fn add_point(
        &mut self,
        base: &BasisValues<T>,
        xi_deriv: &PairedVector<Vector2<T>>,
        w: T,
        w_deriv: &PairedVector<T>,
    ) {
        let b = &base.values;
        let outer = b * b.transpose();
        self.m += &outer * w;
        self.d += b * w;

        let n = b.len();
        for (key, dw) in w_deriv.iter() {
            *self.m_deriv.entry_or_insert_with(key, || DMatrix::zeros(n, n)) += &outer * *dw;
            *self.d_deriv.entry_or_insert_with(key, || DVector::zeros(n)) += b * *dw;
        }
        for (key, dxi) in xi_deriv.iter() {
            let db = base.gradients.transpose() * dxi;
            let d_outer = &db * b.transpose() + b * db.transpose();
            *self.m_deriv.entry_or_insert_with(key, || DMatrix::zeros(n, n)) += d_outer * w;
            *self.d_deriv.entry_or_insert_with(key, || DVector::zeros(n)) += db * w;
        }
    }

    /// Solves for `Ae` restricted to the `active` rows.
    pub fn solve(&self, active: &[usize], element: usize) -> Result<DualBasis<T>, MortarError> {
        let n = self.d.len();
        let k = active.len();
        let mut reduced = DMatrix::zeros(k, k);
        for (a, &i) in active.iter().enumerate() {
            for (b, &j) in active.iter().enumerate() {
                reduced[(a, b)] = self.m[(i, j)];
            }
        }
        let reduced_inverse = reduced
            .try_inverse()
            .ok_or(MortarError::SingularMatrix { element })?;
        let mut m_inverse = DMatrix::zeros(n, n);
        for (a, &i) in active.iter().enumerate() {
            for (b, &j) in active.iter().enumerate() {
                m_inverse[(i, j)] = reduced_inverse[(a, b)];
            }
        }

        let ae = DMatrix::from_diagonal(&self.d) * &m_inverse;

        let mut ae_deriv = PairedVector::with_capacity(self.m_deriv.len());
        for (key, dm) in self.m_deriv.iter() {
            let mut rhs = -(&ae * dm);
            if let Some(dd) = self.d_deriv.get(key) {
                rhs += DMatrix::from_diagonal(dd);
            }
            ae_deriv.add(key, rhs * &m_inverse);
        }
        Ok(DualBasis { ae, ae_deriv })
    }
}

/// Dual basis with biorthogonality over the whole slave element.
pub fn element_dual_basis<T: Real>(
    view: &ElementView<T>,
    transformation: &BaseTransformation<T>,
    config: &CoreConfig,
) -> Result<DualBasis<T>, MortarError> {
    let rule = QuadratureRule::element(view.cell(), points_per_direction(view.cell(), config))?;
    let mut system = BiorthogonalitySystem::new(view.num_nodes());
    let fixed = PairedVector::new();
    for (weight, xi) in rule.iter() {
        let sf = view.shape(xi);
        let base = transformation.apply(&sf);
        let mut w_deriv = view.jacobian_determinant_deriv(&sf);
        w_deriv.scale(weight);
        system.add_point(&base, &fixed, weight * view.jacobian_determinant(&sf), &w_deriv);
    }
    system.solve(&transformation.active, view.id())
}

/// Dual basis with biorthogonality over the given integration cells of the slave element.
pub fn consistent_dual_basis<'c, T: Real>(
    view: &ElementView<T>,
    transformation: &BaseTransformation<T>,
    cells: impl IntoIterator<Item = &'c IntegrationCell<T>>,
    config: &CoreConfig,
) -> Result<DualBasis<T>, MortarError> {
    let n_points = points_per_direction(view.cell(), config);
    let mut system = BiorthogonalitySystem::new(view.num_nodes());
    for cell in cells {
        let rule = if cell.is_interval() {
            QuadratureRule::interval(n_points)?
        } else {
            QuadratureRule::triangle(n_points)?
        };
        for (weight, point) in rule.iter() {
            let mapped = cell.map_point(point);
            let sf = view.shape(&mapped.slave);
            let base = transformation.apply(&sf);
            let det = view.jacobian_determinant(&sf);
            let w = weight * mapped.jacobian * det;
            let w_deriv = weight_deriv(view, &sf, weight, &mapped.slave_deriv, mapped.jacobian, &mapped.jacobian_deriv);
            system.add_point(&base, &mapped.slave_deriv, w, &w_deriv);
        }
    }
    system.solve(&transformation.active, view.id())
}

/// Directional derivative of `w = weight * J_cell * detJ(xi_s)`.
pub(crate) fn weight_deriv<T: Real>(
    view: &ElementView<T>,
    sf: &crate::element::ShapeFunctions<T>,
    weight: T,
    xi_deriv: &PairedVector<Vector2<T>>,
    cell_jacobian: T,
    cell_jacobian_deriv: &PairedVector<T>,
) -> PairedVector<T> {
    let det = view.jacobian_determinant(sf);
    let det_xi = view.jacobian_determinant_xi_deriv(sf);
    let mut deriv = view.jacobian_determinant_deriv(sf);
    deriv.add_mapped(xi_deriv, |dxi| det_xi.dot(dxi));
    deriv.scale(weight * cell_jacobian);
    deriv.add_scaled(cell_jacobian_deriv, weight * det);
    deriv
}
