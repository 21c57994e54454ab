//! Rational B-spline elements.
//!
//! A NURBS element carries one local knot vector per parametric direction, each of length
//! `2 * (p + 1)` for degree `p`, and the element occupies the knot span `[u_p, u_{p+1}]`. The
//! reference coordinate `xi ∈ [-1, 1]` is mapped affinely onto that span. Points outside the span
//! are evaluated by polynomial continuation of the span's basis, which the projector relies on
//! for iterates slightly outside the element.
use super::{CellType, ShapeFunctions};
use mortar_traits::Real;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Knot data attached to a NURBS element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NurbsData<T> {
    /// Local knot vector per parametric direction.
    pub knots: Vec<Vec<T>>,
    /// Orientation factor (`1` or `-1`) applied to the element normal.
    pub normal_factor: T,
}

impl<T: Real> NurbsData<T> {
    pub fn new(knots: Vec<Vec<T>>) -> Self {
        Self {
            knots,
            normal_factor: T::one(),
        }
    }

    /// Checks that the knot data is compatible with the given cell type.
    pub fn check_compatible(&self, cell: CellType) -> Result<(), String> {
        if !cell.is_nurbs() {
            return Err(format!("{:?} does not take knot vectors", cell));
        }
        if self.knots.len() != cell.parametric_dim() {
            return Err(format!(
                "{:?} needs {} knot vectors, got {}",
                cell,
                cell.parametric_dim(),
                self.knots.len()
            ));
        }
        let p = cell.degree();
        for knots in &self.knots {
            if knots.len() != 2 * (p + 1) {
                return Err(format!(
                    "local knot vectors of {:?} must have {} entries, got {}",
                    cell,
                    2 * (p + 1),
                    knots.len()
                ));
            }
            if knots.windows(2).any(|w| w[1] < w[0]) {
                return Err("knot vectors must be non-decreasing".to_string());
            }
            if knots[p + 1] <= knots[p] {
                return Err("the element knot span is empty".to_string());
            }
        }
        if self.normal_factor.abs() != T::one() {
            return Err("normal factor must be 1 or -1".to_string());
        }
        Ok(())
    }
}

/// Values, first and second derivatives of the `p + 1` B-spline basis functions supported on
/// span `p` of `knots`, evaluated at `u`.
fn bspline_basis<T: Real>(knots: &[T], p: usize, u: T) -> [Vec<T>; 3] {
    let ratio = |num: T, den: T| if den == T::zero() { T::zero() } else { num / den };
    let m = knots.len();
    let mut basis = [vec![T::zero(); m - 1], vec![T::zero(); m - 1], vec![T::zero(); m - 1]];
    basis[0][p] = T::one();

    for q in 1..=p {
        let count = m - 1 - q;
        let q_t: T = nalgebra::convert(q as f64);
        let mut next = [vec![T::zero(); count], vec![T::zero(); count], vec![T::zero(); count]];
        for i in 0..count {
            let left = knots[i + q] - knots[i];
            let right = knots[i + q + 1] - knots[i + 1];
            let a = ratio(u - knots[i], left);
            let b = ratio(knots[i + q + 1] - u, right);
            let c = ratio(q_t, left);
            let d = ratio(q_t, right);
            next[0][i] = a * basis[0][i] + b * basis[0][i + 1];
            next[1][i] = c * basis[0][i] - d * basis[0][i + 1];
            next[2][i] = c * basis[1][i] - d * basis[1][i + 1];
        }
        basis = next;
    }
    basis
}

/// Univariate basis in reference coordinates: derivatives are taken with respect to `xi`.
fn reference_basis<T: Real>(knots: &[T], p: usize, xi: T) -> [Vec<T>; 3] {
    let half: T = nalgebra::convert(0.5);
    let h = (knots[p + 1] - knots[p]) * half;
    let u = knots[p] + (xi + T::one()) * h;
    let [values, mut first, mut second] = bspline_basis(knots, p, u);
    first.iter_mut().for_each(|d| *d *= h);
    second.iter_mut().for_each(|d| *d *= h * h);
    [values, first, second]
}

/// Evaluates the rational basis of a NURBS element at `xi`.
///
/// `weights` holds the control point weights in element node order, with the first parametric
/// direction varying fastest.
///
/// # Panics
///
/// Panics if the knot data or the number of weights does not match the cell type.
pub fn evaluate<T: Real>(
    cell: CellType,
    data: &NurbsData<T>,
    weights: &[T],
    xi: &Vector2<T>,
) -> ShapeFunctions<T> {
    assert!(cell.is_nurbs(), "{:?} is not a NURBS cell", cell);
    assert_eq!(weights.len(), cell.num_nodes(), "one weight per control point required");
    assert_eq!(data.knots.len(), cell.parametric_dim(), "one knot vector per direction required");

    let p = cell.degree();
    let n = cell.num_nodes();
    let u_basis = reference_basis(&data.knots[0], p, xi.x);
    let v_basis = if cell.parametric_dim() == 2 {
        reference_basis(&data.knots[1], p, xi.y)
    } else {
        [vec![T::one()], vec![T::zero()], vec![T::zero()]]
    };

    // Weighted (non-rational) products and their derivatives:
    // [A, A_u, A_v, A_uu, A_vv, A_uv]
    let mut weighted = vec![[T::zero(); 6]; n];
    let mut sums = [T::zero(); 6];
    let stride = p + 1;
    for (k, w_k) in weighted.iter_mut().enumerate() {
        let (i, j) = (k % stride, k / stride);
        let (nu, du, ddu) = (u_basis[0][i], u_basis[1][i], u_basis[2][i]);
        let (nv, dv, ddv) = (v_basis[0][j], v_basis[1][j], v_basis[2][j]);
        let w = weights[k];
        *w_k = [nu * nv * w, du * nv * w, nu * dv * w, ddu * nv * w, nu * ddv * w, du * dv * w];
        for (sum, a) in sums.iter_mut().zip(w_k.iter()) {
            *sum += *a;
        }
    }

    let [w, w_u, w_v, w_uu, w_vv, w_uv] = sums;
    let mut sf = ShapeFunctions::zeros(n);
    for (k, &[a, a_u, a_v, a_uu, a_vv, a_uv]) in weighted.iter().enumerate() {
        let r = a / w;
        let r_u = (a_u - r * w_u) / w;
        let r_v = (a_v - r * w_v) / w;
        let two = T::one() + T::one();
        sf.values[k] = r;
        sf.gradients[(0, k)] = r_u;
        sf.gradients[(1, k)] = r_v;
        sf.hessians[(0, k)] = (a_uu - two * r_u * w_u - r * w_uu) / w;
        sf.hessians[(1, k)] = (a_vv - two * r_v * w_v - r * w_vv) / w;
        sf.hessians[(2, k)] = (a_uv - r_u * w_v - r_v * w_u - r * w_uv) / w;
    }
    sf
}
