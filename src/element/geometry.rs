//! Geometric quantities of a surface element in the current configuration.
use super::{evaluate_lagrange, nurbs, CellType, ShapeFunctions};
use crate::mesh::{Element, Node, SurfaceMesh};
use crate::paired::PairedVector;
use mortar_traits::Real;
use nalgebra::{DVector, Matrix3xX, Vector2, Vector3};

/// Borrowed view of one element of a [`SurfaceMesh`].
///
/// Evaluation is split in two steps: [`shape`](Self::shape) evaluates the basis at a parametric
/// point, and the remaining methods compute geometric quantities from that evaluation. This lets
/// callers reuse one evaluation for several quantities.
#[derive(Debug, Copy, Clone)]
pub struct ElementView<'a, T: Real> {
    mesh: &'a SurfaceMesh<T>,
    element: &'a Element<T>,
    index: usize,
}

impl<'a, T: Real> ElementView<'a, T> {
    pub fn new(mesh: &'a SurfaceMesh<T>, index: usize) -> Self {
        Self {
            mesh,
            element: mesh.element(index),
            index,
        }
    }

    pub fn element(&self) -> &'a Element<T> {
        self.element
    }

    /// Arena index of the element.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> usize {
        self.element.id
    }

    pub fn cell(&self) -> CellType {
        self.element.cell
    }

    pub fn dim(&self) -> usize {
        self.mesh.dim()
    }

    pub fn num_nodes(&self) -> usize {
        self.element.nodes.len()
    }

    pub fn node(&self, k: usize) -> &'a Node<T> {
        self.mesh.node(self.element.nodes[k])
    }

    /// Coordinate DOF id of component `c` of local node `k`.
    pub fn dof(&self, k: usize, c: usize) -> usize {
        self.mesh.dof(self.element.nodes[k], c)
    }

    /// Orientation factor applied to the normal.
    pub fn normal_factor(&self) -> T {
        self.element
            .nurbs
            .as_ref()
            .map(|data| data.normal_factor)
            .unwrap_or_else(T::one)
    }

    /// Shape functions of the parent volume element at the face point `xi`, if the element was
    /// given a parent.
    pub fn parent_shape(&self, xi: &Vector2<T>) -> Option<(DVector<T>, Matrix3xX<T>)> {
        self.element.parent.map(|parent| parent.evaluate_at_face(xi))
    }

    /// Shape functions of the element at `xi`.
    ///
    /// # Panics
    ///
    /// Panics if a NURBS element has no knot data, which
    /// [`SurfaceMesh::check_consistency`](crate::mesh::SurfaceMesh::check_consistency) rules out.
    pub fn shape(&self, xi: &Vector2<T>) -> ShapeFunctions<T> {
        let cell = self.cell();
        if cell.is_nurbs() {
            let data = self
                .element
                .nurbs
                .as_ref()
                .expect("NURBS elements are checked for knot data on interface setup");
            let weights: Vec<T> = (0..self.num_nodes())
                .map(|k| self.node(k).weight.unwrap_or_else(T::one))
                .collect();
            nurbs::evaluate(cell, data, &weights, xi)
        } else {
            evaluate_lagrange(cell, xi)
        }
    }

    fn combine(&self, coefficients: impl Iterator<Item = T>, value: impl Fn(&Node<T>) -> Vector3<T>) -> Vector3<T> {
        coefficients
            .enumerate()
            .fold(Vector3::zeros(), |acc, (k, c)| acc + value(self.node(k)) * c)
    }

    /// Current position at the evaluated point.
    pub fn position(&self, sf: &ShapeFunctions<T>) -> Vector3<T> {
        self.combine(sf.values.iter().copied(), Node::position)
    }

    pub fn displacement(&self, sf: &ShapeFunctions<T>) -> Vector3<T> {
        self.combine(sf.values.iter().copied(), |node| node.displacement)
    }

    /// Covariant tangent vectors `dx/dxi` and `dx/deta`. The second one is zero for curves.
    pub fn tangents(&self, sf: &ShapeFunctions<T>) -> [Vector3<T>; 2] {
        [
            self.combine(sf.gradients.row(0).iter().copied(), Node::position),
            self.combine(sf.gradients.row(1).iter().copied(), Node::position),
        ]
    }

    /// Parametric derivatives of the interpolated displacement.
    pub fn displacement_tangents(&self, sf: &ShapeFunctions<T>) -> [Vector3<T>; 2] {
        [
            self.combine(sf.gradients.row(0).iter().copied(), |node| node.displacement),
            self.combine(sf.gradients.row(1).iter().copied(), |node| node.displacement),
        ]
    }

    /// Second parametric derivatives of the position, ordered `xi xi`, `eta eta`, `xi eta`.
    pub fn second_tangents(&self, sf: &ShapeFunctions<T>) -> [Vector3<T>; 3] {
        [0, 1, 2].map(|row| self.combine(sf.hessians.row(row).iter().copied(), Node::position))
    }

    /// Unnormalised outward normal. Its length equals the Jacobian determinant.
    pub fn raw_normal(&self, sf: &ShapeFunctions<T>) -> Vector3<T> {
        let [g1, g2] = self.tangents(sf);
        let fac = self.normal_factor();
        if self.dim() == 2 {
            Vector3::new(g1.y, -g1.x, T::zero()) * fac
        } else {
            g1.cross(&g2) * fac
        }
    }

    pub fn unit_normal(&self, sf: &ShapeFunctions<T>) -> Vector3<T> {
        self.raw_normal(sf).normalize()
    }

    /// Unit normal at the centre of the reference domain.
    pub fn centre_normal(&self) -> Vector3<T> {
        self.unit_normal(&self.shape(&self.cell().centre()))
    }

    pub fn jacobian_determinant(&self, sf: &ShapeFunctions<T>) -> T {
        self.raw_normal(sf).norm()
    }

    /// Parametric derivatives of the raw normal.
    pub fn raw_normal_xi_deriv(&self, sf: &ShapeFunctions<T>) -> [Vector3<T>; 2] {
        let fac = self.normal_factor();
        let [x_xixi, x_etaeta, x_xieta] = self.second_tangents(sf);
        if self.dim() == 2 {
            [Vector3::new(x_xixi.y, -x_xixi.x, T::zero()) * fac, Vector3::zeros()]
        } else {
            let [g1, g2] = self.tangents(sf);
            [
                (x_xixi.cross(&g2) + g1.cross(&x_xieta)) * fac,
                (x_xieta.cross(&g2) + g1.cross(&x_etaeta)) * fac,
            ]
        }
    }

    /// Parametric derivatives of the Jacobian determinant.
    pub fn jacobian_determinant_xi_deriv(&self, sf: &ShapeFunctions<T>) -> Vector2<T> {
        let n = self.unit_normal(sf);
        let [d_xi, d_eta] = self.raw_normal_xi_deriv(sf);
        Vector2::new(n.dot(&d_xi), n.dot(&d_eta))
    }

    /// Directional derivative of the raw normal with respect to the nodal coordinates.
    pub fn raw_normal_deriv(&self, sf: &ShapeFunctions<T>) -> PairedVector<Vector3<T>> {
        let fac = self.normal_factor();
        let dim = self.dim();
        let mut deriv = PairedVector::with_capacity(dim * self.num_nodes());
        let [g1, g2] = self.tangents(sf);
        for k in 0..self.num_nodes() {
            let grad = sf.gradient(k);
            for c in 0..dim {
                let dn = if dim == 2 {
                    // n = (g1.y, -g1.x)
                    match c {
                        0 => Vector3::new(T::zero(), -grad.x, T::zero()),
                        _ => Vector3::new(grad.x, T::zero(), T::zero()),
                    }
                } else {
                    let e_c = Vector3::ith(c, T::one());
                    e_c.cross(&g2) * grad.x + g1.cross(&e_c) * grad.y
                };
                deriv.add(self.dof(k, c), dn * fac);
            }
        }
        deriv
    }

    /// Directional derivative of the Jacobian determinant with respect to the nodal coordinates.
    pub fn jacobian_determinant_deriv(&self, sf: &ShapeFunctions<T>) -> PairedVector<T> {
        let n = self.unit_normal(sf);
        self.raw_normal_deriv(sf).map(|dn| n.dot(dn))
    }

    /// Directional derivative of the position at a fixed parametric point.
    pub fn position_deriv(&self, sf: &ShapeFunctions<T>) -> PairedVector<Vector3<T>> {
        let mut deriv = PairedVector::with_capacity(self.dim() * self.num_nodes());
        for k in 0..self.num_nodes() {
            for c in 0..self.dim() {
                deriv.add(self.dof(k, c), Vector3::ith(c, sf.values[k]));
            }
        }
        deriv
    }

    /// Interpolated (unnormalised) nodal normal field `sum_k N_k n_k`.
    pub fn nodal_normal_field(&self, sf: &ShapeFunctions<T>) -> Vector3<T> {
        self.combine(sf.values.iter().copied(), |node| *node.normal())
    }

    /// Parametric derivatives of the interpolated nodal normal field.
    pub fn nodal_normal_field_xi_deriv(&self, sf: &ShapeFunctions<T>) -> [Vector3<T>; 2] {
        [
            self.combine(sf.gradients.row(0).iter().copied(), |node| *node.normal()),
            self.combine(sf.gradients.row(1).iter().copied(), |node| *node.normal()),
        ]
    }

    /// Directional derivative of the interpolated nodal normal field at a fixed parametric point.
    pub fn nodal_normal_field_deriv(&self, sf: &ShapeFunctions<T>) -> PairedVector<Vector3<T>> {
        let mut deriv = PairedVector::new();
        for k in 0..self.num_nodes() {
            deriv.add_scaled(self.node(k).normal_deriv(), sf.values[k]);
        }
        deriv
    }
}
