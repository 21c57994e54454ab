use super::SurfaceMesh;
use crate::error::MortarError;
use crate::paired::PairedVector;
use mortar_traits::Real;
use nalgebra::{Matrix3, Vector3};

/// `(I - n n^T) / |s|`, the derivative of `s / |s|` with respect to `s`, where `n = s / |s|`.
fn normalization_jacobian<T: Real>(s: &Vector3<T>) -> (Vector3<T>, Matrix3<T>) {
    let length = s.norm();
    let n = s / length;
    (n, (Matrix3::identity() - n * n.transpose()) / length)
}

impl<T: Real> SurfaceMesh<T> {
    /// Computes the averaged unit normal of every node together with its linearisation.
    ///
    /// For each node, the unit normals of all adjacent elements, evaluated at the node's
    /// parametric position, are summed and normalised. Nodes without adjacent elements keep a
    /// zero normal. Fails if the mesh does not pass [`check_consistency`](Self::check_consistency).
    pub fn compute_nodal_normals(&mut self) -> Result<(), MortarError> {
        self.check_consistency()?;
        self.update_nodal_normals();
        Ok(())
    }

    /// Same as [`compute_nodal_normals`](Self::compute_nodal_normals) for a mesh already known to
    /// be consistent.
    pub(crate) fn update_nodal_normals(&mut self) {
        let mut results = Vec::with_capacity(self.nodes.len());
        for node in 0..self.nodes.len() {
            let mut sum = Vector3::zeros();
            let mut sum_deriv: PairedVector<Vector3<T>> = PairedVector::new();
            for &e in &self.node_elements[node] {
                let view = self.view(e);
                let local = match view.element().nodes.iter().position(|&n| n == node) {
                    Some(local) => local,
                    None => continue,
                };
                let sf = view.shape(&view.cell().node_parametric_coords(local));
                let raw = view.raw_normal(&sf);
                let (unit, jacobian) = normalization_jacobian(&raw);
                sum += unit;
                sum_deriv.add_mapped(&view.raw_normal_deriv(&sf), |dn| jacobian * dn);
            }
            if sum.norm() > T::zero() {
                let (normal, jacobian) = normalization_jacobian(&sum);
                results.push((normal, sum_deriv.map(|ds| jacobian * ds)));
            } else {
                results.push((Vector3::zeros(), PairedVector::new()));
            }
        }
        for (node, (normal, deriv)) in self.nodes.iter_mut().zip(results) {
            node.normal = normal;
            node.normal_deriv = deriv;
        }
    }
}
