//! Parent volume elements of surface elements.
//!
//! Surface elements extracted from a volume mesh may remember the volume element and face they
//! were extracted from. Only the reference geometry of the parent is provided here: the face
//! connectivity and the map from face coordinates to parent coordinates.
use super::{evaluate_lagrange, CellType};
use mortar_traits::Real;
use nalgebra::{DVector, Matrix3xX, Vector2, Vector3};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeCellType {
    Tet4,
    Hex8,
}

/// Back-reference from a surface element to the volume element it bounds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentVolume {
    pub cell: VolumeCellType,
    /// User id of the volume element.
    pub element: usize,
    /// Local face number in the parent.
    pub face: usize,
}

impl VolumeCellType {
    pub fn num_nodes(&self) -> usize {
        match self {
            Self::Tet4 => 4,
            Self::Hex8 => 8,
        }
    }

    pub fn num_faces(&self) -> usize {
        match self {
            Self::Tet4 => 4,
            Self::Hex8 => 6,
        }
    }

    /// Parent node indices of the given face, ordered such that the face normal points outward.
    pub fn face_nodes(&self, face: usize) -> &'static [usize] {
        match self {
            Self::Tet4 => [&[0, 2, 1][..], &[0, 1, 3], &[1, 2, 3], &[0, 3, 2]][face],
            Self::Hex8 => [
                &[0, 3, 2, 1][..],
                &[0, 1, 5, 4],
                &[1, 2, 6, 5],
                &[2, 3, 7, 6],
                &[3, 0, 4, 7],
                &[4, 5, 6, 7],
            ][face],
        }
    }

    /// Linear surface cell type of the faces.
    pub fn face_cell_type(&self) -> CellType {
        match self {
            Self::Tet4 => CellType::Tri3,
            Self::Hex8 => CellType::Quad4,
        }
    }

    pub fn node_reference_coords<T: Real>(&self, k: usize) -> Vector3<T> {
        let (x, y, z): (f64, f64, f64) = match self {
            Self::Tet4 => [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0), (0.0, 0.0, 1.0)][k],
            Self::Hex8 => [
                (-1.0, -1.0, -1.0),
                (1.0, -1.0, -1.0),
                (1.0, 1.0, -1.0),
                (-1.0, 1.0, -1.0),
                (-1.0, -1.0, 1.0),
                (1.0, -1.0, 1.0),
                (1.0, 1.0, 1.0),
                (-1.0, 1.0, 1.0),
            ][k],
        };
        Vector3::new(nalgebra::convert(x), nalgebra::convert(y), nalgebra::convert(z))
    }
}

impl ParentVolume {
    /// Maps reference coordinates on the face to reference coordinates of the parent.
    ///
    /// Only the corner nodes of the surface element are used, so the map is exact for linear
    /// faces and for the corner-spanned subspace of quadratic faces.
    pub fn map_to_parent<T: Real>(&self, face_xi: &Vector2<T>) -> Vector3<T> {
        let face_cell = self.cell.face_cell_type();
        let sf = evaluate_lagrange(face_cell, face_xi);
        self.cell
            .face_nodes(self.face)
            .iter()
            .enumerate()
            .fold(Vector3::zeros(), |acc, (k, &node)| {
                acc + self.cell.node_reference_coords::<T>(node) * sf.values[k]
            })
    }

    /// Parent shape functions and their reference gradients at a point of the face.
    ///
    /// ```
    /// use mortar::element::volume::{ParentVolume, VolumeCellType};
    /// use mortar::nalgebra::Vector2;
    ///
    /// let parent = ParentVolume { cell: VolumeCellType::Hex8, element: 3, face: 5 };
    /// // Centre of the top face
    /// let (values, _) = parent.evaluate_at_face(&Vector2::<f64>::new(0.0, 0.0));
    /// for k in 0..8 {
    ///     let expected = if k < 4 { 0.0 } else { 0.25 };
    ///     assert!((values[k] - expected).abs() < 1e-14);
    /// }
    /// ```
    pub fn evaluate_at_face<T: Real>(&self, face_xi: &Vector2<T>) -> (DVector<T>, Matrix3xX<T>) {
        evaluate_volume(self.cell, &self.map_to_parent(face_xi))
    }
}

/// Evaluates the shape functions of a linear volume cell and their reference gradients.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn evaluate_volume<T: Real>(cell: VolumeCellType, xi: &Vector3<T>) -> (DVector<T>, Matrix3xX<T>) {
    let n = cell.num_nodes();
    let mut values = DVector::zeros(n);
    let mut gradients = Matrix3xX::zeros(n);
    match cell {
        VolumeCellType::Tet4 => {
            values[0] = 1.0 - xi.x - xi.y - xi.z;
            values[1] = xi.x;
            values[2] = xi.y;
            values[3] = xi.z;
            gradients.set_column(0, &Vector3::new(-1.0, -1.0, -1.0));
            gradients.set_column(1, &Vector3::x());
            gradients.set_column(2, &Vector3::y());
            gradients.set_column(3, &Vector3::z());
        }
        VolumeCellType::Hex8 => {
            for k in 0..n {
                let node: Vector3<T> = cell.node_reference_coords(k);
                let a = 1.0 + node.x * xi.x;
                let b = 1.0 + node.y * xi.y;
                let c = 1.0 + node.z * xi.z;
                values[k] = 0.125 * a * b * c;
                gradients.set_column(
                    k,
                    &Vector3::new(0.125 * node.x * b * c, 0.125 * a * node.y * c, 0.125 * a * b * node.z),
                );
            }
        }
    }
    (values, gradients)
}
