//! Overlap detection and segmentation of slave/master element pairs.
//!
//! The result of segmenting a pair is a list of [`IntegrationCell`]s: intervals on the slave
//! reference line in 2D problems, triangles in the slave reference domain in 3D problems. Every
//! cell vertex carries its coordinates on both elements together with their directional
//! derivatives, so that the integrator can linearise the Gauss point mapping.
use crate::config::{CoreConfig, LagrangeMultiplierShape};
use crate::element::ElementView;
use crate::error::MortarError;
use crate::paired::PairedVector;
use itertools::Itertools;
use mortar_geometry::polygon::cross2;
use mortar_traits::Real;
use nalgebra::{Matrix2, Scalar, Vector2, Vector3};
use std::cmp::Ordering;

mod clip;
mod interval;
mod pwlin;

pub use interval::{classify_interval_overlap, IntervalOverlap, OverlapKind};

/// What a cell vertex was constructed from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VertexOrigin {
    /// Corner of the slave reference domain, with the given corner number.
    SlaveCorner(usize),
    /// Corner of the master element projected onto the slave.
    MasterCorner(usize),
    /// Intersection of a projected master edge with a slave edge.
    EdgeIntersection { master_edge: usize, slave_edge: usize },
    /// Vertex average of a clipped polygon, used as the fan centre.
    Centre,
    /// Corner of a linear sub-element of the slave.
    SubElementCorner(usize),
    /// Intersection of a cell edge with an edge of a linear sub-element.
    SubElementIntersection { cell_edge: usize, subelement_edge: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellVertex<T: Scalar> {
    pub slave: Vector2<T>,
    pub master: Vector2<T>,
    pub slave_deriv: PairedVector<Vector2<T>>,
    pub master_deriv: PairedVector<Vector2<T>>,
    pub origin: VertexOrigin,
}

/// Integration cell of one slave/master pair.
///
/// Intervals have two vertices ordered by increasing slave coordinate, triangles have three
/// vertices ordered counter-clockwise in the slave reference domain.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationCell<T: Scalar> {
    pub vertices: Vec<CellVertex<T>>,
    /// Arena index of the master element.
    pub master: usize,
    /// Sub-element of the slave for piecewise linear LM.
    pub subelement: Option<usize>,
}

impl<T: Real> IntegrationCell<T> {
    pub fn is_interval(&self) -> bool {
        self.vertices.len() == 2
    }

    pub fn slave_centroid(&self) -> Vector2<T> {
        let n: T = nalgebra::convert(self.vertices.len() as f64);
        self.vertices
            .iter()
            .fold(Vector2::zeros(), |acc: Vector2<T>, v| acc + v.slave)
            / n
    }

    /// Length or area of the cell in the slave reference domain.
    pub fn slave_measure(&self) -> T {
        if self.is_interval() {
            self.vertices[1].slave.x - self.vertices[0].slave.x
        } else {
            let [a, b, c] = [0, 1, 2].map(|k| self.vertices[k].slave);
            cross2(&(b - a), &(c - a)) * nalgebra::convert(0.5)
        }
    }
}

/// A quadrature point of an integration cell mapped onto both elements.
#[derive(Debug, Clone, PartialEq)]
pub struct CellPoint<T: Scalar> {
    pub slave: Vector2<T>,
    pub master: Vector2<T>,
    pub slave_deriv: PairedVector<Vector2<T>>,
    pub master_deriv: PairedVector<Vector2<T>>,
    /// Jacobian determinant of the map from the reference cell to the slave reference domain.
    pub jacobian: T,
    pub jacobian_deriv: PairedVector<T>,
}

impl<T: Real> IntegrationCell<T> {
    /// Maps a point of the reference cell (`[-1, 1]` or the unit triangle) into the cell.
    ///
    /// Coordinates on both elements are interpolated linearly between the cell vertices.
    pub fn map_point(&self, point: &Vector2<T>) -> CellPoint<T> {
        let half: T = nalgebra::convert(0.5);
        let (phi, jacobian, jacobian_deriv) = if self.is_interval() {
            let [v0, v1] = [&self.vertices[0], &self.vertices[1]];
            let mut jacobian_deriv = PairedVector::new();
            jacobian_deriv.add_mapped(&v1.slave_deriv, |d| d.x * half);
            jacobian_deriv.add_mapped(&v0.slave_deriv, |d| -d.x * half);
            (
                vec![(T::one() - point.x) * half, (T::one() + point.x) * half],
                (v1.slave.x - v0.slave.x) * half,
                jacobian_deriv,
            )
        } else {
            let [v0, v1, v2] = [0, 1, 2].map(|k| &self.vertices[k]);
            let (e1, e2) = (v1.slave - v0.slave, v2.slave - v0.slave);
            let mut jacobian_deriv = PairedVector::new();
            jacobian_deriv.add_mapped(&v1.slave_deriv, |d| cross2(d, &e2));
            jacobian_deriv.add_mapped(&v2.slave_deriv, |d| cross2(&e1, d));
            jacobian_deriv.add_mapped(&v0.slave_deriv, |d| -cross2(d, &e2) - cross2(&e1, d));
            (
                vec![T::one() - point.x - point.y, point.x, point.y],
                cross2(&e1, &e2),
                jacobian_deriv,
            )
        };

        let mut mapped = CellPoint {
            slave: Vector2::zeros(),
            master: Vector2::zeros(),
            slave_deriv: PairedVector::new(),
            master_deriv: PairedVector::new(),
            jacobian,
            jacobian_deriv,
        };
        for (vertex, &phi_k) in self.vertices.iter().zip(&phi) {
            mapped.slave += vertex.slave * phi_k;
            mapped.master += vertex.master * phi_k;
            mapped.slave_deriv.add_scaled(&vertex.slave_deriv, phi_k);
            mapped.master_deriv.add_scaled(&vertex.master_deriv, phi_k);
        }
        mapped
    }
}

/// Directional derivative of the position of local node `k`.
pub(crate) fn node_position_deriv<T: Real>(view: &ElementView<T>, k: usize) -> PairedVector<Vector3<T>> {
    (0..view.dim())
        .map(|c| (view.dof(k, c), Vector3::ith(c, T::one())))
        .collect()
}

/// Orders cells lexicographically by their slave centroid.
pub fn sort_cells<T: Real>(cells: &mut [IntegrationCell<T>]) {
    let compare = |a: &T, b: &T| a.partial_cmp(b).unwrap_or(Ordering::Equal);
    cells.sort_by(|a, b| {
        let (ca, cb) = (a.slave_centroid(), b.slave_centroid());
        compare(&ca.x, &cb.x).then_with(|| compare(&ca.y, &cb.y))
    });
}

/// The average of a set of vertices, including coordinates on both elements and derivatives.
fn vertex_average<T: Real>(vertices: &[CellVertex<T>]) -> CellVertex<T> {
    let factor = T::one() / nalgebra::convert::<_, T>(vertices.len() as f64);
    let mut centre = CellVertex {
        slave: Vector2::zeros(),
        master: Vector2::zeros(),
        slave_deriv: PairedVector::new(),
        master_deriv: PairedVector::new(),
        origin: VertexOrigin::Centre,
    };
    for v in vertices {
        centre.slave += v.slave * factor;
        centre.master += v.master * factor;
        centre.slave_deriv.add_scaled(&v.slave_deriv, factor);
        centre.master_deriv.add_scaled(&v.master_deriv, factor);
    }
    centre
}

/// Splits a convex counter-clockwise polygon into triangles around its vertex average.
///
/// Triangles with a slave area below `min_area` are dropped.
fn fan_triangulate<T: Real>(
    polygon: &[CellVertex<T>],
    master: usize,
    subelement: Option<usize>,
    min_area: T,
) -> Vec<IntegrationCell<T>> {
    let centre = vertex_average(polygon);
    polygon
        .iter()
        .circular_tuple_windows()
        .map(|(a, b)| IntegrationCell {
            vertices: vec![centre.clone(), a.clone(), b.clone()],
            master,
            subelement,
        })
        .filter(|cell| {
            let keep = cell.slave_measure() >= min_area;
            if !keep {
                log::debug!("Discarding cell with slave area {:?}", cell.slave_measure());
            }
            keep
        })
        .collect()
}

/// Intersection of the edge `p -> q` (with derivatives) with the fixed line `c + s * dir`.
///
/// Returns the interpolated vertex, or `None` if the edge is parallel to the line.
fn edge_line_intersection<T: Real>(
    p: &CellVertex<T>,
    q: &CellVertex<T>,
    c: &Vector2<T>,
    dir: &Vector2<T>,
    origin: VertexOrigin,
) -> Option<CellVertex<T>> {
    let r = q.slave - p.slave;
    let system = Matrix2::from_columns(&[r, -dir]);
    let inverse = system.try_inverse()?;
    let t = (inverse * (c - p.slave)).x;

    let mut slave_deriv = p.slave_deriv.clone();
    slave_deriv.add_scaled(&q.slave_deriv, t);
    slave_deriv.add_scaled(&p.slave_deriv, -t);
    // [r, -dir] [dt, ds]^T = -(dP + t dr)
    let dt = slave_deriv.map(|d| -(inverse * d).x);
    slave_deriv.add_mapped(&dt, |dt| r * *dt);

    let dm = q.master - p.master;
    let mut master_deriv = p.master_deriv.clone();
    master_deriv.add_scaled(&q.master_deriv, t);
    master_deriv.add_scaled(&p.master_deriv, -t);
    master_deriv.add_mapped(&dt, |dt| dm * *dt);

    Some(CellVertex {
        slave: p.slave + r * t,
        master: p.master + dm * t,
        slave_deriv,
        master_deriv,
        origin,
    })
}

/// Segments one slave/master pair into integration cells.
///
/// An empty list means that the pair does not overlap. Cells are sorted by
/// [`sort_cells`].
pub fn segment_pair<T: Real>(
    slave: &ElementView<T>,
    master: &ElementView<T>,
    config: &CoreConfig,
) -> Result<Vec<IntegrationCell<T>>, MortarError> {
    let mut cells = if slave.dim() == 2 {
        interval::interval_cells(slave, master, config)?
    } else {
        let cells = clip::clip_cells(slave, master, config)?;
        if config.lm_shape == LagrangeMultiplierShape::PiecewiseLinear {
            pwlin::split_by_subelements(slave, cells, config)?
        } else {
            cells
        }
    };
    sort_cells(&mut cells);
    Ok(cells)
}
