//! Intersection of integration cells with the linear sub-elements of a quadratic slave.
use super::{edge_line_intersection, fan_triangulate, CellVertex, IntegrationCell, VertexOrigin};
use crate::config::CoreConfig;
use crate::element::lagmult::{piecewise_linear_subelements, subelement_polygon};
use crate::element::ElementView;
use crate::error::MortarError;
use mortar_geometry::clip::{clip_convex_polygons, ClipVertexKind};
use mortar_traits::Real;
use nalgebra::{Matrix2, Point2, Vector2};

/// Vertex at a point `xi` inside a triangular cell, interpolated barycentrically.
fn interpolate_in_cell<T: Real>(cell: &IntegrationCell<T>, xi: &Vector2<T>, origin: VertexOrigin) -> Option<CellVertex<T>> {
    let [v0, v1, v2] = [0, 1, 2].map(|k| &cell.vertices[k]);
    let (e1, e2) = (v1.slave - v0.slave, v2.slave - v0.slave);
    let inverse = Matrix2::from_columns(&[e1, e2]).try_inverse()?;
    let lambda = inverse * (xi - v0.slave);
    let (dm1, dm2) = (v1.master - v0.master, v2.master - v0.master);

    // The point is fixed: E [dl1, dl2]^T = -(dv0 + l1 de1 + l2 de2)
    let mut rhs = v0.slave_deriv.clone();
    rhs.add_scaled(&v1.slave_deriv, lambda.x);
    rhs.add_scaled(&v2.slave_deriv, lambda.y);
    rhs.add_scaled(&v0.slave_deriv, -(lambda.x + lambda.y));
    let dlambda = rhs.map(|d| -(inverse * d));

    let mut master_deriv = v0.master_deriv.clone();
    master_deriv.add_scaled(&v1.master_deriv, lambda.x);
    master_deriv.add_scaled(&v2.master_deriv, lambda.y);
    master_deriv.add_scaled(&v0.master_deriv, -(lambda.x + lambda.y));
    master_deriv.add_mapped(&dlambda, |dl| dm1 * dl.x + dm2 * dl.y);

    Some(CellVertex {
        slave: *xi,
        master: v0.master + dm1 * lambda.x + dm2 * lambda.y,
        slave_deriv: Default::default(),
        master_deriv,
        origin,
    })
}

/// Splits triangular cells along the boundaries of the linear sub-elements of the slave.
pub(super) fn split_by_subelements<T: Real>(
    slave: &ElementView<T>,
    cells: Vec<IntegrationCell<T>>,
    config: &CoreConfig,
) -> Result<Vec<IntegrationCell<T>>, MortarError> {
    let cell_type = slave.cell();
    let subelements = piecewise_linear_subelements(cell_type).map_err(|msg| MortarError::usage(slave.id(), msg))?;
    let tol: T = nalgebra::convert(config.clip_tolerance);
    let min_area = nalgebra::convert::<_, T>(config.min_cell_area_fraction) * cell_type.reference_measure();

    let mut result = Vec::new();
    for cell in &cells {
        let subject: Vec<Point2<T>> = cell.vertices.iter().map(|v| Point2::from(v.slave)).collect();
        for (s, nodes) in subelements.iter().enumerate() {
            let sub_polygon: Vec<Point2<T>> = subelement_polygon(cell_type, nodes);
            let clipped = clip_convex_polygons(&subject, &sub_polygon, tol)
                .map_err(|err| MortarError::integration(slave.id(), format!("sub-element clipping: {}", err)))?;
            if clipped.is_empty() {
                continue;
            }
            let mut polygon = Vec::with_capacity(clipped.len());
            for vertex in &clipped {
                let cell_vertex = match vertex.kind {
                    ClipVertexKind::Subject(i) => Some(cell.vertices[i].clone()),
                    ClipVertexKind::Clip(j) => {
                        interpolate_in_cell(cell, &vertex.point.coords, VertexOrigin::SubElementCorner(j))
                    }
                    ClipVertexKind::Intersection { subject_edge, clip_edge } => {
                        let p = &cell.vertices[subject_edge];
                        let q = &cell.vertices[(subject_edge + 1) % 3];
                        let c = sub_polygon[clip_edge].coords;
                        let dir = sub_polygon[(clip_edge + 1) % sub_polygon.len()].coords - c;
                        let origin = VertexOrigin::SubElementIntersection {
                            cell_edge: subject_edge,
                            subelement_edge: clip_edge,
                        };
                        edge_line_intersection(p, q, &c, &dir, origin)
                    }
                };
                polygon.push(cell_vertex.ok_or_else(|| {
                    MortarError::integration(slave.id(), "degenerate cell in sub-element clipping")
                })?);
            }
            result.extend(fan_triangulate(&polygon, cell.master, Some(s), min_area));
        }
    }
    Ok(result)
}
