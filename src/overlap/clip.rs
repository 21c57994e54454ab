//! Overlap of surface elements in 3D problems.
use super::{edge_line_intersection, fan_triangulate, node_position_deriv, CellVertex, IntegrationCell, VertexOrigin};
use crate::config::CoreConfig;
use crate::element::ElementView;
use crate::error::MortarError;
use crate::paired::PairedVector;
use crate::projector::{project_point, projection_deriv, Projection};
use log::debug;
use mortar_geometry::clip::{clip_convex_polygons, ClipVertexKind};
use mortar_geometry::polygon::SimplePolygon2d;
use mortar_traits::Real;
use nalgebra::Point2;

/// Clips the projected master polygon against the slave reference domain and triangulates the
/// result.
pub(super) fn clip_cells<T: Real>(
    slave: &ElementView<T>,
    master: &ElementView<T>,
    config: &CoreConfig,
) -> Result<Vec<IntegrationCell<T>>, MortarError> {
    let tol: T = nalgebra::convert(config.clip_tolerance);
    let master_corners = master.cell().corner_nodes();
    let projections: Vec<Projection<T>> = master_corners
        .iter()
        .map(|&k| project_point(slave, &master.node(k).position(), config))
        .collect();
    if let Some(corner) = projections.iter().position(|p| !p.converged) {
        return Err(MortarError::integration(
            slave.id(),
            format!(
                "projection of master {} corner {} onto the slave did not converge",
                master.id(),
                corner
            ),
        ));
    }

    let projected = SimplePolygon2d::from_vertices(projections.iter().map(|p| Point2::from(p.xi)).collect());
    let (subject, permutation) = projected.to_counterclockwise();
    if !subject.is_convex_counterclockwise(tol) {
        return Err(MortarError::integration(
            slave.id(),
            format!("projection of master {} onto the slave is not convex", master.id()),
        ));
    }

    let clip_polygon = slave.cell().corner_polygon::<T>();
    let clipped = clip_convex_polygons(subject.vertices(), &clip_polygon, tol)
        .map_err(|err| MortarError::integration(slave.id(), format!("clipping against master {}: {}", master.id(), err)))?;
    if clipped.is_empty() {
        debug!("Master {} does not overlap slave {}", master.id(), slave.id());
        return Ok(Vec::new());
    }

    // Vertices of the projected master polygon in counter-clockwise order
    let master_reference = master.cell().corner_polygon::<T>();
    let subject_vertices = permutation
        .iter()
        .map(|&corner| {
            let point_deriv = node_position_deriv(master, master_corners[corner]);
            Ok(CellVertex {
                slave: projections[corner].xi,
                master: master_reference[corner].coords,
                slave_deriv: projection_deriv(slave, &projections[corner], &point_deriv)?,
                master_deriv: PairedVector::new(),
                origin: VertexOrigin::MasterCorner(corner),
            })
        })
        .collect::<Result<Vec<_>, MortarError>>()?;

    let n_subject = subject_vertices.len();
    let n_clip = clip_polygon.len();
    let mut polygon = Vec::with_capacity(clipped.len());
    for vertex in &clipped {
        let cell_vertex = match vertex.kind {
            ClipVertexKind::Subject(i) => subject_vertices[i].clone(),
            ClipVertexKind::Clip(j) => slave_corner_vertex(slave, master, j, config)?,
            ClipVertexKind::Intersection { subject_edge, clip_edge } => {
                let p = &subject_vertices[subject_edge];
                let q = &subject_vertices[(subject_edge + 1) % n_subject];
                let c = clip_polygon[clip_edge].coords;
                let dir = clip_polygon[(clip_edge + 1) % n_clip].coords - c;
                let origin = VertexOrigin::EdgeIntersection {
                    master_edge: subject_edge,
                    slave_edge: clip_edge,
                };
                edge_line_intersection(p, q, &c, &dir, origin).ok_or_else(|| {
                    MortarError::integration(slave.id(), "parallel edges produced an intersection vertex")
                })?
            }
        };
        polygon.push(cell_vertex);
    }

    let min_area = nalgebra::convert::<_, T>(config.min_cell_area_fraction) * slave.cell().reference_measure();
    Ok(fan_triangulate(&polygon, master.index(), None, min_area))
}

/// Cell vertex at slave corner `j`, whose master coordinates follow from projecting the corner
/// node onto the master.
fn slave_corner_vertex<T: Real>(
    slave: &ElementView<T>,
    master: &ElementView<T>,
    j: usize,
    config: &CoreConfig,
) -> Result<CellVertex<T>, MortarError> {
    let node = slave.cell().corner_nodes()[j];
    let projection = project_point(master, &slave.node(node).position(), config);
    if !projection.converged {
        return Err(MortarError::integration(
            slave.id(),
            format!("projection of slave corner {} onto master {} did not converge", j, master.id()),
        ));
    }
    let point_deriv = node_position_deriv(slave, node);
    Ok(CellVertex {
        slave: slave.cell().node_parametric_coords(node),
        master: projection.xi,
        slave_deriv: PairedVector::new(),
        master_deriv: projection_deriv(master, &projection, &point_deriv)?,
        origin: VertexOrigin::SlaveCorner(j),
    })
}
