//! Overlap of line elements in 2D problems.
use super::{node_position_deriv, CellVertex, IntegrationCell, VertexOrigin};
use crate::config::CoreConfig;
use crate::element::ElementView;
use crate::error::MortarError;
use crate::paired::PairedVector;
use crate::projector::{project_point, projection_deriv, Projection};
use log::{debug, warn};
use mortar_traits::Real;
use nalgebra::Vector2;

/// Topological configuration of a 2D slave/master pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OverlapKind {
    None,
    /// Both interval endpoints are slave corners.
    SlaveCovered,
    /// Both interval endpoints are projected master corners.
    MasterCovered,
    /// The lower endpoint is a projected master corner, the upper one a slave corner.
    LowerTrimmed,
    /// The lower endpoint is a slave corner, the upper one a projected master corner.
    UpperTrimmed,
}

/// Source of an interval endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Slave corner `0` (at `-1`) or `1` (at `1`).
    Slave(usize),
    /// Master corner `0` (at `-1`) or `1` (at `1`).
    Master(usize),
}

/// Projection data of the four end nodes of a pair of line elements.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IntervalOverlap<T> {
    /// Slave coordinates of the interval, `(lower, upper)`.
    pub slave: (T, T),
    pub lower: Endpoint,
    pub upper: Endpoint,
    pub kind: OverlapKind,
}

/// Determines the overlap interval from the feasibility flags and projected coordinates.
///
/// `slave_on_master` holds whether the slave corners at `-1` and `1` project onto the master.
/// `master_on_slave` holds the slave coordinates of the projected master corners at `-1` and `1`,
/// or `None` if the projection is infeasible. The master is traversed in the opposite direction,
/// so its corner at `1` is the candidate for the lower endpoint.
pub fn classify_interval_overlap<T: Real>(
    slave_on_master: [bool; 2],
    master_on_slave: [Option<T>; 2],
    tol: T,
) -> IntervalOverlap<T> {
    let one = T::one();
    let none = IntervalOverlap {
        slave: (-one, one),
        lower: Endpoint::Slave(0),
        upper: Endpoint::Slave(1),
        kind: OverlapKind::None,
    };

    let slave_interior = |xi: T| xi > -one + tol && xi < one - tol;
    if slave_on_master[0] && slave_on_master[1] && master_on_slave.iter().flatten().any(|&xi| slave_interior(xi)) {
        warn!("Inconsistent overlap: slave is covered, but a master node projects into its interior");
    }

    // The slave corner wins ties and any candidate beyond the slave corner
    let lower = match master_on_slave[1] {
        Some(xi) if xi > -one + tol => Some((xi, Endpoint::Master(1))),
        Some(_) => Some((-one, Endpoint::Slave(0))),
        None if slave_on_master[0] => Some((-one, Endpoint::Slave(0))),
        None => None,
    };
    let upper = match master_on_slave[0] {
        Some(xi) if xi < one - tol => Some((xi, Endpoint::Master(0))),
        Some(_) => Some((one, Endpoint::Slave(1))),
        None if slave_on_master[1] => Some((one, Endpoint::Slave(1))),
        None => None,
    };

    match (lower, upper) {
        (Some((a, lower)), Some((b, upper))) if b - a > tol => {
            let kind = match (lower, upper) {
                (Endpoint::Slave(_), Endpoint::Slave(_)) => OverlapKind::SlaveCovered,
                (Endpoint::Master(_), Endpoint::Master(_)) => OverlapKind::MasterCovered,
                (Endpoint::Master(_), Endpoint::Slave(_)) => OverlapKind::LowerTrimmed,
                (Endpoint::Slave(_), Endpoint::Master(_)) => OverlapKind::UpperTrimmed,
            };
            IntervalOverlap {
                slave: (a, b),
                lower,
                upper,
                kind,
            }
        }
        _ => none,
    }
}

/// Projects the corner nodes of `source` onto `target`.
fn project_corners<T: Real>(
    source: &ElementView<T>,
    target: &ElementView<T>,
    config: &CoreConfig,
) -> [Projection<T>; 2] {
    let corners = source.cell().corner_nodes();
    [0, 1].map(|c| project_point(target, &source.node(corners[c]).position(), config))
}

fn endpoint_vertex<T: Real>(
    endpoint: Endpoint,
    slave: &ElementView<T>,
    master: &ElementView<T>,
    slave_projections: &[Projection<T>; 2],
    master_projections: &[Projection<T>; 2],
) -> Result<CellVertex<T>, MortarError> {
    let corner_coord = |c: usize| if c == 0 { -T::one() } else { T::one() };
    match endpoint {
        Endpoint::Slave(c) => {
            let projection = &slave_projections[c];
            if !projection.converged {
                return Err(MortarError::integration(
                    slave.id(),
                    format!("projection of slave corner {} onto master {} did not converge", c, master.id()),
                ));
            }
            let node = slave.cell().corner_nodes()[c];
            let point_deriv = node_position_deriv(slave, node);
            Ok(CellVertex {
                slave: Vector2::new(corner_coord(c), T::zero()),
                master: projection.xi,
                slave_deriv: PairedVector::new(),
                master_deriv: projection_deriv(master, projection, &point_deriv)?,
                origin: VertexOrigin::SlaveCorner(c),
            })
        }
        Endpoint::Master(c) => {
            let projection = &master_projections[c];
            let node = master.cell().corner_nodes()[c];
            let point_deriv = node_position_deriv(master, node);
            Ok(CellVertex {
                slave: projection.xi,
                master: Vector2::new(corner_coord(c), T::zero()),
                slave_deriv: projection_deriv(slave, projection, &point_deriv)?,
                master_deriv: PairedVector::new(),
                origin: VertexOrigin::MasterCorner(c),
            })
        }
    }
}

/// Computes the overlap interval of a pair of line elements as a single integration cell.
pub(super) fn interval_cells<T: Real>(
    slave: &ElementView<T>,
    master: &ElementView<T>,
    config: &CoreConfig,
) -> Result<Vec<IntegrationCell<T>>, MortarError> {
    let slave_projections = project_corners(slave, master, config);
    let master_projections = project_corners(master, slave, config);
    let overlap = classify_interval_overlap(
        slave_projections.map(|p| p.feasible),
        master_projections.map(|p| Some(p.xi.x).filter(|_| p.feasible)),
        nalgebra::convert(config.clip_tolerance),
    );
    debug!(
        "Slave {} / master {}: {:?} on [{:?}, {:?}]",
        slave.id(),
        master.id(),
        overlap.kind,
        overlap.slave.0,
        overlap.slave.1
    );
    if overlap.kind == OverlapKind::None {
        return Ok(Vec::new());
    }

    let lower = endpoint_vertex(overlap.lower, slave, master, &slave_projections, &master_projections)?;
    let upper = endpoint_vertex(overlap.upper, slave, master, &slave_projections, &master_projections)?;
    Ok(vec![IntegrationCell {
        vertices: vec![lower, upper],
        master: master.index(),
        subelement: None,
    }])
}
