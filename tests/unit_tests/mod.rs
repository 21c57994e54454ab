use mortar::config::CoreConfig;
use mortar::coupling::Interface;
use mortar::element::CellType;
use mortar::integrate::{ElementContribution, NodeContribution};
use mortar::mesh::{Node, Side, SurfaceMesh};
use mortar::nalgebra::{DMatrix, DVector, Vector3};
use mortar::optimize::calculus::approximate_jacobian_fd_into;

mod assembly;
mod config;
mod dual;
mod linearisation;
mod scenarios_3d;

/// Builds a mesh from `(id, [x, y, z])` node data and `(id, cell, side, node ids)` element data.
pub fn build_mesh(
    dim: usize,
    nodes: &[(usize, [f64; 3])],
    elements: &[(usize, CellType, Side, &[usize])],
) -> SurfaceMesh<f64> {
    let mut mesh = SurfaceMesh::new(dim).unwrap();
    for &(id, [x, y, z]) in nodes {
        mesh.add_node(Node::new(id, Vector3::new(x, y, z))).unwrap();
    }
    for &(id, cell, side, node_ids) in elements {
        mesh.add_element(id, cell, side, node_ids).unwrap();
    }
    mesh
}

/// Two line2 elements in 2D: slave `0 -> 1` and master `10 -> 11`.
pub fn line2_pair(slave: [[f64; 2]; 2], master: [[f64; 2]; 2]) -> SurfaceMesh<f64> {
    let [s0, s1] = slave;
    let [m0, m1] = master;
    build_mesh(
        2,
        &[
            (0, [s0[0], s0[1], 0.0]),
            (1, [s1[0], s1[1], 0.0]),
            (10, [m0[0], m0[1], 0.0]),
            (11, [m1[0], m1[1], 0.0]),
        ],
        &[
            (0, CellType::Line2, Side::Slave, &[0, 1]),
            (1, CellType::Line2, Side::Master, &[10, 11]),
        ],
    )
}

/// Unit right triangle as tri3 slave at `z = 0` and the tri3 master `A, C, B` at `z = 0.1`,
/// overlapping in the triangle `(0, 0), (0.3, 0), (0, 0.3)`.
pub fn partial_tri3_pair() -> SurfaceMesh<f64> {
    build_mesh(
        3,
        &[
            (0, [0.0, 0.0, 0.0]),
            (1, [1.0, 0.0, 0.0]),
            (2, [0.0, 1.0, 0.0]),
            (10, [0.6, -0.3, 0.1]),
            (11, [-0.3, -0.3, 0.1]),
            (12, [-0.3, 0.6, 0.1]),
        ],
        &[
            (0, CellType::Tri3, Side::Slave, &[0, 1, 2]),
            (1, CellType::Tri3, Side::Master, &[10, 11, 12]),
        ],
    )
}

pub fn node<'a>(contribution: &'a ElementContribution<f64>, id: usize) -> &'a NodeContribution<f64> {
    contribution
        .nodes
        .iter()
        .find(|node| node.node == id)
        .expect("node must be part of the element")
}

pub fn entry(values: &mortar::paired::PairedVector<f64>, key: usize) -> f64 {
    values.get(key).copied().unwrap_or(0.0)
}

/// Which operator entry of a node contribution a row of the linearisation check refers to.
#[derive(Debug, Copy, Clone)]
enum Entry {
    D(usize),
    M(usize),
    Gap,
    Pressure,
}

fn entry_value(node: &NodeContribution<f64>, entry: Entry) -> f64 {
    match entry {
        Entry::D(j) => self::entry(&node.d, j),
        Entry::M(j) => self::entry(&node.m, j),
        Entry::Gap => node.gap,
        Entry::Pressure => node.contact.as_ref().map(|c| c.pressure).unwrap_or(0.0),
    }
}

fn entry_deriv(node: &NodeContribution<f64>, entry: Entry, dof: usize) -> f64 {
    let nested = |derivs: &mortar::paired::PairedVector<mortar::paired::PairedVector<f64>>, j: usize| {
        derivs.get(j).map(|d| self::entry(d, dof)).unwrap_or(0.0)
    };
    match entry {
        Entry::D(j) => nested(&node.d_deriv, j),
        Entry::M(j) => nested(&node.m_deriv, j),
        Entry::Gap => self::entry(&node.gap_deriv, dof),
        Entry::Pressure => node
            .contact
            .as_ref()
            .map(|c| self::entry(&c.pressure_deriv, dof))
            .unwrap_or(0.0),
    }
}

/// Compares the directional derivatives of `D`, `M`, the weighted gap and (in contact mode) the
/// weighted pressure with central differences around the displacement `u0`.
pub fn assert_linearisation_matches_finite_differences(mut interface: Interface<f64>, u0: DVector<f64>) {
    let num_dofs = interface.mesh().num_dofs();
    assert_eq!(u0.len(), num_dofs);
    interface.update_displacements(&u0);
    interface.begin_iteration();
    let base = interface.evaluate().unwrap();

    let mut layout = Vec::new();
    for (e, element) in base.iter().enumerate() {
        for (n, node) in element.nodes.iter().enumerate() {
            layout.extend(node.d.keys().map(|j| (e, n, Entry::D(j))));
            layout.extend(node.m.keys().map(|j| (e, n, Entry::M(j))));
            layout.push((e, n, Entry::Gap));
            if node.contact.is_some() {
                layout.push((e, n, Entry::Pressure));
            }
        }
    }
    assert!(!layout.is_empty());

    let exact = DMatrix::from_fn(layout.len(), num_dofs, |row, dof| {
        let (e, n, entry) = layout[row];
        entry_deriv(&base[e].nodes[n], entry, dof)
    });

    let mut approx = DMatrix::zeros(layout.len(), num_dofs);
    let mut u = u0.clone();
    approximate_jacobian_fd_into(
        &mut approx,
        |u, mut out| {
            interface.update_displacements(&u.clone_owned());
            interface.begin_iteration();
            let perturbed = interface.evaluate().unwrap();
            for (row, &(e, n, entry)) in layout.iter().enumerate() {
                out[row] = entry_value(&perturbed[e].nodes[n], entry);
            }
        },
        &mut u,
        1e-7,
    );

    for row in 0..layout.len() {
        for dof in 0..num_dofs {
            let (a, b) = (exact[(row, dof)], approx[(row, dof)]);
            assert!(
                (a - b).abs() <= 1e-5 * f64::max(a.abs(), 1.0),
                "derivative of {:?} w.r.t. DOF {}: exact {:e}, finite difference {:e}",
                layout[row],
                dof,
                a,
                b
            );
        }
    }
}

pub fn default_interface(mesh: SurfaceMesh<f64>) -> Interface<f64> {
    Interface::new(mesh, CoreConfig::default()).unwrap()
}
