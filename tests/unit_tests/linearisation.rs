use mortar::config::{
    ConsistentDual, CoreConfig, IntegrationType, LagrangeMultiplierOrder, LagrangeMultiplierShape,
};
use mortar::coupling::Interface;
use mortar::element::nurbs::NurbsData;
use mortar::element::CellType;
use mortar::mesh::{Node, Side, SurfaceMesh};
use mortar::nalgebra::{DVector, Rotation3, Unit, Vector2, Vector3};

use super::{assert_linearisation_matches_finite_differences, build_mesh, entry, line2_pair, partial_tri3_pair};

/// A deterministic, small, non-uniform displacement field.
fn perturbation(num_dofs: usize, amplitude: f64) -> DVector<f64> {
    DVector::from_fn(num_dofs, |i, _| amplitude * ((i as f64) * 1.7 + 0.3).sin())
}

fn tilted_line_pair() -> mortar::mesh::SurfaceMesh<f64> {
    line2_pair([[0.0, 0.0], [1.0, 0.1]], [[1.3, -0.05], [0.4, 0.02]])
}

#[test]
fn line2_dual_operators() {
    let interface = Interface::new(tilted_line_pair(), CoreConfig::default()).unwrap();
    assert_linearisation_matches_finite_differences(interface, perturbation(8, 0.01));
}

#[test]
fn line2_standard_operators() {
    let config = CoreConfig {
        lm_shape: LagrangeMultiplierShape::Standard,
        ..CoreConfig::default()
    };
    let interface = Interface::new(tilted_line_pair(), config).unwrap();
    assert_linearisation_matches_finite_differences(interface, perturbation(8, 0.01));
}

#[test]
fn line2_consistent_dual_operators() {
    let config = CoreConfig {
        consistent_dual: ConsistentDual::Boundary,
        ..CoreConfig::default()
    };
    let interface = Interface::new(tilted_line_pair(), config).unwrap();
    assert_linearisation_matches_finite_differences(interface, perturbation(8, 0.01));
}

#[test]
fn line2_element_based_operators() {
    let config = CoreConfig {
        integration: IntegrationType::Elements,
        ..CoreConfig::default()
    };
    // The master covers the slave, so every Gauss point projects
    let mesh = line2_pair([[0.0, 0.0], [1.0, 0.1]], [[1.5, -0.05], [-0.4, 0.02]]);
    let interface = Interface::new(mesh, config).unwrap();
    assert_linearisation_matches_finite_differences(interface, perturbation(8, 0.01));
}

#[test]
fn curved_line3_operators() {
    let mesh = build_mesh(
        2,
        &[
            (0, [0.0, 0.0, 0.0]),
            (1, [1.0, 0.0, 0.0]),
            (2, [0.5, 0.05, 0.0]),
            (10, [1.2, -0.05, 0.0]),
            (11, [0.3, 0.01, 0.0]),
        ],
        &[
            (0, CellType::Line3, Side::Slave, &[0, 1, 2]),
            (1, CellType::Line2, Side::Master, &[10, 11]),
        ],
    );
    let interface = Interface::new(mesh, CoreConfig::default()).unwrap();
    assert_linearisation_matches_finite_differences(interface, perturbation(10, 0.005));
}

#[test]
fn partial_tri3_dual_operators() {
    let interface = Interface::new(partial_tri3_pair(), CoreConfig::default()).unwrap();
    assert_linearisation_matches_finite_differences(interface, perturbation(18, 0.01));
}

#[test]
fn partial_tri3_consistent_dual_operators() {
    let config = CoreConfig {
        consistent_dual: ConsistentDual::All,
        ..CoreConfig::default()
    };
    let interface = Interface::new(partial_tri3_pair(), config).unwrap();
    assert_linearisation_matches_finite_differences(interface, perturbation(18, 0.01));
}

#[test]
fn partial_quad4_standard_operators() {
    let mesh = build_mesh(
        3,
        &[
            (0, [0.0, 0.0, 0.0]),
            (1, [1.0, 0.0, 0.02]),
            (2, [1.0, 1.0, 0.0]),
            (3, [0.0, 1.0, -0.01]),
            (10, [0.3, 0.2, 0.1]),
            (11, [0.4, 1.4, 0.12]),
            (12, [1.5, 1.3, 0.08]),
            (13, [1.4, 0.3, 0.1]),
        ],
        &[
            (0, CellType::Quad4, Side::Slave, &[0, 1, 2, 3]),
            (1, CellType::Quad4, Side::Master, &[10, 11, 12, 13]),
        ],
    );
    let config = CoreConfig {
        lm_shape: LagrangeMultiplierShape::Standard,
        ..CoreConfig::default()
    };
    let interface = Interface::new(mesh, config).unwrap();
    assert_linearisation_matches_finite_differences(interface, perturbation(24, 0.005));
}

/// Tri6 slave over the unit triangle, lifted to `z = 0.04 ξ η`, with the given tri3 master at
/// `z = 0.1`.
fn curved_tri6_pair(master: [[f64; 2]; 3]) -> SurfaceMesh<f64> {
    let mut nodes: Vec<(usize, [f64; 3])> = (0..6)
        .map(|k| {
            let xi: Vector2<f64> = CellType::Tri6.node_parametric_coords(k);
            (k, [xi.x, xi.y, 0.04 * xi.x * xi.y])
        })
        .collect();
    nodes.extend(master.iter().enumerate().map(|(k, [x, y])| (10 + k, [*x, *y, 0.1])));
    build_mesh(
        3,
        &nodes,
        &[
            (0, CellType::Tri6, Side::Slave, &[0, 1, 2, 3, 4, 5]),
            (1, CellType::Tri3, Side::Master, &[10, 11, 12]),
        ],
    )
}

#[test]
fn piecewise_linear_lm_on_tri6_across_subelements() {
    // The master lies inside the slave and crosses the edges of all four sub-elements
    let mesh = curved_tri6_pair([[0.1, 0.1], [0.15, 0.7], [0.7, 0.15]]);
    let config = CoreConfig {
        lm_shape: LagrangeMultiplierShape::PiecewiseLinear,
        ..CoreConfig::default()
    };
    let interface = Interface::new(mesh, config).unwrap();
    assert_linearisation_matches_finite_differences(interface, perturbation(27, 0.005));
}

#[test]
fn linear_lm_on_partially_covered_tri6_with_consistent_dual() {
    let mesh = curved_tri6_pair([[0.6, -0.3], [-0.3, -0.3], [-0.3, 0.6]]);
    let config = CoreConfig {
        lm_quad: LagrangeMultiplierOrder::Linear,
        consistent_dual: ConsistentDual::Boundary,
        ..CoreConfig::default()
    };
    let interface = Interface::new(mesh, config).unwrap();
    assert_linearisation_matches_finite_differences(interface, perturbation(27, 0.005));
}

#[test]
fn nurbs3_slave_operators() {
    let mut mesh = SurfaceMesh::new(2).unwrap();
    for (id, [x, y], weight) in [(0, [0.0, 0.0], 1.0), (1, [0.5, 0.06], 0.8), (2, [1.0, 0.0], 1.0)] {
        mesh.add_node(Node::new(id, Vector3::new(x, y, 0.0)).with_weight(weight))
            .unwrap();
    }
    for (id, [x, y]) in [(10, [1.3, -0.08]), (11, [0.4, -0.05])] {
        mesh.add_node(Node::new(id, Vector3::new(x, y, 0.0))).unwrap();
    }
    mesh.add_element(0, CellType::Nurbs3, Side::Slave, &[0, 1, 2])
        .unwrap()
        .nurbs = Some(NurbsData::new(vec![vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]]));
    mesh.add_element(1, CellType::Line2, Side::Master, &[10, 11])
        .unwrap();

    let interface = Interface::new(mesh, CoreConfig::default()).unwrap();
    assert_linearisation_matches_finite_differences(interface, perturbation(10, 0.005));
}

#[test]
fn element_based_integration_with_segment_fallback() {
    // Slave 0 is covered by the master, slave 1 only partially and falls back to segments
    let mesh = build_mesh(
        2,
        &[
            (0, [0.0, 0.0, 0.0]),
            (1, [0.5, 0.02, 0.0]),
            (2, [1.0, 0.1, 0.0]),
            (10, [0.9, -0.05, 0.0]),
            (11, [-0.4, 0.02, 0.0]),
        ],
        &[
            (0, CellType::Line2, Side::Slave, &[0, 1]),
            (1, CellType::Line2, Side::Slave, &[1, 2]),
            (2, CellType::Line2, Side::Master, &[10, 11]),
        ],
    );
    let config = CoreConfig {
        integration: IntegrationType::ElementsBoundarySegmentation,
        ..CoreConfig::default()
    };
    let interface = Interface::new(mesh, config).unwrap();
    assert_linearisation_matches_finite_differences(interface, perturbation(10, 0.01));
}

/// Quadratic quadrilateral slave over `[0, 1]^2`, lifted to `z = 0.01 (2 - ξ² - η²)`, partially
/// covered by a quad4 master at `z = 0.1`.
fn curved_quadratic_quad_pair(cell: CellType) -> SurfaceMesh<f64> {
    let n = cell.num_nodes();
    let mut nodes: Vec<(usize, [f64; 3])> = (0..n)
        .map(|k| {
            let xi: Vector2<f64> = cell.node_parametric_coords(k);
            let z = 0.01 * (2.0 - xi.x * xi.x - xi.y * xi.y);
            (k, [0.5 * (xi.x + 1.0), 0.5 * (xi.y + 1.0), z])
        })
        .collect();
    nodes.extend([
        (20, [0.3, 0.2, 0.1]),
        (21, [0.35, 1.15, 0.1]),
        (22, [1.15, 1.1, 0.1]),
        (23, [1.1, 0.25, 0.1]),
    ]);
    let slave_nodes: Vec<usize> = (0..n).collect();
    build_mesh(
        3,
        &nodes,
        &[
            (0, cell, Side::Slave, slave_nodes.as_slice()),
            (1, CellType::Quad4, Side::Master, &[20, 21, 22, 23]),
        ],
    )
}

#[test]
fn curved_quad9_dual_operators() {
    let interface = Interface::new(curved_quadratic_quad_pair(CellType::Quad9), CoreConfig::default()).unwrap();
    assert_linearisation_matches_finite_differences(interface, perturbation(39, 0.003));
}

#[test]
fn curved_quad8_standard_operators() {
    let config = CoreConfig {
        lm_shape: LagrangeMultiplierShape::Standard,
        ..CoreConfig::default()
    };
    let interface = Interface::new(curved_quadratic_quad_pair(CellType::Quad8), config).unwrap();
    assert_linearisation_matches_finite_differences(interface, perturbation(36, 0.003));
}

#[test]
fn rigid_motion_leaves_curved_quad9_operators_unchanged() {
    let mut interface = Interface::new(curved_quadratic_quad_pair(CellType::Quad9), CoreConfig::default()).unwrap();
    let before = interface.evaluate().unwrap();

    let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(Vector3::new(1.0, 2.0, 0.5)), 0.7);
    let translation = Vector3::new(0.3, -1.2, 2.0);
    let num_dofs = interface.mesh().num_dofs();
    let mut u = DVector::zeros(num_dofs);
    for n in 0..interface.mesh().nodes().len() {
        let x = interface.mesh().node(n).reference;
        let moved = rotation * x + translation;
        for c in 0..3 {
            u[interface.mesh().dof(n, c)] = moved[c] - x[c];
        }
    }
    interface.update_displacements(&u);
    interface.begin_iteration();
    let after = interface.evaluate().unwrap();

    let mut total_gap = 0.0;
    for (a, b) in before[0].nodes.iter().zip(&after[0].nodes) {
        assert_eq!(a.node, b.node);
        assert!((a.gap - b.gap).abs() < 1e-12, "gap of node {}: {} vs {}", a.node, a.gap, b.gap);
        for (j, &value) in a.d.iter() {
            assert!((value - entry(&b.d, j)).abs() < 1e-12);
        }
        for (j, &value) in a.m.iter() {
            assert!((value - entry(&b.m, j)).abs() < 1e-12);
        }
        total_gap += a.gap;
    }
    assert!(total_gap.abs() > 1e-6);
}
