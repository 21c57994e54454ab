use mortar::config::{CoreConfig, LagrangeMultiplierShape};
use mortar::coupling::Interface;
use mortar::element::CellType;
use mortar::mesh::Side;
use mortar::overlap::segment_pair;

use super::{build_mesh, default_interface, entry, node, partial_tri3_pair};

fn operator_sums(contributions: &[mortar::integrate::ElementContribution<f64>]) -> (f64, f64, f64) {
    let rows = || contributions.iter().flat_map(|element| element.nodes.iter());
    let d = rows().flat_map(|row| row.d.iter().map(|(_, &v)| v)).sum();
    let m = rows().flat_map(|row| row.m.iter().map(|(_, &v)| v)).sum();
    let gap = rows().map(|row| row.gap).sum();
    (d, m, gap)
}

#[test]
fn partial_tri3_overlap_is_clipped_into_three_cells() {
    let mut mesh = partial_tri3_pair();
    mesh.compute_nodal_normals().unwrap();
    let cells = segment_pair(&mesh.view(0), &mesh.view(1), &CoreConfig::default()).unwrap();
    assert_eq!(cells.len(), 3);
    // The slave Jacobian determinant is one
    let area: f64 = cells.iter().map(|cell| cell.slave_measure()).sum();
    assert!((area - 0.045).abs() < 1e-10);
}

#[test]
fn partial_tri3_operators_integrate_the_overlap() {
    let mut interface = default_interface(partial_tri3_pair());
    let contributions = interface.evaluate().unwrap();
    let (d, m, gap) = operator_sums(&contributions);
    assert!((d - 0.045).abs() < 1e-12);
    assert!((m - 0.045).abs() < 1e-12);
    assert!((gap - 0.0045).abs() < 1e-12);
}

fn matching_quads() -> mortar::mesh::SurfaceMesh<f64> {
    build_mesh(
        3,
        &[
            (0, [0.0, 0.0, 0.0]),
            (1, [1.0, 0.0, 0.0]),
            (2, [1.0, 1.0, 0.0]),
            (3, [0.0, 1.0, 0.0]),
            (10, [0.0, 0.0, 0.0]),
            (11, [0.0, 1.0, 0.0]),
            (12, [1.0, 1.0, 0.0]),
            (13, [1.0, 0.0, 0.0]),
        ],
        &[
            (0, CellType::Quad4, Side::Slave, &[0, 1, 2, 3]),
            (1, CellType::Quad4, Side::Master, &[10, 11, 12, 13]),
        ],
    )
}

#[test]
fn dual_basis_diagonalises_d_on_matching_quads() {
    let mut interface = default_interface(matching_quads());
    let contributions = interface.evaluate().unwrap();
    let element = &contributions[0];
    // Slave node -> coincident master node
    for (i, j) in [(0, 10), (1, 13), (2, 12), (3, 11)] {
        let row = node(element, i);
        for k in 0..4 {
            let expected = if k == i { 0.25 } else { 0.0 };
            assert!((entry(&row.d, k) - expected).abs() < 1e-13);
        }
        assert!((entry(&row.m, j) - 0.25).abs() < 1e-13);
        let m_sum: f64 = row.m.iter().map(|(_, &v)| v).sum();
        assert!((m_sum - 0.25).abs() < 1e-13);
    }
}

#[test]
fn piecewise_linear_lm_on_tri6_integrates_the_full_element() {
    let coords = [
        [0.0, 0.0],
        [1.0, 0.0],
        [0.0, 1.0],
        [0.5, 0.0],
        [0.5, 0.5],
        [0.0, 0.5],
    ];
    let mut nodes: Vec<_> = coords
        .iter()
        .enumerate()
        .map(|(k, &[x, y])| (k, [x, y, 0.0]))
        .collect();
    nodes.extend([
        (10, [-1.0, -1.0, 0.05]),
        (11, [-1.0, 3.0, 0.05]),
        (12, [3.0, -1.0, 0.05]),
    ]);
    let mesh = build_mesh(
        3,
        &nodes,
        &[
            (0, CellType::Tri6, Side::Slave, &[0, 1, 2, 3, 4, 5]),
            (1, CellType::Tri3, Side::Master, &[10, 11, 12]),
        ],
    );
    let config = CoreConfig {
        lm_shape: LagrangeMultiplierShape::PiecewiseLinear,
        ..CoreConfig::default()
    };
    let mut interface = Interface::new(mesh, config).unwrap();
    let contributions = interface.evaluate().unwrap();
    let (d, m, gap) = operator_sums(&contributions);
    assert!((d - 0.5).abs() < 1e-12);
    assert!((m - 0.5).abs() < 1e-12);
    assert!((gap - 0.025).abs() < 1e-12);

    // The hat functions of the corner nodes live on a single sub-element
    let corner: f64 = node(&contributions[0], 0).d.iter().map(|(_, &v)| v).sum();
    assert!((corner - 0.125 / 3.0).abs() < 1e-12);
}
