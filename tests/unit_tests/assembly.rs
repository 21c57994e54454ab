use mortar::assembly::assemble_mortar_operators;
use mortar::element::CellType;
use mortar::error::MortarError;
use mortar::mesh::Side;
use mortar::nalgebra::DMatrix;

use super::{build_mesh, default_interface};

/// Two slave segments sharing node 1 over a single master segment at `y = -0.1`.
fn two_slaves() -> mortar::mesh::SurfaceMesh<f64> {
    build_mesh(
        2,
        &[
            (0, [0.0, 0.0, 0.0]),
            (1, [0.6, 0.0, 0.0]),
            (2, [1.0, 0.0, 0.0]),
            (10, [1.2, -0.1, 0.0]),
            (11, [-0.2, -0.1, 0.0]),
        ],
        &[
            (0, CellType::Line2, Side::Slave, &[0, 1]),
            (1, CellType::Line2, Side::Slave, &[1, 2]),
            (2, CellType::Line2, Side::Master, &[10, 11]),
        ],
    )
}

#[test]
fn shared_slave_node_contributions_are_summed() {
    let mut interface = default_interface(two_slaves());
    let num_dofs = interface.mesh().num_dofs();
    let contributions = interface.evaluate().unwrap();
    let operators = assemble_mortar_operators(&contributions, num_dofs).unwrap();

    assert_eq!(operators.slave_nodes, vec![0, 1, 2]);
    assert_eq!(operators.master_nodes, vec![10, 11]);
    assert_eq!(operators.slave_row(1), Some(1));
    assert_eq!(operators.master_column(11), Some(1));
    assert_eq!(operators.master_column(1), None);

    let d = DMatrix::from(&operators.d);
    let m = DMatrix::from(&operators.m);
    assert_eq!((d.nrows(), d.ncols()), (3, 3));
    assert_eq!((m.nrows(), m.ncols()), (3, 2));

    // Lumped lengths: half of each adjacent segment
    let expected_diagonal = [0.3, 0.5, 0.2];
    for i in 0..3 {
        assert!((d[(i, i)] - expected_diagonal[i]).abs() < 1e-13);
        for j in 0..3 {
            if i != j {
                assert!(d[(i, j)].abs() < 1e-13);
            }
        }
        // Fully covered slave: rows of M balance the diagonal of D
        assert!((m.row(i).sum() - d[(i, i)]).abs() < 1e-13);
        assert!((operators.gap[i] - 0.1 * expected_diagonal[i]).abs() < 1e-13);
    }
}

#[test]
fn linearisations_have_global_layout() {
    let mut interface = default_interface(two_slaves());
    let num_dofs = interface.mesh().num_dofs();
    let contributions = interface.evaluate().unwrap();
    let operators = assemble_mortar_operators(&contributions, num_dofs).unwrap();

    assert_eq!(operators.gap_deriv.nrows(), 3);
    assert_eq!(operators.gap_deriv.ncols(), num_dofs);
    assert!(operators.d_deriv.contains_key(&(1, 1)));
    assert!(operators.m_deriv.keys().all(|&(row, column)| row < 3 && column < 2));
    assert!(operators.pressure.is_none());
    assert!(operators.traction.is_none());

    // The derivative of the shared diagonal entry is the sum over both elements
    let summed: f64 = contributions
        .iter()
        .flat_map(|element| element.nodes.iter())
        .filter(|node| node.node == 1)
        .filter_map(|node| node.d_deriv.get(1))
        .map(|deriv| deriv.get(2).copied().unwrap_or(0.0))
        .sum();
    let assembled = operators.d_deriv[&(1, 1)].get(2).copied().unwrap_or(0.0);
    assert!((assembled - summed).abs() < 1e-14);
}

#[test]
fn empty_contributions_assemble_to_empty_operators() {
    let operators = assemble_mortar_operators::<f64>(&[], 4).unwrap();
    assert!(operators.slave_nodes.is_empty());
    assert_eq!(operators.d.nnz(), 0);
    assert_eq!(operators.gap_deriv.ncols(), 4);
}

#[test]
fn gap_derivative_beyond_the_dof_count_is_rejected() {
    let mut interface = default_interface(two_slaves());
    let num_dofs = interface.mesh().num_dofs();
    let contributions = interface.evaluate().unwrap();
    // Master node 11 carries the largest DOF ids
    let result = assemble_mortar_operators(&contributions, num_dofs - 1);
    assert!(matches!(result, Err(MortarError::Usage { element: 0, .. })));
}
