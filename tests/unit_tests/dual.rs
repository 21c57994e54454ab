use matrixcompare::assert_matrix_eq;
use mortar::config::{CoreConfig, LagrangeMultiplierOrder};
use mortar::coupling::Interface;
use mortar::dual::element_dual_basis;
use mortar::element::lagmult::base_transformation;
use mortar::element::nurbs::NurbsData;
use mortar::element::CellType;
use mortar::error::MortarError;
use mortar::mesh::{Node, NodeFlags, Side, SurfaceMesh};
use mortar::nalgebra::{DMatrix, DVector, Vector3};
use mortar::quadrature::{points_per_direction, QuadratureRule};

use super::{build_mesh, line2_pair};

/// Checks `∫ Λ_i B_j dΓ = δ_ij ∫ B_j dΓ` on the active rows of the first element of the mesh,
/// using the quadrature the dual basis is built with.
fn assert_biorthogonal(mesh: &SurfaceMesh<f64>, config: &CoreConfig) {
    let view = mesh.view(0);
    let transformation = base_transformation(&view, config).unwrap();
    let dual = element_dual_basis(&view, &transformation, config).unwrap();

    let n = view.num_nodes();
    let mut mixed = DMatrix::zeros(n, n);
    let mut integrals = DVector::zeros(n);
    let rule = QuadratureRule::element(view.cell(), points_per_direction(view.cell(), config)).unwrap();
    for (weight, xi) in rule.iter() {
        let sf = view.shape(xi);
        let base = transformation.apply(&sf);
        let lm = dual.apply(&base);
        let w = weight * view.jacobian_determinant(&sf);
        mixed += &lm.values * base.values.transpose() * w;
        integrals += &base.values * w;
    }

    for &i in &transformation.active {
        for &j in &transformation.active {
            let expected = if i == j { integrals[j] } else { 0.0 };
            assert!(
                (mixed[(i, j)] - expected).abs() < 1e-12,
                "entry ({}, {}): {} != {}",
                i,
                j,
                mixed[(i, j)],
                expected
            );
        }
    }
}

#[test]
fn line2_dual_coefficients() {
    let mesh = line2_pair([[0.0, 0.0], [2.0, 0.0]], [[2.0, -0.1], [0.0, -0.1]]);
    let view = mesh.view(0);
    let config = CoreConfig::default();
    let transformation = base_transformation(&view, &config).unwrap();
    assert!(transformation.is_identity());
    let dual = element_dual_basis(&view, &transformation, &config).unwrap();
    let expected = DMatrix::from_row_slice(2, 2, &[2.0, -1.0, -1.0, 2.0]);
    assert_matrix_eq!(dual.ae, expected, comp = abs, tol = 1e-12);
    assert_biorthogonal(&mesh, &config);
}

#[test]
fn curved_line3_is_biorthogonal() {
    let mesh = build_mesh(
        2,
        &[(0, [0.0, 0.0, 0.0]), (1, [1.0, 0.2, 0.0]), (2, [0.4, 0.25, 0.0])],
        &[(0, CellType::Line3, Side::Slave, &[0, 1, 2])],
    );
    assert_biorthogonal(&mesh, &CoreConfig::default());
}

#[test]
fn distorted_quad4_is_biorthogonal() {
    let mesh = build_mesh(
        3,
        &[
            (0, [0.0, 0.0, 0.0]),
            (1, [2.0, 0.0, 0.0]),
            (2, [2.5, 1.5, 0.0]),
            (3, [0.0, 1.0, 0.0]),
        ],
        &[(0, CellType::Quad4, Side::Slave, &[0, 1, 2, 3])],
    );
    assert_biorthogonal(&mesh, &CoreConfig::default());
}

/// Compares `∂Ae/∂d` of the first element with central differences of `Ae`.
fn assert_ae_deriv_matches_finite_differences(mesh: &SurfaceMesh<f64>, config: &CoreConfig) {
    let view = mesh.view(0);
    let transformation = base_transformation(&view, config).unwrap();
    let dual = element_dual_basis(&view, &transformation, config).unwrap();
    let n = view.num_nodes();

    let h = 1e-6;
    let ae_at = |u: &DVector<f64>| {
        let mut perturbed = mesh.clone();
        perturbed.set_displacements(u);
        let view = perturbed.view(0);
        let transformation = base_transformation(&view, config).unwrap();
        element_dual_basis(&view, &transformation, config)
            .unwrap()
            .ae
    };
    for dof in 0..mesh.num_dofs() {
        let mut u = DVector::zeros(mesh.num_dofs());
        u[dof] = h;
        let plus = ae_at(&u);
        u[dof] = -h;
        let minus = ae_at(&u);
        let fd = (plus - minus) / (2.0 * h);
        let analytic = dual
            .ae_deriv
            .get(dof)
            .cloned()
            .unwrap_or_else(|| DMatrix::zeros(n, n));
        assert_matrix_eq!(analytic, fd, comp = abs, tol = 1e-5);
    }
}

fn warped_quad4() -> SurfaceMesh<f64> {
    build_mesh(
        3,
        &[
            (0, [0.0, 0.0, 0.0]),
            (1, [2.0, 0.0, 0.1]),
            (2, [2.5, 1.5, 0.0]),
            (3, [0.0, 1.0, -0.2]),
        ],
        &[(0, CellType::Quad4, Side::Slave, &[0, 1, 2, 3])],
    )
}

#[test]
fn quad4_dual_coefficient_derivatives() {
    assert_ae_deriv_matches_finite_differences(&warped_quad4(), &CoreConfig::default());
}

#[test]
fn quad4_dual_coefficient_derivatives_with_boundary_corner() {
    let mut mesh = warped_quad4();
    mesh.node_by_id_mut(0).unwrap().flags.insert(NodeFlags::ON_CORNER);
    let config = CoreConfig::default();
    assert_eq!(base_transformation(&mesh.view(0), &config).unwrap().active, vec![1, 2, 3]);
    assert_ae_deriv_matches_finite_differences(&mesh, &config);
}

#[test]
fn tri3_is_biorthogonal() {
    let mesh = build_mesh(
        3,
        &[(0, [0.0, 0.0, 0.0]), (1, [1.0, 0.0, 0.0]), (2, [0.2, 1.0, 0.3])],
        &[(0, CellType::Tri3, Side::Slave, &[0, 1, 2])],
    );
    assert_biorthogonal(&mesh, &CoreConfig::default());
}

#[test]
fn tri6_with_linear_lm_is_biorthogonal() {
    let mesh = build_mesh(
        3,
        &[
            (0, [0.0, 0.0, 0.0]),
            (1, [1.0, 0.0, 0.0]),
            (2, [0.0, 1.0, 0.0]),
            (3, [0.5, 0.0, 0.0]),
            (4, [0.5, 0.5, 0.0]),
            (5, [0.0, 0.5, 0.0]),
        ],
        &[(0, CellType::Tri6, Side::Slave, &[0, 1, 2, 3, 4, 5])],
    );
    let config = CoreConfig {
        lm_quad: LagrangeMultiplierOrder::Linear,
        ..CoreConfig::default()
    };
    let transformation = base_transformation(&mesh.view(0), &config).unwrap();
    assert_eq!(transformation.active, vec![0, 1, 2]);
    assert_biorthogonal(&mesh, &config);
}

#[test]
fn boundary_transformation_keeps_biorthogonality() {
    let mut mesh = build_mesh(
        2,
        &[(0, [0.0, 0.0, 0.0]), (1, [1.0, 0.0, 0.0]), (2, [0.5, 0.0, 0.0])],
        &[(0, CellType::Line3, Side::Slave, &[0, 1, 2])],
    );
    mesh.node_by_id_mut(0).unwrap().flags.insert(NodeFlags::ON_BOUNDARY);
    let config = CoreConfig::default();
    let transformation = base_transformation(&mesh.view(0), &config).unwrap();
    assert_eq!(transformation.active, vec![1, 2]);
    assert_biorthogonal(&mesh, &config);
}

#[test]
fn quadratic_dual_on_tri6_is_rejected() {
    let mesh = build_mesh(
        3,
        &[
            (0, [0.0, 0.0, 0.0]),
            (1, [1.0, 0.0, 0.0]),
            (2, [0.0, 1.0, 0.0]),
            (3, [0.5, 0.0, 0.0]),
            (4, [0.5, 0.5, 0.0]),
            (5, [0.0, 0.5, 0.0]),
        ],
        &[(0, CellType::Tri6, Side::Slave, &[0, 1, 2, 3, 4, 5])],
    );
    let result = Interface::new(mesh, CoreConfig::default());
    assert!(matches!(result, Err(MortarError::Usage { element: 0, .. })));
}

#[test]
fn dual_on_bilinear_nurbs_is_rejected() {
    let mut mesh = SurfaceMesh::new(3).unwrap();
    for (id, [x, y]) in [(0, [0.0, 0.0]), (1, [1.0, 0.0]), (2, [0.0, 1.0]), (3, [1.0, 1.0])] {
        mesh.add_node(Node::new(id, Vector3::new(x, y, 0.0)).with_weight(1.0))
            .unwrap();
    }
    let knots = vec![0.0, 0.0, 1.0, 1.0];
    mesh.add_element(7, CellType::Nurbs4, Side::Slave, &[0, 1, 2, 3])
        .unwrap()
        .nurbs = Some(NurbsData::new(vec![knots.clone(), knots]));
    let result = Interface::new(mesh, CoreConfig::default());
    assert!(matches!(result, Err(MortarError::Usage { element: 7, .. })));
}

#[test]
fn element_with_only_boundary_nodes_is_rejected() {
    let mut mesh = line2_pair([[0.0, 0.0], [1.0, 0.0]], [[1.0, -0.1], [0.0, -0.1]]);
    for id in [0, 1] {
        mesh.node_by_id_mut(id).unwrap().flags.insert(NodeFlags::ON_CORNER);
    }
    let mut interface = Interface::new(mesh, CoreConfig::default()).unwrap();
    assert!(matches!(interface.evaluate(), Err(MortarError::Usage { element: 0, .. })));
}
