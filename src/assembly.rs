//! Assembly of per-element contributions into global mortar operators.
//!
//! Rows of all operators are indexed by the position of the slave node in
//! [`MortarOperators::slave_nodes`], columns of `M` by the position of the master node in
//! [`MortarOperators::master_nodes`]. Both lists are sorted by node id. Contributions of a node
//! shared by several slave elements are summed.
use crate::error::MortarError;
use crate::integrate::ElementContribution;
use crate::paired::PairedVector;
use mortar_traits::Real;
use nalgebra::{DVector, Scalar, Vector3};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct MortarOperators<T: Scalar> {
    pub slave_nodes: Vec<usize>,
    pub master_nodes: Vec<usize>,
    pub d: CsrMatrix<T>,
    pub m: CsrMatrix<T>,
    /// Weighted gap per slave node.
    pub gap: DVector<T>,
    /// `∂g/∂d`, with one column per coordinate DOF.
    pub gap_deriv: CsrMatrix<T>,
    /// Derivatives of the entries of `D`, keyed by (row, column) and then by DOF.
    pub d_deriv: FxHashMap<(usize, usize), PairedVector<T>>,
    pub m_deriv: FxHashMap<(usize, usize), PairedVector<T>>,
    /// Weighted contact pressure per slave node, present in contact mode.
    pub pressure: Option<DVector<T>>,
    pub traction: Option<Vec<Vector3<T>>>,
}

impl<T: Real> MortarOperators<T> {
    pub fn slave_row(&self, node_id: usize) -> Option<usize> {
        self.slave_nodes.binary_search(&node_id).ok()
    }

    pub fn master_column(&self, node_id: usize) -> Option<usize> {
        self.master_nodes.binary_search(&node_id).ok()
    }
}

fn sorted_ids(ids: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut ids: Vec<usize> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Sums the element contributions into global operators over `num_dofs` coordinate DOFs.
///
/// Fails with [`MortarError::Usage`] if a contribution depends on a DOF id not below
/// `num_dofs`.
pub fn assemble_mortar_operators<T: Real>(
    contributions: &[ElementContribution<T>],
    num_dofs: usize,
) -> Result<MortarOperators<T>, MortarError> {
    let node_contributions = || contributions.iter().flat_map(|element| element.nodes.iter());
    let slave_nodes = sorted_ids(node_contributions().map(|node| node.node));
    let master_nodes = sorted_ids(node_contributions().flat_map(|node| node.m.keys().collect::<Vec<_>>()));
    let index = |ids: &[usize], id: usize| ids.binary_search(&id).expect("node ids were collected above");

    let (n_s, n_m) = (slave_nodes.len(), master_nodes.len());
    let mut d = CooMatrix::new(n_s, n_s);
    let mut m = CooMatrix::new(n_s, n_m);
    let mut gap_deriv = CooMatrix::new(n_s, num_dofs);
    let mut gap = DVector::zeros(n_s);
    let mut d_deriv = FxHashMap::default();
    let mut m_deriv = FxHashMap::default();
    let contact = node_contributions().any(|node| node.contact.is_some());
    let mut pressure = contact.then(|| DVector::zeros(n_s));
    let mut traction = contact.then(|| vec![Vector3::zeros(); n_s]);

    for (element, node) in contributions
        .iter()
        .flat_map(|element| element.nodes.iter().map(move |node| (element.element, node)))
    {
        let row = index(&slave_nodes, node.node);
        for (column, &value) in node.d.iter() {
            d.push(row, index(&slave_nodes, column), value);
        }
        for (column, &value) in node.m.iter() {
            m.push(row, index(&master_nodes, column), value);
        }
        for (column, deriv) in node.d_deriv.iter() {
            d_deriv
                .entry((row, index(&slave_nodes, column)))
                .or_insert_with(PairedVector::new)
                .add_scaled(deriv, T::one());
        }
        for (column, deriv) in node.m_deriv.iter() {
            m_deriv
                .entry((row, index(&master_nodes, column)))
                .or_insert_with(PairedVector::new)
                .add_scaled(deriv, T::one());
        }
        gap[row] += node.gap;
        for (dof, &value) in node.gap_deriv.iter() {
            if dof >= num_dofs {
                return Err(MortarError::usage(
                    element,
                    format!("gap of node {} depends on DOF {}, but only {} DOFs exist", node.node, dof, num_dofs),
                ));
            }
            gap_deriv.push(row, dof, value);
        }
        if let (Some(contact), Some(pressure), Some(traction)) =
            (&node.contact, pressure.as_mut(), traction.as_mut())
        {
            pressure[row] += contact.pressure;
            traction[row] += contact.traction;
        }
    }

    Ok(MortarOperators {
        slave_nodes,
        master_nodes,
        d: CsrMatrix::from(&d),
        m: CsrMatrix::from(&m),
        gap,
        gap_deriv: CsrMatrix::from(&gap_deriv),
        d_deriv,
        m_deriv,
        pressure,
        traction,
    })
}
