//! Arena holding the nodes and surface elements of both sides of an interface.
//!
//! Nodes and elements carry user-supplied ids, but reference each other only through stable
//! indices into the arena. All linearisations are keyed by coordinate DOF ids, which default to
//! `dim * node_index + c` and may be overridden per node.
use crate::element::nurbs::NurbsData;
use crate::element::volume::ParentVolume;
use crate::element::{CellType, ElementView};
use crate::error::MortarError;
use crate::paired::PairedVector;
use mortar_traits::Real;
use nalgebra::{DVector, Scalar, Vector3};
use rustc_hash::FxHashMap;
use std::ops::BitOr;

mod normals;

/// Role flags of a node.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodeFlags(u8);

impl NodeFlags {
    pub const SLAVE: Self = Self(1);
    pub const ON_BOUNDARY: Self = Self(1 << 1);
    pub const ON_CORNER: Self = Self(1 << 2);
    pub const ON_EDGE: Self = Self(1 << 3);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for NodeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node<T: Scalar> {
    pub id: usize,
    /// Reference coordinates. The third component is zero in 2D problems.
    pub reference: Vector3<T>,
    pub displacement: Vector3<T>,
    /// Control point weight of NURBS nodes.
    pub weight: Option<T>,
    pub flags: NodeFlags,
    dofs: Option<[usize; 3]>,
    normal: Vector3<T>,
    normal_deriv: PairedVector<Vector3<T>>,
}

impl<T: Real> Node<T> {
    pub fn new(id: usize, reference: Vector3<T>) -> Self {
        Self {
            id,
            reference,
            displacement: Vector3::zeros(),
            weight: None,
            flags: NodeFlags::empty(),
            dofs: None,
            normal: Vector3::zeros(),
            normal_deriv: PairedVector::new(),
        }
    }

    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags.insert(flags);
        self
    }

    pub fn with_weight(mut self, weight: T) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Overrides the default coordinate DOF ids. Only the first `dim` entries are used.
    pub fn with_dofs(mut self, dofs: [usize; 3]) -> Self {
        self.dofs = Some(dofs);
        self
    }

    pub fn position(&self) -> Vector3<T> {
        self.reference + self.displacement
    }

    /// The averaged nodal unit normal, see [`SurfaceMesh::compute_nodal_normals`].
    pub fn normal(&self) -> &Vector3<T> {
        &self.normal
    }

    /// Directional derivative of the nodal normal, keyed by coordinate DOF id.
    pub fn normal_deriv(&self) -> &PairedVector<Vector3<T>> {
        &self.normal_deriv
    }

    pub fn is_slave(&self) -> bool {
        self.flags.contains(NodeFlags::SLAVE)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Side {
    Slave,
    Master,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element<T: Scalar> {
    pub id: usize,
    pub cell: CellType,
    pub side: Side,
    /// Arena indices of the element nodes.
    pub nodes: Vec<usize>,
    pub nurbs: Option<NurbsData<T>>,
    pub parent: Option<ParentVolume>,
}

impl<T: Scalar> Element<T> {
    pub fn is_slave(&self) -> bool {
        self.side == Side::Slave
    }
}

#[derive(Debug, Clone)]
pub struct SurfaceMesh<T: Scalar> {
    dim: usize,
    nodes: Vec<Node<T>>,
    elements: Vec<Element<T>>,
    node_elements: Vec<Vec<usize>>,
    node_lookup: FxHashMap<usize, usize>,
    element_lookup: FxHashMap<usize, usize>,
}

impl<T: Real> SurfaceMesh<T> {
    pub fn new(dim: usize) -> Result<Self, MortarError> {
        if dim != 2 && dim != 3 {
            return Err(MortarError::Configuration(format!(
                "problem dimension must be 2 or 3, got {}",
                dim
            )));
        }
        Ok(Self {
            dim,
            nodes: Vec::new(),
            elements: Vec::new(),
            node_elements: Vec::new(),
            node_lookup: FxHashMap::default(),
            element_lookup: FxHashMap::default(),
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Adds a node and returns its arena index.
    pub fn add_node(&mut self, node: Node<T>) -> Result<usize, MortarError> {
        if self.node_lookup.contains_key(&node.id) {
            return Err(MortarError::Configuration(format!("duplicate node id {}", node.id)));
        }
        let index = self.nodes.len();
        self.node_lookup.insert(node.id, index);
        self.nodes.push(node);
        self.node_elements.push(Vec::new());
        Ok(index)
    }

    /// Adds an element connecting the nodes with the given ids.
    ///
    /// Nodes of slave elements are flagged as slave nodes. The returned reference can be used to
    /// attach NURBS data or a parent volume.
    pub fn add_element(
        &mut self,
        id: usize,
        cell: CellType,
        side: Side,
        node_ids: &[usize],
    ) -> Result<&mut Element<T>, MortarError> {
        if self.element_lookup.contains_key(&id) {
            return Err(MortarError::Configuration(format!("duplicate element id {}", id)));
        }
        if node_ids.len() != cell.num_nodes() {
            return Err(MortarError::usage(
                id,
                format!("{:?} needs {} nodes, got {}", cell, cell.num_nodes(), node_ids.len()),
            ));
        }
        let expected_dim = cell.parametric_dim() + 1;
        if expected_dim != self.dim {
            return Err(MortarError::usage(
                id,
                format!("{:?} cannot be used in a {}D problem", cell, self.dim),
            ));
        }
        let nodes = node_ids
            .iter()
            .map(|node_id| {
                self.node_lookup
                    .get(node_id)
                    .copied()
                    .ok_or_else(|| MortarError::usage(id, format!("unknown node id {}", node_id)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let index = self.elements.len();
        for &node in &nodes {
            self.node_elements[node].push(index);
            if side == Side::Slave {
                self.nodes[node].flags.insert(NodeFlags::SLAVE);
            }
        }
        self.element_lookup.insert(id, index);
        self.elements.push(Element {
            id,
            cell,
            side,
            nodes,
            nurbs: None,
            parent: None,
        });
        Ok(&mut self.elements[index])
    }

    /// Checks the element data that can only be verified once the mesh is complete.
    pub fn check_consistency(&self) -> Result<(), MortarError> {
        for element in &self.elements {
            if element.cell.is_nurbs() {
                let data = element
                    .nurbs
                    .as_ref()
                    .ok_or_else(|| MortarError::usage(element.id, "NURBS element without knot data"))?;
                data.check_compatible(element.cell)
                    .map_err(|msg| MortarError::usage(element.id, msg))?;
                if element.nodes.iter().any(|&n| self.nodes[n].weight.is_none()) {
                    return Err(MortarError::usage(element.id, "NURBS control point without weight"));
                }
            } else if element.nurbs.is_some() {
                return Err(MortarError::usage(element.id, "knot data on a Lagrange element"));
            }
            if let Some(parent) = &element.parent {
                let face_cell = parent.cell.face_cell_type();
                let corner_cell = element.cell.linear_counterpart().unwrap_or(element.cell);
                if parent.face >= parent.cell.num_faces() || face_cell != corner_cell {
                    return Err(MortarError::usage(
                        element.id,
                        format!("{:?} is not a face of {:?}", element.cell, parent.cell),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[Node<T>] {
        &self.nodes
    }

    pub fn elements(&self) -> &[Element<T>] {
        &self.elements
    }

    pub fn node(&self, index: usize) -> &Node<T> {
        &self.nodes[index]
    }

    pub fn element(&self, index: usize) -> &Element<T> {
        &self.elements[index]
    }

    pub fn node_index(&self, id: usize) -> Option<usize> {
        self.node_lookup.get(&id).copied()
    }

    pub fn element_index(&self, id: usize) -> Option<usize> {
        self.element_lookup.get(&id).copied()
    }

    pub fn node_by_id(&self, id: usize) -> Option<&Node<T>> {
        self.node_index(id).map(|index| &self.nodes[index])
    }

    /// Mutable access to a node, e.g. to adjust its flags before the interface is set up.
    pub fn node_by_id_mut(&mut self, id: usize) -> Option<&mut Node<T>> {
        let index = self.node_index(id)?;
        Some(&mut self.nodes[index])
    }

    /// Indices of the elements adjacent to the given node.
    pub fn adjacent_elements(&self, node: usize) -> &[usize] {
        &self.node_elements[node]
    }

    pub fn slave_elements(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.elements.len()).filter(move |&e| self.elements[e].is_slave())
    }

    pub fn master_elements(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.elements.len()).filter(move |&e| !self.elements[e].is_slave())
    }

    /// Coordinate DOF id of component `c` of the given node.
    pub fn dof(&self, node: usize, c: usize) -> usize {
        debug_assert!(c < self.dim);
        match self.nodes[node].dofs {
            Some(dofs) => dofs[c],
            None => self.dim * node + c,
        }
    }

    /// One past the largest coordinate DOF id of the mesh.
    pub fn num_dofs(&self) -> usize {
        (0..self.nodes.len())
            .flat_map(|n| (0..self.dim).map(move |c| (n, c)))
            .map(|(n, c)| self.dof(n, c) + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn view(&self, element: usize) -> ElementView<'_, T> {
        ElementView::new(self, element)
    }

    /// Sets the nodal displacements from a global vector indexed by coordinate DOF id.
    ///
    /// # Panics
    ///
    /// Panics if `u` is shorter than [`num_dofs`](Self::num_dofs).
    pub fn set_displacements(&mut self, u: &DVector<T>) {
        assert!(u.len() >= self.num_dofs(), "displacement vector too short");
        for n in 0..self.nodes.len() {
            let mut displacement = Vector3::zeros();
            for c in 0..self.dim {
                displacement[c] = u[self.dof(n, c)];
            }
            self.nodes[n].displacement = displacement;
        }
    }
}
