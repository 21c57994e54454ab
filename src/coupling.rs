//! Evaluation driver of a mortar interface.
//!
//! An [`Interface`] owns the surface mesh of both sides, the configuration and the per-element
//! [`MortarData`] side table. Each slave element is processed independently:
//!
//! 1. candidate masters whose normals do not oppose the slave normal are discarded,
//! 2. every remaining pair is segmented into integration cells,
//! 3. the LM basis is set up, building the dual coefficients if required,
//! 4. the cells are integrated into per-node contributions.
//!
//! Since slave elements share no mutable state, [`Interface::evaluate_par`] processes them in
//! parallel and produces results identical to [`Interface::evaluate`].
use crate::config::{ConsistentDual, CoreConfig, IntegrationType, LagrangeMultiplierShape};
use crate::contact::ContactLaw;
use crate::dual::{consistent_dual_basis, element_dual_basis, DualBasis};
use crate::element::lagmult::{
    base_transformation, check_supported, evaluate_lagrange_multiplier, BaseTransformation, BasisValues,
    LagrangeMultiplierBasis,
};
use crate::element::ElementView;
use crate::error::MortarError;
use crate::integrate::{ElementContribution, SlaveIntegrator};
use crate::mesh::SurfaceMesh;
use crate::overlap::{segment_pair, IntegrationCell};
use crate::projector::orientation_compatible;
use crate::quadrature::{points_per_direction, QuadratureRule};
use log::debug;
use mortar_traits::Real;
use nalgebra::{DVector, Scalar, Vector2};
use rayon::prelude::*;

/// Relative coverage below which an element counts as a boundary element for the consistent
/// dual.
const FULL_COVERAGE_TOLERANCE: f64 = 1e-8;

/// Transient per-element data of a slave element, cleared at the start of every iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct MortarData<T: Scalar> {
    pub transformation: BaseTransformation<T>,
    /// Dual coefficients over the whole element, built on first use.
    pub dual: Option<DualBasis<T>>,
}

impl<T: Real> MortarData<T> {
    /// Builds the LM transformation of a slave element. The dual coefficients are built lazily.
    pub fn new(view: &ElementView<T>, config: &CoreConfig) -> Result<Self, MortarError> {
        let transformation = if config.lm_shape == LagrangeMultiplierShape::PiecewiseLinear {
            BaseTransformation::identity(view.num_nodes())
        } else {
            base_transformation(view, config)?
        };
        Ok(Self {
            transformation,
            dual: None,
        })
    }

    pub(crate) fn ensure_element_dual(&mut self, view: &ElementView<T>, config: &CoreConfig) -> Result<(), MortarError> {
        if config.uses_dual_basis() && self.dual.is_none() {
            self.dual = Some(element_dual_basis(view, &self.transformation, config)?);
        }
        Ok(())
    }

    /// The LM basis of the element, using `consistent` instead of the element-wide dual
    /// coefficients if given.
    pub fn basis<'a>(
        &'a self,
        view: &ElementView<T>,
        config: &CoreConfig,
        consistent: Option<&'a DualBasis<T>>,
    ) -> Result<LagrangeMultiplierBasis<'a, T>, MortarError> {
        match config.lm_shape {
            LagrangeMultiplierShape::Standard => Ok(LagrangeMultiplierBasis::Standard(&self.transformation)),
            LagrangeMultiplierShape::PiecewiseLinear => Ok(LagrangeMultiplierBasis::PiecewiseLinear),
            LagrangeMultiplierShape::Dual | LagrangeMultiplierShape::PetrovGalerkin => consistent
                .or(self.dual.as_ref())
                .map(|dual| LagrangeMultiplierBasis::Dual(&self.transformation, dual))
                .ok_or_else(|| MortarError::integration(view.id(), "dual basis requested before it was built")),
        }
    }
}

/// Read-only data shared by all slave element evaluations.
#[derive(Copy, Clone)]
pub struct CouplingContext<'a, T: Real> {
    pub mesh: &'a SurfaceMesh<T>,
    pub config: &'a CoreConfig,
    pub law: Option<&'a dyn ContactLaw<T>>,
}

pub struct Interface<T: Real> {
    mesh: SurfaceMesh<T>,
    config: CoreConfig,
    law: Option<Box<dyn ContactLaw<T>>>,
    /// Arena indices of the slave elements.
    slaves: Vec<usize>,
    /// Candidate masters per slave element, as arena indices.
    candidates: Vec<Vec<usize>>,
    mortar_data: Vec<Option<MortarData<T>>>,
}

impl<T: Real> Interface<T> {
    /// Sets up an interface for tied coupling.
    ///
    /// Validates the configuration and the LM support of every slave element, and computes the
    /// nodal normals. Every master element is initially a candidate of every slave element.
    pub fn new(mesh: SurfaceMesh<T>, config: CoreConfig) -> Result<Self, MortarError> {
        if config.contact {
            return Err(MortarError::Configuration(
                "contact mode requires a contact law".to_string(),
            ));
        }
        Self::setup(mesh, config, None)
    }

    /// Sets up an interface in contact mode with the given constitutive law.
    pub fn with_contact_law(
        mesh: SurfaceMesh<T>,
        config: CoreConfig,
        law: Box<dyn ContactLaw<T>>,
    ) -> Result<Self, MortarError> {
        if !config.contact {
            return Err(MortarError::Configuration(
                "a contact law was given, but contact mode is disabled".to_string(),
            ));
        }
        Self::setup(mesh, config, Some(law))
    }

    fn setup(
        mut mesh: SurfaceMesh<T>,
        config: CoreConfig,
        law: Option<Box<dyn ContactLaw<T>>>,
    ) -> Result<Self, MortarError> {
        config.validate(mesh.dim())?;
        mesh.check_consistency()?;
        let slaves: Vec<usize> = mesh.slave_elements().collect();
        for &slave in &slaves {
            check_supported(&mesh.view(slave), &config)?;
        }
        mesh.update_nodal_normals();

        let masters: Vec<usize> = mesh.master_elements().collect();
        Ok(Self {
            candidates: vec![masters; slaves.len()],
            mortar_data: vec![None; slaves.len()],
            slaves,
            mesh,
            config,
            law,
        })
    }

    pub fn mesh(&self) -> &SurfaceMesh<T> {
        &self.mesh
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    fn slave_position(&self, element_id: usize) -> Result<usize, MortarError> {
        let index = self
            .mesh
            .element_index(element_id)
            .ok_or_else(|| MortarError::usage(element_id, "unknown element"))?;
        self.slaves
            .binary_search(&index)
            .map_err(|_| MortarError::usage(element_id, "element is not a slave element"))
    }

    /// Replaces the candidate masters of a slave element, e.g. with the result of a search.
    pub fn set_candidates(&mut self, slave_id: usize, master_ids: &[usize]) -> Result<(), MortarError> {
        let position = self.slave_position(slave_id)?;
        let candidates = master_ids
            .iter()
            .map(|&id| match self.mesh.element_index(id) {
                Some(index) if !self.mesh.element(index).is_slave() => Ok(index),
                _ => Err(MortarError::usage(slave_id, format!("candidate {} is not a master element", id))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.candidates[position] = candidates;
        Ok(())
    }

    /// Sets the nodal displacements from a global vector indexed by coordinate DOF id.
    ///
    /// Takes effect with the next call to [`begin_iteration`](Self::begin_iteration).
    pub fn update_displacements(&mut self, u: &DVector<T>) {
        self.mesh.set_displacements(u);
    }

    /// Recomputes the nodal normals and clears all cached per-element data.
    pub fn begin_iteration(&mut self) {
        self.mesh.update_nodal_normals();
        self.mortar_data.iter_mut().for_each(|data| *data = None);
    }

    /// Cached data of a slave element, if it was evaluated in the current iteration.
    pub fn mortar_data(&self, element_id: usize) -> Option<&MortarData<T>> {
        let position = self.slave_position(element_id).ok()?;
        self.mortar_data[position].as_ref()
    }

    /// Evaluates the LM basis of a slave element at the parametric point `xi`.
    ///
    /// Uses the cached data of the element, which is created if the element was not evaluated
    /// in the current iteration.
    pub fn evaluate_lagrange_multiplier(
        &mut self,
        element_id: usize,
        xi: &Vector2<T>,
    ) -> Result<BasisValues<T>, MortarError> {
        let position = self.slave_position(element_id)?;
        let view = self.mesh.view(self.slaves[position]);
        let slot = &mut self.mortar_data[position];
        let mut data = match slot.take() {
            Some(data) => data,
            None => MortarData::new(&view, &self.config)?,
        };
        let result = evaluate_lagrange_multiplier(&view, &self.config, &mut data, xi);
        *slot = Some(data);
        result
    }

    /// Evaluates all slave elements sequentially.
    pub fn evaluate(&mut self) -> Result<Vec<ElementContribution<T>>, MortarError> {
        let context = CouplingContext {
            mesh: &self.mesh,
            config: &self.config,
            law: self.law.as_deref(),
        };
        self.mortar_data
            .iter_mut()
            .zip(&self.slaves)
            .zip(&self.candidates)
            .map(|((data, &slave), candidates)| evaluate_slave(&context, slave, candidates, data))
            .collect()
    }

    /// Evaluates all slave elements in parallel. The result equals that of
    /// [`evaluate`](Self::evaluate).
    pub fn evaluate_par(&mut self) -> Result<Vec<ElementContribution<T>>, MortarError> {
        let context = CouplingContext {
            mesh: &self.mesh,
            config: &self.config,
            law: self.law.as_deref(),
        };
        self.mortar_data
            .par_iter_mut()
            .zip(self.slaves.par_iter())
            .zip(self.candidates.par_iter())
            .map(|((data, &slave), candidates)| evaluate_slave(&context, slave, candidates, data))
            .collect()
    }

    /// Evaluates a single slave element.
    pub fn evaluate_element(&mut self, element_id: usize) -> Result<ElementContribution<T>, MortarError> {
        let position = self.slave_position(element_id)?;
        let slave = self.slaves[position];
        let context = CouplingContext {
            mesh: &self.mesh,
            config: &self.config,
            law: self.law.as_deref(),
        };
        evaluate_slave(&context, slave, &self.candidates[position], &mut self.mortar_data[position])
    }
}

/// Measure of the slave element covered by the given cells, `∫ detJ dξ` over the cells.
pub fn covered_measure<'c, T: Real>(
    view: &ElementView<T>,
    cells: impl IntoIterator<Item = &'c IntegrationCell<T>>,
    config: &CoreConfig,
) -> Result<T, MortarError> {
    let n_points = points_per_direction(view.cell(), config);
    let (interval, triangle) = (QuadratureRule::interval(n_points)?, QuadratureRule::triangle(n_points)?);
    let mut measure = T::zero();
    for cell in cells {
        let rule = if cell.is_interval() { &interval } else { &triangle };
        for (weight, point) in rule.iter() {
            let mapped = cell.map_point(point);
            measure += weight * mapped.jacobian * view.jacobian_determinant(&view.shape(&mapped.slave));
        }
    }
    Ok(measure)
}

fn element_measure<T: Real>(view: &ElementView<T>, config: &CoreConfig) -> Result<T, MortarError> {
    let rule = QuadratureRule::element(view.cell(), points_per_direction(view.cell(), config))?;
    Ok(rule
        .iter()
        .map(|(weight, xi)| weight * view.jacobian_determinant(&view.shape(xi)))
        .fold(T::zero(), |acc, x| acc + x))
}

/// Evaluates one slave element against its candidate masters.
pub fn evaluate_slave<T: Real>(
    context: &CouplingContext<'_, T>,
    slave: usize,
    candidates: &[usize],
    slot: &mut Option<MortarData<T>>,
) -> Result<ElementContribution<T>, MortarError> {
    let view = context.mesh.view(slave);
    let mut data = match slot.take() {
        Some(data) => data,
        None => MortarData::new(&view, context.config)?,
    };
    let result = evaluate_with_data(context, &view, candidates, &mut data);
    *slot = Some(data);
    result
}

fn evaluate_with_data<T: Real>(
    context: &CouplingContext<'_, T>,
    view: &ElementView<T>,
    candidates: &[usize],
    data: &mut MortarData<T>,
) -> Result<ElementContribution<T>, MortarError> {
    let CouplingContext { mesh, config, law } = *context;
    let masters: Vec<ElementView<T>> = candidates
        .iter()
        .map(|&m| mesh.view(m))
        .filter(|master| {
            let compatible = orientation_compatible(view, master);
            if !compatible {
                debug!("Slave {} / master {}: normals do not oppose", view.id(), master.id());
            }
            compatible
        })
        .collect();

    if config.integration != IntegrationType::Segments {
        let fallback = config.integration == IntegrationType::ElementsBoundarySegmentation;
        data.ensure_element_dual(view, config)?;
        let mut integrator = SlaveIntegrator::new(*view, data.basis(view, config, None)?, law);
        if integrator.integrate_elements(&masters, config, fallback)? {
            return Ok(integrator.finish());
        }
        debug!("Slave {} falls back to segment-based integration", view.id());
    }

    let mut pairs = Vec::with_capacity(masters.len());
    for master in &masters {
        let cells = segment_pair(view, master, config)?;
        if !cells.is_empty() {
            pairs.push((master, cells));
        }
    }
    if pairs.is_empty() {
        return Ok(SlaveIntegrator::new(*view, LagrangeMultiplierBasis::Standard(&data.transformation), law).finish());
    }

    let all_cells = || pairs.iter().flat_map(|(_, cells)| cells.iter());
    let consistent = match config.consistent_dual {
        ConsistentDual::None => false,
        ConsistentDual::All => true,
        ConsistentDual::Boundary => {
            let covered = covered_measure(view, all_cells(), config)?;
            let full = element_measure(view, config)?;
            covered < full * (T::one() - nalgebra::convert(FULL_COVERAGE_TOLERANCE))
        }
    };
    let consistent_dual = if consistent && config.uses_dual_basis() {
        debug!("Slave {} uses the consistent dual basis", view.id());
        Some(consistent_dual_basis(view, &data.transformation, all_cells(), config)?)
    } else {
        data.ensure_element_dual(view, config)?;
        None
    };

    let mut integrator = SlaveIntegrator::new(*view, data.basis(view, config, consistent_dual.as_ref())?, law);
    for (master, cells) in &pairs {
        integrator.integrate_cells(master, cells, config)?;
    }
    Ok(integrator.finish())
}
