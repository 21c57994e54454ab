//! Numerical integration of the mortar operators on one slave element.
//!
//! For every Gauss point with slave coordinate `xi_s`, master coordinate `xi_m` and weight `w`
//! (including the slave Jacobian determinant), the integrator accumulates for every LM node `i`
//!
//! ```text
//! D_ij += w Λ_i(xi_s) N^s_j(xi_s)
//! M_ij += w Λ_i(xi_s) N^m_j(xi_m)
//! g_i  += w Λ_i(xi_s) (x_m(xi_m) - x_s(xi_s)) · n_i
//! ```
//!
//! together with the directional derivatives obtained by the product rule. Derivatives of the
//! Gauss point coordinates and weights are supplied by the caller, which makes the same routine
//! serve segment-based and element-based integration.
use crate::config::CoreConfig;
use crate::contact::{ContactContribution, ContactLaw, ContactState};
use crate::dual::weight_deriv;
use crate::element::lagmult::{BasisValues, LagrangeMultiplierBasis};
use crate::element::{ElementView, ShapeFunctions};
use crate::error::MortarError;
use crate::overlap::IntegrationCell;
use crate::paired::PairedVector;
use crate::projector::{project_point, projection_deriv};
use crate::quadrature::{points_per_direction, QuadratureRule};
use mortar_traits::Real;
use nalgebra::{DVector, Matrix3, Scalar, Vector2, Vector3};

/// Contributions of one slave node to the mortar operators.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeContribution<T: Scalar> {
    /// Id of the slave node, i.e. the row of the operators.
    pub node: usize,
    /// Row of `D`, keyed by slave node id.
    pub d: PairedVector<T>,
    /// Row of `M`, keyed by master node id.
    pub m: PairedVector<T>,
    /// Weighted gap.
    pub gap: T,
    /// `∂D_ij/∂d`, keyed by slave node id `j` and then by coordinate DOF id.
    pub d_deriv: PairedVector<PairedVector<T>>,
    /// `∂M_ij/∂d`, keyed by master node id `j` and then by coordinate DOF id.
    pub m_deriv: PairedVector<PairedVector<T>>,
    pub gap_deriv: PairedVector<T>,
    /// Present in contact mode.
    pub contact: Option<ContactContribution<T>>,
}

impl<T: Real> NodeContribution<T> {
    fn new(node: usize, contact: bool) -> Self {
        Self {
            node,
            d: PairedVector::new(),
            m: PairedVector::new(),
            gap: T::zero(),
            d_deriv: PairedVector::new(),
            m_deriv: PairedVector::new(),
            gap_deriv: PairedVector::new(),
            contact: if contact { Some(ContactContribution::default()) } else { None },
        }
    }
}

/// Contributions of all nodes of one slave element, in element node order.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementContribution<T: Scalar> {
    /// Id of the slave element.
    pub element: usize,
    pub nodes: Vec<NodeContribution<T>>,
}

/// LM values at `xi` and their directional derivatives.
fn evaluate_with_deriv<T: Real>(
    basis: &LagrangeMultiplierBasis<T>,
    slave: &ElementView<T>,
    sf: &ShapeFunctions<T>,
    xi: &Vector2<T>,
    subelement: Option<usize>,
    xi_deriv: &PairedVector<Vector2<T>>,
) -> Result<(BasisValues<T>, PairedVector<DVector<T>>), MortarError> {
    let values = basis.evaluate(slave, sf, xi, subelement)?;
    let mut deriv = xi_deriv.map(|dxi| values.gradients.transpose() * dxi);
    if let LagrangeMultiplierBasis::Dual(t, dual) = basis {
        let base = t.apply(sf);
        deriv.add_mapped(&dual.ae_deriv, |dae| dae * &base.values);
    }
    Ok((values, deriv))
}

/// A Gauss point with coordinates on both elements and its weight, including derivatives.
#[derive(Debug, Clone)]
pub(crate) struct GaussPoint<T: Scalar> {
    pub slave: Vector2<T>,
    pub slave_shape: ShapeFunctions<T>,
    pub master: Vector2<T>,
    pub slave_deriv: PairedVector<Vector2<T>>,
    pub master_deriv: PairedVector<Vector2<T>>,
    pub weight: T,
    pub weight_deriv: PairedVector<T>,
    pub subelement: Option<usize>,
}

/// Directional derivative of `x(xi)` for a moving parametric point.
fn point_deriv<T: Real>(
    view: &ElementView<T>,
    sf: &ShapeFunctions<T>,
    xi_deriv: &PairedVector<Vector2<T>>,
    tangents: &[Vector3<T>; 2],
) -> PairedVector<Vector3<T>> {
    let mut deriv = view.position_deriv(sf);
    deriv.add_mapped(xi_deriv, |dxi| tangents[0] * dxi.x + tangents[1] * dxi.y);
    deriv
}

/// Accumulates the derivative of `w a_i b_j` into `target`.
fn add_product_deriv<T: Real>(
    target: &mut PairedVector<T>,
    w: T,
    w_deriv: &PairedVector<T>,
    (a, a_deriv, i): (T, &PairedVector<DVector<T>>, usize),
    (b, b_deriv, j): (T, &PairedVector<DVector<T>>, usize),
) {
    target.add_mapped(w_deriv, |dw| *dw * a * b);
    target.add_mapped(a_deriv, |da| w * da[i] * b);
    target.add_mapped(b_deriv, |db| w * a * db[j]);
}

pub(crate) struct SlaveIntegrator<'a, T: Real> {
    slave: ElementView<'a, T>,
    basis: LagrangeMultiplierBasis<'a, T>,
    law: Option<&'a dyn ContactLaw<T>>,
    active: Vec<usize>,
    nodes: Vec<NodeContribution<T>>,
}

impl<'a, T: Real> SlaveIntegrator<'a, T> {
    pub fn new(slave: ElementView<'a, T>, basis: LagrangeMultiplierBasis<'a, T>, law: Option<&'a dyn ContactLaw<T>>) -> Self {
        let nodes = (0..slave.num_nodes())
            .map(|k| NodeContribution::new(slave.node(k).id, law.is_some()))
            .collect();
        Self {
            slave,
            active: basis.active(slave.num_nodes()),
            basis,
            law,
            nodes,
        }
    }

    pub fn finish(self) -> ElementContribution<T> {
        ElementContribution {
            element: self.slave.id(),
            nodes: self.nodes,
        }
    }

    /// Integrates over the cells of one slave/master pair.
    pub fn integrate_cells(
        &mut self,
        master: &ElementView<T>,
        cells: &[IntegrationCell<T>],
        config: &CoreConfig,
    ) -> Result<(), MortarError> {
        let slave = self.slave;
        let n_points = points_per_direction(slave.cell(), config).max(points_per_direction(master.cell(), config));
        let rule = if slave.dim() == 2 {
            QuadratureRule::interval(n_points)?
        } else {
            QuadratureRule::triangle(n_points)?
        };
        for cell in cells {
            for (weight, point) in rule.iter() {
                let mapped = cell.map_point(point);
                if mapped.jacobian <= T::zero() {
                    return Err(MortarError::integration(
                        slave.id(),
                        format!("non-positive cell Jacobian {:?} on master {}", mapped.jacobian, master.id()),
                    ));
                }
                let sf = slave.shape(&mapped.slave);
                let w = weight * mapped.jacobian * slave.jacobian_determinant(&sf);
                let w_deriv = weight_deriv(
                    &slave,
                    &sf,
                    weight,
                    &mapped.slave_deriv,
                    mapped.jacobian,
                    &mapped.jacobian_deriv,
                );
                let gp = GaussPoint {
                    slave: mapped.slave,
                    slave_shape: sf,
                    master: mapped.master,
                    slave_deriv: mapped.slave_deriv,
                    master_deriv: mapped.master_deriv,
                    weight: w,
                    weight_deriv: w_deriv,
                    subelement: cell.subelement,
                };
                self.integrate_point(master, &gp)?;
            }
        }
        Ok(())
    }

    /// Element-based integration: every Gauss point of the slave element is assigned to the
    /// first master onto which it projects exactly.
    ///
    /// If `fallback` is set and some Gauss point has no exact projection, nothing is integrated
    /// and `false` is returned.
    pub fn integrate_elements(
        &mut self,
        masters: &[ElementView<'a, T>],
        config: &CoreConfig,
        fallback: bool,
    ) -> Result<bool, MortarError> {
        let slave = self.slave;
        let rule = QuadratureRule::element(slave.cell(), points_per_direction(slave.cell(), config))?;
        let mut assigned = Vec::with_capacity(rule.len());
        for (weight, xi) in rule.iter() {
            let sf = slave.shape(xi);
            let x = slave.position(&sf);
            let found = masters.iter().find_map(|master| {
                let projection = project_point(master, &x, config);
                Some((master, projection)).filter(|(_, p)| p.exact)
            });
            match found {
                Some((master, projection)) => assigned.push((weight, *xi, sf, master, projection)),
                None if fallback => return Ok(false),
                None => {}
            }
        }

        for (weight, xi, sf, master, projection) in assigned {
            let point_deriv = slave.position_deriv(&sf);
            let master_deriv = projection_deriv(master, &projection, &point_deriv)?;
            let mut w_deriv = slave.jacobian_determinant_deriv(&sf);
            w_deriv.scale(weight);
            let gp = GaussPoint {
                slave: xi,
                master: projection.xi,
                weight: weight * slave.jacobian_determinant(&sf),
                slave_shape: sf,
                slave_deriv: PairedVector::new(),
                master_deriv,
                weight_deriv: w_deriv,
                subelement: None,
            };
            self.integrate_point(master, &gp)?;
        }
        Ok(true)
    }

    fn integrate_point(&mut self, master: &ElementView<T>, gp: &GaussPoint<T>) -> Result<(), MortarError> {
        let Self {
            slave,
            basis,
            law,
            active,
            nodes,
        } = self;
        let sf_s = &gp.slave_shape;
        let sf_m = master.shape(&gp.master);
        let (lm, lm_deriv) = evaluate_with_deriv(basis, slave, sf_s, &gp.slave, gp.subelement, &gp.slave_deriv)?;

        let ns_deriv = gp.slave_deriv.map(|dxi| sf_s.gradients.transpose() * dxi);
        let nm_deriv = gp.master_deriv.map(|dxi| sf_m.gradients.transpose() * dxi);

        let delta = master.position(&sf_m) - slave.position(sf_s);
        let mut delta_deriv = point_deriv(master, &sf_m, &gp.master_deriv, &master.tangents(&sf_m));
        delta_deriv.add_scaled(
            &point_deriv(slave, sf_s, &gp.slave_deriv, &slave.tangents(sf_s)),
            -T::one(),
        );

        let (w, w_deriv) = (gp.weight, &gp.weight_deriv);
        for &i in active.iter() {
            let lm_i = lm.values[i];
            let node = slave.node(i);
            let contribution = &mut nodes[i];

            for j in 0..slave.num_nodes() {
                let column = slave.node(j).id;
                let n_j = sf_s.values[j];
                contribution.d.add(column, w * lm_i * n_j);
                let deriv = contribution.d_deriv.entry_or_insert_with(column, PairedVector::new);
                add_product_deriv(deriv, w, w_deriv, (lm_i, &lm_deriv, i), (n_j, &ns_deriv, j));
            }
            for j in 0..master.num_nodes() {
                let column = master.node(j).id;
                let n_j = sf_m.values[j];
                contribution.m.add(column, w * lm_i * n_j);
                let deriv = contribution.m_deriv.entry_or_insert_with(column, PairedVector::new);
                add_product_deriv(deriv, w, w_deriv, (lm_i, &lm_deriv, i), (n_j, &nm_deriv, j));
            }

            let normal = node.normal();
            let gap = delta.dot(normal);
            contribution.gap += w * lm_i * gap;
            let gap_deriv = &mut contribution.gap_deriv;
            gap_deriv.add_mapped(w_deriv, |dw| *dw * lm_i * gap);
            gap_deriv.add_mapped(&lm_deriv, |dl| w * dl[i] * gap);
            gap_deriv.add_mapped(&delta_deriv, |dd| w * lm_i * dd.dot(normal));
            gap_deriv.add_mapped(node.normal_deriv(), |dn| w * lm_i * delta.dot(dn));
        }

        if let Some(law) = law {
            let kinematics = contact_kinematics(slave, sf_s, master, &sf_m, gp, &delta, &delta_deriv);
            let response = law.evaluate(&kinematics.state);
            let mut pressure_deriv = kinematics.gap_deriv.map(|dg| response.pressure_gap * *dg);
            pressure_deriv.add_mapped(&kinematics.slip_deriv, |ds| response.pressure_slip.dot(ds));
            let mut traction_deriv = kinematics.gap_deriv.map(|dg| response.traction_gap * *dg);
            traction_deriv.add_mapped(&kinematics.slip_deriv, |ds| response.traction_slip * ds);

            let (p, t) = (response.pressure, response.traction);
            for &i in active.iter() {
                let lm_i = lm.values[i];
                if let Some(contact) = nodes[i].contact.as_mut() {
                    contact.pressure += w * lm_i * p;
                    contact.pressure_deriv.add_mapped(w_deriv, |dw| *dw * lm_i * p);
                    contact.pressure_deriv.add_mapped(&lm_deriv, |dl| w * dl[i] * p);
                    contact.pressure_deriv.add_mapped(&pressure_deriv, |dp| w * lm_i * *dp);

                    contact.traction += t * (w * lm_i);
                    contact.traction_deriv.add_mapped(w_deriv, |dw| t * (*dw * lm_i));
                    contact.traction_deriv.add_mapped(&lm_deriv, |dl| t * (w * dl[i]));
                    contact.traction_deriv.add_mapped(&traction_deriv, |dt| dt * (w * lm_i));
                }
            }
        }
        Ok(())
    }
}

struct ContactKinematics<T: Scalar> {
    state: ContactState<T>,
    gap_deriv: PairedVector<T>,
    slip_deriv: PairedVector<Vector3<T>>,
}

/// Normal gap and tangential relative displacement at a Gauss point.
fn contact_kinematics<T: Real>(
    slave: &ElementView<T>,
    sf_s: &ShapeFunctions<T>,
    master: &ElementView<T>,
    sf_m: &ShapeFunctions<T>,
    gp: &GaussPoint<T>,
    delta: &Vector3<T>,
    delta_deriv: &PairedVector<Vector3<T>>,
) -> ContactKinematics<T> {
    let raw = slave.nodal_normal_field(sf_s);
    let mut raw_deriv = slave.nodal_normal_field_deriv(sf_s);
    let raw_xi = slave.nodal_normal_field_xi_deriv(sf_s);
    raw_deriv.add_mapped(&gp.slave_deriv, |dxi| raw_xi[0] * dxi.x + raw_xi[1] * dxi.y);

    let length = raw.norm();
    let normal = raw / length;
    let tangential = Matrix3::identity() - normal * normal.transpose();
    let normal_deriv = raw_deriv.map(|dn| tangential * dn / length);

    let gap = delta.dot(&normal);
    let mut gap_deriv = delta_deriv.map(|dd| dd.dot(&normal));
    gap_deriv.add_mapped(&normal_deriv, |dn| delta.dot(dn));

    let du = master.displacement(sf_m) - slave.displacement(sf_s);
    let du_m = master.displacement_tangents(sf_m);
    let du_s = slave.displacement_tangents(sf_s);
    // Displacement and coordinate DOFs coincide, x = X + u
    let mut du_deriv = point_deriv(master, sf_m, &gp.master_deriv, &du_m);
    du_deriv.add_mapped(&gp.slave_deriv, |dxi| -(du_s[0] * dxi.x + du_s[1] * dxi.y));
    du_deriv.add_scaled(&slave.position_deriv(sf_s), -T::one());

    let slip = tangential * du;
    let mut slip_deriv = du_deriv.map(|d| tangential * d);
    slip_deriv.add_mapped(&normal_deriv, |dn| -(dn * normal.dot(&du)) - normal * dn.dot(&du));

    ContactKinematics {
        state: ContactState { gap, slip, normal },
        gap_deriv,
        slip_deriv,
    }
}
