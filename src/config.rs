//! Run-time options recognised by the mortar core.
//!
//! A [`CoreConfig`] is passed explicitly into [`Interface::new`](crate::coupling::Interface::new)
//! and validated there against the problem dimension. It can be deserialized from JSON, which
//! is how hosts usually provide it.
use crate::error::MortarError;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Shape of the Lagrange multiplier basis on the slave side.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LagrangeMultiplierShape {
    /// The LM basis coincides with the displacement basis.
    Standard,
    /// Biorthogonal basis, `Λ_i = A_ij N_j`.
    Dual,
    /// Dual test functions with standard trial functions. The coupling operators are
    /// integrated with the dual basis.
    PetrovGalerkin,
    /// Piecewise linear LM on a subdivision of quadratic slave elements.
    PiecewiseLinear,
}

/// Order of the LM basis on quadratic slave elements.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LagrangeMultiplierOrder {
    Quadratic,
    /// Only vertex nodes carry Lagrange multipliers.
    Linear,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationType {
    /// Integrate over overlap segments (2D) or clipped cells (3D).
    Segments,
    /// Integrate over the full slave element, projecting every Gauss point onto the masters.
    Elements,
    /// Element-based integration with segment-based fallback on boundary elements.
    #[serde(rename = "elements_bs")]
    ElementsBoundarySegmentation,
}

/// Domain over which the dual coefficients are computed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistentDual {
    /// Always integrate over the full slave element.
    None,
    /// Integrate over the projected overlap on partially covered slave elements.
    Boundary,
    /// Integrate over the projected overlap on every slave element.
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub lm_shape: LagrangeMultiplierShape,
    pub lm_quad: LagrangeMultiplierOrder,
    pub integration: IntegrationType,
    pub consistent_dual: ConsistentDual,
    /// Apply the boundary transformation on elements with boundary, corner or edge nodes.
    pub boundary_trafo: bool,
    /// Evaluate normal and tangential kinematics and consult the contact law.
    pub contact: bool,
    /// Tolerance on the reference domain for a projection to count as feasible.
    pub projection_tolerance: f64,
    /// Tolerance on the reference domain for a projection to count as exactly inside.
    pub exact_projection_limit: f64,
    pub newton_tolerance: f64,
    pub newton_max_iterations: usize,
    pub clip_tolerance: f64,
    /// Cells smaller than this fraction of the slave reference area are discarded.
    pub min_cell_area_fraction: f64,
    /// Overrides the number of Gauss points per direction.
    pub gauss_points_1d: Option<usize>,
    pub gap_shift: Option<f64>,
    pub basic_stiff_gap: bool,
    pub wear: bool,
    pub damping: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            lm_shape: LagrangeMultiplierShape::Dual,
            lm_quad: LagrangeMultiplierOrder::Quadratic,
            integration: IntegrationType::Segments,
            consistent_dual: ConsistentDual::None,
            boundary_trafo: true,
            contact: false,
            projection_tolerance: 0.05,
            exact_projection_limit: 1e-8,
            newton_tolerance: 1e-12,
            newton_max_iterations: 10,
            clip_tolerance: 1e-8,
            min_cell_area_fraction: 1e-12,
            gauss_points_1d: None,
            gap_shift: None,
            basic_stiff_gap: false,
            wear: false,
            damping: false,
        }
    }
}

impl CoreConfig {
    /// Checks the configuration for unsupported flags and contradictions.
    pub fn validate(&self, dim: usize) -> Result<(), MortarError> {
        if self.gap_shift.is_some() {
            return Err(MortarError::UnsupportedFlag("gap_shift"));
        }
        if self.basic_stiff_gap {
            return Err(MortarError::UnsupportedFlag("basic_stiff_gap"));
        }
        if self.wear {
            return Err(MortarError::UnsupportedFlag("wear"));
        }
        if self.damping {
            return Err(MortarError::UnsupportedFlag("damping"));
        }
        if dim != 2 && dim != 3 {
            return Err(MortarError::Configuration(format!(
                "problem dimension must be 2 or 3, got {}",
                dim
            )));
        }

        use LagrangeMultiplierShape::*;
        if self.consistent_dual != ConsistentDual::None {
            if matches!(self.lm_shape, Standard | PiecewiseLinear) {
                return Err(MortarError::Configuration(format!(
                    "consistent dual requires a dual LM shape, got {:?}",
                    self.lm_shape
                )));
            }
            if self.integration == IntegrationType::Elements {
                return Err(MortarError::Configuration(
                    "consistent dual requires segment-based integration".to_string(),
                ));
            }
        }
        if self.lm_shape == PiecewiseLinear && dim == 2 {
            return Err(MortarError::Configuration(
                "piecewise linear LM is not available in 2D".to_string(),
            ));
        }
        if self.lm_shape == PiecewiseLinear && self.integration != IntegrationType::Segments {
            return Err(MortarError::Configuration(
                "piecewise linear LM requires segment-based integration".to_string(),
            ));
        }
        if self.newton_max_iterations == 0 || self.gauss_points_1d == Some(0) {
            return Err(MortarError::Configuration(
                "iteration and quadrature point counts must be positive".to_string(),
            ));
        }
        let tolerances = [
            self.projection_tolerance,
            self.exact_projection_limit,
            self.newton_tolerance,
            self.clip_tolerance,
            self.min_cell_area_fraction,
        ];
        if tolerances.iter().any(|tol| !(tol.is_finite() && *tol >= 0.0)) {
            return Err(MortarError::Configuration(
                "tolerances must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the dual coefficient matrix is needed at all.
    pub fn uses_dual_basis(&self) -> bool {
        matches!(
            self.lm_shape,
            LagrangeMultiplierShape::Dual | LagrangeMultiplierShape::PetrovGalerkin
        )
    }

    /// Parses a configuration from JSON and rejects unsupported flags.
    pub fn from_json_str(json: &str) -> eyre::Result<Self> {
        let config: Self = serde_json::from_str(json).wrap_err("failed to parse mortar configuration")?;
        // Any configuration valid in 2D is valid in 3D, so this checks everything that does
        // not depend on the mesh
        config.validate(3)?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read mortar configuration from {}", path.display()))?;
        Self::from_json_str(&json)
    }
}
