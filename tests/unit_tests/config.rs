use mortar::config::{ConsistentDual, CoreConfig, IntegrationType, LagrangeMultiplierOrder, LagrangeMultiplierShape};
use mortar::error::MortarError;

#[test]
fn default_configuration_is_valid() {
    let config = CoreConfig::default();
    assert_eq!(config.lm_shape, LagrangeMultiplierShape::Dual);
    assert_eq!(config.integration, IntegrationType::Segments);
    assert_eq!(config.consistent_dual, ConsistentDual::None);
    assert!(config.uses_dual_basis());
    assert!(config.validate(2).is_ok());
    assert!(config.validate(3).is_ok());
}

#[test]
fn json_fields_override_defaults() {
    let config = CoreConfig::from_json_str(
        r#"{
            "lm_shape": "petrov_galerkin",
            "lm_quad": "linear",
            "integration": "elements_bs",
            "consistent_dual": "boundary",
            "gauss_points_1d": 5
        }"#,
    )
    .unwrap();
    assert_eq!(config.lm_shape, LagrangeMultiplierShape::PetrovGalerkin);
    assert_eq!(config.lm_quad, LagrangeMultiplierOrder::Linear);
    assert_eq!(config.integration, IntegrationType::ElementsBoundarySegmentation);
    assert_eq!(config.consistent_dual, ConsistentDual::Boundary);
    assert_eq!(config.gauss_points_1d, Some(5));
    assert_eq!(config.projection_tolerance, CoreConfig::default().projection_tolerance);
}

#[test]
fn unknown_json_fields_are_rejected() {
    assert!(CoreConfig::from_json_str(r#"{ "lm_shape": "dual", "frobnicate": true }"#).is_err());
    assert!(CoreConfig::from_json_str(r#"{ "integration": "nodes" }"#).is_err());
}

#[test]
fn json_with_unsupported_flag_is_rejected() {
    let err = CoreConfig::from_json_str(r#"{ "damping": true }"#).unwrap_err();
    assert_eq!(
        err.downcast_ref::<MortarError>(),
        Some(&MortarError::UnsupportedFlag("damping"))
    );
}

#[test]
fn unsupported_flags() {
    let cases = [
        (
            CoreConfig {
                gap_shift: Some(0.1),
                ..CoreConfig::default()
            },
            "gap_shift",
        ),
        (
            CoreConfig {
                basic_stiff_gap: true,
                ..CoreConfig::default()
            },
            "basic_stiff_gap",
        ),
        (
            CoreConfig {
                wear: true,
                ..CoreConfig::default()
            },
            "wear",
        ),
        (
            CoreConfig {
                damping: true,
                ..CoreConfig::default()
            },
            "damping",
        ),
    ];
    for (config, flag) in cases {
        assert_eq!(config.validate(3), Err(MortarError::UnsupportedFlag(flag)));
    }
}

#[test]
fn contradictory_options() {
    let standard_consistent = CoreConfig {
        lm_shape: LagrangeMultiplierShape::Standard,
        consistent_dual: ConsistentDual::All,
        ..CoreConfig::default()
    };
    let element_consistent = CoreConfig {
        integration: IntegrationType::Elements,
        consistent_dual: ConsistentDual::Boundary,
        ..CoreConfig::default()
    };
    let pwlin_elements = CoreConfig {
        lm_shape: LagrangeMultiplierShape::PiecewiseLinear,
        integration: IntegrationType::Elements,
        ..CoreConfig::default()
    };
    let no_points = CoreConfig {
        gauss_points_1d: Some(0),
        ..CoreConfig::default()
    };
    let negative_tolerance = CoreConfig {
        clip_tolerance: -1.0,
        ..CoreConfig::default()
    };
    for config in [
        standard_consistent,
        element_consistent,
        pwlin_elements,
        no_points,
        negative_tolerance,
    ] {
        assert!(matches!(config.validate(3), Err(MortarError::Configuration(_))));
    }
}

#[test]
fn piecewise_linear_lm_is_three_dimensional_only() {
    let config = CoreConfig {
        lm_shape: LagrangeMultiplierShape::PiecewiseLinear,
        ..CoreConfig::default()
    };
    assert!(config.validate(3).is_ok());
    assert!(!config.uses_dual_basis());
    assert!(matches!(config.validate(2), Err(MortarError::Configuration(_))));
}

#[test]
fn problem_dimension_is_checked() {
    assert!(matches!(
        CoreConfig::default().validate(4),
        Err(MortarError::Configuration(_))
    ));
}

#[test]
fn element_based_integration_accepts_consistent_dual_with_fallback() {
    let config = CoreConfig {
        integration: IntegrationType::ElementsBoundarySegmentation,
        consistent_dual: ConsistentDual::Boundary,
        ..CoreConfig::default()
    };
    assert!(config.validate(2).is_ok());
}

#[test]
fn configuration_round_trips_through_json() {
    let config = CoreConfig {
        lm_shape: LagrangeMultiplierShape::Standard,
        gauss_points_1d: Some(3),
        ..CoreConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"standard\""));
    assert_eq!(CoreConfig::from_json_str(&json).unwrap(), config);
}
