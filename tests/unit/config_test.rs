//! Tests for configuration validation

use airport_tower::config::{SimulationConfig, SimulationMode, TimingConfig};

#[test]
fn test_default_config_is_valid() {
    assert!(SimulationConfig::default().validate().is_ok());
    assert!(SimulationConfig::sequential().validate().is_ok());
}

#[test]
fn test_zero_runways_invalid() {
    let cfg = SimulationConfig::default().with_resources(0, 3);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_zero_gates_invalid() {
    let cfg = SimulationConfig::default().with_resources(3, 0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_zero_operators_only_matters_when_concurrent() {
    let concurrent = SimulationConfig::default().with_operators(0);
    assert!(concurrent.validate().is_err());

    let sequential = SimulationConfig::sequential().with_operators(0);
    assert!(sequential.validate().is_ok());
}

#[test]
fn test_inverted_approach_window_invalid() {
    let timing = TimingConfig {
        approach_min_ms: 900,
        approach_max_ms: 100,
        ..TimingConfig::default()
    };
    let err = SimulationConfig::default()
        .with_timing(timing)
        .validate()
        .unwrap_err();
    assert!(err.starts_with("timing invalid"));
}

#[test]
fn test_from_json_fills_defaults() {
    let cfg = SimulationConfig::from_json_str(
        r#"{ "mode": "sequential", "aircraft": 4, "timing": { "landing_ms": 5 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.mode, SimulationMode::Sequential);
    assert_eq!(cfg.aircraft, 4);
    assert_eq!(cfg.runways, 3);
    assert_eq!(cfg.timing.landing_ms, 5);
    assert_eq!(cfg.timing.approach_max_ms, 1500);
}

#[test]
fn test_from_json_rejects_invalid_values() {
    assert!(SimulationConfig::from_json_str(r#"{ "aircraft": 0 }"#).is_err());
    assert!(SimulationConfig::from_json_str("not json").is_err());
}

#[test]
fn test_mode_parsing() {
    assert_eq!("Concurrent".parse::<SimulationMode>(), Ok(SimulationMode::Concurrent));
    assert!("parallel".parse::<SimulationMode>().is_err());
}
