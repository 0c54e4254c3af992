//! Tests for builder modules

use airport_tower::builders::{build_sink, build_tower, BuiltTower};
use airport_tower::config::{SimulationConfig, SimulationMode};
use airport_tower::core::{EventSink, InMemoryEventSink, TowerError};

#[test]
fn test_build_concurrent_tower() {
    let cfg = SimulationConfig::default().with_resources(2, 4);
    let built = build_tower(&cfg, None).unwrap();
    assert!(matches!(built, BuiltTower::Concurrent(_)));

    let snap = built.as_tower().snapshot();
    assert_eq!(snap.runways.len(), 2);
    assert_eq!(snap.gates.len(), 4);
    assert_eq!(snap.queue_capacity, 5);
}

#[test]
fn test_build_sequential_tower() {
    let built = build_tower(&SimulationConfig::sequential(), None).unwrap();
    assert_eq!(built.mode(), SimulationMode::Sequential);
    assert_eq!(built.as_tower().mode(), SimulationMode::Sequential);
}

#[test]
fn test_build_rejects_invalid_config() {
    let cfg = SimulationConfig::default().with_max_queue(0);
    assert!(matches!(
        build_tower(&cfg, None),
        Err(TowerError::InvalidConfig(_))
    ));
}

#[test]
fn test_build_sink_combinations() {
    let cfg = SimulationConfig::default();
    assert!(build_sink(&cfg, None).is_none());

    let extra: Box<dyn EventSink> = Box::new(InMemoryEventSink::new(4));
    assert!(build_sink(&cfg, Some(extra)).is_some());

    let mut with_file = SimulationConfig::default();
    with_file.state_file = Some(std::env::temp_dir().join("airport-builder-state.json"));
    let extra: Box<dyn EventSink> = Box::new(InMemoryEventSink::new(4));
    assert!(build_sink(&with_file, Some(extra)).is_some());
}
