//! Tests for the simulation runner and summaries

use std::fs;

use airport_tower::config::{SimulationConfig, TimingConfig};
use airport_tower::core::{FlightStatus, InMemoryEventSink, TowerAction};
use airport_tower::runtime::{summary_rows, Simulation};

fn quick(cfg: SimulationConfig) -> SimulationConfig {
    cfg.with_timing(TimingConfig::instant())
}

#[test]
fn test_sequential_run_completes_every_flight() {
    let report = Simulation::new(quick(SimulationConfig::sequential()))
        .run()
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(report.flights.len(), 10);
    assert!(report
        .flights
        .iter()
        .all(|f| f.final_status == FlightStatus::Departed));
    assert_eq!(report.stats.saturated, 0);
    assert_eq!(report.stats.deferred, 0);
}

#[test]
fn test_summary_csv_uses_semicolons() {
    let path = std::env::temp_dir().join(format!("airport-summary-{}.csv", uuid::Uuid::new_v4()));
    let mut cfg = quick(SimulationConfig::sequential().with_aircraft(3));
    cfg.summary_file = Some(path.clone());

    let report = Simulation::new(cfg).run().unwrap();
    let body = fs::read_to_string(&path).unwrap();
    let _ = fs::remove_file(&path);

    let mut lines = body.lines();
    assert_eq!(lines.next(), Some("metric;value"));
    assert!(body.contains("mode;sequential"));
    assert!(body.contains("completed;3"));
    assert_eq!(body.lines().count(), summary_rows(&report).len() + 1);
}

#[test]
fn test_state_file_lists_departed_aircraft() {
    let path = std::env::temp_dir().join(format!("airport-state-{}.json", uuid::Uuid::new_v4()));
    let mut cfg = quick(SimulationConfig::sequential().with_aircraft(2));
    cfg.state_file = Some(path.clone());

    Simulation::new(cfg).run().unwrap();
    let panel: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let _ = fs::remove_file(&path);

    assert_eq!(panel["IBE-001"], "DEPARTED");
    assert_eq!(panel["IBE-002"], "DEPARTED");
}

#[test]
fn test_extra_sink_receives_whole_lifecycle() {
    let log = InMemoryEventSink::new(256);
    Simulation::new(quick(SimulationConfig::sequential().with_aircraft(1)))
        .with_sink(log.clone())
        .run()
        .unwrap();

    let actions = log.actions_for("IBE-001");
    assert_eq!(actions.first(), Some(&TowerAction::Submitted));
    assert_eq!(
        actions.iter().filter(|a| **a == TowerAction::Released).count(),
        3
    );
}
