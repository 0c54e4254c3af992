//! End-to-end simulation tests.
//!
//! A checking sink replays every grant and release the coordinator reports
//! and records any double booking or capacity overrun it observes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use airport_tower::config::{SimulationConfig, SimulationMode, TimingConfig};
use airport_tower::core::{EventSink, FlightStatus, TowerAction, TowerEvent};
use airport_tower::runtime::Simulation;

#[derive(Clone, Default)]
struct OccupancyChecker {
    state: Arc<Mutex<Occupancy>>,
}

#[derive(Default)]
struct Occupancy {
    holders: HashMap<String, String>,
    peak_runways: usize,
    peak_gates: usize,
    violations: Vec<String>,
}

impl Occupancy {
    fn busy(&self, prefix: &str) -> usize {
        self.holders.keys().filter(|id| id.starts_with(prefix)).count()
    }
}

impl EventSink for OccupancyChecker {
    fn record(&mut self, event: TowerEvent) {
        let mut s = self.state.lock();
        let ids: Vec<String> = event
            .detail
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_owned)
            .collect();
        match event.action {
            TowerAction::Assigned | TowerAction::Resumed => {
                for id in ids {
                    if let Some(holder) = s.holders.insert(id.clone(), event.aircraft.to_string()) {
                        s.violations
                            .push(format!("{id} granted to {} while held by {holder}", event.aircraft));
                    }
                }
            }
            TowerAction::Released => {
                for id in ids {
                    if s.holders.remove(&id).is_none() {
                        s.violations.push(format!("{id} released while free"));
                    }
                }
            }
            _ => {}
        }
        s.peak_runways = s.peak_runways.max(s.busy("RWY-"));
        s.peak_gates = s.peak_gates.max(s.busy("GATE-"));
    }
}

fn fast(cfg: SimulationConfig) -> SimulationConfig {
    cfg.with_timing(TimingConfig {
        approach_min_ms: 0,
        approach_max_ms: 20,
        landing_ms: 2,
        boarding_max_ms: 10,
        departing_ms: 2,
        saturation_backoff_ms: 1,
        arrival_stagger_ms: 1,
        assignment_timeout_ms: Some(30_000),
    })
}

#[test]
fn test_default_airport_under_contention() {
    let checker = OccupancyChecker::default();
    let cfg = fast(SimulationConfig::default());
    let report = Simulation::new(cfg).with_sink(checker.clone()).run().unwrap();

    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(report.mode, SimulationMode::Concurrent);
    assert_eq!(report.flights.len(), 20);
    assert_eq!(report.stats.departed, 20);
    assert_eq!(report.stats.landings_assigned, 20);
    assert_eq!(report.stats.takeoffs_assigned, 20);
    assert_eq!(report.stats.resumed, report.stats.deferred);

    let occupancy = checker.state.lock();
    assert!(occupancy.violations.is_empty(), "{:?}", occupancy.violations);
    assert!(occupancy.holders.is_empty());
    assert!(occupancy.peak_runways <= 3);
    assert!(occupancy.peak_gates <= 5);
}

#[test]
fn test_single_runway_single_gate_serializes_everyone() {
    let checker = OccupancyChecker::default();
    let cfg = fast(
        SimulationConfig::default()
            .with_aircraft(8)
            .with_resources(1, 1)
            .with_operators(3)
            .with_max_queue(2),
    );
    let report = Simulation::new(cfg).with_sink(checker.clone()).run().unwrap();

    assert!(report.is_clean(), "{:?}", report.failures);
    assert!(report
        .flights
        .iter()
        .all(|f| f.final_status == FlightStatus::Departed));
    let occupancy = checker.state.lock();
    assert!(occupancy.violations.is_empty(), "{:?}", occupancy.violations);
    assert_eq!(occupancy.peak_runways, 1);
    assert_eq!(occupancy.peak_gates, 1);
}

#[test]
fn test_tiny_queue_forces_backoff_without_loss() {
    let cfg = SimulationConfig::default()
        .with_aircraft(15)
        .with_resources(2, 2)
        .with_operators(1)
        .with_max_queue(1)
        .with_timing(TimingConfig::instant());
    let report = Simulation::new(cfg).run().unwrap();

    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(report.stats.departed, 15);
    // Five requests per flight, each accepted exactly once.
    assert_eq!(report.stats.submitted, 75);
    let retries: u64 = report
        .flights
        .iter()
        .map(|f| u64::from(f.saturated_retries))
        .sum();
    assert_eq!(retries, report.stats.saturated);
}

#[cfg(feature = "tokio-runtime")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_wait_on_live_tower() {
    use std::time::Duration;

    use airport_tower::core::{operator_id, spawn_operator, ConcurrentTower, RequestKind, Tower};

    let tower = Arc::new(ConcurrentTower::new(1, 1, 5));
    let operator = spawn_operator(Arc::clone(&tower), operator_id(1)).unwrap();
    let aircraft = tower.register("IBE-100");
    aircraft.advance(FlightStatus::LandingRequested).unwrap();
    tower.submit("IBE-100", RequestKind::Landing).unwrap();

    let status = Arc::clone(&aircraft)
        .wait_until_async(FlightStatus::LandingAssigned, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(status, FlightStatus::LandingAssigned);

    tower.close();
    operator.join().unwrap();
}
