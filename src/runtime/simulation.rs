//! End-to-end simulation runner.
//!
//! Concurrent mode spawns the operator pool, launches one thread per aircraft
//! with a small stagger, joins the flights, then closes the queue and joins
//! the operators. Sequential mode flies each aircraft to completion on the
//! calling thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::builders::{build_sink, build_tower, BuiltTower};
use crate::config::{SimulationConfig, SimulationMode};
use crate::core::{
    operator_id, run_flight, spawn_flight, spawn_operator, AirportSnapshot, ConcurrentTower,
    EventSink, FlightReport, FlightTimings, SequentialTower, Tower, TowerError, TowerStats,
};
use crate::runtime::summary::write_summary;

/// A flight that did not reach `DEPARTED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightFailure {
    /// Callsign.
    pub aircraft: String,
    /// What went wrong.
    pub reason: String,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Tower implementation used.
    pub mode: SimulationMode,
    /// Completed flights in launch order.
    pub flights: Vec<FlightReport>,
    /// Flights that ended early.
    pub failures: Vec<FlightFailure>,
    /// Tower counters at the end of the run.
    pub stats: TowerStats,
    /// Final airport state.
    pub snapshot: AirportSnapshot,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl SimulationReport {
    /// Every flight departed and the airport is empty.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
            && self.snapshot.busy_runways() == 0
            && self.snapshot.busy_gates() == 0
            && self.snapshot.pending_landings.is_empty()
            && self.snapshot.pending_takeoffs.is_empty()
    }

    /// Mean wait for landing clearance.
    #[must_use]
    pub fn mean_landing_wait(&self) -> Duration {
        mean(self.flights.iter().map(|f| f.landing_wait))
    }

    /// Mean wait for takeoff clearance.
    #[must_use]
    pub fn mean_takeoff_wait(&self) -> Duration {
        mean(self.flights.iter().map(|f| f.takeoff_wait))
    }
}

fn mean(waits: impl Iterator<Item = Duration>) -> Duration {
    let (total, count) = waits.fold((Duration::ZERO, 0u32), |(t, n), w| (t + w, n + 1));
    if count == 0 {
        Duration::ZERO
    } else {
        total / count
    }
}

/// A configured simulation, ready to run once.
pub struct Simulation {
    config: SimulationConfig,
    sink: Option<Box<dyn EventSink>>,
}

impl Simulation {
    /// Simulation over `config`.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self { config, sink: None }
    }

    /// Report every tower decision to `sink` as well.
    #[must_use]
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Fly every aircraft and collect the results.
    ///
    /// # Errors
    ///
    /// `TowerError::InvalidConfig` for a bad configuration,
    /// `TowerError::Internal` if threads cannot be spawned, and
    /// `TowerError::Persistence` if the summary file cannot be written.
    pub fn run(self) -> Result<SimulationReport, TowerError> {
        let Self { config, sink } = self;
        let started = Instant::now();
        let built = build_tower(&config, build_sink(&config, sink))?;
        info!(
            mode = %config.mode,
            aircraft = config.aircraft,
            runways = config.runways,
            gates = config.gates,
            "simulation starting"
        );

        let outcomes = match &built {
            BuiltTower::Concurrent(tower) => run_concurrent(&config, tower)?,
            BuiltTower::Sequential(tower) => run_sequential(&config, tower),
        };

        let mut flights = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (aircraft, outcome) in outcomes {
            match outcome {
                Ok(report) => flights.push(report),
                Err(reason) => {
                    warn!(aircraft = %aircraft, "flight failed: {}", reason);
                    failures.push(FlightFailure { aircraft, reason });
                }
            }
        }

        let tower = built.as_tower();
        let report = SimulationReport {
            mode: config.mode,
            flights,
            failures,
            stats: tower.stats(),
            snapshot: tower.snapshot(),
            elapsed: started.elapsed(),
        };
        info!(
            completed = report.flights.len(),
            failed = report.failures.len(),
            elapsed = ?report.elapsed,
            "simulation finished"
        );

        if let Some(path) = &config.summary_file {
            write_summary(path, &report)?;
        }
        Ok(report)
    }
}

type FlightOutcome = (String, Result<FlightReport, String>);

fn run_sequential(config: &SimulationConfig, tower: &SequentialTower) -> Vec<FlightOutcome> {
    (1..=config.aircraft)
        .map(|n| {
            let callsign = config.callsign(n);
            let outcome = run_flight(tower, &callsign, &FlightTimings::sample(&config.timing))
                .map_err(|e| e.to_string());
            (callsign, outcome)
        })
        .collect()
}

fn run_concurrent(
    config: &SimulationConfig,
    tower: &Arc<ConcurrentTower>,
) -> Result<Vec<FlightOutcome>, TowerError> {
    let mut operators = Vec::with_capacity(config.operators);
    for n in 1..=config.operators {
        match spawn_operator(Arc::clone(tower), operator_id(n)) {
            Ok(handle) => operators.push(handle),
            Err(e) => {
                shutdown(tower, operators);
                return Err(e);
            }
        }
    }

    let shared: Arc<dyn Tower> = Arc::clone(tower) as Arc<dyn Tower>;
    let stagger = Duration::from_millis(config.timing.arrival_stagger_ms);
    let mut flights = Vec::with_capacity(config.aircraft);
    for n in 1..=config.aircraft {
        let callsign = config.callsign(n);
        let timings = FlightTimings::sample(&config.timing);
        match spawn_flight(Arc::clone(&shared), callsign.clone(), timings) {
            Ok(handle) => flights.push((callsign, handle)),
            Err(e) => {
                shutdown(tower, operators);
                return Err(e);
            }
        }
        if !stagger.is_zero() {
            thread::sleep(stagger);
        }
    }

    let outcomes = flights
        .into_iter()
        .map(|(callsign, handle)| {
            let outcome = match handle.join() {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err("flight thread panicked".to_string()),
            };
            (callsign, outcome)
        })
        .collect();

    shutdown(tower, operators);
    Ok(outcomes)
}

fn shutdown(tower: &ConcurrentTower, operators: Vec<JoinHandle<usize>>) {
    tower.close();
    let mut handled = 0;
    for (idx, handle) in operators.into_iter().enumerate() {
        match handle.join() {
            Ok(n) => handled += n,
            Err(_) => error!(operator = %operator_id(idx + 1), "operator thread panicked"),
        }
    }
    info!(handled, "operators stood down");
}
