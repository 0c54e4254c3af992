//! Tower front ends shared by every flight.
//!
//! [`ConcurrentTower`] decouples aircraft from the coordinator through the
//! bounded queue and a pool of operator threads. [`SequentialTower`] runs the
//! same decisions inline on the submitting thread. Flights talk to either
//! through the [`Tower`] trait.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::aircraft::{Aircraft, AircraftId, AircraftSnapshot};
use super::coordinator::{Coordinator, ProcessOutcome, Withdrawal};
use super::error::TowerError;
use super::events::{SharedSink, TowerAction};
use super::queue::RequestQueue;
use super::request::{Request, RequestKind, RequestView};
use super::resources::Resource;
use crate::config::SimulationMode;

/// Operator identity used by the sequential tower.
pub const SEQUENTIAL_OPERATOR: &str = "SEQ";

/// What a flight needs from a control tower.
pub trait Tower: Send + Sync {
    /// Which implementation this is.
    fn mode(&self) -> SimulationMode;

    /// Register an aircraft, returning the shared handle. Registering an id
    /// twice returns the existing aircraft.
    fn register(&self, id: &str) -> Arc<Aircraft>;

    /// Publish a request for a registered aircraft.
    ///
    /// # Errors
    ///
    /// `TowerError::Saturated` when the request buffer is full (retry after a
    /// backoff), `TowerError::UnknownAircraft` for unregistered ids,
    /// `TowerError::Closed` after shutdown.
    fn submit(&self, aircraft: &str, kind: RequestKind) -> Result<(), TowerError>;

    /// Abandon the outstanding `kind` request of an aircraft that stopped
    /// waiting for clearance.
    ///
    /// Unless the grant already happened, the aircraft is also unregistered:
    /// it will never send the notifications that would release a grant.
    ///
    /// # Errors
    ///
    /// `TowerError::UnknownAircraft` for unregistered ids.
    fn withdraw(&self, aircraft: &str, kind: RequestKind) -> Result<Withdrawal, TowerError>;

    /// Consistent view of resources, queue and pending lists.
    fn snapshot(&self) -> AirportSnapshot;

    /// Counters since construction.
    fn stats(&self) -> TowerStats;
}

/// Tower counters combined with the coordinator's decision counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Requests accepted.
    pub submitted: u64,
    /// Submissions rejected by a full queue.
    pub saturated: u64,
    /// Landings assigned.
    pub landings_assigned: u64,
    /// Takeoffs assigned.
    pub takeoffs_assigned: u64,
    /// Requests deferred for lack of resources.
    pub deferred: u64,
    /// Deferred requests later serviced.
    pub resumed: u64,
    /// Resources released.
    pub released: u64,
    /// Requests abandoned before being served.
    pub withdrawn: u64,
    /// Aircraft that left the airport.
    pub departed: u64,
}

#[derive(Default)]
struct TowerCounters {
    submitted: AtomicU64,
    saturated: AtomicU64,
    departed: AtomicU64,
}

/// Registry, counters and coordinator common to both towers.
struct TowerCore {
    coordinator: Coordinator,
    registry: RwLock<HashMap<AircraftId, Arc<Aircraft>>>,
    counters: TowerCounters,
}

impl TowerCore {
    fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            registry: RwLock::new(HashMap::new()),
            counters: TowerCounters::default(),
        }
    }

    fn register(&self, id: &str) -> Arc<Aircraft> {
        if let Some(existing) = self.registry.read().get(id) {
            return Arc::clone(existing);
        }
        let mut registry = self.registry.write();
        Arc::clone(
            registry
                .entry(Arc::from(id))
                .or_insert_with(|| Arc::new(Aircraft::new(id))),
        )
    }

    fn lookup(&self, id: &str) -> Result<Arc<Aircraft>, TowerError> {
        self.registry
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| TowerError::UnknownAircraft(Arc::from(id)))
    }

    fn process(&self, request: Request, operator: &str) -> ProcessOutcome {
        let outcome = self.coordinator.process(request, operator);
        if outcome.kind == RequestKind::Departed {
            self.registry.write().remove(&outcome.aircraft);
            self.counters.departed.fetch_add(1, Ordering::Relaxed);
            info!(aircraft = %outcome.aircraft, "aircraft left the airport");
        }
        outcome
    }

    fn withdraw(&self, id: &str, kind: RequestKind) -> Result<Withdrawal, TowerError> {
        let aircraft = self.lookup(id)?;
        let settled = self.coordinator.withdraw(&aircraft, kind);
        if settled != Withdrawal::Granted {
            self.registry.write().remove(id);
            info!(aircraft = id, "aircraft gave up and left the frequency");
        }
        Ok(settled)
    }

    fn stats(&self) -> TowerStats {
        let decided = self.coordinator.stats();
        TowerStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            saturated: self.counters.saturated.load(Ordering::Relaxed),
            landings_assigned: decided.landings_assigned,
            takeoffs_assigned: decided.takeoffs_assigned,
            deferred: decided.deferred,
            resumed: decided.resumed,
            released: decided.released,
            withdrawn: decided.withdrawn,
            departed: self.counters.departed.load(Ordering::Relaxed),
        }
    }

    fn snapshot(&self, mode: SimulationMode, queue: Vec<RequestView>, queue_capacity: usize) -> AirportSnapshot {
        let monitor = self.coordinator.snapshot();
        let mut flights: Vec<AircraftSnapshot> =
            self.registry.read().values().map(|a| a.snapshot()).collect();
        flights.sort_by(|a, b| a.id.cmp(&b.id));
        AirportSnapshot {
            mode,
            runways: monitor.runways,
            gates: monitor.gates,
            queue,
            queue_capacity,
            pending_landings: monitor.pending_landings,
            pending_takeoffs: monitor.pending_takeoffs,
            flights,
            stats: self.stats(),
        }
    }
}

/// Queue-fed tower serviced by operator threads.
pub struct ConcurrentTower {
    core: TowerCore,
    queue: RequestQueue,
}

impl ConcurrentTower {
    /// Tower with the given pool sizes and queue capacity.
    #[must_use]
    pub fn new(runways: usize, gates: usize, max_queue: usize) -> Self {
        Self::with_coordinator(Coordinator::new(runways, gates), max_queue)
    }

    /// Tower whose coordinator reports to `sink`.
    #[must_use]
    pub fn with_sink(runways: usize, gates: usize, max_queue: usize, sink: SharedSink) -> Self {
        Self::with_coordinator(Coordinator::new(runways, gates).with_sink(sink), max_queue)
    }

    fn with_coordinator(coordinator: Coordinator, max_queue: usize) -> Self {
        Self {
            core: TowerCore::new(coordinator),
            queue: RequestQueue::new(max_queue),
        }
    }

    /// Block until a request is available. `None` once closed and drained.
    pub fn next_request(&self) -> Option<Request> {
        self.queue.dequeue()
    }

    /// Run one request through the coordinator.
    pub fn process(&self, request: Request, operator: &str) -> ProcessOutcome {
        self.core.process(request, operator)
    }

    /// Stop accepting requests and release idle operators.
    pub fn close(&self) {
        info!(pending = self.queue.len(), "closing request queue");
        self.queue.close();
    }

    /// Current queue depth.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// The underlying coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &Coordinator {
        &self.core.coordinator
    }
}

impl Tower for ConcurrentTower {
    fn mode(&self) -> SimulationMode {
        SimulationMode::Concurrent
    }

    fn register(&self, id: &str) -> Arc<Aircraft> {
        self.core.register(id)
    }

    fn submit(&self, aircraft: &str, kind: RequestKind) -> Result<(), TowerError> {
        let aircraft = self.core.lookup(aircraft)?;
        // Recorded before an operator can dequeue it, so sinks never see a
        // decision ahead of its submission.
        let admitted = self.queue.enqueue_with(Request::new(Arc::clone(&aircraft), kind), |_| {
            self.core
                .coordinator
                .emit(&aircraft, TowerAction::Submitted, None, Some(kind.to_string()));
        });
        match admitted {
            Ok(()) => {
                self.core.counters.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(err @ TowerError::Saturated { .. }) => {
                self.core.counters.saturated.fetch_add(1, Ordering::Relaxed);
                warn!(aircraft = %aircraft.id(), kind = %kind, "{}", err);
                self.core
                    .coordinator
                    .emit(&aircraft, TowerAction::Saturated, None, Some(kind.to_string()));
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    fn withdraw(&self, aircraft: &str, kind: RequestKind) -> Result<Withdrawal, TowerError> {
        self.core.withdraw(aircraft, kind)
    }

    fn snapshot(&self) -> AirportSnapshot {
        let queue = self.queue.snapshot();
        self.core
            .snapshot(SimulationMode::Concurrent, queue, self.queue.capacity())
    }

    fn stats(&self) -> TowerStats {
        self.core.stats()
    }
}

/// Tower that decides on the submitting thread.
pub struct SequentialTower {
    core: TowerCore,
}

impl SequentialTower {
    /// Tower with the given pool sizes.
    #[must_use]
    pub fn new(runways: usize, gates: usize) -> Self {
        Self {
            core: TowerCore::new(Coordinator::new(runways, gates)),
        }
    }

    /// Tower whose coordinator reports to `sink`.
    #[must_use]
    pub fn with_sink(runways: usize, gates: usize, sink: SharedSink) -> Self {
        Self {
            core: TowerCore::new(Coordinator::new(runways, gates).with_sink(sink)),
        }
    }

    /// The underlying coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &Coordinator {
        &self.core.coordinator
    }
}

impl Tower for SequentialTower {
    fn mode(&self) -> SimulationMode {
        SimulationMode::Sequential
    }

    fn register(&self, id: &str) -> Arc<Aircraft> {
        self.core.register(id)
    }

    fn submit(&self, aircraft: &str, kind: RequestKind) -> Result<(), TowerError> {
        let aircraft = self.core.lookup(aircraft)?;
        self.core.counters.submitted.fetch_add(1, Ordering::Relaxed);
        self.core
            .coordinator
            .emit(&aircraft, TowerAction::Submitted, None, Some(kind.to_string()));
        self.core
            .process(Request::new(aircraft, kind), SEQUENTIAL_OPERATOR);
        Ok(())
    }

    fn withdraw(&self, aircraft: &str, kind: RequestKind) -> Result<Withdrawal, TowerError> {
        self.core.withdraw(aircraft, kind)
    }

    fn snapshot(&self) -> AirportSnapshot {
        self.core.snapshot(SimulationMode::Sequential, Vec::new(), 0)
    }

    fn stats(&self) -> TowerStats {
        self.core.stats()
    }
}

/// Point-in-time view of the whole airport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirportSnapshot {
    /// Tower implementation.
    pub mode: SimulationMode,
    /// Runways in pool order.
    pub runways: Vec<Resource>,
    /// Gates in pool order.
    pub gates: Vec<Resource>,
    /// Queued requests, oldest first.
    pub queue: Vec<RequestView>,
    /// Queue capacity (0 when there is no queue).
    pub queue_capacity: usize,
    /// Deferred landings, oldest first.
    pub pending_landings: Vec<RequestView>,
    /// Deferred takeoffs, oldest first.
    pub pending_takeoffs: Vec<RequestView>,
    /// Registered aircraft still at or approaching the airport.
    pub flights: Vec<AircraftSnapshot>,
    /// Counters.
    pub stats: TowerStats,
}

impl AirportSnapshot {
    /// Occupied runways.
    #[must_use]
    pub fn busy_runways(&self) -> usize {
        self.runways.iter().filter(|r| !r.available).count()
    }

    /// Occupied gates.
    #[must_use]
    pub fn busy_gates(&self) -> usize {
        self.gates.iter().filter(|g| !g.available).count()
    }
}

const PANEL_WIDTH: usize = 44;

fn rule(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "+{}+", "-".repeat(PANEL_WIDTH + 2))
}

fn row(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    writeln!(f, "| {text:<PANEL_WIDTH$} |")
}

fn resource_table(f: &mut fmt::Formatter<'_>, title: &str, resources: &[Resource]) -> fmt::Result {
    let busy = resources.iter().filter(|r| !r.available).count();
    rule(f)?;
    row(f, &format!("{title} ({busy}/{} busy)", resources.len()))?;
    rule(f)?;
    for r in resources {
        let state = if r.available { "free" } else { "occupied" };
        let holder = r.occupant.as_deref().unwrap_or("");
        row(f, &format!("{:<10}{:<10}{}", r.id, state, holder))?;
    }
    Ok(())
}

fn request_table(f: &mut fmt::Formatter<'_>, title: &str, requests: &[RequestView]) -> fmt::Result {
    rule(f)?;
    row(f, title)?;
    rule(f)?;
    if requests.is_empty() {
        row(f, "(empty)")?;
    }
    for (pos, r) in requests.iter().enumerate() {
        row(f, &format!("{:>2}. {:<12}{}", pos + 1, r.aircraft, r.kind))?;
    }
    Ok(())
}

impl fmt::Display for AirportSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        resource_table(f, "RUNWAYS", &self.runways)?;
        resource_table(f, "GATES", &self.gates)?;
        if self.mode == SimulationMode::Concurrent {
            request_table(
                f,
                &format!("QUEUE ({}/{})", self.queue.len(), self.queue_capacity),
                &self.queue,
            )?;
        }
        request_table(f, "PENDING LANDINGS", &self.pending_landings)?;
        request_table(f, "PENDING TAKEOFFS", &self.pending_takeoffs)?;
        rule(f)
    }
}
