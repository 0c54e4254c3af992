//! The coordinator monitor: every runway and gate decision happens here.
//!
//! A single `parking_lot::Mutex` guards the resource pool and the pending
//! lists. Landings acquire runway and gate all-or-nothing, so no request ever
//! holds one while waiting for the other. Every release re-evaluates the
//! pending lists, landings first, so a freed resource is never left idle
//! while a compatible deferred request exists.
//!
//! An aircraft that stops waiting withdraws its request here too, so nothing
//! is ever granted to a flight that is no longer there to release it.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::aircraft::{Aircraft, AircraftId, FlightStatus};
use super::error::TowerError;
use super::events::{build_event, SharedSink, TowerAction};
use super::pending::PendingLists;
use super::request::{Request, RequestKind, RequestView};
use super::resources::{Resource, ResourceId, ResourceKind, ResourcePool, Shortage};

/// Resources granted to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assignment {
    /// Runway and gate for a landing.
    Landing {
        /// Landing runway.
        runway: ResourceId,
        /// Gate held through boarding.
        gate: ResourceId,
    },
    /// Runway for a takeoff.
    Takeoff {
        /// Departure runway.
        runway: ResourceId,
    },
}

/// Result of processing one request.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Requesting aircraft.
    pub aircraft: AircraftId,
    /// Kind of the processed request.
    pub kind: RequestKind,
    /// Aircraft status once processing finished.
    pub status: FlightStatus,
    /// Resources granted to this request, if any.
    pub assignment: Option<Assignment>,
    /// Why the request was parked, if it was.
    pub deferred: Option<Shortage>,
    /// Resource freed by a notification.
    pub released: Option<ResourceId>,
    /// Deferred requests serviced by the release that followed.
    pub resumed: Vec<(AircraftId, Assignment)>,
    /// The request had been withdrawn and was dropped unserved.
    pub withdrawn: bool,
}

impl ProcessOutcome {
    fn new(request: &Request) -> Self {
        Self {
            aircraft: Arc::clone(request.aircraft_id()),
            kind: request.kind(),
            status: request.aircraft().status(),
            assignment: None,
            deferred: None,
            released: None,
            resumed: Vec::new(),
            withdrawn: false,
        }
    }

    /// Whether the request went to a pending list.
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        self.deferred.is_some()
    }
}

/// Decision counters kept under the monitor lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStats {
    /// Landings assigned (immediately or after deferral).
    pub landings_assigned: u64,
    /// Takeoffs assigned (immediately or after deferral).
    pub takeoffs_assigned: u64,
    /// Requests parked on a pending list.
    pub deferred: u64,
    /// Deferred requests later serviced by a release.
    pub resumed: u64,
    /// Resources released.
    pub released: u64,
    /// Requests abandoned by their aircraft before being served.
    pub withdrawn: u64,
}

/// How a withdrawal was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Withdrawal {
    /// Taken off its pending list.
    Withdrawn,
    /// Not seen by the coordinator yet; it is dropped when it arrives.
    Cancelled,
    /// Already granted. The aircraft holds the resources and must carry on.
    Granted,
}

/// Consistent copy of everything the monitor guards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    /// Runways in pool order.
    pub runways: Vec<Resource>,
    /// Gates in pool order.
    pub gates: Vec<Resource>,
    /// Deferred landings, oldest first.
    pub pending_landings: Vec<RequestView>,
    /// Deferred takeoffs, oldest first.
    pub pending_takeoffs: Vec<RequestView>,
    /// Decision counters.
    pub stats: CoordinatorStats,
}

struct MonitorState {
    pool: ResourcePool,
    pending: PendingLists,
    cancelled: HashSet<(AircraftId, RequestKind)>,
    stats: CoordinatorStats,
}

/// Serialization point for all assignment and release decisions.
pub struct Coordinator {
    state: Mutex<MonitorState>,
    sink: Option<SharedSink>,
}

impl Coordinator {
    /// Create a monitor over `runways` runways and `gates` gates.
    #[must_use]
    pub fn new(runways: usize, gates: usize) -> Self {
        Self {
            state: Mutex::new(MonitorState {
                pool: ResourcePool::new(runways, gates),
                pending: PendingLists::new(),
                cancelled: HashSet::new(),
                stats: CoordinatorStats::default(),
            }),
            sink: None,
        }
    }

    /// Attach an observability sink.
    #[must_use]
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Process one request on behalf of `operator`.
    ///
    /// Never fails: a request that cannot be served now is deferred.
    pub fn process(&self, request: Request, operator: &str) -> ProcessOutcome {
        let mut state = self.state.lock();
        info!(
            operator,
            aircraft = %request.aircraft_id(),
            kind = %request.kind(),
            "processing request"
        );

        let mut outcome = ProcessOutcome::new(&request);
        if state
            .cancelled
            .remove(&(Arc::clone(request.aircraft_id()), request.kind()))
        {
            warn!(operator, aircraft = %request.aircraft_id(), kind = %request.kind(), "dropping withdrawn request");
            state.stats.withdrawn += 1;
            self.emit(
                request.aircraft(),
                TowerAction::Withdrawn,
                Some(operator),
                Some(request.kind().to_string()),
            );
            outcome.withdrawn = true;
            return outcome;
        }
        match request.kind() {
            RequestKind::Landing => self.handle_landing(&mut state, request, operator, &mut outcome),
            RequestKind::Takeoff => self.handle_takeoff(&mut state, request, operator, &mut outcome),
            RequestKind::Landed | RequestKind::Departed => {
                self.handle_release(&mut state, &request, ResourceKind::Runway, operator, &mut outcome);
            }
            RequestKind::Boarded => {
                self.handle_release(&mut state, &request, ResourceKind::Gate, operator, &mut outcome);
            }
        }
        drop(state);

        match outcome.assignment {
            Some(Assignment::Landing { .. }) => outcome.status = FlightStatus::LandingAssigned,
            Some(Assignment::Takeoff { .. }) => outcome.status = FlightStatus::TakeoffAssigned,
            None => {}
        }
        outcome
    }

    fn handle_landing(
        &self,
        state: &mut MonitorState,
        request: Request,
        operator: &str,
        outcome: &mut ProcessOutcome,
    ) {
        match self.try_assign_landing(state, request.aircraft(), operator, TowerAction::Assigned) {
            Ok(assignment) => outcome.assignment = Some(assignment),
            Err(shortage) => {
                let notice = TowerError::ResourceUnavailable {
                    aircraft: Arc::clone(request.aircraft_id()),
                    shortage,
                };
                warn!(operator, "{}; landing deferred", notice);
                self.defer(state, request, operator, shortage);
                outcome.deferred = Some(shortage);
            }
        }
    }

    fn handle_takeoff(
        &self,
        state: &mut MonitorState,
        request: Request,
        operator: &str,
        outcome: &mut ProcessOutcome,
    ) {
        match self.try_assign_takeoff(state, request.aircraft(), operator, TowerAction::Assigned) {
            Some(assignment) => outcome.assignment = Some(assignment),
            None => {
                warn!(operator, aircraft = %request.aircraft_id(), "no free runway; takeoff deferred");
                self.defer(state, request, operator, Shortage::Runway);
                outcome.deferred = Some(Shortage::Runway);
            }
        }
    }

    fn defer(&self, state: &mut MonitorState, request: Request, operator: &str, shortage: Shortage) {
        let aircraft = Arc::clone(request.aircraft());
        if let Err(request) = state.pending.defer(request) {
            error!(kind = %request.kind(), "notification cannot be deferred");
            return;
        }
        state.stats.deferred += 1;
        self.emit(
            &aircraft,
            TowerAction::Deferred,
            Some(operator),
            Some(format!("missing {shortage}")),
        );
    }

    fn handle_release(
        &self,
        state: &mut MonitorState,
        request: &Request,
        kind: ResourceKind,
        operator: &str,
        outcome: &mut ProcessOutcome,
    ) {
        let aircraft = request.aircraft();
        match request.releases() {
            Some(id) if state.pool.release(id) => {
                match kind {
                    ResourceKind::Runway => aircraft.clear_runway(id),
                    ResourceKind::Gate => aircraft.clear_gate(id),
                };
                state.stats.released += 1;
                info!(operator, aircraft = %aircraft.id(), resource = %id, "{} released", kind);
                outcome.released = Some(Arc::clone(id));
            }
            Some(id) => warn!(operator, aircraft = %aircraft.id(), resource = %id, "{} already free", kind),
            None => warn!(operator, aircraft = %aircraft.id(), "{} notification without an assigned {}", request.kind(), kind),
        }
        self.emit(
            aircraft,
            TowerAction::Released,
            Some(operator),
            outcome.released.as_ref().map(ToString::to_string),
        );

        outcome.resumed = self.review_pending(state, operator);
    }

    /// Service the oldest eligible deferred landing, then the oldest eligible
    /// deferred takeoff.
    fn review_pending(&self, state: &mut MonitorState, operator: &str) -> Vec<(AircraftId, Assignment)> {
        let mut resumed = Vec::new();

        if state.pending.has_landings()
            && state.pool.free_runways() > 0
            && state.pool.free_gates() > 0
        {
            if let Some(request) = state.pending.pop_landing() {
                debug!(operator, aircraft = %request.aircraft_id(), "resuming deferred landing");
                if let Ok(assignment) =
                    self.try_assign_landing(state, request.aircraft(), operator, TowerAction::Resumed)
                {
                    resumed.push((Arc::clone(request.aircraft_id()), assignment));
                }
            }
        }

        if state.pending.has_takeoffs() && state.pool.free_runways() > 0 {
            if let Some(request) = state.pending.pop_takeoff() {
                debug!(operator, aircraft = %request.aircraft_id(), "resuming deferred takeoff");
                if let Some(assignment) =
                    self.try_assign_takeoff(state, request.aircraft(), operator, TowerAction::Resumed)
                {
                    resumed.push((Arc::clone(request.aircraft_id()), assignment));
                }
            }
        }

        state.stats.resumed += resumed.len() as u64;
        resumed
    }

    /// Probe both resources before occupying either.
    fn try_assign_landing(
        &self,
        state: &mut MonitorState,
        aircraft: &Arc<Aircraft>,
        operator: &str,
        action: TowerAction,
    ) -> Result<Assignment, Shortage> {
        match (state.pool.find_free_runway(), state.pool.find_free_gate()) {
            (Some(runway), Some(gate)) => {
                state.pool.occupy(&runway, aircraft.id());
                state.pool.occupy(&gate, aircraft.id());
                aircraft.authorize_landing(Arc::clone(&runway), Arc::clone(&gate));
                state.stats.landings_assigned += 1;
                info!(
                    operator,
                    aircraft = %aircraft.id(),
                    runway = %runway,
                    gate = %gate,
                    "landing authorized"
                );
                self.emit(aircraft, action, Some(operator), Some(format!("{runway} {gate}")));
                Ok(Assignment::Landing { runway, gate })
            }
            (runway, gate) => Err(Shortage::from_probe(runway.is_some(), gate.is_some())
                .unwrap_or(Shortage::RunwayAndGate)),
        }
    }

    fn try_assign_takeoff(
        &self,
        state: &mut MonitorState,
        aircraft: &Arc<Aircraft>,
        operator: &str,
        action: TowerAction,
    ) -> Option<Assignment> {
        let runway = state.pool.find_free_runway()?;
        state.pool.occupy(&runway, aircraft.id());
        aircraft.authorize_takeoff(Arc::clone(&runway));
        state.stats.takeoffs_assigned += 1;
        info!(operator, aircraft = %aircraft.id(), runway = %runway, "takeoff authorized");
        self.emit(aircraft, action, Some(operator), Some(runway.to_string()));
        Some(Assignment::Takeoff { runway })
    }

    /// Take back the `kind` request of an aircraft that stopped waiting.
    ///
    /// Decided under the monitor lock, so it never races a grant: either the
    /// grant already happened (`Granted`), or the request is removed from its
    /// pending list, or it is still on its way and will be dropped unserved.
    /// Notifications are never withdrawn and report `Granted`.
    pub fn withdraw(&self, aircraft: &Aircraft, kind: RequestKind) -> Withdrawal {
        let Some(awaited) = kind.awaited_status() else {
            return Withdrawal::Granted;
        };
        let mut state = self.state.lock();
        if aircraft.status() >= awaited {
            debug!(aircraft = %aircraft.id(), kind = %kind, "withdrawal lost the race to a grant");
            return Withdrawal::Granted;
        }

        let settled = if state.pending.withdraw(aircraft.id(), kind).is_some() {
            state.stats.withdrawn += 1;
            Withdrawal::Withdrawn
        } else {
            state.cancelled.insert((Arc::clone(aircraft.id()), kind));
            Withdrawal::Cancelled
        };
        warn!(aircraft = %aircraft.id(), kind = %kind, settled = ?settled, "request withdrawn");
        if settled == Withdrawal::Withdrawn {
            self.emit(aircraft, TowerAction::Withdrawn, None, Some(kind.to_string()));
        }
        settled
    }

    /// Forward an event to the attached sink, if any.
    pub fn emit(
        &self,
        aircraft: &Aircraft,
        action: TowerAction,
        operator: Option<&str>,
        detail: Option<String>,
    ) {
        if let Some(sink) = &self.sink {
            sink.lock()
                .record(build_event(aircraft, action, operator, detail));
        }
    }

    /// Consistent copy of the pool, pending lists and counters.
    #[must_use]
    pub fn snapshot(&self) -> MonitorSnapshot {
        let state = self.state.lock();
        MonitorSnapshot {
            runways: state.pool.runways().to_vec(),
            gates: state.pool.gates().to_vec(),
            pending_landings: state.pending.landing_views(),
            pending_takeoffs: state.pending.takeoff_views(),
            stats: state.stats,
        }
    }

    /// Decision counters.
    #[must_use]
    pub fn stats(&self) -> CoordinatorStats {
        self.state.lock().stats
    }

    /// Whether every runway and gate is free and nothing is deferred.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.pool.is_idle() && state.pending.is_empty()
    }
}
