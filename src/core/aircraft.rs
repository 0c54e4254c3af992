//! Aircraft lifecycle state shared between a flight actor and the tower.
//!
//! Each `Aircraft` pairs its state with a `Condvar`. The tower's authorization
//! transitions notify it, so a flight waiting for clearance blocks instead of
//! polling.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use super::error::TowerError;
use super::resources::ResourceId;

/// Unique aircraft identifier (callsign).
pub type AircraftId = Arc<str>;

/// Lifecycle of an aircraft, in strict order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    /// Approaching the airport.
    InFlight,
    /// Landing request published; waiting for clearance.
    LandingRequested,
    /// Runway and gate assigned by the tower.
    LandingAssigned,
    /// On the runway.
    Landing,
    /// Off the runway, holding the gate.
    Landed,
    /// Passengers boarding.
    Boarding,
    /// Boarding finished.
    Boarded,
    /// Takeoff request published; waiting for clearance.
    TakeoffRequested,
    /// Runway assigned by the tower.
    TakeoffAssigned,
    /// On the runway for departure.
    Departing,
    /// Gone. Terminal.
    Departed,
}

impl FlightStatus {
    /// Every status in lifecycle order.
    pub const ALL: [Self; 11] = [
        Self::InFlight,
        Self::LandingRequested,
        Self::LandingAssigned,
        Self::Landing,
        Self::Landed,
        Self::Boarding,
        Self::Boarded,
        Self::TakeoffRequested,
        Self::TakeoffAssigned,
        Self::Departing,
        Self::Departed,
    ];

    /// The status that immediately follows this one.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::InFlight => Some(Self::LandingRequested),
            Self::LandingRequested => Some(Self::LandingAssigned),
            Self::LandingAssigned => Some(Self::Landing),
            Self::Landing => Some(Self::Landed),
            Self::Landed => Some(Self::Boarding),
            Self::Boarding => Some(Self::Boarded),
            Self::Boarded => Some(Self::TakeoffRequested),
            Self::TakeoffRequested => Some(Self::TakeoffAssigned),
            Self::TakeoffAssigned => Some(Self::Departing),
            Self::Departing => Some(Self::Departed),
            Self::Departed => None,
        }
    }

    /// Whether only the tower may move an aircraft into this status.
    #[must_use]
    pub const fn is_tower_assigned(self) -> bool {
        matches!(self, Self::LandingAssigned | Self::TakeoffAssigned)
    }

    /// Whether this is the final status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Departed)
    }

    /// Canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InFlight => "IN_FLIGHT",
            Self::LandingRequested => "LANDING_REQUESTED",
            Self::LandingAssigned => "LANDING_ASSIGNED",
            Self::Landing => "LANDING",
            Self::Landed => "LANDED",
            Self::Boarding => "BOARDING",
            Self::Boarded => "BOARDED",
            Self::TakeoffRequested => "TAKEOFF_REQUESTED",
            Self::TakeoffAssigned => "TAKEOFF_ASSIGNED",
            Self::Departing => "DEPARTING",
            Self::Departed => "DEPARTED",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct AircraftState {
    status: FlightStatus,
    runway: Option<ResourceId>,
    gate: Option<ResourceId>,
}

/// Point-in-time copy of an aircraft's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AircraftSnapshot {
    /// Callsign.
    pub id: AircraftId,
    /// Current status.
    pub status: FlightStatus,
    /// Runway currently held.
    pub runway: Option<ResourceId>,
    /// Gate currently held.
    pub gate: Option<ResourceId>,
}

/// An aircraft shared between its flight actor and the tower.
#[derive(Debug)]
pub struct Aircraft {
    id: AircraftId,
    state: Mutex<AircraftState>,
    changed: Condvar,
}

impl Aircraft {
    /// Create an aircraft in `IN_FLIGHT` holding nothing.
    pub fn new(id: impl Into<AircraftId>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(AircraftState {
                status: FlightStatus::InFlight,
                runway: None,
                gate: None,
            }),
            changed: Condvar::new(),
        }
    }

    /// Callsign.
    #[must_use]
    pub const fn id(&self) -> &AircraftId {
        &self.id
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> FlightStatus {
        self.state.lock().status
    }

    /// Runway currently held, if any.
    #[must_use]
    pub fn runway(&self) -> Option<ResourceId> {
        self.state.lock().runway.clone()
    }

    /// Gate currently held, if any.
    #[must_use]
    pub fn gate(&self) -> Option<ResourceId> {
        self.state.lock().gate.clone()
    }

    /// Consistent copy of status and assignments.
    #[must_use]
    pub fn snapshot(&self) -> AircraftSnapshot {
        let state = self.state.lock();
        AircraftSnapshot {
            id: Arc::clone(&self.id),
            status: state.status,
            runway: state.runway.clone(),
            gate: state.gate.clone(),
        }
    }

    /// Perform a self-initiated transition to the next lifecycle status.
    ///
    /// # Errors
    ///
    /// `TowerError::InvalidTransition` if `next` does not immediately follow
    /// the current status or is one of the tower-only `*_ASSIGNED` states.
    pub fn advance(&self, next: FlightStatus) -> Result<(), TowerError> {
        let mut state = self.state.lock();
        if next.is_tower_assigned() || state.status.next() != Some(next) {
            return Err(TowerError::InvalidTransition {
                aircraft: Arc::clone(&self.id),
                from: state.status,
                to: next,
            });
        }
        state.status = next;
        drop(state);
        self.changed.notify_all();
        Ok(())
    }

    /// Record a landing clearance and wake the flight.
    pub(crate) fn authorize_landing(&self, runway: ResourceId, gate: ResourceId) {
        let mut state = self.state.lock();
        state.runway = Some(runway);
        state.gate = Some(gate);
        state.status = FlightStatus::LandingAssigned;
        drop(state);
        self.changed.notify_all();
    }

    /// Record a takeoff clearance and wake the flight.
    pub(crate) fn authorize_takeoff(&self, runway: ResourceId) {
        let mut state = self.state.lock();
        state.runway = Some(runway);
        state.status = FlightStatus::TakeoffAssigned;
        drop(state);
        self.changed.notify_all();
    }

    /// Forget the runway assignment if it still refers to `id`.
    pub(crate) fn clear_runway(&self, id: &str) -> bool {
        let mut state = self.state.lock();
        if state.runway.as_deref() == Some(id) {
            state.runway = None;
            true
        } else {
            false
        }
    }

    /// Forget the gate assignment if it still refers to `id`.
    pub(crate) fn clear_gate(&self, id: &str) -> bool {
        let mut state = self.state.lock();
        if state.gate.as_deref() == Some(id) {
            state.gate = None;
            true
        } else {
            false
        }
    }

    /// Block until the status has reached `target` in lifecycle order.
    pub fn wait_until(&self, target: FlightStatus) -> FlightStatus {
        let mut state = self.state.lock();
        self.changed.wait_while(&mut state, |s| s.status < target);
        state.status
    }

    /// Like [`Aircraft::wait_until`], giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// `TowerError::AssignmentTimeout` if `target` was not reached in time.
    pub fn wait_timeout(
        &self,
        target: FlightStatus,
        timeout: Duration,
    ) -> Result<FlightStatus, TowerError> {
        let mut state = self.state.lock();
        let _ = self
            .changed
            .wait_while_for(&mut state, |s| s.status < target, timeout);
        if state.status < target {
            return Err(TowerError::AssignmentTimeout {
                aircraft: Arc::clone(&self.id),
                target,
                waited: timeout,
            });
        }
        Ok(state.status)
    }

    /// Await `target` from async code without blocking the runtime.
    ///
    /// The condvar wait runs on tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// `TowerError::AssignmentTimeout` on timeout, `TowerError::Internal` if
    /// the blocking task was cancelled or panicked.
    #[cfg(feature = "tokio-runtime")]
    pub async fn wait_until_async(
        self: Arc<Self>,
        target: FlightStatus,
        timeout: Duration,
    ) -> Result<FlightStatus, TowerError> {
        let id = Arc::clone(&self.id);
        tokio::task::spawn_blocking(move || self.wait_timeout(target, timeout))
            .await
            .map_err(|e| TowerError::Internal(format!("wait for {id} aborted: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_status_order_matches_next_chain() {
        for pair in FlightStatus::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert!(FlightStatus::Departed.is_terminal());
        assert_eq!(FlightStatus::Departed.next(), None);
    }

    #[test]
    fn test_advance_accepts_successor_only() {
        let aircraft = Aircraft::new("IBE-001");
        assert!(aircraft.advance(FlightStatus::Landing).is_err());
        aircraft.advance(FlightStatus::LandingRequested).unwrap();
        assert_eq!(aircraft.status(), FlightStatus::LandingRequested);
    }

    #[test]
    fn test_advance_refuses_tower_states() {
        let aircraft = Aircraft::new("IBE-001");
        aircraft.advance(FlightStatus::LandingRequested).unwrap();
        let err = aircraft.advance(FlightStatus::LandingAssigned).unwrap_err();
        assert!(matches!(err, TowerError::InvalidTransition { .. }));
    }

    #[test]
    fn test_authorize_landing_records_assignment() {
        let aircraft = Aircraft::new("IBE-001");
        aircraft.advance(FlightStatus::LandingRequested).unwrap();
        aircraft.authorize_landing("RWY-1".into(), "GATE-2".into());
        let snap = aircraft.snapshot();
        assert_eq!(snap.status, FlightStatus::LandingAssigned);
        assert_eq!(snap.runway.as_deref(), Some("RWY-1"));
        assert_eq!(snap.gate.as_deref(), Some("GATE-2"));
    }

    #[test]
    fn test_clear_only_matching_ids() {
        let aircraft = Aircraft::new("IBE-001");
        aircraft.authorize_landing("RWY-1".into(), "GATE-1".into());
        assert!(!aircraft.clear_runway("RWY-2"));
        assert!(aircraft.clear_runway("RWY-1"));
        assert!(aircraft.runway().is_none());
        assert!(aircraft.clear_gate("GATE-1"));
        assert!(aircraft.gate().is_none());
    }

    #[test]
    fn test_wait_until_wakes_on_authorization() {
        let aircraft = Arc::new(Aircraft::new("IBE-001"));
        aircraft.advance(FlightStatus::LandingRequested).unwrap();

        let waiter = {
            let aircraft = Arc::clone(&aircraft);
            thread::spawn(move || aircraft.wait_until(FlightStatus::LandingAssigned))
        };

        thread::sleep(Duration::from_millis(20));
        aircraft.authorize_landing("RWY-1".into(), "GATE-1".into());
        assert_eq!(waiter.join().unwrap(), FlightStatus::LandingAssigned);
    }

    #[test]
    fn test_wait_timeout_expires() {
        let aircraft = Aircraft::new("IBE-001");
        let err = aircraft
            .wait_timeout(FlightStatus::LandingAssigned, Duration::from_millis(20))
            .unwrap_err();
        assert!(matches!(err, TowerError::AssignmentTimeout { .. }));
    }

    #[test]
    fn test_wait_returns_immediately_when_already_past() {
        let aircraft = Aircraft::new("IBE-001");
        aircraft.authorize_takeoff("RWY-1".into());
        let status = aircraft
            .wait_timeout(FlightStatus::LandingAssigned, Duration::from_millis(1))
            .unwrap();
        assert_eq!(status, FlightStatus::TakeoffAssigned);
    }

    #[cfg(feature = "tokio-runtime")]
    #[tokio::test]
    async fn test_wait_until_async() {
        let aircraft = Arc::new(Aircraft::new("IBE-001"));
        let signaller = Arc::clone(&aircraft);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            signaller.authorize_takeoff("RWY-1".into());
        });

        let status = Arc::clone(&aircraft)
            .wait_until_async(FlightStatus::TakeoffAssigned, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(status, FlightStatus::TakeoffAssigned);
    }
}
