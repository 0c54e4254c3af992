//! Requests travelling from aircraft to operators.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::aircraft::{Aircraft, AircraftId, FlightStatus};
use super::resources::ResourceId;
use crate::util::clock::now_ms;

/// What an aircraft asks of the tower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    /// Needs a runway and a gate.
    Landing,
    /// Needs a runway.
    Takeoff,
    /// Notification: release the landing runway, keep the gate.
    Landed,
    /// Notification: release the gate.
    Boarded,
    /// Notification: release the departure runway.
    Departed,
}

impl RequestKind {
    /// The request an aircraft publishes on entering `status`, if any.
    #[must_use]
    pub const fn for_status(status: FlightStatus) -> Option<Self> {
        match status {
            FlightStatus::LandingRequested => Some(Self::Landing),
            FlightStatus::Landed => Some(Self::Landed),
            FlightStatus::Boarded => Some(Self::Boarded),
            FlightStatus::TakeoffRequested => Some(Self::Takeoff),
            FlightStatus::Departed => Some(Self::Departed),
            _ => None,
        }
    }

    /// Notifications release resources and never block the aircraft.
    #[must_use]
    pub const fn is_notification(self) -> bool {
        matches!(self, Self::Landed | Self::Boarded | Self::Departed)
    }

    /// Status the aircraft waits for after publishing this request.
    #[must_use]
    pub const fn awaited_status(self) -> Option<FlightStatus> {
        match self {
            Self::Landing => Some(FlightStatus::LandingAssigned),
            Self::Takeoff => Some(FlightStatus::TakeoffAssigned),
            _ => None,
        }
    }

    /// Canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Landing => "LANDING",
            Self::Takeoff => "TAKEOFF",
            Self::Landed => "LANDED",
            Self::Boarded => "BOARDED",
            Self::Departed => "DEPARTED",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable (aircraft, kind) pair consumed exactly once by an operator.
///
/// Release notifications capture the resource they free when they are
/// created, so they stay correct even if an operator processes them after a
/// later request from the same aircraft.
#[derive(Debug, Clone)]
pub struct Request {
    aircraft: Arc<Aircraft>,
    kind: RequestKind,
    releases: Option<ResourceId>,
    submitted_at_ms: u128,
}

impl Request {
    /// Build a request for `aircraft`.
    #[must_use]
    pub fn new(aircraft: Arc<Aircraft>, kind: RequestKind) -> Self {
        let releases = match kind {
            RequestKind::Landed | RequestKind::Departed => aircraft.runway(),
            RequestKind::Boarded => aircraft.gate(),
            RequestKind::Landing | RequestKind::Takeoff => None,
        };
        Self {
            aircraft,
            kind,
            releases,
            submitted_at_ms: now_ms(),
        }
    }

    /// The requesting aircraft.
    #[must_use]
    pub const fn aircraft(&self) -> &Arc<Aircraft> {
        &self.aircraft
    }

    /// Callsign of the requesting aircraft.
    #[must_use]
    pub fn aircraft_id(&self) -> &AircraftId {
        self.aircraft.id()
    }

    /// Request kind.
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Resource this notification frees, captured at creation.
    #[must_use]
    pub const fn releases(&self) -> Option<&ResourceId> {
        self.releases.as_ref()
    }

    /// Creation time in milliseconds since the epoch.
    #[must_use]
    pub const fn submitted_at_ms(&self) -> u128 {
        self.submitted_at_ms
    }

    /// Display-friendly copy.
    #[must_use]
    pub fn view(&self) -> RequestView {
        RequestView {
            aircraft: Arc::clone(self.aircraft.id()),
            kind: self.kind,
            submitted_at_ms: self.submitted_at_ms,
        }
    }
}

/// Serializable view of a queued or pending request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestView {
    /// Callsign.
    pub aircraft: AircraftId,
    /// Request kind.
    pub kind: RequestKind,
    /// Creation time in milliseconds since the epoch.
    pub submitted_at_ms: u128,
}
