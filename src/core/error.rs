//! Error types for tower operations.

use std::time::Duration;

use thiserror::Error;

use super::aircraft::{AircraftId, FlightStatus};
use super::request::RequestKind;
use super::resources::Shortage;

/// Errors produced by tower components.
///
/// None of these is fatal to a simulation: saturation is retried by the
/// producer, resource shortage is resolved by deferral, and the remaining
/// variants surface misuse or environment failures to the caller.
#[derive(Debug, Error)]
pub enum TowerError {
    /// The request queue is at capacity; the caller retries after a backoff.
    #[error("request queue saturated: {kind} from {aircraft} rejected (capacity {capacity})")]
    Saturated {
        /// Aircraft whose request was turned away.
        aircraft: AircraftId,
        /// Kind of the rejected request.
        kind: RequestKind,
        /// Configured queue capacity.
        capacity: usize,
    },
    /// A landing could not proceed for lack of a runway and/or gate.
    /// Informational: logged and resolved by deferral, never propagated.
    #[error("{shortage} unavailable for {aircraft}")]
    ResourceUnavailable {
        /// Aircraft whose landing was deferred.
        aircraft: AircraftId,
        /// Which resource was missing.
        shortage: Shortage,
    },
    /// The aircraft is not registered with the tower (or already departed).
    #[error("unknown aircraft: {0}")]
    UnknownAircraft(AircraftId),
    /// A lifecycle transition was attempted out of order.
    #[error("invalid transition for {aircraft}: {from} -> {to}")]
    InvalidTransition {
        /// Aircraft that attempted the transition.
        aircraft: AircraftId,
        /// Current status.
        from: FlightStatus,
        /// Requested status.
        to: FlightStatus,
    },
    /// Waiting for a tower authorization exceeded the configured timeout.
    #[error("timed out after {waited:?} waiting for {target} on {aircraft}")]
    AssignmentTimeout {
        /// Aircraft that was waiting.
        aircraft: AircraftId,
        /// Status it was waiting for.
        target: FlightStatus,
        /// How long it waited.
        waited: Duration,
    },
    /// The request queue has been closed.
    #[error("tower closed")]
    Closed,
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Writing a state or summary file failed.
    #[error("persistence error: {0}")]
    Persistence(String),
    /// Internal failure (actor thread panic, runtime join error).
    #[error("internal error: {0}")]
    Internal(String),
}

impl TowerError {
    /// Whether the caller should retry the same operation after a backoff.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Saturated { .. })
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
