//! Tests for error types

use std::sync::Arc;
use std::time::Duration;

use airport_tower::core::{FlightStatus, RequestKind, Shortage, TowerError};

#[test]
fn test_saturated_error() {
    let err = TowerError::Saturated {
        aircraft: Arc::from("IBE-001"),
        kind: RequestKind::Landing,
        capacity: 5,
    };
    assert_eq!(
        format!("{}", err),
        "request queue saturated: LANDING from IBE-001 rejected (capacity 5)"
    );
    assert!(err.is_retryable());
}

#[test]
fn test_unknown_aircraft_error() {
    let err = TowerError::UnknownAircraft(Arc::from("ghost"));
    assert_eq!(format!("{}", err), "unknown aircraft: ghost");
    assert!(!err.is_retryable());
}

#[test]
fn test_invalid_transition_error() {
    let err = TowerError::InvalidTransition {
        aircraft: Arc::from("IBE-002"),
        from: FlightStatus::InFlight,
        to: FlightStatus::Landed,
    };
    assert_eq!(
        format!("{}", err),
        "invalid transition for IBE-002: IN_FLIGHT -> LANDED"
    );
}

#[test]
fn test_resource_unavailable_mentions_aircraft() {
    let err = TowerError::ResourceUnavailable {
        aircraft: Arc::from("IBE-003"),
        shortage: Shortage::Gate,
    };
    assert!(format!("{}", err).contains("IBE-003"));
    assert!(!err.is_retryable());
}

#[test]
fn test_timeout_is_not_retryable() {
    let err = TowerError::AssignmentTimeout {
        aircraft: Arc::from("IBE-004"),
        target: FlightStatus::TakeoffAssigned,
        waited: Duration::from_millis(10),
    };
    assert!(format!("{}", err).contains("TAKEOFF_ASSIGNED"));
    assert!(!err.is_retryable());
    assert!(!TowerError::Closed.is_retryable());
}
