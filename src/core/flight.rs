//! Aircraft actors: the producers walking the lifecycle.
//!
//! A flight sleeps through each physical phase, advances its own status,
//! publishes the matching request and, for landing and takeoff, blocks on the
//! aircraft's condvar until the tower clears it. The same code drives the
//! concurrent and the sequential tower.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::aircraft::{Aircraft, AircraftId, FlightStatus};
use super::coordinator::Withdrawal;
use super::error::TowerError;
use super::request::RequestKind;
use super::tower::Tower;
use crate::config::TimingConfig;

/// Concrete delays for one flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightTimings {
    /// Time in the air before asking to land.
    pub approach: Duration,
    /// Time on the runway while landing.
    pub landing: Duration,
    /// Time at the gate.
    pub boarding: Duration,
    /// Time on the runway while departing.
    pub departing: Duration,
    /// Pause before resubmitting a saturated request.
    pub backoff: Duration,
    /// Give up waiting for clearance after this long.
    pub assignment_timeout: Option<Duration>,
}

impl FlightTimings {
    /// Draw the randomized phases from `timing`.
    #[must_use]
    pub fn sample(timing: &TimingConfig) -> Self {
        let mut rng = rand::rng();
        let approach_max = timing.approach_max_ms.max(timing.approach_min_ms);
        Self {
            approach: Duration::from_millis(rng.random_range(timing.approach_min_ms..=approach_max)),
            landing: Duration::from_millis(timing.landing_ms),
            boarding: Duration::from_millis(rng.random_range(0..=timing.boarding_max_ms)),
            departing: Duration::from_millis(timing.departing_ms),
            backoff: Duration::from_millis(timing.saturation_backoff_ms),
            assignment_timeout: timing.assignment_timeout_ms.map(Duration::from_millis),
        }
    }

    /// No delays at all. Saturation backoff stays at one millisecond.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            approach: Duration::ZERO,
            landing: Duration::ZERO,
            boarding: Duration::ZERO,
            departing: Duration::ZERO,
            backoff: Duration::from_millis(1),
            assignment_timeout: None,
        }
    }
}

/// How a flight went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightReport {
    /// Callsign.
    pub aircraft: AircraftId,
    /// Status when the flight ended.
    pub final_status: FlightStatus,
    /// Time between requesting and being cleared to land.
    pub landing_wait: Duration,
    /// Time between requesting and being cleared for takeoff.
    pub takeoff_wait: Duration,
    /// Submissions rejected by a full queue and retried.
    pub saturated_retries: u32,
    /// Wall time of the whole flight.
    pub elapsed: Duration,
}

/// Submit `kind`, retrying after `backoff` while the queue is saturated.
///
/// Returns the number of retries.
///
/// # Errors
///
/// Any non-retryable error from [`Tower::submit`].
pub fn submit_with_backoff(
    tower: &dyn Tower,
    aircraft: &str,
    kind: RequestKind,
    backoff: Duration,
) -> Result<u32, TowerError> {
    let mut retries = 0;
    loop {
        match tower.submit(aircraft, kind) {
            Ok(()) => return Ok(retries),
            Err(e) if e.is_retryable() => {
                retries += 1;
                debug!(aircraft, kind = %kind, retries, "queue saturated, backing off");
                thread::sleep(backoff);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Block until `kind` is granted. On timeout the request is withdrawn, unless
/// the grant got there first, in which case the flight carries on.
fn await_clearance(
    tower: &dyn Tower,
    aircraft: &Aircraft,
    kind: RequestKind,
    target: FlightStatus,
    timeout: Option<Duration>,
) -> Result<Duration, TowerError> {
    let started = Instant::now();
    match timeout {
        Some(limit) => {
            if let Err(expired) = aircraft.wait_timeout(target, limit) {
                match tower.withdraw(aircraft.id(), kind)? {
                    Withdrawal::Granted => {
                        debug!(aircraft = %aircraft.id(), kind = %kind, "clearance arrived at the deadline");
                    }
                    settled => {
                        warn!(aircraft = %aircraft.id(), kind = %kind, settled = ?settled, "{}", expired);
                        return Err(expired);
                    }
                }
            }
        }
        None => {
            aircraft.wait_until(target);
        }
    }
    Ok(started.elapsed())
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

/// Fly `id` through its whole lifecycle against `tower`.
///
/// # Errors
///
/// `TowerError::AssignmentTimeout` if a clearance does not arrive within the
/// configured timeout, or any non-retryable submission error.
pub fn run_flight(
    tower: &dyn Tower,
    id: &str,
    timings: &FlightTimings,
) -> Result<FlightReport, TowerError> {
    let aircraft = tower.register(id);
    let started = Instant::now();
    let mut retries = 0;

    pause(timings.approach);
    aircraft.advance(FlightStatus::LandingRequested)?;
    retries += submit_with_backoff(tower, id, RequestKind::Landing, timings.backoff)?;
    let landing_wait = await_clearance(
        tower,
        &aircraft,
        RequestKind::Landing,
        FlightStatus::LandingAssigned,
        timings.assignment_timeout,
    )?;
    debug!(aircraft = id, waited = ?landing_wait, "cleared to land");

    aircraft.advance(FlightStatus::Landing)?;
    pause(timings.landing);
    aircraft.advance(FlightStatus::Landed)?;
    retries += submit_with_backoff(tower, id, RequestKind::Landed, timings.backoff)?;

    aircraft.advance(FlightStatus::Boarding)?;
    pause(timings.boarding);
    aircraft.advance(FlightStatus::Boarded)?;
    retries += submit_with_backoff(tower, id, RequestKind::Boarded, timings.backoff)?;

    aircraft.advance(FlightStatus::TakeoffRequested)?;
    retries += submit_with_backoff(tower, id, RequestKind::Takeoff, timings.backoff)?;
    let takeoff_wait = await_clearance(
        tower,
        &aircraft,
        RequestKind::Takeoff,
        FlightStatus::TakeoffAssigned,
        timings.assignment_timeout,
    )?;
    debug!(aircraft = id, waited = ?takeoff_wait, "cleared for takeoff");

    aircraft.advance(FlightStatus::Departing)?;
    pause(timings.departing);
    aircraft.advance(FlightStatus::Departed)?;
    retries += submit_with_backoff(tower, id, RequestKind::Departed, timings.backoff)?;

    let report = FlightReport {
        aircraft: Arc::clone(aircraft.id()),
        final_status: aircraft.status(),
        landing_wait,
        takeoff_wait,
        saturated_retries: retries,
        elapsed: started.elapsed(),
    };
    info!(
        aircraft = id,
        elapsed = ?report.elapsed,
        retries,
        "flight completed"
    );
    Ok(report)
}

/// Run a flight on its own named thread.
///
/// # Errors
///
/// `TowerError::Internal` if the thread cannot be spawned.
pub fn spawn_flight(
    tower: Arc<dyn Tower>,
    id: String,
    timings: FlightTimings,
) -> Result<JoinHandle<Result<FlightReport, TowerError>>, TowerError> {
    thread::Builder::new()
        .name(id.to_lowercase())
        .spawn(move || run_flight(tower.as_ref(), &id, &timings))
        .map_err(|e| TowerError::Internal(format!("spawn flight: {e}")))
}
