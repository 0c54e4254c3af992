//! Observability sinks for tower decisions.
//!
//! The coordinator emits one `TowerEvent` per decision to an `EventSink`
//! supplied at construction. Sinks provided here keep events in memory, fan
//! them out to channel subscribers (a live dashboard), or mirror each
//! aircraft's latest status into a JSON file.

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::aircraft::{Aircraft, AircraftId, FlightStatus};
use super::error::TowerError;
use super::resources::ResourceId;
use crate::util::clock::now_ms;

/// What the tower did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerAction {
    /// Request accepted into the queue.
    Submitted,
    /// Request turned away by a full queue.
    Saturated,
    /// Resources assigned on first processing.
    Assigned,
    /// Request parked on a pending list.
    Deferred,
    /// Pending request assigned after a release.
    Resumed,
    /// Resource released by a notification.
    Released,
    /// Request abandoned by an aircraft that stopped waiting.
    Withdrawn,
}

/// One tower decision, as seen by displays and dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerEvent {
    /// Unique event identifier.
    pub event_id: String,
    /// Timestamp milliseconds.
    pub at_ms: u128,
    /// Operator that made the decision, if any.
    pub operator: Option<String>,
    /// Aircraft concerned.
    pub aircraft: AircraftId,
    /// Decision taken.
    pub action: TowerAction,
    /// Aircraft status after the decision.
    pub status: FlightStatus,
    /// Runway held after the decision.
    pub runway: Option<ResourceId>,
    /// Gate held after the decision.
    pub gate: Option<ResourceId>,
    /// Granted or released resource ids, the shortage behind a deferral, or the submitted kind.
    pub detail: Option<String>,
}

/// Build an event from an aircraft's current state.
pub fn build_event(
    aircraft: &Aircraft,
    action: TowerAction,
    operator: Option<&str>,
    detail: Option<String>,
) -> TowerEvent {
    let snap = aircraft.snapshot();
    TowerEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        at_ms: now_ms(),
        operator: operator.map(str::to_owned),
        aircraft: snap.id,
        action,
        status: snap.status,
        runway: snap.runway,
        gate: snap.gate,
        detail,
    }
}

/// Receiver of tower events.
pub trait EventSink: Send {
    /// Record an event.
    fn record(&mut self, event: TowerEvent);
}

/// Sink handle shared by the towers and their collaborators.
pub type SharedSink = Arc<Mutex<Box<dyn EventSink>>>;

/// Wrap a sink for sharing.
pub fn share_sink(sink: impl EventSink + 'static) -> SharedSink {
    let sink: Box<dyn EventSink> = Box::new(sink);
    Arc::new(Mutex::new(sink))
}

/// Forward every event to each sink in turn.
impl EventSink for Vec<Box<dyn EventSink>> {
    fn record(&mut self, event: TowerEvent) {
        if let Some((last, rest)) = self.split_last_mut() {
            for sink in rest {
                sink.record(event.clone());
            }
            last.record(event);
        }
    }
}

/// Bounded in-memory event log. Clones share the same buffer.
#[derive(Clone)]
pub struct InMemoryEventSink {
    events: Arc<Mutex<VecDeque<TowerEvent>>>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a sink keeping at most `max_events`, dropping the oldest.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(4096)))),
            max_events,
        }
    }

    /// Snapshot of stored events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<TowerEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Actions recorded for one aircraft, oldest first.
    #[must_use]
    pub fn actions_for(&self, aircraft: &str) -> Vec<TowerAction> {
        self.events
            .lock()
            .iter()
            .filter(|e| &*e.aircraft == aircraft)
            .map(|e| e.action)
            .collect()
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&mut self, event: TowerEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Fans events out to any number of channel subscribers.
///
/// Subscribers whose receiver has been dropped are pruned on the next event.
/// Clones share the subscriber list, so keep one to subscribe after handing
/// the other to a tower.
#[derive(Clone, Default)]
pub struct BroadcastSink {
    subscribers: Arc<Mutex<Vec<Sender<TowerEvent>>>>,
}

impl BroadcastSink {
    /// Create a sink with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<TowerEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl EventSink for BroadcastSink {
    fn record(&mut self, event: TowerEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Mirrors every aircraft's latest status into a JSON object on disk.
///
/// Write failures are logged and never interrupt the tower.
pub struct JsonStateSink {
    path: PathBuf,
    flights: BTreeMap<String, FlightStatus>,
}

impl JsonStateSink {
    /// Create a sink writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flights: BTreeMap::new(),
        }
    }

    /// Destination file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Latest status per aircraft.
    #[must_use]
    pub const fn flights(&self) -> &BTreeMap<String, FlightStatus> {
        &self.flights
    }

    /// Rewrite the state file.
    ///
    /// # Errors
    ///
    /// `TowerError::Persistence` if serialization or the write fails.
    pub fn flush(&self) -> Result<(), TowerError> {
        let body = serde_json::to_string_pretty(&self.flights)
            .map_err(|e| TowerError::Persistence(format!("encode flight panel: {e}")))?;
        fs::write(&self.path, body).map_err(|e| {
            TowerError::Persistence(format!("write {}: {e}", self.path.display()))
        })
    }
}

impl EventSink for JsonStateSink {
    fn record(&mut self, event: TowerEvent) {
        self.flights.insert(event.aircraft.to_string(), event.status);
        if let Err(e) = self.flush() {
            tracing::error!("flight panel not updated: {}", e);
        }
    }
}
