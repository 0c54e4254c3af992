//! Resource arbitration core: pool, queue, monitor and the actors around it.

pub mod aircraft;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod flight;
pub mod operator;
pub mod pending;
pub mod queue;
pub mod request;
pub mod resources;
pub mod tower;

pub use aircraft::{Aircraft, AircraftId, AircraftSnapshot, FlightStatus};
pub use coordinator::{
    Assignment, Coordinator, CoordinatorStats, MonitorSnapshot, ProcessOutcome, Withdrawal,
};
pub use error::{AppResult, TowerError};
pub use events::{
    build_event, share_sink, BroadcastSink, EventSink, InMemoryEventSink, JsonStateSink,
    SharedSink, TowerAction, TowerEvent,
};
pub use flight::{run_flight, spawn_flight, submit_with_backoff, FlightReport, FlightTimings};
pub use operator::{operator_id, spawn_operator};
pub use pending::PendingLists;
pub use queue::{RequestQueue, DEFAULT_MAX_QUEUE};
pub use request::{Request, RequestKind, RequestView};
pub use resources::{Resource, ResourceId, ResourceKind, ResourcePool, Shortage};
pub use tower::{
    AirportSnapshot, ConcurrentTower, SequentialTower, Tower, TowerStats, SEQUENTIAL_OPERATOR,
};
