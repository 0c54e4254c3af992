//! Small shared helpers.

pub mod clock;
pub mod telemetry;

pub use clock::{now_ms, run_timestamp};
pub use telemetry::{init_logging, init_tracing, LoggingGuard};
