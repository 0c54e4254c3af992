//! Operator actors: the consumers draining the request queue.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use super::error::TowerError;
use super::tower::ConcurrentTower;

/// Name of the `n`th operator, 1-based: `OP-001`, `OP-002`, ...
#[must_use]
pub fn operator_id(n: usize) -> String {
    format!("OP-{n:03}")
}

/// Start an operator thread serving `tower` until its queue is closed.
///
/// A panic while processing one request is logged and the loop carries on;
/// the coordinator's lock is released by unwinding.
///
/// # Errors
///
/// `TowerError::Internal` if the thread cannot be spawned.
pub fn spawn_operator(
    tower: Arc<ConcurrentTower>,
    operator: String,
) -> Result<JoinHandle<usize>, TowerError> {
    thread::Builder::new()
        .name(operator.to_lowercase())
        .spawn(move || {
            debug!(operator = %operator, "operator on duty");
            let mut handled = 0usize;
            while let Some(request) = tower.next_request() {
                let aircraft = request.aircraft_id().clone();
                let kind = request.kind();
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    tower.process(request, &operator)
                }));
                match result {
                    Ok(_) => handled += 1,
                    Err(_) => error!(
                        operator = %operator,
                        aircraft = %aircraft,
                        kind = %kind,
                        "request processing crashed"
                    ),
                }
                thread::yield_now();
            }
            info!(operator = %operator, handled, "operator off duty");
            handled
        })
        .map_err(|e| TowerError::Internal(format!("spawn operator: {e}")))
}
