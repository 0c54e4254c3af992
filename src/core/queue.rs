//! Bounded FIFO hand-off between aircraft and operators.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use super::error::TowerError;
use super::request::{Request, RequestView};

/// Default queue capacity.
pub const DEFAULT_MAX_QUEUE: usize = 5;

struct QueueState {
    items: VecDeque<Request>,
    closed: bool,
}

/// Bounded request buffer guarded by its own mutex and condvar.
///
/// Enqueue never blocks: a full queue rejects with `TowerError::Saturated`.
/// Dequeue blocks until a request arrives or the queue is closed.
/// The lock is held only for the duration of a single operation and is
/// never nested with the coordinator's. Only the event sink lock may be taken
/// under it.
pub struct RequestQueue {
    capacity: usize,
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl RequestQueue {
    /// Create an empty queue holding at most `capacity` requests.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.min(1024)),
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Append a request if there is room.
    ///
    /// The capacity check happens before anything is recorded, so a rejected
    /// request leaves no trace.
    ///
    /// # Errors
    ///
    /// - `TowerError::Saturated` when the queue holds `capacity` requests
    /// - `TowerError::Closed` after [`RequestQueue::close`]
    pub fn enqueue(&self, request: Request) -> Result<(), TowerError> {
        self.enqueue_with(request, |_| {})
    }

    /// Like [`RequestQueue::enqueue`], running `on_accept` under the queue
    /// lock once the request is admitted and before any consumer can take it.
    ///
    /// # Errors
    ///
    /// Same as [`RequestQueue::enqueue`]; `on_accept` does not run.
    pub fn enqueue_with<F>(&self, request: Request, on_accept: F) -> Result<(), TowerError>
    where
        F: FnOnce(&Request),
    {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TowerError::Closed);
        }
        if state.items.len() >= self.capacity {
            return Err(TowerError::Saturated {
                aircraft: Arc::clone(request.aircraft_id()),
                kind: request.kind(),
                capacity: self.capacity,
            });
        }
        debug!(
            aircraft = %request.aircraft_id(),
            kind = %request.kind(),
            depth = state.items.len() + 1,
            "request enqueued"
        );
        on_accept(&request);
        state.items.push_back(request);
        drop(state);
        self.ready.notify_one();
        Ok(())
    }

    /// Take the oldest request, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub fn dequeue(&self) -> Option<Request> {
        let mut state = self.state.lock();
        self.ready
            .wait_while(&mut state, |s| s.items.is_empty() && !s.closed);
        state.items.pop_front()
    }

    /// Take the oldest request without blocking.
    pub fn try_dequeue(&self) -> Option<Request> {
        self.state.lock().items.pop_front()
    }

    /// Stop accepting requests and wake every blocked consumer.
    ///
    /// Requests already queued can still be dequeued.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }

    /// Whether [`RequestQueue::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Current depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Whether no request is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Maximum depth.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of the queue contents in FIFO order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RequestView> {
        self.state.lock().items.iter().map(Request::view).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aircraft::Aircraft;
    use crate::core::request::RequestKind;
    use std::thread;
    use std::time::Duration;

    fn landing(id: &str) -> Request {
        Request::new(Arc::new(Aircraft::new(id)), RequestKind::Landing)
    }

    #[test]
    fn test_fifo_order() {
        let q = RequestQueue::new(10);
        q.enqueue(landing("A")).unwrap();
        q.enqueue(landing("B")).unwrap();
        q.enqueue(landing("C")).unwrap();

        let order: Vec<_> = (0..3)
            .map(|_| q.dequeue().unwrap().aircraft_id().to_string())
            .collect();
        assert_eq!(order, ["A", "B", "C"]);
    }

    #[test]
    fn test_saturation_at_capacity() {
        let q = RequestQueue::new(DEFAULT_MAX_QUEUE);
        for i in 0..DEFAULT_MAX_QUEUE {
            q.enqueue(landing(&format!("IBE-{i:03}"))).unwrap();
        }

        let err = q.enqueue(landing("IBE-999")).unwrap_err();
        assert!(matches!(err, TowerError::Saturated { capacity: 5, .. }));
        assert_eq!(q.len(), DEFAULT_MAX_QUEUE);

        q.dequeue().unwrap();
        q.enqueue(landing("IBE-999")).unwrap();
        assert_eq!(q.snapshot().last().unwrap().aircraft.as_ref(), "IBE-999");
    }

    #[test]
    fn test_dequeue_blocks_until_enqueue() {
        let q = Arc::new(RequestQueue::new(2));
        let consumer = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.dequeue().map(|r| r.aircraft_id().to_string()))
        };

        thread::sleep(Duration::from_millis(20));
        q.enqueue(landing("late")).unwrap();
        assert_eq!(consumer.join().unwrap().as_deref(), Some("late"));
    }

    #[test]
    fn test_close_releases_consumers() {
        let q = Arc::new(RequestQueue::new(2));
        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let q = Arc::clone(&q);
                thread::spawn(move || q.dequeue().is_none())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        q.close();
        for c in consumers {
            assert!(c.join().unwrap());
        }
        assert!(matches!(q.enqueue(landing("A")), Err(TowerError::Closed)));
    }

    #[test]
    fn test_close_drains_remaining() {
        let q = RequestQueue::new(2);
        q.enqueue(landing("A")).unwrap();
        q.close();
        assert!(q.is_closed());
        assert!(q.dequeue().is_some());
        assert!(q.dequeue().is_none());
        assert!(q.try_dequeue().is_none());
    }

    #[test]
    fn test_on_accept_runs_only_for_admitted_requests() {
        let q = RequestQueue::new(1);
        let mut seen = Vec::new();
        q.enqueue_with(landing("A"), |r| seen.push(r.aircraft_id().to_string()))
            .unwrap();
        let err = q
            .enqueue_with(landing("B"), |r| seen.push(r.aircraft_id().to_string()))
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(seen, ["A"]);
    }
}
