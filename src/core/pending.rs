//! Requests deferred for lack of resources.

use std::collections::VecDeque;

use super::request::{Request, RequestKind, RequestView};

/// Landing and takeoff requests waiting for a release.
///
/// Insertion order is service order within each list. Only the coordinator
/// touches this, under its lock.
#[derive(Debug, Default)]
pub struct PendingLists {
    landings: VecDeque<Request>,
    takeoffs: VecDeque<Request>,
}

impl PendingLists {
    /// Empty lists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a request at the back of its category.
    ///
    /// Notifications are always servable and are handed back untouched.
    ///
    /// # Errors
    ///
    /// Returns the request if it is not a landing or takeoff.
    pub fn defer(&mut self, request: Request) -> Result<(), Request> {
        match request.kind() {
            RequestKind::Landing => self.landings.push_back(request),
            RequestKind::Takeoff => self.takeoffs.push_back(request),
            _ => return Err(request),
        }
        Ok(())
    }

    /// Remove the oldest deferred landing.
    pub fn pop_landing(&mut self) -> Option<Request> {
        self.landings.pop_front()
    }

    /// Remove the oldest deferred takeoff.
    pub fn pop_takeoff(&mut self) -> Option<Request> {
        self.takeoffs.pop_front()
    }

    /// Remove the deferred `kind` request of `aircraft`, wherever it sits.
    pub fn withdraw(&mut self, aircraft: &str, kind: RequestKind) -> Option<Request> {
        let list = match kind {
            RequestKind::Landing => &mut self.landings,
            RequestKind::Takeoff => &mut self.takeoffs,
            _ => return None,
        };
        let pos = list
            .iter()
            .position(|r| r.aircraft_id().as_ref() == aircraft)?;
        list.remove(pos)
    }

    /// Whether a landing is waiting.
    #[must_use]
    pub fn has_landings(&self) -> bool {
        !self.landings.is_empty()
    }

    /// Whether a takeoff is waiting.
    #[must_use]
    pub fn has_takeoffs(&self) -> bool {
        !self.takeoffs.is_empty()
    }

    /// Total deferred requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.landings.len() + self.takeoffs.len()
    }

    /// Whether nothing is deferred.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deferred landings, oldest first.
    #[must_use]
    pub fn landing_views(&self) -> Vec<RequestView> {
        self.landings.iter().map(Request::view).collect()
    }

    /// Deferred takeoffs, oldest first.
    #[must_use]
    pub fn takeoff_views(&self) -> Vec<RequestView> {
        self.takeoffs.iter().map(Request::view).collect()
    }
}
