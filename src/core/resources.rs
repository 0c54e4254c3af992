//! Runway and gate availability tracking.
//!
//! `ResourcePool` is plain state with no locking of its own. Every mutation
//! happens inside the coordinator's critical section.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::aircraft::AircraftId;

/// Identifier of a runway or gate.
pub type ResourceId = Arc<str>;

/// The two kinds of physical resource the tower hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Needed by landings and takeoffs.
    Runway,
    /// Needed by landings, held through boarding.
    Gate,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runway => write!(f, "runway"),
            Self::Gate => write!(f, "gate"),
        }
    }
}

/// What a deferred landing was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shortage {
    /// A gate was free but no runway.
    Runway,
    /// A runway was free but no gate.
    Gate,
    /// Neither was free.
    RunwayAndGate,
}

impl Shortage {
    /// Classify a failed landing from the two availability probes.
    /// Returns `None` when both resources are free.
    #[must_use]
    pub const fn from_probe(runway_free: bool, gate_free: bool) -> Option<Self> {
        match (runway_free, gate_free) {
            (true, true) => None,
            (false, true) => Some(Self::Runway),
            (true, false) => Some(Self::Gate),
            (false, false) => Some(Self::RunwayAndGate),
        }
    }
}

impl fmt::Display for Shortage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runway => write!(f, "runway"),
            Self::Gate => write!(f, "gate"),
            Self::RunwayAndGate => write!(f, "runway and gate"),
        }
    }
}

/// A single runway or gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Stable identifier (`RWY-1`, `GATE-3`, ...).
    pub id: ResourceId,
    /// Runway or gate.
    pub kind: ResourceKind,
    /// Availability flag.
    pub available: bool,
    /// Aircraft currently holding it, if any.
    pub occupant: Option<AircraftId>,
}

impl Resource {
    fn new(kind: ResourceKind, index: usize) -> Self {
        let id = match kind {
            ResourceKind::Runway => format!("RWY-{index}"),
            ResourceKind::Gate => format!("GATE-{index}"),
        };
        Self {
            id: id.into(),
            kind,
            available: true,
            occupant: None,
        }
    }
}

/// Fixed-size pool of runways and gates.
///
/// Lookups are linear scans; pools are tens of units at most.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    runways: Vec<Resource>,
    gates: Vec<Resource>,
}

impl ResourcePool {
    /// Create a pool with `runways` runways and `gates` gates, all free.
    #[must_use]
    pub fn new(runways: usize, gates: usize) -> Self {
        Self {
            runways: (1..=runways)
                .map(|i| Resource::new(ResourceKind::Runway, i))
                .collect(),
            gates: (1..=gates)
                .map(|i| Resource::new(ResourceKind::Gate, i))
                .collect(),
        }
    }

    /// First free runway in pool order.
    #[must_use]
    pub fn find_free_runway(&self) -> Option<ResourceId> {
        Self::first_free(&self.runways)
    }

    /// First free gate in pool order.
    #[must_use]
    pub fn find_free_gate(&self) -> Option<ResourceId> {
        Self::first_free(&self.gates)
    }

    fn first_free(list: &[Resource]) -> Option<ResourceId> {
        list.iter()
            .find(|r| r.available)
            .map(|r| Arc::clone(&r.id))
    }

    /// Mark a resource occupied by `holder`.
    ///
    /// Returns `false` if the id is unknown or the resource is already taken.
    pub fn occupy(&mut self, id: &str, holder: &AircraftId) -> bool {
        match self.get_mut(id) {
            Some(resource) if resource.available => {
                resource.available = false;
                resource.occupant = Some(Arc::clone(holder));
                true
            }
            _ => false,
        }
    }

    /// Mark a resource free again.
    ///
    /// Returns `false` if the id is unknown or the resource was already free.
    pub fn release(&mut self, id: &str) -> bool {
        match self.get_mut(id) {
            Some(resource) if !resource.available => {
                resource.available = true;
                resource.occupant = None;
                true
            }
            _ => false,
        }
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Resource> {
        self.runways
            .iter_mut()
            .chain(self.gates.iter_mut())
            .find(|r| &*r.id == id)
    }

    /// Runways in pool order.
    #[must_use]
    pub fn runways(&self) -> &[Resource] {
        &self.runways
    }

    /// Gates in pool order.
    #[must_use]
    pub fn gates(&self) -> &[Resource] {
        &self.gates
    }

    /// Number of runways currently free.
    #[must_use]
    pub fn free_runways(&self) -> usize {
        self.runways.iter().filter(|r| r.available).count()
    }

    /// Number of gates currently free.
    #[must_use]
    pub fn free_gates(&self) -> usize {
        self.gates.iter().filter(|r| r.available).count()
    }

    /// Whether every runway and gate is free.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.free_runways() == self.runways.len() && self.free_gates() == self.gates.len()
    }
}
