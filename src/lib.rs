//! # Airport Tower
//!
//! A concurrent control-tower simulation arbitrating runways and gates
//! between aircraft.
//!
//! Aircraft are producers: each one walks a fixed lifecycle and publishes
//! landing and takeoff requests into a bounded queue. A pool of operator
//! threads consumes the queue and hands every request to a single monitor,
//! the [`core::Coordinator`], which owns the runway and gate pool.
//!
//! ## Guarantees
//!
//! - **No double booking**: a runway or gate is occupied by at most one aircraft.
//! - **All-or-nothing landings**: runway and gate are acquired together or not
//!   at all, so landings never deadlock on partial pairs.
//! - **No idle resources**: every release re-examines the deferred requests,
//!   landings first, oldest first.
//! - **Backpressure**: a full queue rejects with `Saturated`; the aircraft
//!   backs off and retries.
//!
//! ## Driving a tower by hand
//!
//! ```rust
//! use airport_tower::core::{ConcurrentTower, FlightStatus, RequestKind, Tower};
//!
//! let tower = ConcurrentTower::new(1, 1, 5);
//! let aircraft = tower.register("IBE-001");
//! tower.submit("IBE-001", RequestKind::Landing).unwrap();
//!
//! let request = tower.next_request().unwrap();
//! tower.process(request, "OP-001");
//! assert_eq!(aircraft.status(), FlightStatus::LandingAssigned);
//! ```
//!
//! ## Running a simulation
//!
//! ```rust,no_run
//! use airport_tower::config::SimulationConfig;
//! use airport_tower::runtime::Simulation;
//!
//! let report = Simulation::new(SimulationConfig::default()).run()?;
//! println!("{}", report.snapshot);
//! # Ok::<(), airport_tower::core::TowerError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Resource arbitration core: pool, queue, monitor, aircraft and operators.
pub mod core;
/// Configuration models for the airport, the tower and flight timings.
pub mod config;
/// Builders to construct towers and sinks from configuration.
pub mod builders;
/// Simulation runner and summaries.
pub mod runtime;
/// Shared utilities.
pub mod util;
