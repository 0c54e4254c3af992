//! Simulation runner and run summaries.

pub mod simulation;
pub mod summary;

pub use simulation::{FlightFailure, Simulation, SimulationReport};
pub use summary::{summary_rows, write_summary};
