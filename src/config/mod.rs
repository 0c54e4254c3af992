//! Configuration models for the airport, the tower and flight timings.

pub mod simulation;

pub use simulation::{SimulationConfig, SimulationMode, TimingConfig, CONFIG_PATH_ENV};
