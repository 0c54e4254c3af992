//! Builders wiring configuration into towers.

pub mod tower_builder;

pub use tower_builder::{build_sink, build_tower, BuiltTower};
