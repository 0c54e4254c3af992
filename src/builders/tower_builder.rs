//! Builders to construct towers and their sinks from configuration.

use std::sync::Arc;

use crate::config::{SimulationConfig, SimulationMode};
use crate::core::{
    share_sink, ConcurrentTower, EventSink, JsonStateSink, SequentialTower, SharedSink, Tower,
    TowerError,
};

/// A tower ready to fly, keeping the concrete type the runner needs.
#[derive(Clone)]
pub enum BuiltTower {
    /// Queue-fed tower; operators must be spawned against it.
    Concurrent(Arc<ConcurrentTower>),
    /// Inline tower.
    Sequential(Arc<SequentialTower>),
}

impl BuiltTower {
    /// The tower behind the common trait.
    #[must_use]
    pub fn as_tower(&self) -> Arc<dyn Tower> {
        match self {
            Self::Concurrent(t) => Arc::clone(t) as Arc<dyn Tower>,
            Self::Sequential(t) => Arc::clone(t) as Arc<dyn Tower>,
        }
    }

    /// Configured mode.
    #[must_use]
    pub const fn mode(&self) -> SimulationMode {
        match self {
            Self::Concurrent(_) => SimulationMode::Concurrent,
            Self::Sequential(_) => SimulationMode::Sequential,
        }
    }
}

/// Combine the configured state file sink with an optional caller sink.
///
/// Returns `None` when neither is present.
#[must_use]
pub fn build_sink(cfg: &SimulationConfig, extra: Option<Box<dyn EventSink>>) -> Option<SharedSink> {
    let mut sinks: Vec<Box<dyn EventSink>> = Vec::new();
    if let Some(path) = &cfg.state_file {
        sinks.push(Box::new(JsonStateSink::new(path)));
    }
    sinks.extend(extra);
    match sinks.len() {
        0 => None,
        1 => sinks.pop().map(|only| Arc::new(parking_lot::Mutex::new(only))),
        _ => Some(share_sink(sinks)),
    }
}

/// Build the tower described by `cfg`, reporting to `sink` if given.
///
/// # Errors
///
/// `TowerError::InvalidConfig` if the configuration does not validate.
pub fn build_tower(cfg: &SimulationConfig, sink: Option<SharedSink>) -> Result<BuiltTower, TowerError> {
    cfg.validate()
        .map_err(|e| TowerError::InvalidConfig(format!("config invalid: {e}")))?;

    let built = match (cfg.mode, sink) {
        (SimulationMode::Concurrent, Some(sink)) => BuiltTower::Concurrent(Arc::new(
            ConcurrentTower::with_sink(cfg.runways, cfg.gates, cfg.max_queue, sink),
        )),
        (SimulationMode::Concurrent, None) => BuiltTower::Concurrent(Arc::new(
            ConcurrentTower::new(cfg.runways, cfg.gates, cfg.max_queue),
        )),
        (SimulationMode::Sequential, Some(sink)) => BuiltTower::Sequential(Arc::new(
            SequentialTower::with_sink(cfg.runways, cfg.gates, sink),
        )),
        (SimulationMode::Sequential, None) => {
            BuiltTower::Sequential(Arc::new(SequentialTower::new(cfg.runways, cfg.gates)))
        }
    };
    Ok(built)
}
