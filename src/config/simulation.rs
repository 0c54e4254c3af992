//! Simulation configuration: airport size, tower mode and flight timings.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::DEFAULT_MAX_QUEUE;

/// Environment variable naming a JSON config file.
pub const CONFIG_PATH_ENV: &str = "AIRPORT_CONFIG";

/// Which tower implementation services the aircraft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Bounded queue drained by operator threads; one thread per aircraft.
    #[default]
    Concurrent,
    /// Aircraft fly one after another, decisions taken inline.
    Sequential,
}

impl SimulationMode {
    /// Lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Concurrent => "concurrent",
            Self::Sequential => "sequential",
        }
    }

    /// Upper-case tag used in log file names.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Concurrent => "CONCURRENT",
            Self::Sequential => "SEQUENTIAL",
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concurrent" => Ok(Self::Concurrent),
            "sequential" => Ok(Self::Sequential),
            other => Err(format!("unknown simulation mode `{other}`")),
        }
    }
}

/// Phase durations in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Shortest approach before requesting to land.
    pub approach_min_ms: u64,
    /// Longest approach before requesting to land.
    pub approach_max_ms: u64,
    /// Landing roll on the runway.
    pub landing_ms: u64,
    /// Upper bound of the random boarding time.
    pub boarding_max_ms: u64,
    /// Departure roll on the runway.
    pub departing_ms: u64,
    /// Pause before resubmitting a saturated request.
    pub saturation_backoff_ms: u64,
    /// Delay between consecutive aircraft launches.
    pub arrival_stagger_ms: u64,
    /// Abandon a flight whose clearance takes longer than this.
    pub assignment_timeout_ms: Option<u64>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            approach_min_ms: 500,
            approach_max_ms: 1500,
            landing_ms: 100,
            boarding_max_ms: 500,
            departing_ms: 100,
            saturation_backoff_ms: 100,
            arrival_stagger_ms: 50,
            assignment_timeout_ms: None,
        }
    }
}

impl TimingConfig {
    /// Every delay zeroed except a 1 ms saturation backoff. Used by tests and
    /// benchmarks.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            approach_min_ms: 0,
            approach_max_ms: 0,
            landing_ms: 0,
            boarding_max_ms: 0,
            departing_ms: 0,
            saturation_backoff_ms: 1,
            arrival_stagger_ms: 0,
            assignment_timeout_ms: None,
        }
    }

    /// Validate timing values.
    pub fn validate(&self) -> Result<(), String> {
        if self.approach_min_ms > self.approach_max_ms {
            return Err("approach_min_ms must not exceed approach_max_ms".into());
        }
        if self.saturation_backoff_ms == 0 {
            return Err("saturation_backoff_ms must be greater than 0".into());
        }
        if self.assignment_timeout_ms == Some(0) {
            return Err("assignment_timeout_ms must be greater than 0 when set".into());
        }
        Ok(())
    }
}

/// Root configuration of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Tower implementation.
    pub mode: SimulationMode,
    /// Number of aircraft to fly.
    pub aircraft: usize,
    /// Runway pool size.
    pub runways: usize,
    /// Gate pool size.
    pub gates: usize,
    /// Operator threads (concurrent mode).
    pub operators: usize,
    /// Request queue capacity (concurrent mode).
    pub max_queue: usize,
    /// Callsign prefix; aircraft are named `<prefix>-001`, `<prefix>-002`, ...
    pub callsign_prefix: String,
    /// Phase durations.
    pub timing: TimingConfig,
    /// Mirror every aircraft's status to this JSON file.
    pub state_file: Option<PathBuf>,
    /// Write a `;`-separated run summary to this CSV file.
    pub summary_file: Option<PathBuf>,
    /// Keep a per-run log file under `<log_dir>/<mode>/`.
    pub log_dir: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mode: SimulationMode::Concurrent,
            aircraft: 20,
            runways: 3,
            gates: 5,
            operators: 5,
            max_queue: DEFAULT_MAX_QUEUE,
            callsign_prefix: "IBE".into(),
            timing: TimingConfig::default(),
            state_file: None,
            summary_file: None,
            log_dir: None,
        }
    }
}

impl SimulationConfig {
    /// Preset for the sequential baseline: 10 aircraft, 1 runway, 3 gates.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            mode: SimulationMode::Sequential,
            aircraft: 10,
            runways: 1,
            gates: 3,
            ..Self::default()
        }
    }

    /// Set the number of aircraft.
    #[must_use]
    pub const fn with_aircraft(mut self, aircraft: usize) -> Self {
        self.aircraft = aircraft;
        self
    }

    /// Set both pool sizes.
    #[must_use]
    pub const fn with_resources(mut self, runways: usize, gates: usize) -> Self {
        self.runways = runways;
        self.gates = gates;
        self
    }

    /// Set the operator count.
    #[must_use]
    pub const fn with_operators(mut self, operators: usize) -> Self {
        self.operators = operators;
        self
    }

    /// Set the queue capacity.
    #[must_use]
    pub const fn with_max_queue(mut self, max_queue: usize) -> Self {
        self.max_queue = max_queue;
        self
    }

    /// Replace the timing table.
    #[must_use]
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Callsign of the `n`th aircraft, 1-based.
    #[must_use]
    pub fn callsign(&self, n: usize) -> String {
        format!("{}-{n:03}", self.callsign_prefix)
    }

    /// Log file name for a run started at `timestamp`, e.g.
    /// `airport-CONCURRENT-20AV-3RWY-5GATE-5OP-20250101_120000.log`.
    #[must_use]
    pub fn log_file_name(&self, timestamp: &str) -> String {
        let crew = match self.mode {
            SimulationMode::Concurrent => format!("-{}OP", self.operators),
            SimulationMode::Sequential => String::new(),
        };
        format!(
            "airport-{}-{}AV-{}RWY-{}GATE{crew}-{timestamp}.log",
            self.mode.tag(),
            self.aircraft,
            self.runways,
            self.gates,
        )
    }

    /// Where this run logs to, if a log directory is configured.
    #[must_use]
    pub fn log_path(&self, timestamp: &str) -> Option<PathBuf> {
        self.log_dir.as_ref().map(|dir| {
            dir.join(self.mode.as_str())
                .join(self.log_file_name(timestamp))
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.aircraft == 0 {
            return Err("aircraft must be greater than 0".into());
        }
        if self.runways == 0 {
            return Err("runways must be greater than 0".into());
        }
        if self.gates == 0 {
            return Err("gates must be greater than 0".into());
        }
        if self.mode == SimulationMode::Concurrent {
            if self.operators == 0 {
                return Err("operators must be greater than 0".into());
            }
            if self.max_queue == 0 {
                return Err("max_queue must be greater than 0".into());
            }
        }
        if self.callsign_prefix.trim().is_empty() {
            return Err("callsign_prefix must not be empty".into());
        }
        self.timing
            .validate()
            .map_err(|e| format!("timing invalid: {e}"))
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `AIRPORT_*` overrides fetched through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("AIRPORT_MODE") {
            self.mode = mode.parse()?;
        }
        let counts: [(&str, &mut usize); 5] = [
            ("AIRPORT_AIRCRAFT", &mut self.aircraft),
            ("AIRPORT_RUNWAYS", &mut self.runways),
            ("AIRPORT_GATES", &mut self.gates),
            ("AIRPORT_OPERATORS", &mut self.operators),
            ("AIRPORT_MAX_QUEUE", &mut self.max_queue),
        ];
        for (key, slot) in counts {
            if let Some(raw) = lookup(key) {
                *slot = raw
                    .trim()
                    .parse()
                    .map_err(|e| format!("{key}=`{raw}`: {e}"))?;
            }
        }
        if let Some(dir) = lookup("AIRPORT_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(dir.trim()));
        }
        Ok(())
    }

    /// Load `.env`, then the JSON file named by `AIRPORT_CONFIG` if set, then
    /// the `AIRPORT_*` overrides, and validate the result.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        let mut cfg = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                let body = std::fs::read_to_string(&path)
                    .map_err(|e| format!("read {path}: {e}"))?;
                serde_json::from_str(&body).map_err(|e| format!("parse error in {path}: {e}"))?
            }
            Err(_) => Self::default(),
        };
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_concurrent_run() {
        let cfg = SimulationConfig::default();
        assert_eq!((cfg.aircraft, cfg.runways, cfg.gates, cfg.operators), (20, 3, 5, 5));
        assert_eq!(cfg.max_queue, 5);
        assert_eq!(cfg.callsign(7), "IBE-007");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_sequential_preset() {
        let cfg = SimulationConfig::sequential();
        assert_eq!(cfg.mode, SimulationMode::Sequential);
        assert_eq!((cfg.aircraft, cfg.runways, cfg.gates), (10, 1, 3));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([("AIRPORT_MODE", "sequential"), ("AIRPORT_RUNWAYS", " 2 ")]);
        let mut cfg = SimulationConfig::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(cfg.mode, SimulationMode::Sequential);
        assert_eq!(cfg.runways, 2);
        assert_eq!(cfg.gates, 5);
    }

    #[test]
    fn test_bad_override_is_reported() {
        let mut cfg = SimulationConfig::default();
        let err = cfg
            .apply_overrides(|k| (k == "AIRPORT_GATES").then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.contains("AIRPORT_GATES"));
    }

    #[test]
    fn test_log_file_named_from_config() {
        let cfg = SimulationConfig::default();
        assert_eq!(
            cfg.log_file_name("20250101_120000"),
            "airport-CONCURRENT-20AV-3RWY-5GATE-5OP-20250101_120000.log"
        );
        assert!(cfg.log_path("20250101_120000").is_none());

        let mut seq = SimulationConfig::sequential();
        seq.apply_overrides(|k| (k == "AIRPORT_LOG_DIR").then(|| "logs".to_string()))
            .unwrap();
        assert_eq!(
            seq.log_path("20250101_120000").unwrap(),
            PathBuf::from("logs/sequential/airport-SEQUENTIAL-10AV-1RWY-3GATE-20250101_120000.log")
        );
    }
}
