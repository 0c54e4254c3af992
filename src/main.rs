//! `airport-sim`: run the control-tower simulation from the command line.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;

use airport_tower::config::{SimulationConfig, SimulationMode};
use airport_tower::core::AppResult;
use airport_tower::runtime::{summary_rows, Simulation};
use airport_tower::util::{init_logging, init_tracing, run_timestamp};

/// Run the airport control-tower simulation.
#[derive(Parser)]
#[command(name = "airport-sim", version, about)]
struct Args {
    /// JSON configuration file (defaults to $AIRPORT_CONFIG, then built-in defaults)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Tower implementation
    #[arg(long, value_enum)]
    mode: Option<SimulationMode>,

    /// Number of aircraft
    #[arg(long)]
    aircraft: Option<usize>,

    /// Number of runways
    #[arg(long)]
    runways: Option<usize>,

    /// Number of gates
    #[arg(long)]
    gates: Option<usize>,

    /// Number of operator threads
    #[arg(long)]
    operators: Option<usize>,

    /// Request queue capacity
    #[arg(long)]
    max_queue: Option<usize>,

    /// Mirror aircraft statuses into this JSON file
    #[arg(long, value_name = "FILE")]
    state_file: Option<PathBuf>,

    /// Write a run summary CSV here
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write this run's log under DIR/<mode>/
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn resolve_config(&self) -> AppResult<SimulationConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let body = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                SimulationConfig::from_json_str(&body).map_err(|e| anyhow!(e))?
            }
            None => SimulationConfig::from_env().map_err(|e| anyhow!(e))?,
        };

        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        cfg.aircraft = self.aircraft.unwrap_or(cfg.aircraft);
        cfg.runways = self.runways.unwrap_or(cfg.runways);
        cfg.gates = self.gates.unwrap_or(cfg.gates);
        cfg.operators = self.operators.unwrap_or(cfg.operators);
        cfg.max_queue = self.max_queue.unwrap_or(cfg.max_queue);
        if self.state_file.is_some() {
            cfg.state_file.clone_from(&self.state_file);
        }
        if self.summary.is_some() {
            cfg.summary_file.clone_from(&self.summary);
        }
        if self.log_dir.is_some() {
            cfg.log_dir.clone_from(&self.log_dir);
        }

        cfg.validate()
            .map_err(|e| anyhow!("invalid configuration: {e}"))?;
        Ok(cfg)
    }
}

fn main() -> AppResult<()> {
    let args = Args::parse();
    let cfg = args.resolve_config()?;

    let _log_guard = match cfg.log_path(&run_timestamp()) {
        Some(path) => {
            let guard = init_logging(&args.log_level, &path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            println!("Logging to {}", path.display());
            Some(guard)
        }
        None => {
            init_tracing(&args.log_level);
            None
        }
    };
    println!(
        "Tower online: {} mode, {} aircraft, {} runways, {} gates",
        cfg.mode, cfg.aircraft, cfg.runways, cfg.gates
    );

    let report = Simulation::new(cfg).run().context("simulation failed")?;

    println!("{}", report.snapshot);
    for (metric, value) in summary_rows(&report) {
        println!("{metric:<22}{value}");
    }
    for failure in &report.failures {
        eprintln!("{}: {}", failure.aircraft, failure.reason);
    }
    if !report.failures.is_empty() {
        return Err(anyhow!("{} flights did not complete", report.failures.len()));
    }
    Ok(())
}
