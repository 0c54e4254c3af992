//! End-of-run summary as a `;`-separated CSV.

use std::path::Path;

use crate::core::TowerError;
use crate::runtime::simulation::SimulationReport;

/// `(metric, value)` rows describing a run.
#[must_use]
pub fn summary_rows(report: &SimulationReport) -> Vec<(&'static str, String)> {
    let max_landing_wait = report
        .flights
        .iter()
        .map(|f| f.landing_wait)
        .max()
        .unwrap_or_default();
    let s = &report.stats;
    vec![
        ("mode", report.mode.to_string()),
        ("aircraft", (report.flights.len() + report.failures.len()).to_string()),
        ("completed", report.flights.len().to_string()),
        ("failed", report.failures.len().to_string()),
        ("runways", report.snapshot.runways.len().to_string()),
        ("gates", report.snapshot.gates.len().to_string()),
        ("requests_submitted", s.submitted.to_string()),
        ("queue_saturations", s.saturated.to_string()),
        ("landings_assigned", s.landings_assigned.to_string()),
        ("takeoffs_assigned", s.takeoffs_assigned.to_string()),
        ("requests_deferred", s.deferred.to_string()),
        ("deferred_resumed", s.resumed.to_string()),
        ("resources_released", s.released.to_string()),
        ("requests_withdrawn", s.withdrawn.to_string()),
        ("departed", s.departed.to_string()),
        ("mean_landing_wait_ms", report.mean_landing_wait().as_millis().to_string()),
        ("mean_takeoff_wait_ms", report.mean_takeoff_wait().as_millis().to_string()),
        ("max_landing_wait_ms", max_landing_wait.as_millis().to_string()),
        ("elapsed_ms", report.elapsed.as_millis().to_string()),
    ]
}

/// Write the summary of `report` to `path`.
///
/// # Errors
///
/// `TowerError::Persistence` if the file cannot be created or written.
pub fn write_summary(path: &Path, report: &SimulationReport) -> Result<(), TowerError> {
    let persist = |e: csv::Error| TowerError::Persistence(format!("{}: {e}", path.display()));

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .map_err(persist)?;
    writer.write_record(["metric", "value"]).map_err(persist)?;
    for (metric, value) in summary_rows(report) {
        writer
            .write_record([metric, value.as_str()])
            .map_err(persist)?;
    }
    writer
        .flush()
        .map_err(|e| TowerError::Persistence(format!("{}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), "summary written");
    Ok(())
}
