//! Writing experiment results to disk and to the console
//!
//! For a set of completed scenarios, `write_all` produces:
//! - `simulation_results.json`: scenario name → `Metrics`
//! - `<scenario>_timeseries.csv`: per-minute queue length and utilization
//! - `cost_analysis.csv`: cost breakdown per scenario
//! - `run_metadata.json`: timestamp, seeds and failed scenarios
//! - `experiment.toml`: the resolved experiment configuration

use crate::scenarios::{ScenarioOutcome, ScenarioResult};
use crate::{ExperimentConfig, Metrics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// Metadata for reproducibility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub experiment: String,
    pub timestamp: String,
    pub base_seed: u64,
    pub hen_count: u64,
    pub simulation_time: usize,
    pub completed: Vec<String>,
    pub failed: BTreeMap<String, String>,
}

impl RunMetadata {
    pub fn new(experiment: &ExperimentConfig, outcomes: &[ScenarioOutcome]) -> Self {
        let mut completed = Vec::new();
        let mut failed = BTreeMap::new();
        for outcome in outcomes {
            match outcome {
                ScenarioOutcome::Completed(result) => completed.push(result.name.clone()),
                ScenarioOutcome::Failed { name, reason } => {
                    failed.insert(name.clone(), reason.clone());
                }
            }
        }

        RunMetadata {
            experiment: experiment.experiment.name.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            base_seed: experiment.experiment.base_seed,
            hen_count: experiment.experiment.hen_count,
            simulation_time: experiment.experiment.simulation_time,
            completed,
            failed,
        }
    }
}

/// Scenario name → metrics, pretty-printed
pub fn write_results_json<P: AsRef<Path>>(
    path: P,
    results: &[&ScenarioResult],
) -> Result<(), OutputError> {
    let by_name: BTreeMap<&str, &Metrics> = results
        .iter()
        .map(|result| (result.name.as_str(), &result.metrics))
        .collect();
    let json = serde_json::to_string_pretty(&by_name)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn write_timeseries_csv<P: AsRef<Path>>(
    path: P,
    result: &ScenarioResult,
) -> Result<(), OutputError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["minute", "avg_queue", "utilization"])?;

    let queue = result.queue_time_series.values();
    let utilization = result.utilization_time_series.values();
    for minute in 0..queue.len().max(utilization.len()) {
        wtr.write_record(&[
            minute.to_string(),
            queue.get(minute).copied().unwrap_or(0.0).to_string(),
            utilization.get(minute).copied().unwrap_or(0.0).to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_cost_csv<P: AsRef<Path>>(
    path: P,
    results: &[&ScenarioResult],
) -> Result<(), OutputError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "scenario",
        "belt_capacity",
        "eggs_broken",
        "breakage_cost",
        "energy_cost",
        "total_cost",
    ])?;

    for result in results {
        wtr.write_record(&[
            result.name.clone(),
            result.metrics.belt_capacity.to_string(),
            result.metrics.eggs_broken.to_string(),
            result.cost.breakage_cost.to_string(),
            result.cost.energy_cost.to_string(),
            result.cost.total_cost.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_metadata_json<P: AsRef<Path>>(
    path: P,
    metadata: &RunMetadata,
) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(metadata)?;
    fs::write(path, json)?;
    Ok(())
}

/// Write every output file for an experiment into `dir`, creating it if
/// needed. Failed scenarios only show up in the metadata.
pub fn write_all<P: AsRef<Path>>(
    dir: P,
    experiment: &ExperimentConfig,
    outcomes: &[ScenarioOutcome],
) -> Result<Vec<PathBuf>, OutputError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let results: Vec<&ScenarioResult> = outcomes.iter().filter_map(|o| o.result()).collect();
    let mut written = Vec::new();

    let path = dir.join("simulation_results.json");
    write_results_json(&path, &results)?;
    written.push(path);

    for result in &results {
        let path = dir.join(format!("{}_timeseries.csv", result.name));
        write_timeseries_csv(&path, result)?;
        written.push(path);
    }

    let path = dir.join("cost_analysis.csv");
    write_cost_csv(&path, &results)?;
    written.push(path);

    let path = dir.join("run_metadata.json");
    write_metadata_json(&path, &RunMetadata::new(experiment, outcomes))?;
    written.push(path);

    let path = dir.join("experiment.toml");
    fs::write(&path, toml::to_string_pretty(experiment)?)?;
    written.push(path);

    info!(dir = %dir.display(), files = written.len(), "results written");
    Ok(written)
}

/// Human-readable summary of one scenario
pub fn format_report(result: &ScenarioResult) -> String {
    let m = &result.metrics;
    format!(
        "--- {} (belt capacity {}) ---\n\
         Total eggs laid:      {}\n\
         Eggs collected:       {}\n\
         Eggs broken:          {}\n\
         Breakage rate:        {:.2}%\n\
         Belt utilization:     {:.2}%\n\
         Average queue:        {:.2}\n\
         Maximum queue:        {:.2}\n\
         Total cost:           {:.2} (breakage {:.2}, energy {:.2})",
        result.name,
        m.belt_capacity,
        m.eggs_laid,
        m.eggs_collected,
        m.eggs_broken,
        m.breakage_rate * 100.0,
        m.utilization * 100.0,
        m.avg_queue,
        m.max_queue,
        result.cost.total_cost,
        result.cost.breakage_cost,
        result.cost.energy_cost,
    )
}

pub fn print_report(result: &ScenarioResult) {
    println!("{}\n", format_report(result));
}
