//! Egg Collection Belt - scenario comparison
//!
//! Runs every belt scenario of an experiment, prints a report per scenario
//! and writes results to the experiment's output directory.
//!
//! Usage:
//!   cargo run --release --bin egg_farm                                   # baseline
//!   cargo run --release --bin egg_farm -- experiments/belt_comparison.toml
//!
//! Set `RUST_LOG=info` (or `debug`) for progress logging.

use egg_farm::ExperimentConfig;
use egg_farm::output::{print_report, write_all};
use egg_farm::scenarios::{ScenarioOutcome, run_scenarios};
use std::env;
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let experiment = match args.get(1) {
        Some(path) => ExperimentConfig::load(path).unwrap_or_else(|e| {
            eprintln!("Error loading experiment {}: {}", path, e);
            process::exit(1);
        }),
        None => ExperimentConfig::baseline(),
    };

    println!("----- Starting Egg Farm Simulation -----");
    println!("Experiment: {}", experiment.experiment.name);
    if !experiment.experiment.description.is_empty() {
        println!("Description: {}", experiment.experiment.description);
    }
    println!(
        "Configuration: {} hens, {} minutes, {} scenarios, base seed {}\n",
        experiment.experiment.hen_count,
        experiment.experiment.simulation_time,
        experiment.scenarios.len(),
        experiment.experiment.base_seed
    );

    let start = Instant::now();
    let outcomes = run_scenarios(&experiment);

    for outcome in &outcomes {
        match outcome {
            ScenarioOutcome::Completed(result) => print_report(result),
            ScenarioOutcome::Failed { name, reason } => {
                eprintln!("Scenario {} failed: {}\n", name, reason);
            }
        }
    }

    let output_dir = &experiment.experiment.output_dir;
    match write_all(output_dir, &experiment, &outcomes) {
        Ok(files) => {
            println!("Results written to {}:", output_dir.display());
            for file in files {
                println!("  {}", file.display());
            }
        }
        Err(e) => {
            eprintln!("Error writing results: {}", e);
            process::exit(1);
        }
    }

    let completed = outcomes.iter().filter(|o| o.result().is_some()).count();
    println!(
        "\n----- Simulation completed: {}/{} scenarios in {:.2}s -----",
        completed,
        outcomes.len(),
        start.elapsed().as_secs_f64()
    );
}
