//! Running a set of belt scenarios side by side
//!
//! Every scenario is an independent simulation with its own seed, so they run
//! in parallel. A scenario that errors or panics is reported as failed and
//! contributes no metrics; the others are unaffected.

use crate::{
    CostBreakdown, CostModel, EggFarmSimulation, ExperimentConfig, FarmConfig, Metrics,
    Observation, SimulationError, TimeSeries,
};
use des::AgentFault;
use des::parallel::ParallelRunner;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub config: FarmConfig,
    pub metrics: Metrics,
    pub cost: CostBreakdown,
    pub queue_time_series: TimeSeries,
    pub utilization_time_series: TimeSeries,
    #[serde(skip)]
    pub queue_history: Vec<Observation>,
    #[serde(skip)]
    pub utilization_history: Vec<Observation>,
    #[serde(skip)]
    pub faults: Vec<AgentFault>,
}

#[derive(Debug, Clone)]
pub enum ScenarioOutcome {
    Completed(Box<ScenarioResult>),
    Failed { name: String, reason: String },
}

impl ScenarioOutcome {
    pub fn name(&self) -> &str {
        match self {
            ScenarioOutcome::Completed(result) => &result.name,
            ScenarioOutcome::Failed { name, .. } => name,
        }
    }

    pub fn result(&self) -> Option<&ScenarioResult> {
        match self {
            ScenarioOutcome::Completed(result) => Some(&**result),
            ScenarioOutcome::Failed { .. } => None,
        }
    }
}

/// Build, run and summarise a single scenario
pub fn run_scenario(
    name: &str,
    config: FarmConfig,
    costs: &CostModel,
) -> Result<ScenarioResult, SimulationError> {
    let mut simulation = EggFarmSimulation::new(config)?;
    simulation.run()?;

    let metrics = simulation.get_metrics();
    let cost = costs.evaluate(&metrics, simulation.config().simulation_time);
    Ok(ScenarioResult {
        name: name.to_string(),
        config: simulation.config().clone(),
        metrics,
        cost,
        queue_time_series: simulation.queue_time_series().clone(),
        utilization_time_series: simulation.utilization_time_series().clone(),
        queue_history: simulation.queue_history().to_vec(),
        utilization_history: simulation.utilization_history().to_vec(),
        faults: simulation.faults().to_vec(),
    })
}

/// Run every scenario of the experiment, in parallel, in declaration order
pub fn run_scenarios(experiment: &ExperimentConfig) -> Vec<ScenarioOutcome> {
    let total = experiment.scenarios.len();
    let mut runner = ParallelRunner::new(total, |index| {
        let scenario = &experiment.scenarios[index];
        info!(scenario = %scenario.name, belt_capacity = scenario.belt_capacity, "running scenario");
        run_scenario(
            &scenario.name,
            experiment.scenario_config(index),
            &experiment.costs,
        )
    })
    .progress(|completed, total| info!(completed, total, "scenario finished"));
    if let Some(threads) = experiment.experiment.threads {
        runner = runner.num_threads(threads);
    }
    let results = runner.run();

    experiment
        .scenarios
        .iter()
        .zip(results)
        .map(|(scenario, result)| match result {
            Ok(Ok(result)) => ScenarioOutcome::Completed(Box::new(result)),
            Ok(Err(e)) => {
                warn!(scenario = %scenario.name, error = %e, "scenario failed");
                ScenarioOutcome::Failed {
                    name: scenario.name.clone(),
                    reason: e.to_string(),
                }
            }
            Err(panic) => {
                warn!(scenario = %scenario.name, panic = %panic, "scenario panicked");
                ScenarioOutcome::Failed {
                    name: scenario.name.clone(),
                    reason: panic,
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScenarioSpec;

    fn quick_experiment(scenarios: Vec<ScenarioSpec>) -> ExperimentConfig {
        let mut experiment = ExperimentConfig::baseline();
        experiment.experiment.hen_count = 500;
        experiment.experiment.simulation_time = 20;
        experiment.scenarios = scenarios;
        experiment
    }

    #[test]
    fn test_run_scenario_summarises() {
        let config = FarmConfig::new(10)
            .with_hen_count(500)
            .with_simulation_time(20)
            .with_seed(3);

        let result = run_scenario("small", config, &CostModel::default()).unwrap();

        assert_eq!(result.name, "small");
        assert_eq!(result.metrics.belt_capacity, 10);
        assert_eq!(result.queue_time_series.len(), 20);
        assert_eq!(result.cost.energy_cost, 10.0 * 0.3 * 20.0);
        assert!(!result.queue_history.is_empty());
    }

    #[test]
    fn test_outcomes_keep_declaration_order() {
        let experiment = quick_experiment(vec![
            ScenarioSpec::new("c", 3),
            ScenarioSpec::new("a", 1),
            ScenarioSpec::new("b", 2),
        ]);

        let outcomes = run_scenarios(&experiment);

        let names: Vec<&str> = outcomes.iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        let capacities: Vec<usize> = outcomes
            .iter()
            .filter_map(|o| o.result())
            .map(|r| r.metrics.belt_capacity)
            .collect();
        assert_eq!(capacities, vec![3, 1, 2]);
    }

    #[test]
    fn test_thread_count_does_not_change_results() {
        let mut experiment = quick_experiment(vec![
            ScenarioSpec::new("x", 2),
            ScenarioSpec::new("y", 4),
            ScenarioSpec::new("z", 8),
        ]);
        let metrics = |experiment: &ExperimentConfig| -> Vec<Metrics> {
            run_scenarios(experiment)
                .iter()
                .filter_map(|o| o.result().map(|r| r.metrics))
                .collect()
        };

        let pooled = metrics(&experiment);
        experiment.experiment.threads = Some(1);
        let single = metrics(&experiment);

        assert_eq!(single.len(), 3);
        assert_eq!(single, pooled);
    }

    #[test]
    fn test_errors_become_failed_outcomes() {
        let mut experiment = quick_experiment(vec![
            ScenarioSpec::new("first", 5),
            ScenarioSpec::new("second", 6),
        ]);
        // bypasses ExperimentConfig::validate
        experiment.experiment.hen_count = 0;

        let outcomes = run_scenarios(&experiment);

        assert_eq!(outcomes.len(), 2);
        for outcome in &outcomes {
            match outcome {
                ScenarioOutcome::Failed { reason, .. } => assert!(reason.contains("hen_count")),
                ScenarioOutcome::Completed(_) => panic!("expected failure"),
            }
        }
        assert_eq!(outcomes[1].name(), "second");
    }

    #[test]
    fn test_same_experiment_is_reproducible() {
        let experiment = quick_experiment(vec![
            ScenarioSpec::new("x", 2),
            ScenarioSpec::new("y", 4),
        ]);

        let first: Vec<Metrics> = run_scenarios(&experiment)
            .iter()
            .filter_map(|o| o.result().map(|r| r.metrics))
            .collect();
        let second: Vec<Metrics> = run_scenarios(&experiment)
            .iter()
            .filter_map(|o| o.result().map(|r| r.metrics))
            .collect();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }
}
