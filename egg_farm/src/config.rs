//! Simulation and experiment configuration
//!
//! A `FarmConfig` describes one run. An `ExperimentConfig` describes a set of
//! scenarios that share hen count, horizon and base seed, and can be loaded
//! from TOML:
//!
//! ```toml
//! [experiment]
//! name = "belt_comparison"
//! base_seed = 42
//!
//! [[scenarios]]
//! name = "Scenario_A_Slow"
//! belt_capacity = 80
//! ```

use crate::cost::CostModel;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_HEN_COUNT: u64 = 10_000;
/// Twelve hours, in minutes
pub const DEFAULT_SIMULATION_TIME: usize = 720;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("simulation_time must be at least one minute")]
    ZeroHorizon,

    #[error("hen_count must be positive")]
    NoHens,

    #[error("experiment '{0}' has no scenarios")]
    NoScenarios(String),

    #[error("scenario name '{0}' is used more than once")]
    DuplicateScenario(String),

    #[error("could not read experiment file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse experiment file: {0}")]
    Parse(#[from] toml::de::Error),
}

fn default_hen_count() -> u64 {
    DEFAULT_HEN_COUNT
}

fn default_simulation_time() -> usize {
    DEFAULT_SIMULATION_TIME
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

/// Parameters of a single run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmConfig {
    /// Eggs the belt can carry at once. Zero is allowed and simply never
    /// collects anything.
    pub belt_capacity: usize,
    #[serde(default = "default_hen_count")]
    pub hen_count: u64,
    /// Horizon in minutes
    #[serde(default = "default_simulation_time")]
    pub simulation_time: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl FarmConfig {
    pub fn new(belt_capacity: usize) -> Self {
        FarmConfig {
            belt_capacity,
            hen_count: DEFAULT_HEN_COUNT,
            simulation_time: DEFAULT_SIMULATION_TIME,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_hen_count(mut self, hen_count: u64) -> Self {
        self.hen_count = hen_count;
        self
    }

    pub fn with_simulation_time(mut self, simulation_time: usize) -> Self {
        self.simulation_time = simulation_time;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation_time == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        if self.hen_count == 0 {
            return Err(ConfigError::NoHens);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSettings {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Scenario `i` runs with seed `base_seed + i`
    #[serde(default = "default_seed")]
    pub base_seed: u64,
    #[serde(default = "default_hen_count")]
    pub hen_count: u64,
    #[serde(default = "default_simulation_time")]
    pub simulation_time: usize,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Worker threads for running scenarios; rayon's global pool when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    pub belt_capacity: usize,
}

impl ScenarioSpec {
    pub fn new(name: &str, belt_capacity: usize) -> Self {
        ScenarioSpec {
            name: name.to_string(),
            belt_capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub experiment: ExperimentSettings,
    #[serde(default)]
    pub costs: CostModel,
    pub scenarios: Vec<ScenarioSpec>,
}

impl ExperimentConfig {
    /// Slow, medium and fast belts over a twelve-hour day
    pub fn baseline() -> Self {
        ExperimentConfig {
            experiment: ExperimentSettings {
                name: "belt_comparison".to_string(),
                description: "Breakage and utilization for three belt speeds".to_string(),
                base_seed: DEFAULT_SEED,
                hen_count: DEFAULT_HEN_COUNT,
                simulation_time: DEFAULT_SIMULATION_TIME,
                output_dir: default_output_dir(),
                threads: None,
            },
            costs: CostModel::default(),
            scenarios: vec![
                ScenarioSpec::new("Scenario_A_Slow", 80),
                ScenarioSpec::new("Scenario_B_Medium", 120),
                ScenarioSpec::new("Scenario_C_Fast", 160),
            ],
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: ExperimentConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scenarios.is_empty() {
            return Err(ConfigError::NoScenarios(self.experiment.name.clone()));
        }
        let mut names = HashSet::new();
        for scenario in &self.scenarios {
            if !names.insert(scenario.name.as_str()) {
                return Err(ConfigError::DuplicateScenario(scenario.name.clone()));
            }
        }
        for index in 0..self.scenarios.len() {
            self.scenario_config(index).validate()?;
        }
        Ok(())
    }

    /// Run configuration for the scenario at `index`
    pub fn scenario_config(&self, index: usize) -> FarmConfig {
        let belt_capacity = self
            .scenarios
            .get(index)
            .map_or(0, |scenario| scenario.belt_capacity);
        FarmConfig::new(belt_capacity)
            .with_hen_count(self.experiment.hen_count)
            .with_simulation_time(self.experiment.simulation_time)
            .with_seed(self.experiment.base_seed + index as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_farm_config_defaults() {
        let config = FarmConfig::new(80);
        assert_eq!(config.belt_capacity, 80);
        assert_eq!(config.hen_count, 10_000);
        assert_eq!(config.simulation_time, 720);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_is_valid() {
        assert!(FarmConfig::new(0).validate().is_ok());
    }

    #[test]
    fn test_zero_horizon_is_rejected() {
        let config = FarmConfig::new(10).with_simulation_time(0);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroHorizon)));
    }

    #[test]
    fn test_no_hens_is_rejected() {
        let config = FarmConfig::new(10).with_hen_count(0);
        assert!(matches!(config.validate(), Err(ConfigError::NoHens)));
    }

    #[test]
    fn test_baseline_scenarios() {
        let experiment = ExperimentConfig::baseline();
        let capacities: Vec<usize> = experiment
            .scenarios
            .iter()
            .map(|s| s.belt_capacity)
            .collect();
        assert_eq!(capacities, vec![80, 120, 160]);
        assert!(experiment.validate().is_ok());
    }

    #[test]
    fn test_scenario_seeds_are_offset_by_index() {
        let experiment = ExperimentConfig::baseline();
        assert_eq!(experiment.scenario_config(0).seed, 42);
        assert_eq!(experiment.scenario_config(2).seed, 44);
        assert_eq!(experiment.scenario_config(2).belt_capacity, 160);
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let toml = r#"
            [experiment]
            name = "small"
            simulation_time = 60

            [[scenarios]]
            name = "tiny"
            belt_capacity = 5

            [[scenarios]]
            name = "huge"
            belt_capacity = 500
        "#;

        let experiment = ExperimentConfig::from_toml_str(toml).unwrap();

        assert_eq!(experiment.experiment.name, "small");
        assert_eq!(experiment.experiment.hen_count, 10_000);
        assert_eq!(experiment.experiment.simulation_time, 60);
        assert_eq!(experiment.experiment.output_dir, PathBuf::from("reports"));
        assert_eq!(experiment.experiment.threads, None);
        assert_eq!(experiment.costs, CostModel::default());
        assert_eq!(experiment.scenarios.len(), 2);
        assert_eq!(experiment.scenario_config(1).belt_capacity, 500);
    }

    #[test]
    fn test_parse_toml_with_costs() {
        let toml = r#"
            [experiment]
            name = "priced"
            threads = 2

            [costs]
            egg_value = 25.0
            energy_cost_per_capacity_minute = 0.5

            [[scenarios]]
            name = "a"
            belt_capacity = 1
        "#;

        let experiment = ExperimentConfig::from_toml_str(toml).unwrap();
        assert_eq!(experiment.costs.egg_value, 25.0);
        assert_eq!(experiment.costs.energy_cost_per_capacity_minute, 0.5);
        assert_eq!(experiment.experiment.threads, Some(2));
    }

    #[test]
    fn test_duplicate_scenarios_are_rejected() {
        let toml = r#"
            [experiment]
            name = "dupes"

            [[scenarios]]
            name = "a"
            belt_capacity = 1

            [[scenarios]]
            name = "a"
            belt_capacity = 2
        "#;

        let err = ExperimentConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateScenario(name) if name == "a"));
    }

    #[test]
    fn test_empty_experiment_is_rejected() {
        let toml = r#"
            scenarios = []

            [experiment]
            name = "empty"
        "#;

        let err = ExperimentConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::NoScenarios(_)));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let err = ExperimentConfig::from_toml_str("[experiment\nname=").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
