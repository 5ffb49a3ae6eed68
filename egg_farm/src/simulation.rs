//! One simulated day on the farm
//!
//! Wires the generator, the sampler and the belt into an event loop, runs it
//! to the horizon, and turns the raw histories into per-minute series and
//! summary metrics.

use crate::generator::EggGenerator;
use crate::sampler::MetricsCollector;
use crate::{ConfigError, EggCounts, Event, Farm, FarmConfig, Metrics, Observation, TimeSeries};
use des::{AgentFault, EventLoop};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("simulation has already been run")]
    AlreadyRun,

    #[error("could not build laying distribution: {0}")]
    Distribution(String),
}

pub struct EggFarmSimulation {
    config: FarmConfig,
    // taken by the first run
    rng: Option<StdRng>,
    eggs: EggCounts,
    queue_history: Vec<Observation>,
    utilization_history: Vec<Observation>,
    queue_time_series: TimeSeries,
    utilization_time_series: TimeSeries,
    faults: Vec<AgentFault>,
}

impl EggFarmSimulation {
    /// Seeds the random source from `config.seed`.
    pub fn new(config: FarmConfig) -> Result<Self, ConfigError> {
        let rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(config, rng)
    }

    /// Uses the given random source; `config.seed` is ignored.
    pub fn with_rng(config: FarmConfig, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(EggFarmSimulation {
            config,
            rng: Some(rng),
            eggs: EggCounts::default(),
            queue_history: Vec::new(),
            utilization_history: Vec::new(),
            queue_time_series: TimeSeries::default(),
            utilization_time_series: TimeSeries::default(),
            faults: Vec::new(),
        })
    }

    pub fn config(&self) -> &FarmConfig {
        &self.config
    }

    pub fn has_run(&self) -> bool {
        self.rng.is_none()
    }

    /// Run to the horizon. A simulation can only be run once.
    pub fn run(&mut self) -> Result<(), SimulationError> {
        let Some(rng) = self.rng.take() else {
            return Err(SimulationError::AlreadyRun);
        };
        let mut event_loop: EventLoop<Event, Farm> = EventLoop::new(Farm::new(rng));
        let belt = event_loop.add_resource(self.config.belt_capacity);

        let generator = match EggGenerator::new(belt, self.config.hen_count) {
            Ok(generator) => generator,
            Err(e) => {
                // nothing has run yet, so the instance stays usable
                self.rng = Some(event_loop.into_state().rng);
                return Err(e);
            }
        };

        // From minute 1 on the generator's tick precedes the sampler's, and the
        // eggs it spawns start ahead of the sampler too. At minute 0 the
        // sampler's first wake-up is already queued when the eggs appear.
        event_loop.spawn(0.0, Event::Tick, Box::new(generator));
        event_loop.spawn(0.0, Event::Tick, Box::new(MetricsCollector::new(belt)));

        debug!(
            belt_capacity = self.config.belt_capacity,
            hen_count = self.config.hen_count,
            simulation_time = self.config.simulation_time,
            "running egg farm"
        );
        event_loop.run(self.config.simulation_time as f64);

        self.faults = event_loop.faults().to_vec();
        if !self.faults.is_empty() {
            warn!(faults = self.faults.len(), "some collection tasks failed");
        }

        let live_agents = event_loop.live_agents();
        let farm = event_loop.into_state();
        self.eggs = farm.eggs;
        self.queue_history = farm.queue_history;
        self.utilization_history = farm.utilization_history;
        self.aggregate();

        debug!(
            laid = self.eggs.laid,
            collected = self.eggs.collected,
            broken = self.eggs.broken,
            in_flight = self.eggs.in_flight(),
            live_agents,
            "egg farm finished"
        );
        Ok(())
    }

    fn aggregate(&mut self) {
        let minutes = self.config.simulation_time;
        self.queue_time_series = TimeSeries::from_observations(&self.queue_history, minutes);
        self.utilization_time_series =
            TimeSeries::from_observations(&self.utilization_history, minutes);
    }

    /// Summary metrics; all zero (apart from the capacity) before `run`.
    pub fn get_metrics(&self) -> Metrics {
        Metrics::compute(
            self.eggs,
            &self.queue_time_series,
            &self.utilization_time_series,
            self.config.belt_capacity,
        )
    }

    pub fn eggs(&self) -> EggCounts {
        self.eggs
    }

    /// Every raw queue-length observation, in recording order
    pub fn queue_history(&self) -> &[Observation] {
        &self.queue_history
    }

    /// Every raw utilization observation, in recording order
    pub fn utilization_history(&self) -> &[Observation] {
        &self.utilization_history
    }

    pub fn queue_time_series(&self) -> &TimeSeries {
        &self.queue_time_series
    }

    pub fn utilization_time_series(&self) -> &TimeSeries {
        &self.utilization_time_series
    }

    /// Agents that failed during the run
    pub fn faults(&self) -> &[AgentFault] {
        &self.faults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(belt_capacity: usize) -> FarmConfig {
        FarmConfig::new(belt_capacity)
            .with_hen_count(1000)
            .with_simulation_time(30)
            .with_seed(9)
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let result = EggFarmSimulation::new(FarmConfig::new(10).with_simulation_time(0));
        assert!(matches!(result, Err(ConfigError::ZeroHorizon)));
    }

    #[test]
    fn test_metrics_before_run_are_zero() {
        let simulation = EggFarmSimulation::new(small(50)).unwrap();

        let metrics = simulation.get_metrics();

        assert_eq!(metrics, Metrics::empty(50));
        assert!(simulation.queue_time_series().is_empty());
        assert!(simulation.queue_history().is_empty());
        assert!(!simulation.has_run());
    }

    #[test]
    fn test_run_fills_series_to_horizon() {
        let mut simulation = EggFarmSimulation::new(small(50)).unwrap();

        simulation.run().unwrap();

        assert_eq!(simulation.queue_time_series().len(), 30);
        assert_eq!(simulation.utilization_time_series().len(), 30);
        // sampler plus one observation per egg
        assert_eq!(
            simulation.queue_history().len() as u64,
            30 + simulation.eggs().laid
        );
        assert!(simulation.faults().is_empty());
    }

    #[test]
    fn test_second_run_is_rejected() {
        let mut simulation = EggFarmSimulation::new(small(50)).unwrap();
        simulation.run().unwrap();
        let metrics = simulation.get_metrics();

        assert!(matches!(simulation.run(), Err(SimulationError::AlreadyRun)));
        assert_eq!(simulation.get_metrics(), metrics);
    }
}
