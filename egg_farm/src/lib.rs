//! Egg Collection Belt Simulation
//!
//! A large flock of hens lays eggs onto a single collection belt of finite
//! capacity. Laying follows a time-of-day Bernoulli process; eggs queue for
//! the belt, and the longer the queue an egg finds on arrival the more likely
//! it is to break before it is ever picked up.
//!
//! Agents:
//! - EggGenerator: once per minute, draws the number of eggs laid and spawns
//!   a CollectionTask for each
//! - CollectionTask: one egg's journey (break, or wait → ride the belt → collected)
//! - MetricsCollector: once per minute, samples queue length and belt utilization
//!
//! After the horizon the raw observations are bucketed into per-minute series
//! (see `aggregate`) and summarised into `Metrics`.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

pub mod aggregate;
pub mod collection;
pub mod config;
pub mod cost;
pub mod generator;
pub mod metrics;
pub mod output;
pub mod probability;
pub mod sampler;
pub mod scenarios;
pub mod simulation;

pub use aggregate::TimeSeries;
pub use config::{ConfigError, ExperimentConfig, FarmConfig, ScenarioSpec};
pub use cost::{CostBreakdown, CostModel};
pub use metrics::Metrics;
pub use simulation::{EggFarmSimulation, SimulationError};

/// Time an egg occupies the belt, in minutes.
pub const SERVICE_TIME: f64 = 0.1;

/// Wake-up payloads exchanged through the event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Once-a-minute heartbeat for the generator and the sampler
    Tick,
    /// A new egg has just been laid
    Laid,
    /// The egg has been admitted onto the belt
    OnBelt,
    /// Transport finished, the egg can leave the belt
    Delivered,
}

/// A single `(timestamp, value)` sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub t: f64,
    pub value: f64,
}

impl Observation {
    pub fn new(t: f64, value: f64) -> Self {
        Observation { t, value }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EggCounts {
    pub laid: u64,
    pub collected: u64,
    pub broken: u64,
}

impl EggCounts {
    /// Eggs laid but neither broken nor collected when the run stopped
    pub fn in_flight(&self) -> u64 {
        self.laid.saturating_sub(self.collected + self.broken)
    }
}

/// Shared model state, mutated by agents while they act
pub struct Farm {
    pub rng: StdRng,
    pub eggs: EggCounts,
    pub queue_history: Vec<Observation>,
    pub utilization_history: Vec<Observation>,
}

impl Farm {
    pub fn new(rng: StdRng) -> Self {
        Farm {
            rng,
            eggs: EggCounts::default(),
            queue_history: Vec::new(),
            utilization_history: Vec::new(),
        }
    }
}

pub type FarmContext<'a> = des::Context<'a, Event, Farm>;
pub type FarmResponse = des::Response<Event, Farm>;
