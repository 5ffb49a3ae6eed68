//! Operating cost of a belt configuration
//!
//! Broken eggs are lost revenue; a faster belt burns more energy for every
//! minute it runs.

use crate::Metrics;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EGG_VALUE: f64 = 20.0;
pub const DEFAULT_ENERGY_COST_PER_CAPACITY_MINUTE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    pub egg_value: f64,
    pub energy_cost_per_capacity_minute: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            egg_value: DEFAULT_EGG_VALUE,
            energy_cost_per_capacity_minute: DEFAULT_ENERGY_COST_PER_CAPACITY_MINUTE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub breakage_cost: f64,
    pub energy_cost: f64,
    pub total_cost: f64,
}

impl CostModel {
    pub fn evaluate(&self, metrics: &Metrics, simulation_time: usize) -> CostBreakdown {
        let breakage_cost = metrics.eggs_broken as f64 * self.egg_value;
        let energy_cost = metrics.belt_capacity as f64
            * self.energy_cost_per_capacity_minute
            * simulation_time as f64;
        CostBreakdown {
            breakage_cost,
            energy_cost,
            total_cost: breakage_cost + energy_cost,
        }
    }
}
