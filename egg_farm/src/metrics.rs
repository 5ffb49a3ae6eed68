//! Summary metrics computed once a run has finished

use crate::{EggCounts, TimeSeries};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub eggs_laid: u64,
    pub eggs_collected: u64,
    pub eggs_broken: u64,
    pub breakage_rate: f64,
    /// Mean of the per-minute utilization series
    pub utilization: f64,
    pub max_queue: f64,
    pub avg_queue: f64,
    pub belt_capacity: usize,
}

impl Metrics {
    /// Metrics of a run that has not happened yet
    pub fn empty(belt_capacity: usize) -> Self {
        Metrics {
            belt_capacity,
            ..Metrics::default()
        }
    }

    /// Every ratio degrades to 0 instead of dividing by zero.
    pub fn compute(
        eggs: EggCounts,
        queue: &TimeSeries,
        utilization: &TimeSeries,
        belt_capacity: usize,
    ) -> Self {
        let breakage_rate = if eggs.laid > 0 {
            eggs.broken as f64 / eggs.laid as f64
        } else {
            0.0
        };

        Metrics {
            eggs_laid: eggs.laid,
            eggs_collected: eggs.collected,
            eggs_broken: eggs.broken,
            breakage_rate,
            utilization: utilization.mean(),
            max_queue: queue.max(),
            avg_queue: queue.mean(),
            belt_capacity,
        }
    }

    pub fn eggs_in_flight(&self) -> u64 {
        self.eggs_laid
            .saturating_sub(self.eggs_collected + self.eggs_broken)
    }
}
