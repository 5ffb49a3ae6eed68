//! Egg generator agent
//!
//! Every minute each of `hen_count` hens independently lays with the
//! probability for the current part of the day. The per-minute count is drawn
//! directly as Binomial(hen_count, p), which has the same distribution as
//! `hen_count` separate Bernoulli trials.

use crate::collection::CollectionTask;
use crate::probability::DayPeriod;
use crate::{Event, Farm, FarmContext, FarmResponse, SimulationError};
use des::{Agent, ResourceId, Response};
use rand::Rng;
use rand_distr::{Binomial, Distribution};

pub struct EggGenerator {
    belt: ResourceId,
    hen_count: u64,
    // indexed by DayPeriod::index
    layings: [Binomial; 3],
}

impl EggGenerator {
    pub fn new(belt: ResourceId, hen_count: u64) -> Result<Self, SimulationError> {
        let laying = |period: DayPeriod| {
            Binomial::new(hen_count, period.laying_probability())
                .map_err(|e| SimulationError::Distribution(e.to_string()))
        };
        Ok(EggGenerator {
            belt,
            hen_count,
            layings: [
                laying(DayPeriod::Morning)?,
                laying(DayPeriod::Midday)?,
                laying(DayPeriod::OffPeak)?,
            ],
        })
    }

    pub fn hen_count(&self) -> u64 {
        self.hen_count
    }

    /// Number of eggs laid in the minute starting at `t`
    fn lay<R: Rng + ?Sized>(&self, t: f64, rng: &mut R) -> u64 {
        self.layings[DayPeriod::at(t).index()].sample(rng)
    }
}

impl Agent<Event, Farm> for EggGenerator {
    fn act(&mut self, current_t: f64, data: &Event, ctx: &mut FarmContext) -> FarmResponse {
        match data {
            Event::Tick => {
                let laid = self.lay(current_t, &mut ctx.state.rng);
                ctx.state.eggs.laid += laid;

                let mut response = Response::event(current_t + 1.0, Event::Tick);
                for _ in 0..laid {
                    response = response
                        .with_agent(Event::Laid, Box::new(CollectionTask::new(self.belt)));
                }
                response
            }
            _ => Response::new(),
        }
    }
}
