//! Metrics collector agent
//!
//! Samples queue length and belt utilization once a minute, independent of
//! arrivals. Collection tasks record the same kind of observation when they
//! arrive or board; both sources end up in the same histories and are
//! averaged per minute later.

use crate::{Event, Farm, FarmContext, FarmResponse, Observation};
use des::{Agent, ResourceId, Response};

pub struct MetricsCollector {
    belt: ResourceId,
}

impl MetricsCollector {
    pub fn new(belt: ResourceId) -> Self {
        MetricsCollector { belt }
    }
}

impl Agent<Event, Farm> for MetricsCollector {
    fn act(&mut self, current_t: f64, data: &Event, ctx: &mut FarmContext) -> FarmResponse {
        match data {
            Event::Tick => {
                let (queue_length, utilization) = ctx
                    .resource(self.belt)
                    .map_or((0, 0.0), |belt| (belt.queue_len(), belt.utilization()));

                ctx.state
                    .queue_history
                    .push(Observation::new(current_t, queue_length as f64));
                ctx.state
                    .utilization_history
                    .push(Observation::new(current_t, utilization));

                Response::event(current_t + 1.0, Event::Tick)
            }
            _ => Response::new(),
        }
    }
}
