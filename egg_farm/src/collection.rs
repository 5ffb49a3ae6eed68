//! Collection task: one egg's trip from the nest to the end of the belt
//!
//! Arrived ──(breaks, only if it found a queue)──> Broken
//!    └──> Waiting ──(admitted)──> Holding ──(SERVICE_TIME)──> Collected
//!
//! Breakage is decided against the queue the egg finds on arrival, before it
//! asks for the belt, so a broken egg never occupies belt capacity.

use crate::probability::breakage_probability;
use crate::{Event, Farm, FarmContext, FarmResponse, Observation, SERVICE_TIME};
use des::{Agent, ResourceId, Response};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Arrived,
    Waiting,
    Holding,
    Broken,
    Collected,
}

impl Phase {
    fn is_terminal(self) -> bool {
        matches!(self, Phase::Broken | Phase::Collected)
    }
}

pub struct CollectionTask {
    belt: ResourceId,
    phase: Phase,
}

impl CollectionTask {
    pub fn new(belt: ResourceId) -> Self {
        CollectionTask {
            belt,
            phase: Phase::Arrived,
        }
    }

    fn arrive(&mut self, current_t: f64, ctx: &mut FarmContext) -> FarmResponse {
        let queue_length = ctx.resource(self.belt).map_or(0, |belt| belt.queue_len());

        let farm = &mut *ctx.state;
        farm.queue_history.push(Observation::new(current_t, queue_length as f64));

        // an egg landing on an idle belt never breaks
        if queue_length > 0 && farm.rng.random_bool(breakage_probability(queue_length)) {
            farm.eggs.broken += 1;
            self.phase = Phase::Broken;
            return Response::finished();
        }

        self.phase = Phase::Waiting;
        Response::request(self.belt, Event::OnBelt)
    }

    fn board(&mut self, current_t: f64, ctx: &mut FarmContext) -> FarmResponse {
        let utilization = ctx.resource(self.belt).map_or(0.0, |belt| belt.utilization());
        ctx.state
            .utilization_history
            .push(Observation::new(current_t, utilization));

        self.phase = Phase::Holding;
        Response::event(current_t + SERVICE_TIME, Event::Delivered)
    }

    fn deliver(&mut self, ctx: &mut FarmContext) -> FarmResponse {
        ctx.state.eggs.collected += 1;
        self.phase = Phase::Collected;
        Response::finished().with_release(self.belt)
    }
}

impl Agent<Event, Farm> for CollectionTask {
    fn act(&mut self, current_t: f64, data: &Event, ctx: &mut FarmContext) -> FarmResponse {
        match (data, self.phase) {
            (Event::Laid, Phase::Arrived) => self.arrive(current_t, ctx),
            (Event::OnBelt, Phase::Waiting) => self.board(current_t, ctx),
            (Event::Delivered, Phase::Holding) => self.deliver(ctx),
            _ if self.phase.is_terminal() => Response::finished(),
            _ => Response::new(),
        }
    }
}
