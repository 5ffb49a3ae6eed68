//! Discrete-event simulation engine.
//!
//! A single-threaded, cooperative event loop. Every agent is a resumable
//! process: it is woken with a payload, does some work against the shared
//! model state, and answers with a [`Response`] saying what it wants next
//! (wait a while, queue for a [`Resource`], spawn more agents, or finish).
//!
//! Events are ordered by `(time, priority, sequence)`. The first wake-up of a
//! newly spawned agent is urgent and runs ahead of ordinary wake-ups due at
//! the same instant; otherwise agents scheduled for the same instant are
//! resumed in the order they were scheduled.

use std::any::Any;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, trace, warn};

pub mod parallel;
pub mod resource;

pub use resource::{Resource, ResourceError, ResourceId};

pub type AgentId = usize;

struct Event<T> {
    t: f64,
    // first wake-up of a freshly spawned agent
    urgent: bool,
    seq: u64,
    agent: AgentId,
    data: T,
}

impl<T> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Event<T> {}

impl<T> Ord for Event<T> {
    // BinaryHeap is a max-heap; reverse so the earliest event pops first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .t
            .total_cmp(&self.t)
            .then_with(|| self.urgent.cmp(&other.urgent))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Event<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// What an agent wants the event loop to do after it has acted.
pub struct Response<T, W> {
    /// Future wake-ups for the acting agent, at absolute times.
    pub events: Vec<(f64, T)>,
    /// New agents, each started at the current time with its payload, ahead
    /// of ordinary wake-ups already due now.
    pub agents: Vec<(T, Box<dyn Agent<T, W>>)>,
    /// Queue for a resource; the payload comes back on admission.
    pub request: Option<(ResourceId, T)>,
    /// Resources to hand back before anything else is applied.
    pub release: Vec<ResourceId>,
    /// Drop the agent once this response is applied.
    pub done: bool,
}

impl<T, W> Response<T, W> {
    pub fn new() -> Response<T, W> {
        Response {
            events: Vec::new(),
            agents: Vec::new(),
            request: None,
            release: Vec::new(),
            done: false,
        }
    }

    pub fn event(t: f64, data: T) -> Response<T, W> {
        let mut response = Response::new();
        response.events.push((t, data));
        response
    }

    pub fn events(events: Vec<(f64, T)>) -> Response<T, W> {
        let mut response = Response::new();
        response.events = events;
        response
    }

    pub fn request(resource: ResourceId, data: T) -> Response<T, W> {
        let mut response = Response::new();
        response.request = Some((resource, data));
        response
    }

    pub fn finished() -> Response<T, W> {
        let mut response = Response::new();
        response.done = true;
        response
    }

    pub fn with_agent(mut self, data: T, agent: Box<dyn Agent<T, W>>) -> Response<T, W> {
        self.agents.push((data, agent));
        self
    }

    pub fn with_release(mut self, resource: ResourceId) -> Response<T, W> {
        self.release.push(resource);
        self
    }

    pub fn and_finish(mut self) -> Response<T, W> {
        self.done = true;
        self
    }
}

impl<T, W> Default for Response<T, W> {
    fn default() -> Self {
        Response::new()
    }
}

/// Read-only view of the resources plus mutable access to the model state,
/// handed to an agent while it acts.
pub struct Context<'a, T, W> {
    resources: &'a [Resource<T>],
    pub state: &'a mut W,
}

impl<'a, T, W> Context<'a, T, W> {
    pub fn resource(&self, resource_id: ResourceId) -> Option<&Resource<T>> {
        self.resources.get(resource_id)
    }
}

pub trait Agent<T, W> {
    fn act(&mut self, current_t: f64, data: &T, ctx: &mut Context<T, W>) -> Response<T, W>;
}

/// An agent that panicked or misused a resource. The agent is removed; the
/// run carries on.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentFault {
    pub agent: AgentId,
    pub t: f64,
    pub message: String,
}

pub struct EventLoop<T, W> {
    queue: BinaryHeap<Event<T>>,
    current_t: f64,
    next_seq: u64,
    next_agent_id: AgentId,
    agents: HashMap<AgentId, Box<dyn Agent<T, W>>>,
    resources: Vec<Resource<T>>,
    faults: Vec<AgentFault>,
    state: W,
}

impl<T, W> EventLoop<T, W> {
    pub fn new(state: W) -> EventLoop<T, W> {
        EventLoop {
            queue: BinaryHeap::new(),
            current_t: 0.0,
            next_seq: 0,
            next_agent_id: 0,
            agents: HashMap::new(),
            resources: Vec::new(),
            faults: Vec::new(),
            state,
        }
    }

    pub fn add_resource(&mut self, capacity: usize) -> ResourceId {
        let resource_id = self.resources.len();
        self.resources.push(Resource::new(resource_id, capacity));
        resource_id
    }

    /// Register an agent and wake it at `t` with `data`. The first wake-up is
    /// urgent: it runs before ordinary wake-ups already due at `t`.
    pub fn spawn(&mut self, t: f64, data: T, agent: Box<dyn Agent<T, W>>) -> AgentId {
        let agent_id = self.next_agent_id;
        self.next_agent_id += 1;
        self.agents.insert(agent_id, agent);
        self.push(t, true, agent_id, data);
        agent_id
    }

    pub fn current_t(&self) -> f64 {
        self.current_t
    }

    pub fn resource(&self, resource_id: ResourceId) -> Option<&Resource<T>> {
        self.resources.get(resource_id)
    }

    pub fn state(&self) -> &W {
        &self.state
    }

    pub fn into_state(self) -> W {
        self.state
    }

    pub fn faults(&self) -> &[AgentFault] {
        &self.faults
    }

    /// Number of events still waiting to be processed.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of agents that have not finished.
    pub fn live_agents(&self) -> usize {
        self.agents.len()
    }

    fn schedule(&mut self, t: f64, agent: AgentId, data: T) {
        self.push(t, false, agent, data);
    }

    fn push(&mut self, t: f64, urgent: bool, agent: AgentId, data: T) {
        // the clock never moves backwards
        let t = if t < self.current_t { self.current_t } else { t };
        let seq = self.next_seq;
        self.next_seq += 1;
        trace!(now = self.current_t, t, urgent, seq, agent, "schedule");
        self.queue.push(Event {
            t,
            urgent,
            seq,
            agent,
            data,
        });
    }

    fn fault(&mut self, agent: AgentId, message: String) {
        warn!(agent, t = self.current_t, %message, "agent fault");
        self.faults.push(AgentFault {
            agent,
            t: self.current_t,
            message,
        });
        self.agents.remove(&agent);
        let mut admitted = Vec::new();
        for resource in &mut self.resources {
            admitted.extend(resource.withdraw(agent));
        }
        for (agent, data) in admitted {
            self.schedule(self.current_t, agent, data);
        }
    }

    fn apply(&mut self, agent: AgentId, response: Response<T, W>) {
        for resource_id in response.release {
            let released = match self.resources.get_mut(resource_id) {
                Some(resource) => resource.release(agent),
                None => Err(ResourceError::Unknown(resource_id)),
            };
            match released {
                Ok(admitted) => {
                    for (waiter, data) in admitted {
                        self.schedule(self.current_t, waiter, data);
                    }
                }
                Err(e) => {
                    self.fault(agent, e.to_string());
                    return;
                }
            }
        }

        for (t, data) in response.events {
            self.schedule(t, agent, data);
        }

        if let Some((resource_id, data)) = response.request {
            let Some(resource) = self.resources.get_mut(resource_id) else {
                self.fault(agent, ResourceError::Unknown(resource_id).to_string());
                return;
            };
            for (waiter, data) in resource.request(agent, data) {
                self.schedule(self.current_t, waiter, data);
            }
        }

        for (data, new_agent) in response.agents {
            self.spawn(self.current_t, data, new_agent);
        }

        if response.done {
            self.agents.remove(&agent);
        }
    }

    fn step(&mut self) {
        let Some(event) = self.queue.pop() else {
            return;
        };
        self.current_t = event.t;

        let Some(agent) = self.agents.get_mut(&event.agent) else {
            // finished or faulted before this wake-up came round
            return;
        };
        let mut ctx = Context {
            resources: &self.resources,
            state: &mut self.state,
        };
        let current_t = self.current_t;
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| agent.act(current_t, &event.data, &mut ctx)));

        match outcome {
            Ok(response) => self.apply(event.agent, response),
            Err(panic) => self.fault(event.agent, panic_message(panic)),
        }
    }

    /// Process every event scheduled strictly before `until`.
    ///
    /// Anything left afterwards is dropped and the clock is parked at
    /// `until`. Agents still waiting are abandoned mid-flight.
    pub fn run(&mut self, until: f64) {
        debug!(until, pending = self.queue.len(), "run start");
        let mut processed = 0usize;
        while let Some(event) = self.queue.peek() {
            if event.t >= until {
                break;
            }
            self.step();
            processed += 1;
        }
        let discarded = self.queue.len();
        self.queue.clear();
        if until > self.current_t {
            self.current_t = until;
        }
        debug!(
            processed,
            discarded,
            faults = self.faults.len(),
            "run complete"
        );
    }
}

pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
