//! Finite-capacity shared resource with a FIFO wait queue.
//!
//! A `Resource` hands out at most `capacity` units at a time. Agents that
//! cannot be served immediately wait in arrival order; whenever a unit frees
//! up the head of the queue is admitted. Each waiter carries the payload that
//! will be delivered back to it on admission.

use std::collections::{HashSet, VecDeque};

use thiserror::Error;

use crate::AgentId;

pub type ResourceId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("agent {agent} released resource {resource} without holding it")]
    NotHolder { resource: ResourceId, agent: AgentId },

    #[error("resource {0} does not exist")]
    Unknown(ResourceId),
}

#[derive(Debug)]
pub struct Resource<T> {
    resource_id: ResourceId,
    capacity: usize,
    queue: VecDeque<(AgentId, T)>,
    holders: HashSet<AgentId>,
}

impl<T> Resource<T> {
    pub fn new(resource_id: ResourceId, capacity: usize) -> Resource<T> {
        Resource {
            resource_id,
            capacity,
            queue: VecDeque::new(),
            holders: HashSet::new(),
        }
    }

    pub fn resource_id(&self) -> ResourceId {
        self.resource_id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of agents waiting to be admitted.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of agents currently holding a unit.
    pub fn holder_count(&self) -> usize {
        self.holders.len()
    }

    pub fn is_holder(&self, agent: AgentId) -> bool {
        self.holders.contains(&agent)
    }

    #[cfg(test)]
    fn is_waiting(&self, agent: AgentId) -> bool {
        self.queue.iter().any(|(cid, _)| *cid == agent)
    }

    /// Fraction of capacity in use, 0 for a zero-capacity resource.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.holders.len() as f64 / self.capacity as f64
    }

    /// Join the back of the queue.
    ///
    /// Returns the agents admitted as a result, in admission order. With an
    /// empty queue and a free unit that is just the caller.
    pub fn request(&mut self, agent: AgentId, data: T) -> Vec<(AgentId, T)> {
        self.queue.push_back((agent, data));
        self.admit()
    }

    /// Give back a unit and admit whoever is next in line.
    pub fn release(&mut self, agent: AgentId) -> Result<Vec<(AgentId, T)>, ResourceError> {
        if !self.holders.remove(&agent) {
            return Err(ResourceError::NotHolder {
                resource: self.resource_id,
                agent,
            });
        }
        Ok(self.admit())
    }

    /// Drop every trace of `agent`, held unit or queue slot.
    ///
    /// Used when an agent dies without releasing. Returns newly admitted
    /// agents, as `release` does.
    pub fn withdraw(&mut self, agent: AgentId) -> Vec<(AgentId, T)> {
        self.queue.retain(|(cid, _)| *cid != agent);
        if self.holders.remove(&agent) {
            self.admit()
        } else {
            Vec::new()
        }
    }

    fn admit(&mut self) -> Vec<(AgentId, T)> {
        let mut admitted = Vec::new();
        while self.holders.len() < self.capacity {
            let Some((agent, data)) = self.queue.pop_front() else {
                break;
            };
            self.holders.insert(agent);
            admitted.push((agent, data));
        }
        admitted
    }
}
