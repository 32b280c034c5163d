//! Synthetic allocate/deallocate request stream
//!
//! Every process id in `1..=max_pid` allocates at most once. Once an id is
//! deallocated it is retired for good, so the stream eventually runs dry;
//! at that point the generator emits a no-op deallocation of pid 0.

use crate::core::allocator::ProcessId;
use crate::error::{Result, SimError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use tracing::debug;

/// Pid used for the no-op request emitted by an exhausted generator
pub const NOOP_PID: ProcessId = 0;

/// What a request asks the allocator to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Allocate,
    Deallocate,
}

/// One allocate or deallocate request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub action: Action,
    pub pid: ProcessId,
    /// Requested units (drawn for every request, only used by allocations)
    pub size: usize,
}

impl Request {
    pub fn is_noop(&self) -> bool {
        self.action == Action::Deallocate && self.pid == NOOP_PID
    }
}

/// Seeded request generator
#[derive(Debug, Clone)]
pub struct RequestGenerator {
    /// Ids that have never allocated
    available: BTreeSet<ProcessId>,
    /// Ids currently holding memory
    allocated: BTreeSet<ProcessId>,
    sizes: RangeInclusive<usize>,
    rng: StdRng,
}

impl RequestGenerator {
    /// Create a generator over pids `1..=max_pid` and sizes
    /// `min_request_size..=max_request_size`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `max_pid` is zero, `min_request_size`
    /// is zero, or `max_request_size < min_request_size`.
    pub fn new(
        max_pid: ProcessId,
        min_request_size: usize,
        max_request_size: usize,
        seed: u64,
    ) -> Result<Self> {
        if max_pid == 0 {
            return Err(SimError::InvalidConfiguration(
                "max_pid must be positive".to_string(),
            ));
        }
        if min_request_size < 1 {
            return Err(SimError::InvalidConfiguration(
                "min_request_size must be at least 1".to_string(),
            ));
        }
        if max_request_size < min_request_size {
            return Err(SimError::InvalidConfiguration(format!(
                "max_request_size ({}) is smaller than min_request_size ({})",
                max_request_size, min_request_size
            )));
        }

        Ok(RequestGenerator {
            available: (1..=max_pid).collect(),
            allocated: BTreeSet::new(),
            sizes: min_request_size..=max_request_size,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Ids that can still allocate
    pub fn available(&self) -> &BTreeSet<ProcessId> {
        &self.available
    }

    /// Ids currently holding memory
    pub fn allocated(&self) -> &BTreeSet<ProcessId> {
        &self.allocated
    }

    /// Produce the next request
    ///
    /// Never fails: an exhausted generator yields the pid-0 no-op.
    pub fn next_request(&mut self) -> Request {
        let action = self.pick_action();
        let size = self.rng.gen_range(self.sizes.clone());

        let action = match action {
            Ok(action) => action,
            Err(e) => {
                debug!("{}, emitting no-op", e);
                return Request {
                    action: Action::Deallocate,
                    pid: NOOP_PID,
                    size,
                };
            }
        };

        let pid = match action {
            Action::Allocate => {
                let pid = Self::take_random(&mut self.rng, &mut self.available);
                self.allocated.insert(pid);
                pid
            }
            Action::Deallocate => Self::take_random(&mut self.rng, &mut self.allocated),
        };

        Request { action, pid, size }
    }

    /// Coin flip, overridden when one side has no eligible pid
    fn pick_action(&mut self) -> Result<Action> {
        let coin = if self.rng.gen_bool(0.5) {
            Action::Allocate
        } else {
            Action::Deallocate
        };

        match (self.available.is_empty(), self.allocated.is_empty()) {
            (true, true) => Err(SimError::GeneratorExhausted),
            (false, true) => Ok(Action::Allocate),
            (true, false) => Ok(Action::Deallocate),
            (false, false) => Ok(coin),
        }
    }

    /// Remove and return a uniformly chosen element of a non-empty set
    fn take_random(rng: &mut StdRng, set: &mut BTreeSet<ProcessId>) -> ProcessId {
        let nth = rng.gen_range(0..set.len());
        let pid = set.iter().nth(nth).copied().unwrap_or(NOOP_PID);
        set.remove(&pid);
        pid
    }
}

impl Iterator for RequestGenerator {
    type Item = Request;

    fn next(&mut self) -> Option<Request> {
        Some(self.next_request())
    }
}
