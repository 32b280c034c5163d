//! Simulation driver
//!
//! Feeds one request stream to several allocators side by side so their
//! fragmentation and search cost can be compared step for step. Allocation
//! failures and unknown deallocations are counted, never fatal.

use crate::core::allocator::{BlockList, MemoryAllocator, Policy};
use crate::core::config::SimulationConfig;
use crate::core::stats::{Report, Stats};
use crate::core::workload::{Action, Request, RequestGenerator};
use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, trace};

/// One policy's view of a processed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStep {
    /// Fragment count after the request
    pub fragments: usize,
    /// Blocks examined by this request (0 for deallocations and failures)
    pub traversed: usize,
    /// Blocks examined by all successful allocations so far
    pub cumulative_traversed: u64,
}

/// Per-request record, one `PolicyStep` per lane
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Zero-based request index
    pub index: usize,
    pub request: Request,
    pub policies: Vec<PolicyStep>,
}

/// An allocator under comparison
#[derive(Debug, Clone)]
struct Lane<A> {
    policy: Policy,
    allocator: A,
}

/// Simulation over a set of allocators sharing one workload
#[derive(Debug)]
pub struct Simulation<A = BlockList> {
    lanes: Vec<Lane<A>>,
    generator: RequestGenerator,
    stats: Stats,
    processed: usize,
}

impl Simulation<BlockList> {
    /// Build one block list per configured policy plus the generator
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        let allocators = config
            .policies
            .iter()
            .map(|&policy| Ok((policy, BlockList::new(config.total_units, policy)?)))
            .collect::<Result<Vec<_>>>()?;

        let generator = RequestGenerator::new(
            config.effective_max_pid(),
            config.min_request_size,
            config.max_request_size,
            config.seed,
        )?;

        Self::with_allocators(allocators, generator)
    }
}

impl<A: MemoryAllocator + fmt::Display> Simulation<A> {
    /// Compare arbitrary allocators, labelled by policy, over `generator`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if no allocator is given or a policy
    /// labels more than one allocator.
    pub fn with_allocators(
        allocators: Vec<(Policy, A)>,
        generator: RequestGenerator,
    ) -> Result<Self> {
        if allocators.is_empty() {
            return Err(SimError::InvalidConfiguration(
                "at least one allocator is required".to_string(),
            ));
        }

        let policies: Vec<Policy> = allocators.iter().map(|(policy, _)| *policy).collect();
        if let Some(policy) = Policy::first_duplicate(&policies) {
            return Err(SimError::InvalidConfiguration(format!(
                "policy {} is listed more than once",
                policy
            )));
        }

        let stats = Stats::new(policies);
        let lanes = allocators
            .into_iter()
            .map(|(policy, allocator)| Lane { policy, allocator })
            .collect();

        Ok(Simulation {
            lanes,
            generator,
            stats,
            processed: 0,
        })
    }

    pub fn policies(&self) -> Vec<Policy> {
        self.lanes.iter().map(|lane| lane.policy).collect()
    }

    /// The allocator serving `policy`, if it is part of the run
    pub fn allocator(&self, policy: Policy) -> Option<&A> {
        self.lanes
            .iter()
            .find(|lane| lane.policy == policy)
            .map(|lane| &lane.allocator)
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn report(&self) -> Report {
        self.stats.report()
    }

    /// Generate and process the next request
    pub fn step(&mut self) -> StepRecord {
        let request = self.generator.next_request();
        self.process_request(request)
    }

    /// Process `requests` generated requests
    pub fn run(&mut self, requests: usize) -> Vec<StepRecord> {
        info!(
            "Running {} requests against {} allocator(s)",
            requests,
            self.lanes.len()
        );

        let records: Vec<StepRecord> = (0..requests).map(|_| self.step()).collect();

        info!(
            "Processed {} requests ({} allocations, {} deallocations)",
            self.stats.requests, self.stats.allocations, self.stats.deallocations
        );
        records
    }

    /// Route one request to every allocator and record the outcome
    pub fn process_request(&mut self, request: Request) -> StepRecord {
        self.stats.requests += 1;
        match request.action {
            Action::Allocate => self.stats.allocations += 1,
            Action::Deallocate => self.stats.deallocations += 1,
        }

        let mut policies = Vec::with_capacity(self.lanes.len());

        for (lane, counters) in self.lanes.iter_mut().zip(self.stats.policies.iter_mut()) {
            let mut traversed = 0;

            match request.action {
                Action::Allocate => match lane.allocator.allocate(request.pid, request.size) {
                    Ok(cost) => {
                        traversed = cost;
                        counters.traversed += cost as u64;
                        counters.successful_allocations += 1;
                    }
                    Err(e) => {
                        counters.allocation_failures += 1;
                        debug!("{}: {}", lane.policy, e);
                        trace!("{}", lane.allocator);
                    }
                },
                Action::Deallocate => {
                    if let Err(e) = lane.allocator.deallocate(request.pid) {
                        counters.deallocation_misses += 1;
                        debug!("{}: {}", lane.policy, e);
                    }
                }
            }

            let fragments = lane.allocator.fragment_count();
            counters.fragments += fragments as u64;

            policies.push(PolicyStep {
                fragments,
                traversed,
                cumulative_traversed: counters.traversed,
            });
        }

        let record = StepRecord {
            index: self.processed,
            request,
            policies,
        };
        self.processed += 1;
        record
    }
}
