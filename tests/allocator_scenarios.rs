//! End-to-end allocator scenarios through the public API
//!
//! Covers the reference first-fit and best-fit walkthroughs, generator pid
//! bookkeeping, and long simulated runs.

use blockfit::{
    Action, Block, BlockList, Policy, RequestGenerator, SimError, Simulation, SimulationConfig,
};
use std::collections::HashSet;

#[test]
fn test_first_fit_walkthrough() {
    let mut pool = BlockList::new(10, Policy::FirstFit).unwrap();

    assert_eq!(pool.allocate(1, 3).unwrap(), 1);
    assert_eq!(pool.allocate(2, 4).unwrap(), 2);
    assert_eq!(pool.largest_free_block(), 3);

    match pool.allocate(3, 4) {
        Err(SimError::AllocationFailed { traversed, .. }) => assert_eq!(traversed, 3),
        other => panic!("expected allocation failure, got {:?}", other),
    }

    pool.deallocate(1).unwrap();
    assert_eq!(
        pool.blocks(),
        &[
            Block::free(1, 3),
            Block::allocated(4, 4, 2),
            Block::free(8, 3),
        ]
    );
    assert_eq!(pool.free_block_count(), 2);
}

#[test]
fn test_best_fit_walkthrough() {
    let mut pool = BlockList::new(5, Policy::BestFit).unwrap();

    pool.allocate(10, 2).unwrap();
    assert_eq!(pool.largest_free_block(), 3);

    pool.allocate(11, 3).unwrap();
    assert_eq!(pool.blocks().len(), 2);

    pool.deallocate(10).unwrap();
    pool.deallocate(11).unwrap();
    assert_eq!(pool.blocks(), &[Block::free(1, 5)]);
}

#[test]
fn test_fresh_pool_has_no_fragments() {
    for policy in [Policy::FirstFit, Policy::BestFit] {
        let mut pool = BlockList::new(128, policy).unwrap();
        assert_eq!(pool.fragment_count(), 0);
    }
}

#[test]
fn test_generator_retires_pids() {
    let mut gen = RequestGenerator::new(3, 3, 10, 1).unwrap();
    let mut allocated = Vec::new();

    while allocated.len() < 3 {
        let request = gen.next_request();
        if request.action == Action::Allocate {
            allocated.push(request.pid);
        }
    }

    let distinct: HashSet<_> = allocated.iter().copied().collect();
    assert_eq!(distinct, HashSet::from([1, 2, 3]));

    for request in gen.take(20) {
        assert_eq!(request.action, Action::Deallocate);
    }
}

#[test]
fn test_reference_sized_run() {
    let config = SimulationConfig {
        requests: 20_000,
        ..SimulationConfig::default()
    };

    let mut sim = Simulation::new(&config).unwrap();
    let records = sim.run(config.requests);
    assert_eq!(records.len(), 20_000);

    for policy in [Policy::FirstFit, Policy::BestFit] {
        sim.allocator(policy).unwrap().check_invariants().unwrap();
    }

    let report = sim.report();
    for summary in &report.policies {
        assert!(summary.failure_rate_percent >= 0.0 && summary.failure_rate_percent <= 100.0);
        assert!(summary.avg_traversed_per_allocation >= 1.0);
        // A pid whose allocation failed in this pool is later a deallocation miss
        assert!(summary.deallocation_misses <= summary.allocation_failures);
    }
}
