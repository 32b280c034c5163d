//! Ordered block list allocator
//!
//! The pool `[1, total_units]` is described by a vector of blocks sorted by
//! start address. Blocks never overlap and leave no gaps. Allocation splits a
//! free block, deallocation frees owned blocks, and coalescing merges runs of
//! adjacent free blocks back together.

use super::fit::{self, FitSearch};
use super::{Block, MemoryAllocator, Policy, ProcessId};
use crate::error::{Result, SimError};
use std::fmt;
use tracing::trace;

/// Block list allocator with a fixed search policy
#[derive(Debug, Clone)]
pub struct BlockList {
    /// Blocks ordered by start address
    blocks: Vec<Block>,

    /// Pool size in units, fixed at construction
    total_units: usize,

    policy: Policy,
}

impl BlockList {
    /// Create an allocator whose pool is one free block of `total_units`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `total_units` is zero, or so large
    /// that the 1-based end address `total_units + 1` does not fit a `usize`.
    pub fn new(total_units: usize, policy: Policy) -> Result<Self> {
        if total_units == 0 {
            return Err(SimError::InvalidConfiguration(
                "memory size must be positive".to_string(),
            ));
        }
        if total_units.checked_add(1).is_none() {
            return Err(SimError::InvalidConfiguration(format!(
                "memory size {} exceeds the addressable range",
                total_units
            )));
        }

        Ok(BlockList {
            blocks: vec![Block::free(1, total_units)],
            total_units,
            policy,
        })
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Current blocks in address order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Allocate `units` contiguous units to `pid`
    ///
    /// Returns the number of blocks the search examined (always at least 1 on
    /// success). On failure the block list is left untouched and the error
    /// carries the traversal count. Zero-unit requests never match.
    pub fn allocate(&mut self, pid: ProcessId, units: usize) -> Result<usize> {
        let FitSearch { index, traversed } = fit::search(self.policy, &self.blocks, units);

        let Some(index) = index else {
            return Err(SimError::AllocationFailed {
                pid,
                requested: units,
                traversed,
            });
        };

        if let Some(remainder) = self.blocks[index].split_for(pid, units) {
            self.blocks.insert(index + 1, remainder);
            self.coalesce();
        }

        trace!(
            "{} placed pid {} ({} units) at block {} after {} blocks",
            self.policy,
            pid,
            units,
            index + 1,
            traversed
        );

        Ok(traversed)
    }

    /// Free every block owned by `pid`
    ///
    /// # Errors
    ///
    /// Returns `DeallocationNotFound` if `pid` owns nothing; no state changes.
    pub fn deallocate(&mut self, pid: ProcessId) -> Result<()> {
        let mut found = false;
        for block in self.blocks.iter_mut().filter(|b| b.owner == Some(pid)) {
            block.owner = None;
            found = true;
        }

        if !found {
            return Err(SimError::DeallocationNotFound(pid));
        }

        self.coalesce();
        Ok(())
    }

    /// Merge every run of adjacent free blocks into one block
    ///
    /// A single forward pass: a free block keeps absorbing its successor until
    /// the successor is allocated, then the scan moves on.
    pub fn coalesce(&mut self) {
        let mut i = 0;
        while i + 1 < self.blocks.len() {
            if self.blocks[i].is_free() && self.blocks[i + 1].is_free() {
                let next = self.blocks.remove(i + 1);
                self.blocks[i].absorb(&next);
            } else {
                i += 1;
            }
        }
    }

    /// Number of free blocks of exactly 1 or 2 units, after coalescing
    pub fn fragment_count(&mut self) -> usize {
        self.coalesce();
        self.blocks.iter().filter(|b| b.is_fragment()).count()
    }

    pub fn total_units(&self) -> usize {
        self.total_units
    }

    /// Sum of free block sizes
    pub fn free_units(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.is_free())
            .map(|b| b.size)
            .sum()
    }

    /// Size of the largest free block, 0 when the pool is full
    pub fn largest_free_block(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.is_free())
            .map(|b| b.size)
            .max()
            .unwrap_or(0)
    }

    pub fn free_block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_free()).count()
    }

    /// Find the block covering a unit address
    pub fn block_at(&self, unit: usize) -> Option<&Block> {
        self.blocks.iter().find(|b| b.contains(unit))
    }

    /// Verify the block list still partitions the pool
    ///
    /// Checks that blocks start at unit 1, are non-empty, abut each other,
    /// cover exactly `total_units`, and that no two free blocks are adjacent.
    pub fn check_invariants(&self) -> Result<()> {
        let mut expected_start = 1;

        for (i, block) in self.blocks.iter().enumerate() {
            if block.size == 0 {
                return Err(SimError::Corrupted(format!(
                    "block {} at unit {} has zero size",
                    i, block.start
                )));
            }
            if block.start != expected_start {
                return Err(SimError::Corrupted(format!(
                    "block {} starts at unit {}, expected {}",
                    i, block.start, expected_start
                )));
            }
            if let Some(next) = self.blocks.get(i + 1) {
                if block.is_free() && next.is_free() {
                    return Err(SimError::Corrupted(format!(
                        "free blocks at units {} and {} were not coalesced",
                        block.start, next.start
                    )));
                }
            }
            expected_start = block.end();
        }

        if expected_start != self.total_units + 1 {
            return Err(SimError::Corrupted(format!(
                "blocks cover {} units, pool has {}",
                expected_start - 1,
                self.total_units
            )));
        }

        Ok(())
    }
}

impl MemoryAllocator for BlockList {
    fn allocate(&mut self, pid: ProcessId, units: usize) -> Result<usize> {
        BlockList::allocate(self, pid, units)
    }

    fn deallocate(&mut self, pid: ProcessId) -> Result<()> {
        BlockList::deallocate(self, pid)
    }

    fn fragment_count(&mut self) -> usize {
        BlockList::fragment_count(self)
    }

    fn total_units(&self) -> usize {
        self.total_units
    }

    fn free_units(&self) -> usize {
        BlockList::free_units(self)
    }
}

/// Block table, one row per block
impl fmt::Display for BlockList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Memory Blocks ({}):", self.policy)?;
        writeln!(f, "Start\tSize\tPID\tFree")?;
        for block in &self.blocks {
            let pid = block
                .owner
                .map(|pid| pid.to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "{}\t{}\t{}\t{}",
                block.start,
                block.size,
                pid,
                if block.is_free() { "yes" } else { "no" }
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pool_is_one_free_block() {
        let pool = BlockList::new(128, Policy::FirstFit).unwrap();
        assert_eq!(pool.blocks(), &[Block::free(1, 128)]);
        assert_eq!(pool.free_units(), 128);
        assert!(pool.check_invariants().is_ok());
    }

    #[test]
    fn test_zero_size_pool_rejected() {
        let result = BlockList::new(0, Policy::BestFit);
        assert!(matches!(result, Err(SimError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_unaddressable_pool_rejected() {
        let result = BlockList::new(usize::MAX, Policy::FirstFit);
        assert!(matches!(result, Err(SimError::InvalidConfiguration(_))));

        // Largest accepted pool still has every end address in range
        let mut pool = BlockList::new(usize::MAX - 1, Policy::BestFit).unwrap();
        assert!(pool.check_invariants().is_ok());
        assert!(pool.block_at(usize::MAX - 1).is_some());
        assert_eq!(pool.allocate(1, 4).unwrap(), 1);
        assert!(pool.check_invariants().is_ok());
    }

    #[test]
    fn test_first_fit_scenario() {
        let mut pool = BlockList::new(10, Policy::FirstFit).unwrap();

        assert_eq!(pool.allocate(1, 3).unwrap(), 1);
        // A occupies the first block, so B lands in the second
        assert_eq!(pool.allocate(2, 4).unwrap(), 2);
        assert_eq!(pool.blocks()[2], Block::free(8, 3));

        let result = pool.allocate(3, 4);
        assert!(matches!(
            result,
            Err(SimError::AllocationFailed {
                pid: 3,
                requested: 4,
                traversed: 3
            })
        ));

        pool.deallocate(1).unwrap();
        assert_eq!(
            pool.blocks(),
            &[
                Block::free(1, 3),
                Block::allocated(4, 4, 2),
                Block::free(8, 3)
            ]
        );
        assert!(pool.check_invariants().is_ok());
    }

    #[test]
    fn test_best_fit_scenario() {
        let mut pool = BlockList::new(5, Policy::BestFit).unwrap();

        assert_eq!(pool.allocate(1, 2).unwrap(), 1);
        assert_eq!(pool.blocks()[1], Block::free(3, 3));

        // Exact fit, no split
        assert_eq!(pool.allocate(2, 3).unwrap(), 2);
        assert_eq!(pool.blocks().len(), 2);
        assert_eq!(pool.free_units(), 0);

        pool.deallocate(1).unwrap();
        pool.deallocate(2).unwrap();
        assert_eq!(pool.blocks(), &[Block::free(1, 5)]);
    }

    #[test]
    fn test_best_fit_prefers_smallest_hole() {
        let mut pool = BlockList::new(20, Policy::BestFit).unwrap();
        pool.allocate(1, 5).unwrap(); // 1-5
        pool.allocate(2, 1).unwrap(); // 6
        pool.allocate(3, 3).unwrap(); // 7-9
        pool.allocate(4, 1).unwrap(); // 10
        pool.deallocate(1).unwrap(); // hole of 5 at 1
        pool.deallocate(3).unwrap(); // hole of 3 at 7

        pool.allocate(5, 3).unwrap();
        assert_eq!(pool.block_at(7).unwrap().owner, Some(5));
    }

    #[test]
    fn test_failed_allocation_leaves_state() {
        let mut pool = BlockList::new(4, Policy::BestFit).unwrap();
        pool.allocate(1, 3).unwrap();
        let before = pool.blocks().to_vec();

        assert!(pool.allocate(2, 2).is_err());
        assert_eq!(pool.blocks(), before.as_slice());
    }

    #[test]
    fn test_zero_unit_request_is_a_miss() {
        let mut pool = BlockList::new(8, Policy::FirstFit).unwrap();
        assert!(matches!(
            pool.allocate(1, 0),
            Err(SimError::AllocationFailed { .. })
        ));
        assert_eq!(pool.blocks(), &[Block::free(1, 8)]);
    }

    #[test]
    fn test_deallocate_unknown_pid() {
        let mut pool = BlockList::new(8, Policy::FirstFit).unwrap();
        pool.allocate(1, 4).unwrap();
        let before = pool.blocks().to_vec();

        assert!(matches!(
            pool.deallocate(42),
            Err(SimError::DeallocationNotFound(42))
        ));
        assert_eq!(pool.blocks(), before.as_slice());
    }

    #[test]
    fn test_deallocate_frees_every_owned_block() {
        let mut pool = BlockList::new(10, Policy::FirstFit).unwrap();
        pool.allocate(7, 2).unwrap();
        pool.allocate(8, 2).unwrap();
        pool.allocate(7, 2).unwrap();

        pool.deallocate(7).unwrap();
        assert!(pool.blocks().iter().all(|b| b.owner != Some(7)));
        assert_eq!(pool.free_units(), 8);
        assert!(pool.check_invariants().is_ok());
    }

    #[test]
    fn test_coalesce_merges_long_runs() {
        let mut pool = BlockList::new(6, Policy::FirstFit).unwrap();
        for pid in 1..=6 {
            pool.allocate(pid, 1).unwrap();
        }
        for block in pool.blocks.iter_mut() {
            block.owner = None;
        }

        pool.coalesce();
        assert_eq!(pool.blocks(), &[Block::free(1, 6)]);
    }

    #[test]
    fn test_fragment_count() {
        let mut pool = BlockList::new(12, Policy::FirstFit).unwrap();
        assert_eq!(pool.fragment_count(), 0);

        pool.allocate(1, 1).unwrap(); // 1
        pool.allocate(2, 2).unwrap(); // 2-3
        pool.allocate(3, 2).unwrap(); // 4-5
        pool.allocate(4, 3).unwrap(); // 6-8
        pool.allocate(5, 1).unwrap(); // 9
        // 10-12 free (3 units, not a fragment)
        pool.deallocate(1).unwrap(); // free 1
        pool.deallocate(3).unwrap(); // free 2

        assert_eq!(pool.fragment_count(), 2);
    }

    #[test]
    fn test_display_lists_blocks() {
        let mut pool = BlockList::new(10, Policy::FirstFit).unwrap();
        pool.allocate(4, 3).unwrap();

        let table = pool.to_string();
        assert!(table.contains("Start\tSize\tPID\tFree"));
        assert!(table.contains("1\t3\t4\tno"));
        assert!(table.contains("4\t7\t-\tyes"));
    }

    #[test]
    fn test_trait_object_dispatch() {
        let mut pool: Box<dyn MemoryAllocator> =
            Box::new(BlockList::new(16, Policy::BestFit).unwrap());
        pool.allocate(1, 8).unwrap();
        assert_eq!(pool.free_units(), 8);
        assert_eq!(pool.total_units(), 16);
        pool.deallocate(1).unwrap();
        assert_eq!(pool.free_units(), 16);
    }
}
