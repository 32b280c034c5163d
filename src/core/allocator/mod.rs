//! Block allocation policies for a fixed-size memory pool
//!
//! The pool is a list of contiguous blocks. Two search strategies pick the
//! block that serves a request:
//! - First-fit: lowest-address free block that is large enough
//! - Best-fit: smallest free block that is large enough

pub mod block;
pub mod block_list;
pub mod fit;

pub use block::Block;
pub use block_list::BlockList;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a simulated process
///
/// Zero is reserved as the no-op sentinel emitted by an exhausted workload.
pub type ProcessId = u32;

/// Allocation search strategy, fixed when the allocator is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// First free block (by start address) that fits
    FirstFit,
    /// Smallest free block that fits, ties to the lowest start
    BestFit,
}

impl Policy {
    /// Column prefix used in per-step result tables
    pub fn column_prefix(&self) -> &'static str {
        match self {
            Policy::FirstFit => "FirstFit",
            Policy::BestFit => "BestFit",
        }
    }

    /// First policy that appears more than once in `policies`
    ///
    /// ```
    /// use blockfit::Policy;
    ///
    /// assert_eq!(Policy::first_duplicate(&[Policy::FirstFit, Policy::BestFit]), None);
    /// assert_eq!(
    ///     Policy::first_duplicate(&[Policy::BestFit, Policy::FirstFit, Policy::BestFit]),
    ///     Some(Policy::BestFit)
    /// );
    /// ```
    pub fn first_duplicate(policies: &[Policy]) -> Option<Policy> {
        policies
            .iter()
            .enumerate()
            .find(|&(i, policy)| policies[..i].contains(policy))
            .map(|(_, policy)| *policy)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::FirstFit => write!(f, "First-Fit"),
            Policy::BestFit => write!(f, "Best-Fit"),
        }
    }
}

/// Memory allocator trait
///
/// Defines the interface the simulation driver uses to exercise a pool.
pub trait MemoryAllocator {
    /// Allocate `units` contiguous units to `pid`
    ///
    /// Returns the number of blocks examined by the search.
    fn allocate(&mut self, pid: ProcessId, units: usize) -> Result<usize>;

    /// Release every block owned by `pid`
    fn deallocate(&mut self, pid: ProcessId) -> Result<()>;

    /// Count small free fragments (free blocks of 1 or 2 units)
    fn fragment_count(&mut self) -> usize;

    /// Get total number of units managed
    fn total_units(&self) -> usize;

    /// Get number of free units available
    fn free_units(&self) -> usize;
}
