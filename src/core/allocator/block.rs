//! A contiguous run of memory units with a single owner

use super::ProcessId;
use serde::{Deserialize, Serialize};

/// A block covering `[start, start + size)` in pool units
///
/// Unit addresses are 1-based. A block is free exactly when it has no owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// First unit covered by the block
    pub start: usize,
    /// Number of units covered
    pub size: usize,
    /// Owning process, `None` when free
    pub owner: Option<ProcessId>,
}

impl Block {
    /// Create a free block
    pub fn free(start: usize, size: usize) -> Self {
        Block {
            start,
            size,
            owner: None,
        }
    }

    /// Create a block owned by `pid`
    pub fn allocated(start: usize, size: usize, pid: ProcessId) -> Self {
        Block {
            start,
            size,
            owner: Some(pid),
        }
    }

    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }

    /// One past the last unit covered
    pub fn end(&self) -> usize {
        self.start + self.size
    }

    /// Check if this block covers a unit address
    pub fn contains(&self, unit: usize) -> bool {
        unit >= self.start && unit < self.end()
    }

    /// Check if `other` starts exactly where this block ends
    pub fn precedes(&self, other: &Block) -> bool {
        self.end() == other.start
    }

    /// Whether the block is a small free fragment (1 or 2 units)
    pub fn is_fragment(&self) -> bool {
        self.is_free() && (self.size == 1 || self.size == 2)
    }

    /// Give the leading `units` to `pid` and return the free remainder, if any
    ///
    /// The caller guarantees `0 < units <= self.size`.
    pub(crate) fn split_for(&mut self, pid: ProcessId, units: usize) -> Option<Block> {
        let remainder = self.size - units;
        self.size = units;
        self.owner = Some(pid);

        if remainder == 0 {
            None
        } else {
            Some(Block::free(self.start + units, remainder))
        }
    }

    /// Merge a directly following block into this one
    pub(crate) fn absorb(&mut self, next: &Block) {
        debug_assert!(self.precedes(next));
        self.size += next.size;
    }
}
