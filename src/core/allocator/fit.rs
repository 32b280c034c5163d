//! First-fit and best-fit block searches
//!
//! Both searches are read-only. They report which block to use and how many
//! blocks they examined; the block list performs the split.

use super::{Block, Policy};

/// Outcome of one search over the block list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitSearch {
    /// Index of the chosen block, `None` when nothing fits
    pub index: Option<usize>,
    /// Number of blocks examined
    pub traversed: usize,
}

/// Run the search for `policy`
pub fn search(policy: Policy, blocks: &[Block], units: usize) -> FitSearch {
    match policy {
        Policy::FirstFit => first_fit(blocks, units),
        Policy::BestFit => best_fit(blocks, units),
    }
}

fn fits(block: &Block, units: usize) -> bool {
    units > 0 && block.is_free() && block.size >= units
}

/// First free block, in address order, with at least `units` units
///
/// Stops at the match; on a miss every block has been examined.
pub fn first_fit(blocks: &[Block], units: usize) -> FitSearch {
    match blocks.iter().position(|block| fits(block, units)) {
        Some(index) => FitSearch {
            index: Some(index),
            traversed: index + 1,
        },
        None => FitSearch {
            index: None,
            traversed: blocks.len(),
        },
    }
}

/// Smallest free block with at least `units` units
///
/// Always examines the whole list. Ties go to the lowest start address.
pub fn best_fit(blocks: &[Block], units: usize) -> FitSearch {
    let mut best: Option<(usize, usize)> = None;

    for (index, block) in blocks.iter().enumerate() {
        if !fits(block, units) {
            continue;
        }
        match best {
            Some((_, size)) if size <= block.size => {}
            _ => best = Some((index, block.size)),
        }
    }

    FitSearch {
        index: best.map(|(index, _)| index),
        traversed: blocks.len(),
    }
}
