//! # blockfit - First-Fit vs Best-Fit Block Allocation
//!
//! `blockfit` models a fixed-size memory pool carved into contiguous blocks and
//! compares two classic placement policies under the same synthetic workload:
//!
//! - **First-fit**: take the lowest-address free block that is large enough
//! - **Best-fit**: take the smallest free block that is large enough
//!
//! For every request the simulation records how many blocks each search
//! examined and how many small free fragments (1 or 2 units) remain.
//!
//! ## Quick Start
//!
//! ```rust
//! use blockfit::{BlockList, Policy, Result};
//!
//! # fn main() -> Result<()> {
//! let mut pool = BlockList::new(10, Policy::FirstFit)?;
//!
//! assert_eq!(pool.allocate(1, 3)?, 1); // first block examined
//! assert_eq!(pool.allocate(2, 4)?, 2); // second block examined
//! assert!(pool.allocate(3, 4).is_err()); // only 3 units left
//!
//! pool.deallocate(1)?;
//! assert_eq!(pool.fragment_count(), 0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Running a Comparison
//!
//! ```rust
//! use blockfit::{Simulation, SimulationConfig, Result};
//!
//! # fn main() -> Result<()> {
//! let config = SimulationConfig {
//!     requests: 1_000,
//!     ..SimulationConfig::default()
//! };
//!
//! let mut sim = Simulation::new(&config)?;
//! let records = sim.run(config.requests);
//! assert_eq!(records.len(), 1_000);
//!
//! println!("{}", sim.report());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;

pub use crate::core::{
    allocator::{Block, BlockList, MemoryAllocator, Policy, ProcessId},
    config::SimulationConfig,
    report::{save_steps_csv, write_steps_csv},
    simulation::{PolicyStep, Simulation, StepRecord},
    stats::{PolicySummary, Report, Stats},
    workload::{Action, Request, RequestGenerator, NOOP_PID},
};
pub use crate::error::{Result, SimError};
