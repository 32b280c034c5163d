//! Allocator core and the simulation collaborators around it

pub mod allocator;
pub mod config;
pub mod report;
pub mod simulation;
pub mod stats;
pub mod workload;
