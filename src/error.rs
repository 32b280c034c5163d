//! Error types for the block allocator simulation

use thiserror::Error;

use crate::core::allocator::ProcessId;

/// Simulation result type
pub type Result<T> = std::result::Result<T, SimError>;

/// Simulation errors
///
/// Only `InvalidConfiguration` is fatal. Allocation and deallocation failures
/// are ordinary outcomes that the driver records as statistics.
#[derive(Error, Debug)]
pub enum SimError {
    /// Constructor or config arguments out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No free block is large enough for the request
    #[error("Allocation failed: no free block of {requested} units for process {pid} ({traversed} blocks examined)")]
    AllocationFailed {
        pid: ProcessId,
        requested: usize,
        traversed: usize,
    },

    /// The process owns no block
    #[error("Deallocation failed: process {0} owns no block")]
    DeallocationNotFound(ProcessId),

    /// Neither an allocation nor a deallocation is possible
    #[error("Workload generator exhausted: no process id available for any action")]
    GeneratorExhausted,

    /// Block list no longer partitions the pool
    #[error("Block list corrupted: {0}")]
    Corrupted(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<validator::ValidationErrors> for SimError {
    fn from(errors: validator::ValidationErrors) -> Self {
        SimError::InvalidConfiguration(errors.to_string())
    }
}
