//! Simulation run configuration
//!
//! Loaded from TOML, then overridden field by field from the command line.
//! Missing fields fall back to the reference run: a 128-unit pool (256KB in
//! 2KB units), one million requests, one pid per request, sizes 3 to 10.

use crate::core::allocator::{Policy, ProcessId};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use validator::{Validate, ValidationError};

/// Parameters for one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_ranges"))]
pub struct SimulationConfig {
    /// Pool size in units
    #[validate(range(min = 1))]
    pub total_units: usize,

    /// Number of requests to process
    pub requests: usize,

    /// Highest process id; defaults to one id per request
    pub max_pid: Option<ProcessId>,

    #[validate(range(min = 1))]
    pub min_request_size: usize,

    #[validate(range(min = 1))]
    pub max_request_size: usize,

    /// Workload seed
    pub seed: u64,

    /// Policies to compare, in report order
    #[validate(length(min = 1), custom(function = "validate_distinct_policies"))]
    pub policies: Vec<Policy>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            total_units: 128,
            requests: 1_000_000,
            max_pid: None,
            min_request_size: 3,
            max_request_size: 10,
            seed: 1,
            policies: vec![Policy::FirstFit, Policy::BestFit],
        }
    }
}

/// Request size bounds must be ordered and an explicit `max_pid` positive
fn validate_ranges(config: &SimulationConfig) -> std::result::Result<(), ValidationError> {
    if config.max_request_size < config.min_request_size {
        let mut err = ValidationError::new("request_size_range");
        err.message = Some("max_request_size must not be smaller than min_request_size".into());
        return Err(err);
    }
    if config.max_pid == Some(0) {
        let mut err = ValidationError::new("max_pid");
        err.message = Some("max_pid must be positive".into());
        return Err(err);
    }
    Ok(())
}

/// Each policy may run in at most one lane
#[allow(clippy::ptr_arg)]
fn validate_distinct_policies(policies: &Vec<Policy>) -> std::result::Result<(), ValidationError> {
    if let Some(policy) = Policy::first_duplicate(policies) {
        let mut err = ValidationError::new("duplicate_policy");
        err.message = Some(format!("policy {} is listed more than once", policy).into());
        return Err(err);
    }
    Ok(())
}

impl SimulationConfig {
    /// Parse a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        debug!("Loading simulation config from {:?}", path.as_ref());
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    /// Highest pid handed to the generator
    ///
    /// Without an explicit value every request gets its own id, saturating at
    /// `ProcessId::MAX`.
    pub fn effective_max_pid(&self) -> ProcessId {
        self.max_pid
            .unwrap_or_else(|| ProcessId::try_from(self.requests.max(1)).unwrap_or(ProcessId::MAX))
    }
}
