//! Run statistics and the end-of-run report

use crate::core::allocator::Policy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters kept for one policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStats {
    pub policy: Policy,
    /// Blocks examined by successful allocations
    pub traversed: u64,
    /// Sum of per-request fragment snapshots
    pub fragments: u64,
    pub successful_allocations: u64,
    pub allocation_failures: u64,
    /// Deallocations naming a pid that owned nothing
    pub deallocation_misses: u64,
}

impl PolicyStats {
    pub fn new(policy: Policy) -> Self {
        PolicyStats {
            policy,
            traversed: 0,
            fragments: 0,
            successful_allocations: 0,
            allocation_failures: 0,
            deallocation_misses: 0,
        }
    }
}

/// Aggregate statistics for a run, updated once per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub requests: u64,
    pub allocations: u64,
    pub deallocations: u64,
    /// One entry per policy, in the driver's lane order
    pub policies: Vec<PolicyStats>,
}

impl Stats {
    pub fn new(policies: impl IntoIterator<Item = Policy>) -> Self {
        Stats {
            requests: 0,
            allocations: 0,
            deallocations: 0,
            policies: policies.into_iter().map(PolicyStats::new).collect(),
        }
    }

    /// Derive averages and rates
    pub fn report(&self) -> Report {
        let requests = self.requests as f64;
        let attempts = self.allocations as f64;

        let policies = self
            .policies
            .iter()
            .map(|p| PolicySummary {
                policy: p.policy,
                total_traversed: p.traversed,
                total_fragments: p.fragments,
                allocation_failures: p.allocation_failures,
                deallocation_misses: p.deallocation_misses,
                avg_fragments_per_request: ratio(p.fragments as f64, requests),
                avg_traversed_per_allocation: ratio(
                    p.traversed as f64,
                    p.successful_allocations as f64,
                ),
                failure_rate_percent: ratio(p.allocation_failures as f64 * 100.0, attempts),
            })
            .collect();

        Report {
            requests: self.requests,
            allocations: self.allocations,
            deallocations: self.deallocations,
            policies,
        }
    }
}

/// Division that reports 0 instead of NaN for an empty denominator
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Final per-policy figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    pub policy: Policy,
    pub total_traversed: u64,
    pub total_fragments: u64,
    pub allocation_failures: u64,
    pub deallocation_misses: u64,
    pub avg_fragments_per_request: f64,
    /// Mean blocks examined per successful allocation
    pub avg_traversed_per_allocation: f64,
    /// Failures as a percentage of allocation attempts
    pub failure_rate_percent: f64,
}

/// End-of-run report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub requests: u64,
    pub allocations: u64,
    pub deallocations: u64,
    pub policies: Vec<PolicySummary>,
}

impl Report {
    pub fn policy(&self, policy: Policy) -> Option<&PolicySummary> {
        self.policies.iter().find(|p| p.policy == policy)
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation Statistics:")?;
        writeln!(f, "Total Requests: {}", self.requests)?;
        writeln!(f, "Total Allocations: {}", self.allocations)?;
        writeln!(f, "Total Deallocations: {}", self.deallocations)?;

        for p in &self.policies {
            writeln!(f, "======================================")?;
            writeln!(f, "{} Nodes Traversed: {}", p.policy, p.total_traversed)?;
            writeln!(f, "{} Allocation Failures: {}", p.policy, p.allocation_failures)?;
            writeln!(f, "{} Deallocation Misses: {}", p.policy, p.deallocation_misses)?;
            writeln!(f, "{} Fragment Count: {}", p.policy, p.total_fragments)?;
            writeln!(
                f,
                "Average {} Fragment Count: {:.4}",
                p.policy, p.avg_fragments_per_request
            )?;
            writeln!(
                f,
                "Average {} Nodes Traversed: {:.4}",
                p.policy, p.avg_traversed_per_allocation
            )?;
            writeln!(
                f,
                "Percentage of {} Allocation Failures: {:.4}%",
                p.policy, p.failure_rate_percent
            )?;
        }
        write!(f, "======================================")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_run_has_no_nan() {
        let stats = Stats::new([Policy::FirstFit, Policy::BestFit]);
        let report = stats.report();

        for p in &report.policies {
            assert_eq!(p.avg_fragments_per_request, 0.0);
            assert_eq!(p.avg_traversed_per_allocation, 0.0);
            assert_eq!(p.failure_rate_percent, 0.0);
        }
    }

    #[test]
    fn test_report_averages() {
        let mut stats = Stats::new([Policy::FirstFit]);
        stats.requests = 10;
        stats.allocations = 4;
        stats.deallocations = 6;
        stats.policies[0].traversed = 9;
        stats.policies[0].successful_allocations = 3;
        stats.policies[0].allocation_failures = 1;
        stats.policies[0].fragments = 5;

        let report = stats.report();
        let first = report.policy(Policy::FirstFit).unwrap();
        assert_eq!(first.avg_fragments_per_request, 0.5);
        assert_eq!(first.avg_traversed_per_allocation, 3.0);
        assert_eq!(first.failure_rate_percent, 25.0);
        assert!(report.policy(Policy::BestFit).is_none());
    }

    #[test]
    fn test_report_display_and_json() {
        let mut stats = Stats::new([Policy::FirstFit, Policy::BestFit]);
        stats.requests = 2;
        stats.allocations = 2;
        let report = stats.report();

        let text = report.to_string();
        assert!(text.contains("Total Requests: 2"));
        assert!(text.contains("Percentage of Best-Fit Allocation Failures"));

        let json = report.to_json().unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.policies[1].policy, Policy::BestFit);
    }
}
