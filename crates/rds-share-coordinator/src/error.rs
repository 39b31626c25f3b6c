//! Configuration and run errors
//!
//! Typed errors for the failures the runner reports itself. AWS SDK errors
//! are classified separately in [`crate::aws::error`].

use thiserror::Error;

use crate::runner::PruneFailure;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value is empty
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// Account id is not a 12-digit number
    #[error("account id must be 12 digits, got {0:?}")]
    InvalidAccountId(String),

    /// Retention is NaN or infinite
    #[error("retention_time must be a finite number of seconds, got {0}")]
    InvalidRetention(f64),

    /// Poll interval is zero
    #[error("poll_interval must be greater than 0")]
    InvalidPollInterval,

    /// Maximum wait shorter than one poll interval
    #[error("max_wait ({max_wait}s) must be at least poll_interval ({poll_interval}s)")]
    InvalidMaxWait { max_wait: u64, poll_interval: u64 },

    /// Source and destination are the same account
    #[error("source and destination account must differ, both are {0}")]
    SameAccount(String),
}

/// Failures detected by the runner outside of individual AWS calls
#[derive(Debug, Error)]
pub enum RunError {
    /// Credentials resolve to a different account than configured
    #[error("credentials belong to account {actual}, expected {expected}")]
    AccountMismatch { expected: String, actual: String },

    /// One or more expired snapshots could not be deleted
    #[error("failed to prune {} snapshot(s): {}", .failures.len(), summarize(.failures))]
    PruneFailed { failures: Vec<PruneFailure> },
}

fn summarize(failures: &[PruneFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.snapshot_id, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}
