//! Default configuration values and RDS constants

/// Seconds between snapshot status checks
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Upper bound on a single snapshot wait in seconds (2 hours)
pub const DEFAULT_MAX_WAIT_SECS: u64 = 7200;

/// Default retention in seconds. Zero disables pruning.
pub const DEFAULT_RETENTION_SECS: f64 = 0.0;

/// Snapshot status reported by RDS once the snapshot can be shared or copied
pub const STATUS_AVAILABLE: &str = "available";

/// Prefix of the snapshot created in the destination account
pub const COPY_PREFIX: &str = "cp-";

/// `chrono` format of the date suffix in snapshot names
pub const SNAPSHOT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Snapshot attribute holding the accounts allowed to restore it
pub const RESTORE_ATTRIBUTE: &str = "restore";
