//! AWS test utilities
//!
//! Provides region detection, test DB instance lookup and unique snapshot
//! names for AWS integration tests.

use chrono::Utc;

/// Environment variable naming an existing RDS instance tests may snapshot
pub const TEST_DB_INSTANCE_VAR: &str = "RDS_SHARE_TEST_DB_INSTANCE";

/// Get the AWS region for tests.
///
/// Checks environment variables in order:
/// 1. AWS_REGION
/// 2. AWS_DEFAULT_REGION
/// 3. Falls back to us-east-2
///
/// # Example
///
/// ```
/// use rds_share_test_utils::aws::get_test_region;
///
/// let region = get_test_region();
/// assert!(!region.is_empty());
/// ```
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| "us-east-2".to_string())
}

/// DB instance identifier to snapshot in live tests, if one is configured
pub fn test_db_instance() -> Option<String> {
    std::env::var(TEST_DB_INSTANCE_VAR)
        .ok()
        .filter(|s| !s.trim().is_empty())
}

/// Generate a unique run ID for test resources.
///
/// Format: `test-{timestamp_ms}-{counter}`, so names stay unique even when
/// tests start simultaneously.
///
/// # Example
///
/// ```
/// use rds_share_test_utils::aws::test_run_id;
///
/// let run_id = test_run_id();
/// assert!(run_id.starts_with("test-"));
/// ```
pub fn test_run_id() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let ts = Utc::now().timestamp_millis();
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("test-{}-{}", ts, counter)
}

/// Generate a unique, RDS-valid snapshot identifier for `db_instance`.
///
/// Snapshot identifiers must start with a letter and may not contain two
/// consecutive hyphens.
pub fn test_snapshot_name(db_instance: &str) -> String {
    format!("{}-{}", db_instance, test_run_id())
}
