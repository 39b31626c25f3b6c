//! Shared test utilities for rds-snapshot-share
//!
//! Helpers for the live-AWS integration tests, which are `#[ignore]`d by
//! default and run with `cargo test -- --ignored`.
//!
//! ## Modules
//!
//! - [`aws`]: Region and test-instance detection, unique test identifiers

pub mod aws;

pub use aws::{get_test_region, test_db_instance, test_run_id, test_snapshot_name};
