//! Deterministic snapshot naming
//!
//! A snapshot is named `{db_name}-{YYYY-MM-DD}` after the local calendar day
//! of the run, and its destination copy is the same name prefixed with `cp-`.
//! Running twice on the same day therefore targets the same snapshots.

use chrono::NaiveDate;
use serde::Serialize;

use crate::defaults::{COPY_PREFIX, SNAPSHOT_DATE_FORMAT};

/// Name of the source snapshot for `db_name` on `date`
pub fn snapshot_name(db_name: &str, date: NaiveDate) -> String {
    format!("{}-{}", db_name, date.format(SNAPSHOT_DATE_FORMAT))
}

/// Name of the destination copy of `snapshot_name`
pub fn copy_name(snapshot_name: &str) -> String {
    format!("{COPY_PREFIX}{snapshot_name}")
}

/// ARN partition for a region (`aws`, `aws-cn` or `aws-us-gov`)
pub fn partition_for_region(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else {
        "aws"
    }
}

/// ARN of a manual DB snapshot, used as the source of a cross-account copy
pub fn snapshot_arn(region: &str, account_id: &str, snapshot_name: &str) -> String {
    format!(
        "arn:{}:rds:{}:{}:snapshot:{}",
        partition_for_region(region),
        region,
        account_id,
        snapshot_name
    )
}

/// Names and ARN a single run operates on, fixed when the run starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotPlan {
    /// DB instance being snapshotted
    pub db_name: String,
    /// Snapshot created in the source account
    pub source_snapshot: String,
    /// ARN of the source snapshot, as seen from the destination account
    pub source_arn: String,
    /// Snapshot created in the destination account
    pub copy_snapshot: String,
}

impl SnapshotPlan {
    pub fn new(db_name: &str, source_region: &str, source_account: &str, date: NaiveDate) -> Self {
        let source_snapshot = snapshot_name(db_name, date);
        Self {
            db_name: db_name.to_string(),
            source_arn: snapshot_arn(source_region, source_account, &source_snapshot),
            copy_snapshot: copy_name(&source_snapshot),
            source_snapshot,
        }
    }
}
