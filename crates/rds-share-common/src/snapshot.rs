//! Described-snapshot view

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::defaults::STATUS_AVAILABLE;

/// The subset of a described DB snapshot the runner acts on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotInfo {
    /// Snapshot identifier (name)
    pub snapshot_id: String,
    /// Identifier of the DB instance the snapshot was taken from
    pub db_instance: String,
    /// Lifecycle status as reported by RDS (e.g. "creating", "available")
    pub status: String,
    /// Creation time; absent while RDS has not recorded it yet
    pub created_at: Option<DateTime<Utc>>,
}

impl SnapshotInfo {
    pub fn is_available(&self) -> bool {
        self.status == STATUS_AVAILABLE
    }
}
