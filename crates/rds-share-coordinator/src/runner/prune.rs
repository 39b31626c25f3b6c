//! Best-effort pruning of expired destination snapshots

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rds_share_common::select_expired;
use serde::Serialize;
use tracing::{info, warn};

use crate::aws::RdsOperations;

/// A snapshot that was expired but could not be deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneFailure {
    pub snapshot_id: String,
    pub error: String,
}

/// Outcome of one pruning pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct PruneReport {
    /// Snapshots returned by the listing
    pub scanned: usize,
    /// Snapshots deleted
    pub deleted: Vec<String>,
    /// Deletions that failed; the pass continues past each of them
    pub failures: Vec<PruneFailure>,
}

impl PruneReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Delete every snapshot of `db_name` created strictly before `cutoff`.
///
/// A failed listing is returned as an error. Failed deletions are collected
/// in the report and do not stop the remaining deletions.
pub async fn prune_expired<R: RdsOperations>(
    ops: &R,
    db_name: &str,
    cutoff: DateTime<Utc>,
) -> Result<PruneReport> {
    let snapshots = ops
        .list_snapshots(db_name)
        .await
        .context("Failed to list snapshots for pruning")?;

    let expired = select_expired(&snapshots, db_name, cutoff);
    info!(
        db_instance = %db_name,
        scanned = snapshots.len(),
        expired = expired.len(),
        cutoff = %cutoff,
        "Scanned snapshots for pruning"
    );

    let mut report = PruneReport {
        scanned: snapshots.len(),
        ..Default::default()
    };

    for snapshot in expired {
        info!(
            snapshot = %snapshot.snapshot_id,
            created_at = ?snapshot.created_at,
            "Snapshot is too old, deleting"
        );
        match ops.delete_snapshot(&snapshot.snapshot_id).await {
            Ok(()) => report.deleted.push(snapshot.snapshot_id.clone()),
            Err(e) => {
                warn!(
                    snapshot = %snapshot.snapshot_id,
                    error = ?e,
                    "Failed to delete old snapshot"
                );
                report.failures.push(PruneFailure {
                    snapshot_id: snapshot.snapshot_id.clone(),
                    error: format!("{e:#}"),
                });
            }
        }
    }

    Ok(report)
}
