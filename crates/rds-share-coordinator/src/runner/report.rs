//! Run report

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rds_share_common::SnapshotPlan;
use serde::Serialize;
use tracing::info;

/// What the pruning step did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PruneOutcome {
    /// Retention was zero or negative
    Disabled,
    /// Every expired snapshot was deleted
    Completed { scanned: usize, deleted: Vec<String> },
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub plan: SnapshotPlan,
    /// False when the source snapshot already existed
    pub created: bool,
    /// False when the destination copy already existed
    pub copied: bool,
    pub prune: PruneOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn log_summary(&self) {
        let pruned = match &self.prune {
            PruneOutcome::Disabled => None,
            PruneOutcome::Completed { deleted, .. } => Some(deleted.len()),
        };
        info!(
            source_snapshot = %self.plan.source_snapshot,
            copy_snapshot = %self.plan.copy_snapshot,
            created = self.created,
            copied = self.copied,
            pruned = ?pruned,
            elapsed_secs = self.elapsed().num_seconds(),
            "Snapshot share complete"
        );
    }
}

/// Write the report as pretty-printed JSON
pub fn write_report(path: &str, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write run report to {path}"))?;
    info!(path = %path, "Run report written");
    Ok(())
}
