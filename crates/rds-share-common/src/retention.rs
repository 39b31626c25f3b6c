//! Retention window and expiry selection
//!
//! A snapshot is expired when its creation time is strictly older than
//! `now - retention`. Snapshots without a creation time are never expired.

use chrono::{DateTime, Duration, Utc};

use crate::snapshot::SnapshotInfo;

/// A positive retention window. Zero, negative and non-finite retention
/// values have no window, which disables pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow(Duration);

impl RetentionWindow {
    /// Build a window from a retention in (possibly fractional) seconds
    pub fn from_secs_f64(secs: f64) -> Option<Self> {
        if !secs.is_finite() || secs <= 0.0 {
            return None;
        }
        // Anything beyond i64 milliseconds is effectively "keep forever"
        let millis = (secs * 1000.0).min(i64::MAX as f64) as i64;
        Some(Self(
            Duration::try_milliseconds(millis.max(1)).unwrap_or(Duration::MAX),
        ))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Snapshots created strictly before this instant are expired
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.0)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Check whether a creation time lies strictly before `cutoff`
pub fn is_expired(created_at: Option<DateTime<Utc>>, cutoff: DateTime<Utc>) -> bool {
    created_at.is_some_and(|created| created < cutoff)
}

/// Select the snapshots of `db_name` created strictly before `cutoff`.
///
/// Snapshots of other DB instances are ignored even if the listing returned
/// them.
pub fn select_expired<'a>(
    snapshots: &'a [SnapshotInfo],
    db_name: &str,
    cutoff: DateTime<Utc>,
) -> Vec<&'a SnapshotInfo> {
    snapshots
        .iter()
        .filter(|s| s.db_instance == db_name && is_expired(s.created_at, cutoff))
        .collect()
}
