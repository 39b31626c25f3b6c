//! In-memory RDS account for runner tests
//!
//! [`FakeRds`] records every call in a [`Journal`] so tests can assert on
//! the exact order of operations, optionally interleaved across accounts.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rds_share_common::SnapshotInfo;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::aws::{AwsError, RdsOperations};

/// One recorded RDS call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create {
        db_instance: String,
        snapshot_id: String,
    },
    Describe(String),
    Share {
        snapshot_id: String,
        account_id: String,
    },
    Copy {
        source_arn: String,
        target_id: String,
        source_account: String,
    },
    Delete(String),
    List(String),
}

/// Call log shared between fakes, tagged with the fake's name
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<(&'static str, Call)>>>);

impl Journal {
    fn record(&self, who: &'static str, call: Call) {
        self.0.lock().unwrap().push((who, call));
    }

    pub fn entries(&self) -> Vec<(&'static str, Call)> {
        self.0.lock().unwrap().clone()
    }
}

/// Scriptable fake of one account's RDS API
pub struct FakeRds {
    name: &'static str,
    journal: Journal,
    /// Remaining non-available describe responses per snapshot
    pending: Mutex<HashMap<String, u32>>,
    snapshots: Vec<SnapshotInfo>,
    failing_deletes: HashSet<String>,
    fail_share: bool,
    fail_list: bool,
}

impl FakeRds {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            journal: Journal::default(),
            pending: Mutex::new(HashMap::new()),
            snapshots: Vec::new(),
            failing_deletes: HashSet::new(),
            fail_share: false,
            fail_list: false,
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// Report `snapshot_id` as "creating" for the next `polls` describes
    pub fn with_pending_polls(self, snapshot_id: &str, polls: u32) -> Self {
        self.pending
            .lock()
            .unwrap()
            .insert(snapshot_id.to_string(), polls);
        self
    }

    /// Snapshots returned by `list_snapshots`
    pub fn with_snapshots(mut self, snapshots: Vec<SnapshotInfo>) -> Self {
        self.snapshots = snapshots;
        self
    }

    pub fn failing_delete(mut self, snapshot_id: &str) -> Self {
        self.failing_deletes.insert(snapshot_id.to_string());
        self
    }

    pub fn failing_share(mut self) -> Self {
        self.fail_share = true;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    /// Calls made on this fake, in order
    pub fn calls(&self) -> Vec<Call> {
        self.journal
            .entries()
            .into_iter()
            .filter(|(who, _)| *who == self.name)
            .map(|(_, call)| call)
            .collect()
    }

    fn record(&self, call: Call) {
        self.journal.record(self.name, call);
    }
}

impl RdsOperations for FakeRds {
    async fn create_snapshot(&self, db_instance: &str, snapshot_id: &str) -> Result<()> {
        self.record(Call::Create {
            db_instance: db_instance.to_string(),
            snapshot_id: snapshot_id.to_string(),
        });
        Ok(())
    }

    async fn describe_snapshot(&self, snapshot_id: &str) -> Result<Option<SnapshotInfo>> {
        self.record(Call::Describe(snapshot_id.to_string()));

        let mut pending = self.pending.lock().unwrap();
        let status = match pending.get_mut(snapshot_id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                "creating"
            }
            _ => "available",
        };
        Ok(Some(snapshot_with_status(snapshot_id, status)))
    }

    async fn share_snapshot(&self, snapshot_id: &str, account_id: &str) -> Result<()> {
        self.record(Call::Share {
            snapshot_id: snapshot_id.to_string(),
            account_id: account_id.to_string(),
        });
        if self.fail_share {
            return Err(AwsError::AccessDenied {
                code: "AccessDenied".to_string(),
                message: "not authorized to perform rds:ModifyDBSnapshotAttribute".to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn copy_snapshot(
        &self,
        source_arn: &str,
        target_id: &str,
        source_account: &str,
    ) -> Result<()> {
        self.record(Call::Copy {
            source_arn: source_arn.to_string(),
            target_id: target_id.to_string(),
            source_account: source_account.to_string(),
        });
        Ok(())
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<()> {
        self.record(Call::Delete(snapshot_id.to_string()));
        if self.failing_deletes.contains(snapshot_id) {
            return Err(AwsError::InvalidState {
                code: "InvalidDBSnapshotState".to_string(),
                message: format!("snapshot {snapshot_id} is in use"),
            }
            .into());
        }
        Ok(())
    }

    async fn list_snapshots(&self, db_instance: &str) -> Result<Vec<SnapshotInfo>> {
        self.record(Call::List(db_instance.to_string()));
        if self.fail_list {
            return Err(AwsError::Throttled {
                message: "Rate exceeded".to_string(),
            }
            .into());
        }
        Ok(self.snapshots.clone())
    }
}

/// An `orders-db` snapshot created now with the given status
pub fn snapshot_with_status(snapshot_id: &str, status: &str) -> SnapshotInfo {
    SnapshotInfo {
        snapshot_id: snapshot_id.to_string(),
        db_instance: "orders-db".to_string(),
        status: status.to_string(),
        created_at: Some(Utc::now()),
    }
}

/// An available snapshot created `days` before `now`
pub fn aged_snapshot(
    snapshot_id: &str,
    db_instance: &str,
    now: DateTime<Utc>,
    days: i64,
) -> SnapshotInfo {
    SnapshotInfo {
        snapshot_id: snapshot_id.to_string(),
        db_instance: db_instance.to_string(),
        status: "available".to_string(),
        created_at: Some(now - Duration::days(days)),
    }
}
