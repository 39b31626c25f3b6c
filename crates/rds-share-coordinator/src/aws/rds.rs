//! RDS snapshot operations

use anyhow::{Context, Result};
use aws_sdk_rds::{
    Client,
    types::{DbSnapshot, Tag},
};
use chrono::{DateTime, Utc};
use rds_share_common::SnapshotInfo;
use rds_share_common::defaults::RESTORE_ATTRIBUTE;
use rds_share_common::tags::{self, TAG_CREATED_AT};
use tracing::{debug, info};

use super::account::AccountId;
use super::context::{AwsContext, FromAwsContext};
use super::error::classify_sdk_error;

/// Page size for DescribeDBSnapshots
const DESCRIBE_PAGE_SIZE: i32 = 100;

/// RDS client bound to one account and region
pub struct RdsClient {
    client: Client,
    region: String,
    account_id: AccountId,
}

impl FromAwsContext for RdsClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.rds_client(),
            region: ctx.region().to_string(),
            account_id: ctx.account_id().clone(),
        }
    }
}

impl RdsClient {
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Create a manual snapshot of `db_instance` named `snapshot_id`
    pub async fn create_snapshot(&self, db_instance: &str, snapshot_id: &str) -> Result<()> {
        info!(db_instance = %db_instance, snapshot = %snapshot_id, "Creating snapshot");

        self.client
            .create_db_snapshot()
            .db_instance_identifier(db_instance)
            .db_snapshot_identifier(snapshot_id)
            .set_tags(Some(build_tags(&self.account_id)))
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .with_context(|| format!("Failed to create snapshot {snapshot_id}"))?;

        Ok(())
    }

    /// Describe a single snapshot by identifier
    pub async fn describe_snapshot(&self, snapshot_id: &str) -> Result<Option<SnapshotInfo>> {
        let response = self
            .client
            .describe_db_snapshots()
            .db_snapshot_identifier(snapshot_id)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .with_context(|| format!("Failed to describe snapshot {snapshot_id}"))?;

        Ok(response.db_snapshots().first().map(snapshot_info))
    }

    /// Grant `account_id` permission to restore from the snapshot
    pub async fn share_snapshot(&self, snapshot_id: &str, account_id: &str) -> Result<()> {
        info!(snapshot = %snapshot_id, account_id = %account_id, "Sharing snapshot");

        self.client
            .modify_db_snapshot_attribute()
            .db_snapshot_identifier(snapshot_id)
            .attribute_name(RESTORE_ATTRIBUTE)
            .values_to_add(account_id)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .with_context(|| format!("Failed to share snapshot {snapshot_id} with {account_id}"))?;

        Ok(())
    }

    /// Copy a shared snapshot, given by ARN, into this account.
    ///
    /// The copy is tagged with `source_account`, the account that owns the
    /// snapshot behind `source_arn`.
    pub async fn copy_snapshot(
        &self,
        source_arn: &str,
        target_id: &str,
        source_account: &str,
    ) -> Result<()> {
        info!(source = %source_arn, target = %target_id, region = %self.region, "Copying snapshot");

        self.client
            .copy_db_snapshot()
            .source_db_snapshot_identifier(source_arn)
            .target_db_snapshot_identifier(target_id)
            .set_tags(Some(build_tags(source_account)))
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .with_context(|| format!("Failed to copy snapshot {source_arn} to {target_id}"))?;

        Ok(())
    }

    /// Delete a manual snapshot
    pub async fn delete_snapshot(&self, snapshot_id: &str) -> Result<()> {
        info!(snapshot = %snapshot_id, region = %self.region, "Deleting snapshot");

        self.client
            .delete_db_snapshot()
            .db_snapshot_identifier(snapshot_id)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .with_context(|| format!("Failed to delete snapshot {snapshot_id}"))?;

        Ok(())
    }

    /// List every manual snapshot of `db_instance`, following pagination
    pub async fn list_snapshots(&self, db_instance: &str) -> Result<Vec<SnapshotInfo>> {
        let mut snapshots = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_db_snapshots()
                .db_instance_identifier(db_instance)
                .snapshot_type("manual")
                .max_records(DESCRIBE_PAGE_SIZE)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))
                .with_context(|| format!("Failed to list snapshots of {db_instance}"))?;

            snapshots.extend(response.db_snapshots().iter().map(snapshot_info));

            match response.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        debug!(db_instance = %db_instance, count = snapshots.len(), "Listed snapshots");
        Ok(snapshots)
    }
}

/// Standard tags for a snapshot originating from `source_account`
fn build_tags(source_account: &str) -> Vec<Tag> {
    tags::snapshot_tags(source_account, Utc::now())
        .into_iter()
        .map(|(key, value)| Tag::builder().key(key).value(value).build())
        .collect()
}

/// Convert an SDK snapshot description into the runner's view.
///
/// The creation time falls back to the tool's created-at tag while RDS has
/// not recorded one.
fn snapshot_info(snapshot: &DbSnapshot) -> SnapshotInfo {
    let created_at = snapshot
        .snapshot_create_time()
        .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()))
        .or_else(|| {
            snapshot
                .tag_list()
                .iter()
                .find(|tag| tag.key() == Some(TAG_CREATED_AT))
                .and_then(|tag| tag.value())
                .and_then(tags::parse_created_at)
        });

    SnapshotInfo {
        snapshot_id: snapshot.db_snapshot_identifier().unwrap_or_default().to_string(),
        db_instance: snapshot.db_instance_identifier().unwrap_or_default().to_string(),
        status: snapshot.status().unwrap_or_default().to_string(),
        created_at,
    }
}

/// Trait for RDS operations that can be mocked in tests.
///
/// This trait abstracts the RDS client operations so the snapshot lifecycle
/// can be tested without hitting real AWS.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait RdsOperations: Send + Sync {
    /// Create a manual snapshot of a DB instance
    async fn create_snapshot(&self, db_instance: &str, snapshot_id: &str) -> Result<()>;

    /// Describe a snapshot by identifier
    async fn describe_snapshot(&self, snapshot_id: &str) -> Result<Option<SnapshotInfo>>;

    /// Add an account to the snapshot's restore attribute
    async fn share_snapshot(&self, snapshot_id: &str, account_id: &str) -> Result<()>;

    /// Copy a shared snapshot owned by `source_account` into this account
    async fn copy_snapshot(
        &self,
        source_arn: &str,
        target_id: &str,
        source_account: &str,
    ) -> Result<()>;

    /// Delete a manual snapshot
    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<()>;

    /// List the manual snapshots of a DB instance
    async fn list_snapshots(&self, db_instance: &str) -> Result<Vec<SnapshotInfo>>;
}

impl RdsOperations for RdsClient {
    async fn create_snapshot(&self, db_instance: &str, snapshot_id: &str) -> Result<()> {
        RdsClient::create_snapshot(self, db_instance, snapshot_id).await
    }

    async fn describe_snapshot(&self, snapshot_id: &str) -> Result<Option<SnapshotInfo>> {
        RdsClient::describe_snapshot(self, snapshot_id).await
    }

    async fn share_snapshot(&self, snapshot_id: &str, account_id: &str) -> Result<()> {
        RdsClient::share_snapshot(self, snapshot_id, account_id).await
    }

    async fn copy_snapshot(
        &self,
        source_arn: &str,
        target_id: &str,
        source_account: &str,
    ) -> Result<()> {
        RdsClient::copy_snapshot(self, source_arn, target_id, source_account).await
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<()> {
        RdsClient::delete_snapshot(self, snapshot_id).await
    }

    async fn list_snapshots(&self, db_instance: &str) -> Result<Vec<SnapshotInfo>> {
        RdsClient::list_snapshots(self, db_instance).await
    }
}
