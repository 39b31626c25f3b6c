//! Configuration types for the snapshot run

use chrono::NaiveDate;
use rds_share_common::{RetentionWindow, SnapshotPlan};

use crate::aws::AccountId;
use crate::error::ConfigError;
use crate::wait::WaitConfig;

/// Static credentials and identity of one AWS account
#[derive(Clone)]
pub struct AccountConfig {
    /// AWS region the snapshots live in
    pub region: String,
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Account the credentials must belong to
    pub account_id: AccountId,
}

impl AccountConfig {
    fn validate(&self, role: Role) -> Result<(), ConfigError> {
        let [region, access_key_id, secret_access_key] = role.field_names();
        if self.region.trim().is_empty() {
            return Err(ConfigError::Empty(region));
        }
        if self.access_key_id.trim().is_empty() {
            return Err(ConfigError::Empty(access_key_id));
        }
        if self.secret_access_key.is_empty() {
            return Err(ConfigError::Empty(secret_access_key));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("account_id", &self.account_id)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
enum Role {
    Source,
    Destination,
}

impl Role {
    fn field_names(self) -> [&'static str; 3] {
        match self {
            Role::Source => ["src_region", "src_access_key_id", "src_secret_access_key"],
            Role::Destination => ["dest_region", "dest_access_key_id", "dest_secret_access_key"],
        }
    }
}

/// Runtime behavior flags
#[derive(Debug, Clone, Default)]
pub struct RuntimeFlags {
    /// Connect and plan only, without touching snapshots
    pub dry_run: bool,
    /// Output JSON file path for the run report
    pub output: Option<String>,
}

/// Configuration for a snapshot run
///
/// Built once at startup and passed by reference to the runner.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: AccountConfig,
    pub destination: AccountConfig,
    /// DB instance identifier in the source account
    pub db_name: String,
    /// Retention in seconds; zero or less disables pruning
    pub retention_secs: f64,
    pub wait: WaitConfig,
    pub flags: RuntimeFlags,
}

impl RunConfig {
    /// Check every field before any AWS call is made
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.source.validate(Role::Source)?;
        self.destination.validate(Role::Destination)?;

        if self.db_name.trim().is_empty() {
            return Err(ConfigError::Empty("db_name"));
        }
        if self.retention_secs.is_nan() || self.retention_secs.is_infinite() {
            return Err(ConfigError::InvalidRetention(self.retention_secs));
        }
        if self.wait.interval.is_zero() {
            return Err(ConfigError::InvalidPollInterval);
        }
        if self.wait.timeout < self.wait.interval {
            return Err(ConfigError::InvalidMaxWait {
                max_wait: self.wait.timeout.as_secs(),
                poll_interval: self.wait.interval.as_secs(),
            });
        }
        if self.source.account_id == self.destination.account_id {
            return Err(ConfigError::SameAccount(self.source.account_id.to_string()));
        }
        Ok(())
    }

    /// Retention window, or `None` when pruning is disabled
    pub fn retention(&self) -> Option<RetentionWindow> {
        RetentionWindow::from_secs_f64(self.retention_secs)
    }

    /// Snapshot names and source ARN for a run on `date`
    pub fn plan_for(&self, date: NaiveDate) -> SnapshotPlan {
        SnapshotPlan::new(
            &self.db_name,
            &self.source.region,
            &self.source.account_id,
            date,
        )
    }

    pub fn dry_run(&self) -> bool {
        self.flags.dry_run
    }

    pub fn output(&self) -> Option<&str> {
        self.flags.output.as_deref()
    }
}

/// Fixtures shared by unit tests across the crate
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::time::Duration;

    pub const SOURCE_ACCOUNT: &str = "111122223333";
    pub const DEST_ACCOUNT: &str = "444455556666";

    pub fn account(region: &str, account_id: &str) -> AccountConfig {
        AccountConfig {
            region: region.to_string(),
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG".to_string(),
            account_id: account_id.parse().unwrap(),
        }
    }

    /// A valid config for `orders-db` with millisecond polling
    pub fn test_run_config(retention_secs: f64) -> RunConfig {
        RunConfig {
            source: account("us-east-1", SOURCE_ACCOUNT),
            destination: account("eu-west-1", DEST_ACCOUNT),
            db_name: "orders-db".to_string(),
            retention_secs,
            wait: WaitConfig {
                interval: Duration::from_millis(1),
                timeout: Duration::from_secs(5),
            },
            flags: RuntimeFlags::default(),
        }
    }
}
