//! Shared AWS configuration context
//!
//! Provides `AwsContext` for loading AWS SDK configuration once per account
//! and creating service clients from it.

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use std::sync::Arc;
use tracing::info;

use super::account::{AccountId, get_current_account_id};
use crate::config::AccountConfig;
use crate::error::RunError;

/// Name reported by the static credentials provider
const CREDENTIALS_PROVIDER: &str = "rds-snapshot-share";

/// Shared AWS configuration context for creating service clients.
///
/// Holds the SDK config of one account, built from static credentials, and
/// the account id those credentials were verified against.
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
    account_id: AccountId,
}

impl AwsContext {
    /// Build the SDK config for an account from its static credentials.
    ///
    /// No request is made; use [`AwsContext::connect`] to also verify the
    /// credentials.
    pub async fn with_static_credentials(account: &AccountConfig) -> Self {
        let credentials = Credentials::new(
            account.access_key_id.clone(),
            account.secret_access_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(account.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        Self {
            config: Arc::new(config),
            region: account.region.clone(),
            account_id: account.account_id.clone(),
        }
    }

    /// Build the SDK config and verify the credentials belong to the
    /// configured account.
    pub async fn connect(account: &AccountConfig) -> Result<Self> {
        let ctx = Self::with_static_credentials(account).await;

        let actual = get_current_account_id(ctx.sdk_config())
            .await
            .with_context(|| format!("Failed to connect to account {}", account.account_id))?;

        if actual != account.account_id {
            return Err(RunError::AccountMismatch {
                expected: account.account_id.to_string(),
                actual: actual.to_string(),
            }
            .into());
        }

        info!(account_id = %ctx.account_id, region = %ctx.region, "Connected");
        Ok(ctx)
    }

    /// Get the underlying SDK config for direct client construction.
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    /// Get the region string.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Account the credentials belong to.
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Create an RDS client from this context.
    pub fn rds_client(&self) -> aws_sdk_rds::Client {
        aws_sdk_rds::Client::new(self.sdk_config())
    }
}

/// Trait for types that can be constructed from an AwsContext.
pub trait FromAwsContext {
    fn from_context(ctx: &AwsContext) -> Self;
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .field("account_id", &self.account_id)
            .finish_non_exhaustive()
    }
}
