//! AWS account identity

use anyhow::{Context, Result};
use std::str::FromStr;
use tracing::info;

use crate::error::ConfigError;

/// Strongly-typed AWS account ID (12-digit string)
///
/// This newtype prevents accidentally mixing account IDs with other strings
/// and rejects values that cannot be an account id, such as a secret key
/// picked up from the wrong environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

impl FromStr for AccountId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() == 12 && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(AccountId(s.to_string()))
        } else {
            Err(ConfigError::InvalidAccountId(s.to_string()))
        }
    }
}

/// Fetch the account ID behind the loaded credentials via STS GetCallerIdentity
///
/// This operation requires no special permissions - it always succeeds if
/// credentials are valid.
pub async fn get_current_account_id(config: &aws_config::SdkConfig) -> Result<AccountId> {
    let sts = aws_sdk_sts::Client::new(config);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| crate::aws::error::classify_sdk_error(&e))
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;

    info!(account_id = %account, "AWS account validated");

    Ok(AccountId(account.to_string()))
}
