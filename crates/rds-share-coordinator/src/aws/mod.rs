//! AWS client modules
//!
//! - account: account id parsing and STS lookup
//! - context: per-account SDK configuration from static credentials
//! - rds: snapshot operations
//! - error: classification of SDK errors

pub mod account;
pub mod context;
pub mod error;
pub mod rds;

pub use account::{AccountId, get_current_account_id};
pub use context::{AwsContext, FromAwsContext};
pub use rds::{RdsClient, RdsOperations};

#[cfg(test)]
pub use rds::MockRdsOperations;

// Error handling
pub use error::{
    AwsError, classify_anyhow_error, classify_aws_error, classify_sdk_error, ignore_already_exists,
};
