//! AWS error classification and handling
//!
//! SDK errors are classified by their `.code()` (via `ProvideErrorMetadata`)
//! into `AwsError`, which the runner uses to tell tolerated failures from
//! fatal ones.

use aws_sdk_rds::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// AWS error categories
#[derive(Debug, Clone, Error)]
pub enum AwsError {
    /// Snapshot or DB instance was not found
    #[error("Resource not found ({code}): {message}")]
    NotFound { code: String, message: String },

    /// Snapshot already exists (tolerated by create and copy)
    #[error("Resource already exists: {message}")]
    AlreadyExists { message: String },

    /// Snapshot or instance is not in a state that allows the operation
    #[error("Invalid resource state ({code}): {message}")]
    InvalidState { code: String, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {message}")]
    Throttled { message: String },

    /// Credentials rejected or operation not permitted
    #[error("Access denied ({code}): {message}")]
    AccessDenied { code: String, message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is an "already exists" error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, AwsError::AlreadyExists { .. })
    }

    /// The AWS error code, when the service returned one
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::NotFound { code, .. }
            | AwsError::InvalidState { code, .. }
            | AwsError::AccessDenied { code, .. } => Some(code),
            AwsError::AlreadyExists { .. } => Some(ALREADY_EXISTS_CODES[0]),
            AwsError::Throttled { .. } => Some(THROTTLING_CODES[0]),
            AwsError::Sdk { code, .. } => code.as_deref(),
        }
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        self.code().and_then(suggestion_for_code)
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &["DBSnapshotNotFound", "DBInstanceNotFound"];

/// Known AWS error codes for "already exists" conditions
const ALREADY_EXISTS_CODES: &[&str] = &["DBSnapshotAlreadyExists"];

/// Known AWS error codes for operations rejected by resource state
const INVALID_STATE_CODES: &[&str] = &["InvalidDBSnapshotState", "InvalidDBInstanceState"];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Known AWS error codes for rejected credentials or permissions
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "InvalidClientTokenId",
    "SignatureDoesNotMatch",
    "AuthFailure",
    "ExpiredToken",
];

/// Classify an AWS error from its code and message.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            code: c.to_string(),
            message,
        },
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => AwsError::AlreadyExists { message },
        Some(c) if INVALID_STATE_CODES.contains(&c) => AwsError::InvalidState {
            code: c.to_string(),
            message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled { message },
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied {
            code: c.to_string(),
            message,
        },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify an SDK operation error.
///
/// Service errors keep their code and message. Transport and credential
/// failures carry no code, so the full error context becomes the message.
pub fn classify_sdk_error<E>(error: &E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match error.code() {
        Some(code) => classify_aws_error(Some(code), error.message()),
        None => AwsError::Sdk {
            code: None,
            message: DisplayErrorContext(error).to_string(),
        },
    }
}

/// Find the classified AWS error in an anyhow error chain.
///
/// Errors that never passed through [`classify_sdk_error`] come back as
/// `AwsError::Sdk` without a code.
pub fn classify_anyhow_error(error: &anyhow::Error) -> AwsError {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<AwsError>())
        .cloned()
        .unwrap_or_else(|| AwsError::Sdk {
            code: None,
            message: error.to_string(),
        })
}

/// Treat "already exists" as success, propagate every other error.
pub fn ignore_already_exists(result: anyhow::Result<()>) -> anyhow::Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if classify_anyhow_error(&e).is_already_exists() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "DBInstanceNotFound",
        "Check --db-name; it must be the DB instance identifier in the source region.",
    ),
    (
        "DBSnapshotNotFound",
        "The snapshot disappeared or was never shared; check the source account and region.",
    ),
    (
        "InvalidDBInstanceState",
        "The DB instance must be 'available' to take a snapshot.",
    ),
    (
        "InvalidDBSnapshotState",
        "The snapshot is still being created or copied; wait and re-run.",
    ),
    (
        "SnapshotQuotaExceeded",
        "Manual snapshot quota reached. Delete old snapshots or request a limit increase.",
    ),
    (
        "SharedSnapshotQuotaExceeded",
        "The snapshot is already shared with the maximum number of accounts.",
    ),
    (
        "KMSKeyNotAccessibleFault",
        "Encrypted snapshots need a KMS key shared with the destination account.",
    ),
    (
        "InvalidClientTokenId",
        "The access key id is not valid for this account.",
    ),
    (
        "SignatureDoesNotMatch",
        "The secret access key does not match the access key id.",
    ),
    (
        "ExpiredToken",
        "The credentials have expired; issue new access keys.",
    ),
    (
        "AccessDenied",
        "The credentials lack the required rds:* permission.",
    ),
    (
        "Throttling",
        "AWS API rate limit hit. Re-run once the account is less busy.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
fn suggestion_for_code(code: &str) -> Option<String> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| (*s).to_string())
}
