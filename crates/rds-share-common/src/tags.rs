//! Tags applied to snapshots created by rds-snapshot-share
//!
//! ## Tag Schema
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `rds-snapshot-share:tool` | Static identifier ("rds-snapshot-share") |
//! | `rds-snapshot-share:source-account` | Account the snapshot originates from |
//! | `rds-snapshot-share:created-at` | RFC 3339 creation timestamp |

/// Tag key for tool identification
pub const TAG_TOOL: &str = "rds-snapshot-share:tool";

/// Tag value for tool identification
pub const TAG_TOOL_VALUE: &str = "rds-snapshot-share";

/// Tag key for the originating account id
pub const TAG_SOURCE_ACCOUNT: &str = "rds-snapshot-share:source-account";

/// Tag key for creation timestamp (RFC 3339 format)
pub const TAG_CREATED_AT: &str = "rds-snapshot-share:created-at";

/// Helper to format creation timestamp for tags
pub fn format_created_at(time: chrono::DateTime<chrono::Utc>) -> String {
    time.to_rfc3339()
}

/// Helper to parse creation timestamp from tags
pub fn parse_created_at(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

/// Standard tags for a snapshot created on behalf of `source_account`
pub fn snapshot_tags(
    source_account: &str,
    created_at: chrono::DateTime<chrono::Utc>,
) -> Vec<(&'static str, String)> {
    vec![
        (TAG_TOOL, TAG_TOOL_VALUE.to_string()),
        (TAG_SOURCE_ACCOUNT, source_account.to_string()),
        (TAG_CREATED_AT, format_created_at(created_at)),
    ]
}
