//! Command-line arguments
//!
//! Every flag falls back to an environment variable so the tool can run
//! from a scheduled container with no arguments at all.

use clap::Parser;
use rds_share_common::defaults::{
    DEFAULT_MAX_WAIT_SECS, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_RETENTION_SECS,
};
use std::time::Duration;

use crate::config::{AccountConfig, RunConfig, RuntimeFlags};
use crate::error::ConfigError;
use crate::wait::WaitConfig;

#[derive(Parser, Debug)]
#[command(name = "rds-snapshot-share")]
#[command(about = "Snapshot an RDS instance and copy it into another AWS account")]
#[command(version)]
pub struct Args {
    /// AWS region of the source account
    #[arg(long, env = "AWS_SRC_REGION")]
    pub src_region: String,

    /// Access key id for the source account
    #[arg(long, env = "AWS_SRC_ACCESS_KEY_ID")]
    pub src_access_key_id: String,

    /// Secret access key for the source account
    #[arg(long, env = "AWS_SRC_SECRET_KEY", hide_env_values = true)]
    pub src_secret_access_key: String,

    /// 12-digit id of the source account
    #[arg(long, env = "AWS_SRC_ACCOUNT_ID")]
    pub src_account_id: String,

    /// AWS region of the destination account
    #[arg(long, env = "AWS_DEST_REGION")]
    pub dest_region: String,

    /// Access key id for the destination account
    #[arg(long, env = "AWS_DEST_ACCESS_KEY_ID")]
    pub dest_access_key_id: String,

    /// Secret access key for the destination account
    #[arg(long, env = "AWS_DEST_SECRET_KEY", hide_env_values = true)]
    pub dest_secret_access_key: String,

    /// 12-digit id of the destination account
    #[arg(long, env = "AWS_DEST_ACCOUNT_ID")]
    pub dest_account_id: String,

    /// Delete destination snapshots older than this many seconds (0 disables)
    #[arg(
        long,
        env = "RETENTION_TIME",
        default_value_t = DEFAULT_RETENTION_SECS,
        allow_negative_numbers = true
    )]
    pub retention_time: f64,

    /// DB instance identifier to snapshot
    #[arg(long, env = "DATABASE_NAME")]
    pub db_name: String,

    /// Seconds between snapshot status checks
    #[arg(long, env = "SNAPSHOT_POLL_INTERVAL", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval: u64,

    /// Maximum seconds to wait for a snapshot to become available
    #[arg(long, env = "SNAPSHOT_MAX_WAIT", default_value_t = DEFAULT_MAX_WAIT_SECS)]
    pub max_wait: u64,

    /// Connect to both accounts and log the plan without touching snapshots
    #[arg(long)]
    pub dry_run: bool,

    /// Output JSON file for the run report
    #[arg(short, long)]
    pub output: Option<String>,
}

impl TryFrom<Args> for RunConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        Ok(Self {
            source: AccountConfig {
                region: args.src_region,
                access_key_id: args.src_access_key_id,
                secret_access_key: args.src_secret_access_key,
                account_id: args.src_account_id.parse()?,
            },
            destination: AccountConfig {
                region: args.dest_region,
                access_key_id: args.dest_access_key_id,
                secret_access_key: args.dest_secret_access_key,
                account_id: args.dest_account_id.parse()?,
            },
            db_name: args.db_name,
            retention_secs: args.retention_time,
            wait: WaitConfig {
                interval: Duration::from_secs(args.poll_interval),
                timeout: Duration::from_secs(args.max_wait),
            },
            flags: RuntimeFlags {
                dry_run: args.dry_run,
                output: args.output,
            },
        })
    }
}

/// Rewrite single-dash long flags (`-db-name`) as `--db-name`.
///
/// Short flags (`-o`), negative numbers and `--` are left untouched.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| {
            let mut chars = arg.chars();
            let is_single_dash_long = chars.next() == Some('-')
                && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.next().is_some();
            if is_single_dash_long {
                format!("-{arg}")
            } else {
                arg
            }
        })
        .collect()
}
