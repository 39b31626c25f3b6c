//! rds-snapshot-share: copy a daily RDS snapshot into another AWS account
//!
//! Reads its configuration from flags or environment variables, runs the
//! snapshot share once and exits non-zero on the first fatal error.

use anyhow::Result;
use clap::Parser;
use rds_share_coordinator::aws::classify_anyhow_error;
use rds_share_coordinator::cli::{Args, normalize_args};
use rds_share_coordinator::config::RunConfig;
use rds_share_coordinator::{logging, runner};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let args = match Args::try_parse_from(normalize_args(std::env::args())) {
        Ok(args) => args,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args).await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if let Some(hint) = classify_anyhow_error(e).suggestion() {
        let _ = writeln!(stderr, "\n\x1b[36mHint:\x1b[0m {hint}");
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

async fn run(args: Args) -> Result<()> {
    logging::init();

    let config = RunConfig::try_from(args)?;
    info!(
        db_name = %config.db_name,
        source_account = %config.source.account_id,
        source_region = %config.source.region,
        dest_account = %config.destination.account_id,
        dest_region = %config.destination.region,
        retention_secs = config.retention_secs,
        dry_run = config.dry_run(),
        "Starting snapshot share"
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, aborting after the current call");
            on_signal.cancel();
        }
    });

    runner::execute(&config, cancel).await?;
    Ok(())
}
