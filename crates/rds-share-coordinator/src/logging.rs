//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset or unparsable
pub const DEFAULT_LOG_DIRECTIVES: &str = "info,aws_config=warn,aws_smithy_runtime=warn";

/// Build the log filter from a `RUST_LOG` value.
///
/// A valid `RUST_LOG` replaces the defaults entirely, so `RUST_LOG=debug`
/// also turns on debug output from the AWS SDK.
pub fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVES))
}

/// Install the global fmt subscriber, honoring `RUST_LOG`
pub fn init() {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .init();
}
