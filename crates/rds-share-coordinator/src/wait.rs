//! Resource waiting with a fixed poll interval, a deadline and cancellation.
//!
//! Provides a generic abstraction for waiting on AWS resources (or any async
//! condition) to become ready.

use anyhow::Result;
use backon::{BackoffBuilder, ConstantBuilder};
use rds_share_common::defaults::{DEFAULT_MAX_WAIT_SECS, DEFAULT_POLL_INTERVAL_SECS};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for resource waiting.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Delay between checks
    pub interval: Duration,
    /// Maximum total time to wait before timeout
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_MAX_WAIT_SECS),
        }
    }
}

/// Ways a wait can end without the resource becoming ready
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("Timeout waiting for {resource} after {timeout:?} ({attempts} attempts)")]
    Timeout {
        resource: String,
        timeout: Duration,
        attempts: u32,
    },

    #[error("Wait for {resource} cancelled")]
    Cancelled { resource: String },
}

/// Wait for a resource to become ready, checking on a fixed interval.
///
/// # Arguments
/// * `config` - Wait configuration
/// * `cancel` - Optional cancellation token
/// * `check` - Async function that returns `Ok(true)` when ready, `Ok(false)` to retry
/// * `resource_name` - Name for logging
///
/// # Returns
/// * `Ok(())` - Resource is ready
/// * `Err` - [`WaitError`] on timeout or cancellation, or the error returned by `check`
///
/// # Example
/// ```ignore
/// wait_for_resource(
///     &WaitConfig::default(),
///     Some(&cancel_token),
///     || async {
///         let ready = check_if_resource_exists().await;
///         Ok(ready)
///     },
///     "my-resource",
/// ).await?;
/// ```
pub async fn wait_for_resource<F, Fut>(
    config: &WaitConfig,
    cancel: Option<&CancellationToken>,
    check: F,
    resource_name: &str,
) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = tokio::time::Instant::now();
    let mut attempts = 0u32;

    let mut delays = ConstantBuilder::default()
        .with_delay(config.interval)
        .with_max_times(usize::MAX)
        .build();

    loop {
        attempts += 1;

        if cancel.is_some_and(|token| token.is_cancelled()) {
            return Err(WaitError::Cancelled {
                resource: resource_name.to_string(),
            }
            .into());
        }

        match check().await {
            Ok(true) => {
                debug!(resource = %resource_name, attempts, "Resource ready");
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => {
                warn!(resource = %resource_name, error = ?e, "Resource check failed");
                return Err(e);
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= config.timeout {
            return Err(WaitError::Timeout {
                resource: resource_name.to_string(),
                timeout: config.timeout,
                attempts,
            }
            .into());
        }

        // Never sleep past the deadline; the final check happens at the deadline
        let delay = delays
            .next()
            .unwrap_or(config.interval)
            .min(config.timeout - elapsed);
        debug!(
            resource = %resource_name,
            attempt = attempts,
            delay_ms = delay.as_millis(),
            "Resource not ready, retrying"
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = async {
                if let Some(token) = cancel {
                    token.cancelled().await
                } else {
                    std::future::pending::<()>().await
                }
            } => {
                return Err(WaitError::Cancelled {
                    resource: resource_name.to_string(),
                }
                .into());
            }
        }
    }
}
