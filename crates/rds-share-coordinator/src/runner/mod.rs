//! Snapshot share runner
//!
//! Drives one run through a fixed sequence against two accounts:
//! create a snapshot in the source, wait for it, share it with the
//! destination, copy it there and wait again, delete the source snapshot,
//! then prune expired copies in the destination. The first failing step
//! ends the run.

mod prune;
mod report;

pub use prune::{PruneFailure, PruneReport, prune_expired};
pub use report::{PruneOutcome, RunReport, write_report};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use rds_share_common::SnapshotPlan;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::aws::{AwsContext, FromAwsContext, RdsClient, RdsOperations, ignore_already_exists};
use crate::config::RunConfig;
use crate::error::RunError;
use crate::wait::wait_for_resource;

/// Executes the snapshot lifecycle for one run
pub struct SnapshotRunner<'a, S, D> {
    config: &'a RunConfig,
    source: &'a S,
    destination: &'a D,
    cancel: Option<CancellationToken>,
}

impl<'a, S: RdsOperations, D: RdsOperations> SnapshotRunner<'a, S, D> {
    pub fn new(config: &'a RunConfig, source: &'a S, destination: &'a D) -> Self {
        Self {
            config,
            source,
            destination,
            cancel: None,
        }
    }

    /// Abort waits when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run every step for `plan` in order
    pub async fn run(&self, plan: &SnapshotPlan) -> Result<RunReport> {
        let started_at = Utc::now();

        let created = self.create_snapshot(plan).await?;
        self.wait_until_available(self.source, &plan.source_snapshot)
            .await
            .context("Error waiting for snapshot")?;

        self.share_snapshot(plan).await?;
        let copied = self.copy_snapshot(plan).await?;
        self.delete_source_snapshot(plan).await?;
        let prune = self.prune(Utc::now()).await?;

        Ok(RunReport {
            plan: plan.clone(),
            created,
            copied,
            prune,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Create the source snapshot; `false` if it already existed
    pub async fn create_snapshot(&self, plan: &SnapshotPlan) -> Result<bool> {
        let created = ignore_already_exists(
            self.source
                .create_snapshot(&plan.db_name, &plan.source_snapshot)
                .await,
        )
        .context("Error taking snapshot")?;

        if !created {
            info!(snapshot = %plan.source_snapshot, "Snapshot already exists, reusing it");
        }
        Ok(created)
    }

    /// Poll `ops` until `snapshot_id` reports the `available` status
    pub async fn wait_until_available<R: RdsOperations>(
        &self,
        ops: &R,
        snapshot_id: &str,
    ) -> Result<()> {
        wait_for_resource(
            &self.config.wait,
            self.cancel.as_ref(),
            || async move {
                let snapshot = ops.describe_snapshot(snapshot_id).await?;
                let status = snapshot.as_ref().map_or("missing", |s| s.status.as_str());
                let ready = snapshot.as_ref().is_some_and(|s| s.is_available());
                if !ready {
                    info!(snapshot = %snapshot_id, status = %status, "Snapshot not available yet");
                }
                Ok::<_, anyhow::Error>(ready)
            },
            snapshot_id,
        )
        .await?;

        info!(snapshot = %snapshot_id, "Snapshot available");
        Ok(())
    }

    /// Grant the destination account restore access to the source snapshot
    pub async fn share_snapshot(&self, plan: &SnapshotPlan) -> Result<()> {
        self.source
            .share_snapshot(&plan.source_snapshot, &self.config.destination.account_id)
            .await
            .context("Error sharing snapshot")
    }

    /// Copy the shared snapshot into the destination and wait for it.
    ///
    /// Returns `false` if the copy already existed.
    pub async fn copy_snapshot(&self, plan: &SnapshotPlan) -> Result<bool> {
        let copied = ignore_already_exists(
            self.destination
                .copy_snapshot(
                    &plan.source_arn,
                    &plan.copy_snapshot,
                    &self.config.source.account_id,
                )
                .await,
        )
        .context("Error copying snapshot")?;

        if !copied {
            info!(snapshot = %plan.copy_snapshot, "Copy already exists, reusing it");
        }

        self.wait_until_available(self.destination, &plan.copy_snapshot)
            .await
            .context("Error waiting for snapshot copy")?;
        Ok(copied)
    }

    pub async fn delete_source_snapshot(&self, plan: &SnapshotPlan) -> Result<()> {
        self.source
            .delete_snapshot(&plan.source_snapshot)
            .await
            .context("Error deleting snapshot")
    }

    /// Delete destination snapshots older than the retention window.
    ///
    /// Any deletion failure fails the run after every expired snapshot has
    /// been attempted.
    pub async fn prune(&self, now: DateTime<Utc>) -> Result<PruneOutcome> {
        let Some(window) = self.config.retention() else {
            info!("Retention not set, skipping snapshot pruning");
            return Ok(PruneOutcome::Disabled);
        };

        let report = prune_expired(self.destination, &self.config.db_name, window.cutoff(now))
            .await
            .context("Error cleaning old snapshots")?;

        if !report.is_clean() {
            return Err(RunError::PruneFailed {
                failures: report.failures,
            }
            .into());
        }

        Ok(PruneOutcome::Completed {
            scanned: report.scanned,
            deleted: report.deleted,
        })
    }
}

/// Connect to both accounts and run the snapshot share.
///
/// Returns `None` for a dry run, which stops after connecting and planning.
pub async fn execute(config: &RunConfig, cancel: CancellationToken) -> Result<Option<RunReport>> {
    config.validate()?;

    let source_ctx = AwsContext::connect(&config.source)
        .await
        .context("Failed to connect to source account")?;
    let dest_ctx = AwsContext::connect(&config.destination)
        .await
        .context("Failed to connect to destination account")?;

    let source = RdsClient::from_context(&source_ctx);
    let destination = RdsClient::from_context(&dest_ctx);

    let plan = config.plan_for(Local::now().date_naive());
    run_plan(config, &source, &destination, &plan, cancel).await
}

/// Run `plan` against connected accounts.
///
/// A dry run logs the plan and makes no calls. Otherwise the report is
/// written to the configured output path once the run succeeds.
pub async fn run_plan<S: RdsOperations, D: RdsOperations>(
    config: &RunConfig,
    source: &S,
    destination: &D,
    plan: &SnapshotPlan,
    cancel: CancellationToken,
) -> Result<Option<RunReport>> {
    info!(
        db_instance = %plan.db_name,
        source_snapshot = %plan.source_snapshot,
        copy_snapshot = %plan.copy_snapshot,
        source_region = %config.source.region,
        dest_region = %config.destination.region,
        retention = ?config.retention().map(|w| w.duration()),
        "Snapshot plan"
    );

    if config.dry_run() {
        info!("Dry run, not touching any snapshots");
        return Ok(None);
    }

    let report = SnapshotRunner::new(config, source, destination)
        .with_cancellation(cancel)
        .run(plan)
        .await?;

    report.log_summary();
    if let Some(path) = config.output() {
        write_report(path, &report)?;
    }

    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::{AwsError, MockRdsOperations};
    use crate::config::fixtures::{DEST_ACCOUNT, SOURCE_ACCOUNT, test_run_config};
    use crate::testing::{Call, FakeRds, aged_snapshot, snapshot_with_status};
    use crate::wait::WaitError;
    use chrono::{Duration, NaiveDate};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn may_first_plan(config: &RunConfig) -> SnapshotPlan {
        config.plan_for(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
    }

    fn already_exists() -> anyhow::Error {
        AwsError::AlreadyExists {
            message: "DBSnapshotAlreadyExists".to_string(),
        }
        .into()
    }

    #[tokio::test]
    async fn full_run_executes_steps_in_order() {
        let config = test_run_config(86_400.0);
        let plan = may_first_plan(&config);
        let now = Utc::now();

        let source = FakeRds::new("source").with_pending_polls(&plan.source_snapshot, 2);
        let dest = FakeRds::new("destination")
            .with_pending_polls(&plan.copy_snapshot, 1)
            .with_snapshots(vec![
                aged_snapshot("cp-orders-db-2024-04-01", "orders-db", now, 30),
                aged_snapshot(&plan.copy_snapshot, "orders-db", now, 0),
                aged_snapshot("cp-billing-2024-04-01", "billing", now, 30),
            ]);

        let report = SnapshotRunner::new(&config, &source, &dest)
            .run(&plan)
            .await
            .unwrap();

        let describe_source = Call::Describe("orders-db-2024-05-01".to_string());
        assert_eq!(
            source.calls(),
            vec![
                Call::Create {
                    db_instance: "orders-db".to_string(),
                    snapshot_id: "orders-db-2024-05-01".to_string(),
                },
                describe_source.clone(),
                describe_source.clone(),
                describe_source,
                Call::Share {
                    snapshot_id: "orders-db-2024-05-01".to_string(),
                    account_id: DEST_ACCOUNT.to_string(),
                },
                Call::Delete("orders-db-2024-05-01".to_string()),
            ]
        );

        let describe_copy = Call::Describe("cp-orders-db-2024-05-01".to_string());
        assert_eq!(
            dest.calls(),
            vec![
                Call::Copy {
                    source_arn: "arn:aws:rds:us-east-1:111122223333:snapshot:orders-db-2024-05-01"
                        .to_string(),
                    target_id: "cp-orders-db-2024-05-01".to_string(),
                    source_account: SOURCE_ACCOUNT.to_string(),
                },
                describe_copy.clone(),
                describe_copy,
                Call::List("orders-db".to_string()),
                Call::Delete("cp-orders-db-2024-04-01".to_string()),
            ]
        );

        assert!(report.created);
        assert!(report.copied);
        assert_eq!(
            report.prune,
            PruneOutcome::Completed {
                scanned: 3,
                deleted: vec!["cp-orders-db-2024-04-01".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn source_is_deleted_only_after_copy_is_available() {
        let config = test_run_config(0.0);
        let plan = may_first_plan(&config);
        let journal = crate::testing::Journal::default();

        let source = FakeRds::new("source").with_journal(journal.clone());
        let dest = FakeRds::new("destination")
            .with_journal(journal.clone())
            .with_pending_polls(&plan.copy_snapshot, 3);

        SnapshotRunner::new(&config, &source, &dest)
            .run(&plan)
            .await
            .unwrap();

        let entries = journal.entries();
        let last_copy_poll = entries
            .iter()
            .rposition(|(who, call)| *who == "destination" && matches!(call, Call::Describe(_)))
            .unwrap();
        let source_delete = entries
            .iter()
            .position(|(who, call)| *who == "source" && matches!(call, Call::Delete(_)))
            .unwrap();
        assert!(source_delete > last_copy_poll);
    }

    #[tokio::test]
    async fn existing_snapshot_and_copy_are_reused() {
        let config = test_run_config(0.0);
        let plan = may_first_plan(&config);

        let mut source = MockRdsOperations::new();
        source
            .expect_create_snapshot()
            .times(1)
            .returning(|_, _| Err(already_exists()));
        source
            .expect_describe_snapshot()
            .times(1)
            .returning(|id| Ok(Some(snapshot_with_status(id, "available"))));
        source
            .expect_share_snapshot()
            .times(1)
            .returning(|_, _| Ok(()));
        source
            .expect_delete_snapshot()
            .times(1)
            .returning(|_| Ok(()));

        let mut dest = MockRdsOperations::new();
        dest.expect_copy_snapshot()
            .times(1)
            .returning(|_, _, _| Err(already_exists()));
        dest.expect_describe_snapshot()
            .times(1)
            .returning(|id| Ok(Some(snapshot_with_status(id, "available"))));

        let report = SnapshotRunner::new(&config, &source, &dest)
            .run(&plan)
            .await
            .unwrap();

        assert!(!report.created);
        assert!(!report.copied);
        assert_eq!(report.prune, PruneOutcome::Disabled);
    }

    #[tokio::test]
    async fn create_failure_stops_before_any_other_call() {
        let config = test_run_config(0.0);
        let plan = may_first_plan(&config);

        let mut source = MockRdsOperations::new();
        source.expect_create_snapshot().times(1).returning(|_, _| {
            Err(AwsError::NotFound {
                code: "DBInstanceNotFound".to_string(),
                message: "DBInstance orders-db not found".to_string(),
            }
            .into())
        });
        let dest = MockRdsOperations::new();

        let err = SnapshotRunner::new(&config, &source, &dest)
            .run(&plan)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Error taking snapshot"));
        assert!(format!("{err:#}").contains("DBInstanceNotFound"));
    }

    #[tokio::test]
    async fn poll_requeries_until_available() {
        let config = test_run_config(0.0);
        let polls = Arc::new(AtomicU32::new(0));
        let counter = polls.clone();

        let mut source = MockRdsOperations::new();
        source
            .expect_describe_snapshot()
            .times(4)
            .returning(move |id| {
                let status = match counter.fetch_add(1, Ordering::SeqCst) {
                    0 => "creating",
                    1 => "backing-up",
                    2 => "creating",
                    _ => "available",
                };
                Ok(Some(snapshot_with_status(id, status)))
            });
        let dest = MockRdsOperations::new();

        SnapshotRunner::new(&config, &source, &dest)
            .wait_until_available(&source, "orders-db-2024-05-01")
            .await
            .unwrap();

        assert_eq!(polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn poll_keeps_waiting_while_snapshot_is_missing() {
        let config = test_run_config(0.0);
        let polls = Arc::new(AtomicU32::new(0));
        let counter = polls.clone();

        let mut dest = MockRdsOperations::new();
        dest.expect_describe_snapshot().times(2).returning(move |id| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(None)
            } else {
                Ok(Some(snapshot_with_status(id, "available")))
            }
        });
        let source = MockRdsOperations::new();

        SnapshotRunner::new(&config, &source, &dest)
            .wait_until_available(&dest, "cp-orders-db-2024-05-01")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wait_times_out_when_snapshot_never_becomes_available() {
        let mut config = test_run_config(0.0);
        config.wait.timeout = std::time::Duration::from_millis(20);
        let plan = may_first_plan(&config);

        let source = FakeRds::new("source").with_pending_polls(&plan.source_snapshot, u32::MAX);
        let dest = FakeRds::new("destination");

        let err = SnapshotRunner::new(&config, &source, &dest)
            .run(&plan)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Error waiting for snapshot"));
        assert!(matches!(
            err.downcast_ref::<WaitError>(),
            Some(WaitError::Timeout { .. })
        ));
        assert!(dest.calls().is_empty());
    }

    #[tokio::test]
    async fn cancelled_run_stops_waiting() {
        let config = test_run_config(0.0);
        let plan = may_first_plan(&config);
        let token = CancellationToken::new();
        token.cancel();

        let source = FakeRds::new("source");
        let dest = FakeRds::new("destination");

        let err = SnapshotRunner::new(&config, &source, &dest)
            .with_cancellation(token)
            .run(&plan)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<WaitError>(),
            Some(WaitError::Cancelled { .. })
        ));
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn share_failure_is_fatal_and_skips_destination() {
        let config = test_run_config(86_400.0);
        let plan = may_first_plan(&config);

        let source = FakeRds::new("source").failing_share();
        let dest = FakeRds::new("destination");

        let err = SnapshotRunner::new(&config, &source, &dest)
            .run(&plan)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Error sharing snapshot"));
        assert!(dest.calls().is_empty());
        assert!(!source.calls().iter().any(|c| matches!(c, Call::Delete(_))));
    }

    #[tokio::test]
    async fn source_delete_failure_skips_pruning() {
        let config = test_run_config(86_400.0);
        let plan = may_first_plan(&config);

        let source = FakeRds::new("source").failing_delete(&plan.source_snapshot);
        let dest = FakeRds::new("destination");

        let err = SnapshotRunner::new(&config, &source, &dest)
            .run(&plan)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Error deleting snapshot"));
        assert!(!dest.calls().iter().any(|c| matches!(c, Call::List(_))));
    }

    #[tokio::test]
    async fn zero_retention_never_lists_destination() {
        let config = test_run_config(0.0);
        let dest = FakeRds::new("destination");
        let source = FakeRds::new("source");

        let outcome = SnapshotRunner::new(&config, &source, &dest)
            .prune(Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome, PruneOutcome::Disabled);
        assert!(dest.calls().is_empty());
    }

    #[tokio::test]
    async fn prune_failures_fail_the_run_after_trying_all() {
        let config = test_run_config(86_400.0);
        let now = Utc::now();
        let source = FakeRds::new("source");
        let dest = FakeRds::new("destination")
            .with_snapshots(vec![
                aged_snapshot("cp-orders-db-2024-03-01", "orders-db", now, 60),
                aged_snapshot("cp-orders-db-2024-03-02", "orders-db", now, 59),
            ])
            .failing_delete("cp-orders-db-2024-03-01");

        let err = SnapshotRunner::new(&config, &source, &dest)
            .prune(now)
            .await
            .unwrap_err();

        match err.downcast_ref::<RunError>() {
            Some(RunError::PruneFailed { failures }) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].snapshot_id, "cp-orders-db-2024-03-01");
            }
            other => panic!("expected prune failure, got {other:?}"),
        }
        assert!(dest.calls().contains(&Call::Delete("cp-orders-db-2024-03-02".to_string())));
    }

    #[tokio::test]
    async fn dry_run_makes_no_snapshot_calls() {
        let mut config = test_run_config(86_400.0);
        config.flags.dry_run = true;
        let plan = may_first_plan(&config);
        let source = FakeRds::new("source");
        let dest = FakeRds::new("destination");

        let report = run_plan(&config, &source, &dest, &plan, CancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_none());
        assert!(source.calls().is_empty());
        assert!(dest.calls().is_empty());
    }

    #[tokio::test]
    async fn report_is_written_after_successful_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let mut config = test_run_config(0.0);
        config.flags.output = Some(path.to_str().unwrap().to_string());
        let plan = may_first_plan(&config);
        let source = FakeRds::new("source");
        let dest = FakeRds::new("destination");

        let report = run_plan(&config, &source, &dest, &plan, CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["plan"]["copy_snapshot"], "cp-orders-db-2024-05-01");
        assert_eq!(written["created"], report.created);
        assert_eq!(written["prune"]["status"], "disabled");
    }

    #[tokio::test]
    async fn failed_run_writes_no_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let mut config = test_run_config(0.0);
        config.flags.output = Some(path.to_str().unwrap().to_string());
        let plan = may_first_plan(&config);
        let source = FakeRds::new("source").failing_share();
        let dest = FakeRds::new("destination");

        run_plan(&config, &source, &dest, &plan, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn prune_listing_failure_is_fatal() {
        let config = test_run_config(86_400.0);
        let source = FakeRds::new("source");
        let dest = FakeRds::new("destination").failing_list();

        let err = SnapshotRunner::new(&config, &source, &dest)
            .prune(Utc::now())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Error cleaning old snapshots"));
    }

    #[tokio::test]
    async fn retention_boundary_uses_run_time() {
        let config = test_run_config(86_400.0);
        let now = Utc::now();
        let source = FakeRds::new("source");
        let dest = FakeRds::new("destination").with_snapshots(vec![
            rds_share_common::SnapshotInfo {
                created_at: Some(now - Duration::seconds(86_400)),
                ..snapshot_with_status("cp-orders-db-exact", "available")
            },
        ]);

        let outcome = SnapshotRunner::new(&config, &source, &dest)
            .prune(now)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PruneOutcome::Completed {
                scanned: 1,
                deleted: vec![],
            }
        );
    }
}
