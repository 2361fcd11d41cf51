//! ExpirySweepHandler - Expires trials and paid periods that have elapsed.
//!
//! A sweep handles at most `batch_size` rows so a large backlog is drained
//! over several runs. Re-running after a partial failure is safe: rows that
//! already moved no longer match the due query, and each row is re-checked
//! against its freshly read state before the transition is applied.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{SubscriptionId, Timestamp};
use crate::domain::subscription::SubscriptionError;
use crate::ports::SubscriptionRepository;

use super::super::subscription::{Decision, ExecutionOutcome, TransitionExecutor};

#[derive(Debug, Clone, Copy)]
pub struct RunExpirySweepCommand {
    pub now: Timestamp,
}

/// One row that could not be expired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFailure {
    pub subscription_id: SubscriptionId,
    pub error: SubscriptionError,
}

/// Summary of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub expired_count: usize,
    /// Rows that were no longer due when re-read.
    pub skipped: usize,
    pub errors: Vec<SweepFailure>,
}

/// Wire form of [`SweepReport`].
#[derive(Debug, Clone, Serialize)]
pub struct SweepReportView {
    pub examined: usize,
    pub expired_count: usize,
    pub skipped: usize,
    pub errors: Vec<SweepFailureView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepFailureView {
    pub subscription_id: SubscriptionId,
    pub code: String,
    pub message: String,
}

impl From<&SweepReport> for SweepReportView {
    fn from(report: &SweepReport) -> Self {
        Self {
            examined: report.examined,
            expired_count: report.expired_count,
            skipped: report.skipped,
            errors: report
                .errors
                .iter()
                .map(|f| SweepFailureView {
                    subscription_id: f.subscription_id,
                    code: f.error.code().to_string(),
                    message: f.error.message(),
                })
                .collect(),
        }
    }
}

pub struct ExpirySweepHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    executor: TransitionExecutor,
    batch_size: u32,
}

impl ExpirySweepHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, batch_size: u32) -> Self {
        Self {
            executor: TransitionExecutor::new(subscriptions.clone()),
            subscriptions,
            batch_size,
        }
    }

    /// Runs one sweep at `now`.
    ///
    /// Only the initial query can fail the sweep; per-row errors are
    /// collected into the report.
    pub async fn handle(&self, cmd: RunExpirySweepCommand) -> Result<SweepReport, SubscriptionError> {
        let now = cmd.now;
        let due = self
            .subscriptions
            .find_due_for_expiry(now, self.batch_size)
            .await?;

        let mut report = SweepReport {
            examined: due.len(),
            ..Default::default()
        };

        for subscription in due {
            let result = self
                .executor
                .execute(subscription.id, now, |current, now| {
                    if !current.is_due_for_expiry(now) {
                        return Ok(Decision::Skip);
                    }
                    Ok(current
                        .expiry_event()
                        .map(Decision::apply)
                        .unwrap_or(Decision::Skip))
                })
                .await;

            match result {
                Ok(ExecutionOutcome::Applied { .. }) => report.expired_count += 1,
                Ok(_) => report.skipped += 1,
                Err(error) => {
                    tracing::error!(
                        subscription_id = %subscription.id,
                        error = %error,
                        "Failed to expire subscription"
                    );
                    report.errors.push(SweepFailure {
                        subscription_id: subscription.id,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            examined = report.examined,
            expired = report.expired_count,
            skipped = report.skipped,
            failed = report.errors.len(),
            "Expiry sweep finished"
        );

        Ok(report)
    }

    /// Shorthand for `handle(RunExpirySweepCommand { now })`.
    pub async fn sweep(&self, now: Timestamp) -> Result<SweepReport, SubscriptionError> {
        self.handle(RunExpirySweepCommand { now }).await
    }
}
