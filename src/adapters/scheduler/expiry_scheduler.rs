//! ExpiryScheduler - Background loop that runs the expiry sweep on a timer.
//!
//! It is the only component that starts transitions without external input.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 300s | Time between sweeps |
//!
//! Batch size belongs to the `ExpirySweepHandler` it drives.
//!
//! ## Graceful Shutdown
//!
//! A shutdown signal is observed between sweeps; a sweep in progress always
//! runs to completion.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::application::handlers::{ExpirySweepHandler, RunExpirySweepCommand, SweepReport};
use crate::config::SchedulerConfig;
use crate::domain::foundation::Timestamp;

#[derive(Debug, Clone)]
pub struct ExpirySchedulerConfig {
    pub interval: Duration,
}

impl Default for ExpirySchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
        }
    }
}

impl From<&SchedulerConfig> for ExpirySchedulerConfig {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            interval: config.interval(),
        }
    }
}

pub struct ExpiryScheduler {
    sweeper: Arc<ExpirySweepHandler>,
    config: ExpirySchedulerConfig,
}

impl ExpiryScheduler {
    pub fn new(sweeper: Arc<ExpirySweepHandler>, config: ExpirySchedulerConfig) -> Self {
        Self { sweeper, config }
    }

    /// Runs sweeps until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// A failed sweep is logged and retried on the next tick.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            "Expiry scheduler started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Expiry scheduler stopping");
                        return;
                    }
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// Runs exactly one sweep at the current time.
    pub async fn tick(&self) -> Option<SweepReport> {
        let cmd = RunExpirySweepCommand {
            now: Timestamp::now(),
        };
        match self.sweeper.handle(cmd).await {
            Ok(report) => Some(report),
            Err(err) => {
                tracing::error!(error = %err, "Expiry sweep failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBillingStore;
    use crate::domain::foundation::{PlanId, SubscriptionId, UserId};
    use crate::domain::subscription::{Subscription, SubscriptionStatus};
    use crate::ports::SubscriptionRepository;

    async fn seed_lapsed_trial(store: &Arc<InMemoryBillingStore>) -> SubscriptionId {
        let created = Subscription::start_trial(
            SubscriptionId::new(),
            UserId::new("learner-7").unwrap(),
            PlanId::new(),
            Timestamp::now().add_days(-10),
            7,
        );
        store
            .create(&created.subscription, &created.audit)
            .await
            .unwrap();
        created.subscription.id
    }

    fn scheduler(store: &Arc<InMemoryBillingStore>, interval: Duration) -> ExpiryScheduler {
        ExpiryScheduler::new(
            Arc::new(ExpirySweepHandler::new(store.clone(), 50)),
            ExpirySchedulerConfig { interval },
        )
    }

    #[tokio::test]
    async fn tick_expires_lapsed_trial() {
        let store = Arc::new(InMemoryBillingStore::new());
        let id = seed_lapsed_trial(&store).await;

        let report = scheduler(&store, Duration::from_secs(60)).tick().await.unwrap();

        assert_eq!(report.expired_count, 1);
        let stored = SubscriptionRepository::find_by_id(store.as_ref(), &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Expired);
    }

    #[tokio::test]
    async fn run_sweeps_then_stops_on_shutdown() {
        let store = Arc::new(InMemoryBillingStore::new());
        let id = seed_lapsed_trial(&store).await;
        let scheduler = Arc::new(scheduler(&store, Duration::from_millis(10)));
        let (tx, rx) = watch::channel(false);

        let task = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.run(rx).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("scheduler did not stop")
            .unwrap();

        let stored = SubscriptionRepository::find_by_id(store.as_ref(), &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Expired);
    }

    #[tokio::test]
    async fn dropped_sender_stops_loop() {
        let store = Arc::new(InMemoryBillingStore::new());
        let scheduler = scheduler(&store, Duration::from_secs(3600));
        let (tx, rx) = watch::channel(false);
        drop(tx);

        tokio::time::timeout(Duration::from_secs(1), scheduler.run(rx))
            .await
            .expect("scheduler did not stop");
    }

    #[test]
    fn config_from_settings() {
        let settings = SchedulerConfig {
            interval_secs: 42,
            ..Default::default()
        };
        assert_eq!(
            ExpirySchedulerConfig::from(&settings).interval,
            Duration::from_secs(42)
        );
    }
}
