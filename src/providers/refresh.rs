//! Periodic rate refresh as a cancellable background task.
//!
//! A [`RateRefresher`] queries its targets on every tick and publishes each result as a
//! [`RateUpdate`] on an `mpsc` channel. The fetch cadence is owned here and knows
//! nothing about how updates are rendered.
use crate::core::currency::{CurrencyRateProvider, RateTable};
use crate::core::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTarget {
    Pair { base: String, target: String },
    Table { base: String },
}

impl RefreshTarget {
    pub fn pair(base: &str, target: &str) -> Self {
        RefreshTarget::Pair {
            base: base.to_string(),
            target: target.to_string(),
        }
    }

    pub fn table(base: &str) -> Self {
        RefreshTarget::Table {
            base: base.to_string(),
        }
    }
}

impl Display for RefreshTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshTarget::Pair { base, target } => write!(f, "{base}/{target}"),
            RefreshTarget::Table { base } => write!(f, "{base}/*"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RateSnapshot {
    Pair(f64),
    Table(RateTable),
}

#[derive(Debug)]
pub struct RateUpdate {
    pub target: RefreshTarget,
    pub fetched_at: DateTime<Utc>,
    pub result: Result<RateSnapshot>,
}

pub struct RateRefresher {
    provider: Arc<dyn CurrencyRateProvider + Send + Sync>,
    targets: Vec<RefreshTarget>,
    interval: Duration,
}

impl RateRefresher {
    pub fn new(
        provider: Arc<dyn CurrencyRateProvider + Send + Sync>,
        interval: Duration,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(EngineError::invalid_input("Refresh interval must be non-zero"));
        }
        Ok(Self {
            provider,
            targets: Vec::new(),
            interval,
        })
    }

    pub fn watch(mut self, target: RefreshTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// Starts refreshing. The first round runs immediately.
    pub fn spawn(self, updates: mpsc::Sender<RateUpdate>) -> RefreshHandle {
        let cancel = CancellationToken::new();
        info!(
            targets = self.targets.len(),
            "Starting rate refresher every {:?}", self.interval
        );
        let task = tokio::spawn(self.run(updates, cancel.clone()));
        RefreshHandle { cancel, task }
    }

    async fn run(self, updates: mpsc::Sender<RateUpdate>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Rate refresher cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    if !self.refresh_all(&updates, &cancel).await {
                        break;
                    }
                }
            }
        }
    }

    /// Returns `false` once the refresher should stop.
    async fn refresh_all(
        &self,
        updates: &mpsc::Sender<RateUpdate>,
        cancel: &CancellationToken,
    ) -> bool {
        for target in &self.targets {
            let result = match target {
                RefreshTarget::Pair { base, target } => self
                    .provider
                    .get_rate(base, target)
                    .await
                    .map(RateSnapshot::Pair),
                RefreshTarget::Table { base } => self
                    .provider
                    .get_all_rates(base)
                    .await
                    .map(RateSnapshot::Table),
            };

            // A lookup that was already in flight is allowed to finish, but its
            // result is dropped once the caller has gone away.
            if cancel.is_cancelled() {
                debug!(target = %target, "Discarding rate fetched after cancellation");
                return false;
            }

            let update = RateUpdate {
                target: target.clone(),
                fetched_at: Utc::now(),
                result,
            };
            // A full channel must not keep the refresher alive past cancellation.
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!(target = %target, "Dropping undelivered update after cancellation");
                    return false;
                }
                sent = updates.send(update) => {
                    if sent.is_err() {
                        debug!("Update channel closed, stopping rate refresher");
                        return false;
                    }
                }
            }
        }
        true
    }
}

pub struct RefreshHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels and waits for the task to wind down.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            debug!("Rate refresher task ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl CountingProvider {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
            })
        }
    }

    #[async_trait]
    impl CurrencyRateProvider for CountingProvider {
        async fn get_rate(&self, _from: &str, _to: &str) -> Result<f64> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(1.0 + n as f64 / 100.0)
        }

        async fn get_all_rates(&self, base: &str) -> Result<RateTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::rate_unavailable(format!("{base}/*"), "offline"))
        }
    }

    #[tokio::test]
    async fn test_publishes_updates_each_tick() {
        let provider = CountingProvider::new(Duration::ZERO);
        let (tx, mut rx) = mpsc::channel(8);
        let handle = RateRefresher::new(provider.clone(), Duration::from_millis(10))
            .unwrap()
            .watch(RefreshTarget::pair("USD", "EUR"))
            .spawn(tx);

        let mut rates = Vec::new();
        for _ in 0..3 {
            let update = rx.recv().await.expect("refresher should publish");
            assert_eq!(update.target, RefreshTarget::pair("USD", "EUR"));
            match update.result {
                Ok(RateSnapshot::Pair(rate)) => rates.push(rate),
                other => panic!("unexpected update: {other:?}"),
            }
        }
        handle.stop().await;

        assert_eq!(rates, vec![1.0, 1.01, 1.02]);
    }

    #[tokio::test]
    async fn test_failures_are_published() {
        let provider = CountingProvider::new(Duration::ZERO);
        let (tx, mut rx) = mpsc::channel(8);
        let handle = RateRefresher::new(provider, Duration::from_millis(10))
            .unwrap()
            .watch(RefreshTarget::table("USD"))
            .spawn(tx);

        let update = rx.recv().await.unwrap();
        assert_eq!(update.target.to_string(), "USD/*");
        assert!(update.result.unwrap_err().is_rate_unavailable());
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_in_flight_result_is_discarded_after_cancel() {
        let provider = CountingProvider::new(Duration::from_millis(50));
        let (tx, mut rx) = mpsc::channel(8);
        let handle = RateRefresher::new(provider.clone(), Duration::from_secs(60))
            .unwrap()
            .watch(RefreshTarget::pair("USD", "EUR"))
            .spawn(tx);

        // Let the first lookup start, then abandon it.
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.stop().await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stops_when_receiver_dropped() {
        let provider = CountingProvider::new(Duration::ZERO);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = RateRefresher::new(provider, Duration::from_millis(5))
            .unwrap()
            .watch(RefreshTarget::pair("USD", "EUR"))
            .spawn(tx);

        tokio::time::timeout(Duration::from_secs(1), async {
            while !handle.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("refresher should stop on its own");
    }

    #[tokio::test]
    async fn test_stop_returns_when_updates_are_not_drained() {
        let provider = CountingProvider::new(Duration::ZERO);
        let (tx, _rx) = mpsc::channel(1);
        let handle = RateRefresher::new(provider, Duration::from_millis(5))
            .unwrap()
            .watch(RefreshTarget::pair("USD", "EUR"))
            .spawn(tx);

        // The buffer fills and the refresher blocks on the next send.
        tokio::time::sleep(Duration::from_millis(50)).await;
        tokio::time::timeout(Duration::from_secs(2), handle.stop())
            .await
            .expect("stop should not wait on a full channel");
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let provider = CountingProvider::new(Duration::ZERO);
        assert!(RateRefresher::new(provider, Duration::ZERO).is_err());
    }
}
