use super::aggregator::HealthAggregator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owns the single ticking task that drives a [`HealthAggregator`].
///
/// `stop` lets an in-flight tick finish before returning. Dropping the
/// scheduler without `stop` aborts the task.
pub struct MonitorScheduler {
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl MonitorScheduler {
    /// First tick fires immediately, then every `interval`.
    pub fn start(aggregator: Arc<HealthAggregator>, interval: Duration) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(run_monitor_loop(aggregator, interval, rx));
        tracing::info!(interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX), "monitor started");
        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take()
            && let Err(error) = handle.await
        {
            tracing::error!(%error, "monitor task ended abnormally");
        }
        tracing::info!("monitor stopped");
    }
}

impl Drop for MonitorScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn run_monitor_loop(
    aggregator: Arc<HealthAggregator>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                aggregator.tick().await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() { break; }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::monitor::probe::{Probe, ProbeFuture, ProbeReading};
    use crate::patches::{LifecycleReconciler, MemoryPatchStore, MemoryReportStore};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn aggregator() -> Arc<HealthAggregator> {
        Arc::new(HealthAggregator::new(LifecycleReconciler::new(
            Arc::new(MemoryPatchStore::new()),
            Arc::new(MemoryReportStore::new()),
        )))
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_interval_until_stopped() {
        let aggregator = aggregator();
        let scheduler = MonitorScheduler::start(Arc::clone(&aggregator), Duration::from_secs(3));
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(9_500)).await;
        scheduler.stop().await;

        let ticks = aggregator.latest().unwrap().tick;
        assert_eq!(ticks, 4);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(aggregator.latest().unwrap().tick, ticks);
    }

    /// Blocks for a while, then records that it finished.
    struct SlowProbe {
        started: Arc<AtomicUsize>,
        finished: Arc<AtomicBool>,
    }

    impl Probe for SlowProbe {
        fn name(&self) -> &str {
            "slow"
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(10)
        }

        fn probe(&self) -> ProbeFuture<'_> {
            Box::pin(async move {
                self.started.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(400)).await;
                self.finished.store(true, Ordering::SeqCst);
                Ok::<_, ProbeError>(ProbeReading::Alive(true))
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_waits_for_in_flight_tick() {
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));
        let aggregator = Arc::new(
            HealthAggregator::new(LifecycleReconciler::new(
                Arc::new(MemoryPatchStore::new()),
                Arc::new(MemoryReportStore::new()),
            ))
            .with_subsystem(
                Arc::new(SlowProbe {
                    started: Arc::clone(&started),
                    finished: Arc::clone(&finished),
                }),
                false,
            ),
        );

        let scheduler = MonitorScheduler::start(Arc::clone(&aggregator), Duration::from_secs(60));
        while started.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        scheduler.stop().await;

        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(aggregator.latest().unwrap().tick, 1);
    }
}
