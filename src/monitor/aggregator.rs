use super::observer::SnapshotObserver;
use super::probe::{Probe, run_probe};
use super::probes::{FileTimestampProbe, HttpProbe, ProcessProbe};
use super::snapshot::{
    ActivityEntry, ChangeRecord, ENDPOINT_UNCONFIGURED, ENDPOINT_UNREACHABLE, EndpointStatus,
    HealthSnapshot, PatchCounts, SystemsStatus, diff,
};
use crate::config::Config;
use crate::error::PersistenceError;
use crate::patches::{
    FsPatchStore, FsReportStore, LifecycleReconciler, PatchStore, Reconciliation, ReportStore,
};
use chrono::Utc;
use futures_util::future::join_all;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A snapshot together with the transitions detected when it was built.
#[derive(Debug, Clone)]
pub struct Publication {
    pub snapshot: Arc<HealthSnapshot>,
    pub changes: Arc<[ChangeRecord]>,
}

struct Subsystem {
    probe: Arc<dyn Probe>,
    executor: bool,
}

struct Endpoint {
    probe: Arc<dyn Probe>,
    url: Option<String>,
}

/// Builds one [`HealthSnapshot`] per tick from the lifecycle reconciler and
/// a set of probes, keeps a bounded change history and publishes every
/// snapshot to observers.
///
/// A tick always yields a snapshot: failed probes only degrade their own
/// field.
pub struct HealthAggregator {
    reconciler: LifecycleReconciler,
    subsystems: Vec<Subsystem>,
    endpoint: Option<Endpoint>,
    activity: Option<Arc<dyn Probe>>,
    queue_preview: usize,
    history_capacity: usize,
    state_file: Option<PathBuf>,
    history: Mutex<VecDeque<ChangeRecord>>,
    ticks: AtomicU64,
    /// Previous snapshot. Held for a whole tick so ticks never interleave.
    previous: tokio::sync::Mutex<Option<Arc<HealthSnapshot>>>,
    published: watch::Sender<Option<Publication>>,
}

impl HealthAggregator {
    pub fn new(reconciler: LifecycleReconciler) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            reconciler,
            subsystems: Vec::new(),
            endpoint: None,
            activity: None,
            queue_preview: 5,
            history_capacity: 10,
            state_file: None,
            history: Mutex::new(VecDeque::new()),
            ticks: AtomicU64::new(0),
            previous: tokio::sync::Mutex::new(None),
            published,
        }
    }

    /// Filesystem stores, `pgrep` subsystem probes and the optional HTTP
    /// endpoint, all as configured.
    pub fn from_config(config: &Config) -> Self {
        let monitor = &config.monitor;
        let patches: Arc<dyn PatchStore> = Arc::new(FsPatchStore::new(config.patches_dir()));
        let reports: Arc<dyn ReportStore> = Arc::new(FsReportStore::new(config.summaries_dir()));
        let process_timeout = Duration::from_millis(monitor.process_timeout_ms);
        let http_timeout = Duration::from_secs(monitor.http_timeout_secs);

        let mut aggregator = Self::new(LifecycleReconciler::new(patches, Arc::clone(&reports)))
            .with_activity(Arc::new(FileTimestampProbe::new(
                reports,
                monitor.recent_activity_limit,
                http_timeout,
            )))
            .with_queue_preview(monitor.queue_preview)
            .with_history_capacity(monitor.history_capacity);

        for sub in &monitor.subsystems {
            aggregator = aggregator.with_subsystem(
                Arc::new(ProcessProbe::new(&sub.name, &sub.pattern, process_timeout)),
                sub.executor,
            );
        }
        if let Some(url) = monitor.health_url.as_deref().filter(|u| !u.is_empty()) {
            aggregator = aggregator.with_endpoint(
                Arc::new(HttpProbe::new("endpoint", url, http_timeout)),
                Some(url.to_string()),
            );
        }
        if let Some(path) = config.monitor_state_path() {
            aggregator = aggregator.with_state_file(path);
        }
        aggregator
    }

    #[must_use]
    pub fn with_subsystem(mut self, probe: Arc<dyn Probe>, executor: bool) -> Self {
        self.subsystems.push(Subsystem { probe, executor });
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, probe: Arc<dyn Probe>, url: Option<String>) -> Self {
        self.endpoint = Some(Endpoint { probe, url });
        self
    }

    #[must_use]
    pub fn with_activity(mut self, probe: Arc<dyn Probe>) -> Self {
        self.activity = Some(probe);
        self
    }

    #[must_use]
    pub fn with_queue_preview(mut self, limit: usize) -> Self {
        self.queue_preview = limit;
        self
    }

    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    /// Run one tick: reconcile, probe everything concurrently, assemble,
    /// diff against the previous snapshot, record and publish.
    pub async fn tick(&self) -> Arc<HealthSnapshot> {
        let mut previous = self.previous.lock().await;
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;

        let reconciler = self.reconciler.clone();
        let reconcile = tokio::task::spawn_blocking(move || reconciler.reconcile_now());
        let subsystems = join_all(
            self.subsystems
                .iter()
                .map(|sub| run_probe(sub.probe.as_ref())),
        );
        let endpoint = async {
            match &self.endpoint {
                Some(endpoint) => Some(run_probe(endpoint.probe.as_ref()).await),
                None => None,
            }
        };
        let activity = async {
            match &self.activity {
                Some(probe) => Some(run_probe(probe.as_ref()).await),
                None => None,
            }
        };
        let (reconciled, readings, endpoint_reading, activity_reading) =
            tokio::join!(reconcile, subsystems, endpoint, activity);

        let reconciled = reconciled.unwrap_or_else(|error| {
            tracing::error!(%error, "reconciliation task failed; reporting empty lifecycle");
            Reconciliation::default()
        });

        let mut systems = SystemsStatus::default();
        let mut executing = 0;
        for (sub, reading) in self.subsystems.iter().zip(readings) {
            let name = sub.probe.name().to_string();
            match reading.and_then(|r| r.into_alive(&name)) {
                Ok(true) => {
                    if sub.executor {
                        executing += 1;
                    }
                    systems.running.push(name);
                }
                Ok(false) => systems.stopped.push(name),
                Err(error) => {
                    tracing::debug!(%error, "subsystem probe failed");
                    systems.errors.push(name);
                }
            }
        }

        let status = match endpoint_reading {
            None => ENDPOINT_UNCONFIGURED.to_string(),
            Some(reading) => reading
                .and_then(|r| r.into_status("endpoint"))
                .unwrap_or_else(|error| {
                    tracing::debug!(%error, "endpoint probe failed");
                    ENDPOINT_UNREACHABLE.to_string()
                }),
        };

        let recent_activity: Vec<ActivityEntry> = match activity_reading {
            None => Vec::new(),
            Some(reading) => reading
                .and_then(|r| r.into_activity("activity"))
                .unwrap_or_else(|error| {
                    tracing::warn!(%error, "activity probe failed");
                    Vec::new()
                }),
        };

        let taken_at = Utc::now();
        let snapshot = Arc::new(HealthSnapshot {
            tick,
            taken_at,
            patches: PatchCounts {
                pending: reconciled.pending.len(),
                executing,
                completed: reconciled.completed.len(),
                failed: reconciled.failed.len(),
            },
            queue: reconciled.queue_preview(self.queue_preview),
            systems,
            endpoint: EndpointStatus {
                status,
                last_check: taken_at,
                url: self.endpoint.as_ref().and_then(|e| e.url.clone()),
            },
            recent_activity,
        });

        let changes: Vec<ChangeRecord> = previous
            .as_deref()
            .map(|prev| diff(prev, &snapshot))
            .unwrap_or_default();
        self.record_changes(&changes);
        *previous = Some(Arc::clone(&snapshot));

        tracing::debug!(
            tick,
            pending = snapshot.patches.pending,
            running = snapshot.systems.running.len(),
            errors = snapshot.systems.errors.len(),
            changes = changes.len(),
            "health tick assembled"
        );

        self.published.send_replace(Some(Publication {
            snapshot: Arc::clone(&snapshot),
            changes: changes.into(),
        }));

        if let Some(path) = &self.state_file
            && let Err(error) = write_snapshot(path, &snapshot).await
        {
            tracing::warn!(%error, "failed to write monitor state file");
        }

        snapshot
    }

    fn record_changes(&self, changes: &[ChangeRecord]) {
        if changes.is_empty() {
            return;
        }
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.extend(changes.iter().cloned());
        while history.len() > self.history_capacity {
            history.pop_front();
        }
    }

    /// Most recent snapshot, `None` before the first tick.
    pub fn latest(&self) -> Option<Arc<HealthSnapshot>> {
        self.published
            .borrow()
            .as_ref()
            .map(|p| Arc::clone(&p.snapshot))
    }

    /// Retained change records, oldest first.
    pub fn history(&self) -> Vec<ChangeRecord> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Publication>> {
        self.published.subscribe()
    }

    /// Deliver every future publication to `observer` on its own task.
    pub fn on_snapshot(&self, observer: Arc<dyn SnapshotObserver>) -> JoinHandle<()> {
        let mut rx = self.published.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let publication = rx.borrow_and_update().clone();
                if let Some(p) = publication {
                    observer.on_snapshot(&p.snapshot, &p.changes);
                }
            }
            tracing::debug!(observer = observer.name(), "snapshot feed closed");
        })
    }

    /// Write the latest snapshot to the configured state file.
    pub async fn persist_latest(&self) -> Result<(), PersistenceError> {
        let (Some(path), Some(snapshot)) = (&self.state_file, self.latest()) else {
            return Ok(());
        };
        write_snapshot(path, &snapshot).await
    }
}

async fn write_snapshot(path: &Path, snapshot: &HealthSnapshot) -> Result<(), PersistenceError> {
    let data = serde_json::to_vec_pretty(snapshot)?;
    let write_err = |source: std::io::Error| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, data).await.map_err(write_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(write_err)?;
    Ok(())
}
