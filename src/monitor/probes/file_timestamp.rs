use crate::error::ProbeError;
use crate::monitor::probe::{Probe, ProbeFuture, ProbeReading};
use crate::monitor::snapshot::ActivityEntry;
use crate::patches::ReportStore;
use std::sync::Arc;
use std::time::Duration;

/// The `limit` most recently modified completion reports.
pub struct FileTimestampProbe {
    name: String,
    reports: Arc<dyn ReportStore>,
    limit: usize,
    timeout: Duration,
}

impl FileTimestampProbe {
    pub fn new(reports: Arc<dyn ReportStore>, limit: usize, timeout: Duration) -> Self {
        Self {
            name: "recent-activity".into(),
            reports,
            limit,
            timeout,
        }
    }
}

impl Probe for FileTimestampProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn probe(&self) -> ProbeFuture<'_> {
        Box::pin(async move {
            let reports = Arc::clone(&self.reports);
            let limit = self.limit;
            let listed = tokio::task::spawn_blocking(move || reports.list_reports())
                .await
                .map_err(|e| ProbeError::Spawn {
                    probe: self.name.clone(),
                    message: e.to_string(),
                })?
                .map_err(|e| ProbeError::Transport {
                    probe: self.name.clone(),
                    message: e.to_string(),
                })?;

            let mut entries: Vec<ActivityEntry> = listed
                .into_iter()
                .map(|r| ActivityEntry {
                    id: r.id,
                    file: r.file_name,
                    modified: r.produced_at,
                    size_bytes: r.size_bytes,
                })
                .collect();
            entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.id.cmp(&b.id)));
            entries.truncate(limit);
            Ok(ProbeReading::Activity(entries))
        })
    }
}
