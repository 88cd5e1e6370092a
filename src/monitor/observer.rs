use super::snapshot::{ChangeRecord, HealthSnapshot};

/// Read-only consumer of published snapshots.
///
/// Observers run on their own task and only ever see the newest snapshot;
/// a slow observer skips intermediate ticks instead of holding up the
/// aggregator.
pub trait SnapshotObserver: Send + Sync {
    fn name(&self) -> &str;

    /// `changes` are the transitions detected on this tick.
    fn on_snapshot(&self, snapshot: &HealthSnapshot, changes: &[ChangeRecord]);
}

/// Emits one tracing event per transition plus a debug summary per tick.
pub struct LogObserver;

impl SnapshotObserver for LogObserver {
    fn name(&self) -> &str {
        "log"
    }

    fn on_snapshot(&self, snapshot: &HealthSnapshot, changes: &[ChangeRecord]) {
        for change in changes {
            tracing::info!(
                change_type = %change.change_type,
                field = %change.field,
                old = %change.old_value,
                new = %change.new_value,
                "snapshot.transition"
            );
        }
        tracing::debug!(
            tick = snapshot.tick,
            pending = snapshot.patches.pending,
            completed = snapshot.patches.completed,
            failed = snapshot.patches.failed,
            endpoint = %snapshot.endpoint.status,
            "snapshot.tick"
        );
    }
}

/// Adapts a closure.
pub struct FnObserver<F> {
    name: String,
    f: F,
}

impl<F> FnObserver<F>
where
    F: Fn(&HealthSnapshot, &[ChangeRecord]) + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> SnapshotObserver for FnObserver<F>
where
    F: Fn(&HealthSnapshot, &[ChangeRecord]) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_snapshot(&self, snapshot: &HealthSnapshot, changes: &[ChangeRecord]) {
        (self.f)(snapshot, changes);
    }
}
