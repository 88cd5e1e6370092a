use super::id::compare_ids;
use super::store::{PatchStore, ReportStore};
use super::types::PatchState;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Effective state of every known work item.
///
/// `pending`, `completed` and `failed` are pairwise disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub pending: BTreeSet<String>,
    pub completed: BTreeSet<String>,
    pub failed: BTreeSet<String>,
}

impl Reconciliation {
    pub fn total(&self) -> usize {
        self.pending.len() + self.completed.len() + self.failed.len()
    }

    /// First `limit` pending ids in phase/step/attempt order.
    pub fn queue_preview(&self, limit: usize) -> Vec<String> {
        let mut queue: Vec<&String> = self.pending.iter().collect();
        queue.sort_by(|a, b| compare_ids(a, b));
        queue.into_iter().take(limit).cloned().collect()
    }

    pub fn state_of(&self, id: &str) -> Option<PatchState> {
        if self.failed.contains(id) {
            Some(PatchState::Failed)
        } else if self.completed.contains(id) {
            Some(PatchState::Completed)
        } else if self.pending.contains(id) {
            Some(PatchState::Pending)
        } else {
            None
        }
    }
}

/// Ids per physical collection plus the ids that have a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreView {
    pub pending: BTreeSet<String>,
    pub completed: BTreeSet<String>,
    pub archived: BTreeSet<String>,
    pub failed: BTreeSet<String>,
    pub reports: BTreeSet<String>,
}

/// `completed = patch_ids ∩ report_ids`, `pending = patch_ids − completed`.
pub fn reconcile(patch_ids: &BTreeSet<String>, report_ids: &BTreeSet<String>) -> Reconciliation {
    reconcile_view(&StoreView {
        pending: patch_ids.clone(),
        reports: report_ids.clone(),
        ..StoreView::default()
    })
}

/// Full reconciliation over every collection.
///
/// An item counts as completed when it has a report or physically sits in the
/// completed/archived collections. The failed collection always wins.
/// Reports without a matching work item are ignored.
pub fn reconcile_view(view: &StoreView) -> Reconciliation {
    let failed = view.failed.clone();

    let known: BTreeSet<String> = view
        .pending
        .iter()
        .chain(&view.completed)
        .chain(&view.archived)
        .filter(|id| !failed.contains(*id))
        .cloned()
        .collect();

    let completed: BTreeSet<String> = known
        .iter()
        .filter(|id| {
            view.reports.contains(*id) || view.completed.contains(*id) || view.archived.contains(*id)
        })
        .cloned()
        .collect();

    let pending = known.difference(&completed).cloned().collect();

    Reconciliation {
        pending,
        completed,
        failed,
    }
}

/// Derives the effective lifecycle state straight from the two stores on
/// every call. Nothing is cached between calls.
#[derive(Clone)]
pub struct LifecycleReconciler {
    patches: Arc<dyn PatchStore>,
    reports: Arc<dyn ReportStore>,
}

impl LifecycleReconciler {
    pub fn new(patches: Arc<dyn PatchStore>, reports: Arc<dyn ReportStore>) -> Self {
        Self { patches, reports }
    }

    /// Read every collection. An unreadable collection is logged and
    /// treated as empty for this call.
    pub fn view(&self) -> StoreView {
        let ids = |state: PatchState| -> BTreeSet<String> {
            match self.patches.list(state) {
                Ok(items) => items.into_iter().map(|item| item.id).collect(),
                Err(error) => {
                    tracing::warn!(%error, %state, "patch collection unreadable; treating as empty");
                    BTreeSet::new()
                }
            }
        };

        let reports = match self.reports.list_reports() {
            Ok(reports) => reports.into_iter().map(|report| report.id).collect(),
            Err(error) => {
                tracing::warn!(%error, "report collection unreadable; treating as empty");
                BTreeSet::new()
            }
        };

        StoreView {
            pending: ids(PatchState::Pending),
            completed: ids(PatchState::Completed),
            archived: ids(PatchState::Archived),
            failed: ids(PatchState::Failed),
            reports,
        }
    }

    pub fn reconcile_now(&self) -> Reconciliation {
        let reconciliation = reconcile_view(&self.view());
        tracing::debug!(
            pending = reconciliation.pending.len(),
            completed = reconciliation.completed.len(),
            failed = reconciliation.failed.len(),
            "reconciled patch lifecycle"
        );
        reconciliation
    }
}
