use super::id::compare_ids;
use super::store::{PatchStore, ReportStore, locate_for_move};
use super::types::{CompletionReport, PatchFlags, PatchState, WorkItem};
use crate::error::StoreError;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// In-memory patch store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryPatchStore {
    items: Mutex<BTreeMap<String, WorkItem>>,
    failing: Mutex<Vec<PatchState>>,
}

impl MemoryPatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: &str, state: PatchState, flags: PatchFlags) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), WorkItem::new(id, state, flags));
    }

    pub fn with_items<'a>(items: impl IntoIterator<Item = (&'a str, PatchState)>) -> Self {
        let store = Self::new();
        for (id, state) in items {
            store.insert(id, state, PatchFlags::default());
        }
        store
    }

    /// Make every `list(state)` call fail, simulating an unreadable collection.
    pub fn fail_reads(&self, state: PatchState) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(state);
    }

    fn state_of(&self, id: &str) -> Option<PatchState> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(|item| item.state)
    }
}

impl PatchStore for MemoryPatchStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn list(&self, state: PatchState) -> Result<Vec<WorkItem>, StoreError> {
        if self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&state)
        {
            return Err(StoreError::Read {
                collection: state.to_string(),
                path: "memory".into(),
                source: std::io::Error::other("simulated read failure"),
            });
        }

        let mut items: Vec<WorkItem> = self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|item| item.state == state)
            .cloned()
            .collect();
        items.sort_by(|a, b| compare_ids(&a.id, &b.id));
        Ok(items)
    }

    fn move_item(&self, id: &str, to: PatchState) -> Result<WorkItem, StoreError> {
        locate_for_move(id, to, |state| Ok(self.state_of(id) == Some(state)))?;

        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        let item = items.get_mut(id).ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
            state: to.to_string(),
        })?;
        item.state = to;
        Ok(item.clone())
    }
}

/// In-memory report store.
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    reports: Mutex<Vec<CompletionReport>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, report: CompletionReport) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report);
    }

    pub fn with_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let store = Self::new();
        for id in ids {
            store.add(CompletionReport::new(id, chrono::Utc::now()));
        }
        store
    }
}

impl ReportStore for MemoryReportStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn list_reports(&self) -> Result<Vec<CompletionReport>, StoreError> {
        let mut reports = self
            .reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        reports.sort_by(|a, b| b.produced_at.cmp(&a.produced_at));
        Ok(reports)
    }
}
