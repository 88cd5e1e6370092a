use super::types::{CompletionReport, PatchState, WorkItem};
use crate::error::StoreError;

/// Repository over the patch state collections.
///
/// Membership in a collection is the item's state; moving between
/// collections is the only mutation.
pub trait PatchStore: Send + Sync {
    /// Human-readable adapter name (e.g. "fs", "memory")
    fn name(&self) -> &str;

    /// Every work item currently held in `state`.
    fn list(&self, state: PatchState) -> Result<Vec<WorkItem>, StoreError>;

    /// Move `id` into `to`. Only pending→completed, pending→failed and
    /// completed→archived are accepted.
    fn move_item(&self, id: &str, to: PatchState) -> Result<WorkItem, StoreError>;

    fn list_pending(&self) -> Result<Vec<WorkItem>, StoreError> {
        self.list(PatchState::Pending)
    }

    fn list_completed(&self) -> Result<Vec<WorkItem>, StoreError> {
        self.list(PatchState::Completed)
    }

    fn list_failed(&self) -> Result<Vec<WorkItem>, StoreError> {
        self.list(PatchState::Failed)
    }

    fn list_archived(&self) -> Result<Vec<WorkItem>, StoreError> {
        self.list(PatchState::Archived)
    }

    fn complete(&self, id: &str) -> Result<WorkItem, StoreError> {
        self.move_item(id, PatchState::Completed)
    }

    fn fail(&self, id: &str) -> Result<WorkItem, StoreError> {
        self.move_item(id, PatchState::Failed)
    }

    fn archive(&self, id: &str) -> Result<WorkItem, StoreError> {
        self.move_item(id, PatchState::Archived)
    }
}

/// Repository over completion reports.
pub trait ReportStore: Send + Sync {
    fn name(&self) -> &str;

    fn list_reports(&self) -> Result<Vec<CompletionReport>, StoreError>;
}

/// Resolve where `id` currently lives among the states allowed to move to
/// `to`, producing the matching transition error otherwise.
pub(crate) fn locate_for_move<F>(id: &str, to: PatchState, mut lookup: F) -> Result<PatchState, StoreError>
where
    F: FnMut(PatchState) -> Result<bool, StoreError>,
{
    for from in PatchState::sources_for(to) {
        if lookup(*from)? {
            return Ok(*from);
        }
    }

    for other in [
        PatchState::Pending,
        PatchState::Completed,
        PatchState::Failed,
        PatchState::Archived,
    ] {
        if !PatchState::sources_for(to).contains(&other) && lookup(other)? {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: other.to_string(),
                to: to.to_string(),
            });
        }
    }

    Err(StoreError::NotFound {
        id: id.to_string(),
        state: PatchState::sources_for(to)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("|"),
    })
}
