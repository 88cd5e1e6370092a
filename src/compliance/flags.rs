use crate::patches::{PatchState, WorkItem};
use serde::Serialize;

/// A work item that does not declare every required flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagFinding {
    pub id: String,
    pub state: PatchState,
    pub missing: Vec<&'static str>,
}

/// Every item not eligible for trusted execution, with the flags it lacks.
pub fn audit_flags<'a>(items: impl IntoIterator<Item = &'a WorkItem>) -> Vec<FlagFinding> {
    items
        .into_iter()
        .filter(|item| !item.is_trusted_eligible())
        .map(|item| FlagFinding {
            id: item.id.clone(),
            state: item.state,
            missing: item.flags.missing(),
        })
        .collect()
}
