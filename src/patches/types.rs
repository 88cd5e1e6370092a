use super::id::PatchCoordinates;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Collection a work item currently lives in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PatchState {
    Pending,
    Completed,
    Failed,
    Archived,
}

impl PatchState {
    /// Whether `self -> to` is one of the permitted moves.
    pub fn can_move_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Completed | Self::Failed) | (Self::Completed, Self::Archived)
        )
    }

    /// The states an item may be moved out of on its way to `to`.
    pub fn sources_for(to: Self) -> &'static [Self] {
        match to {
            Self::Completed | Self::Failed => &[Self::Pending],
            Self::Archived => &[Self::Completed],
            Self::Pending => &[],
        }
    }
}

/// Obligations declared by a work item's author.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchFlags {
    #[serde(default)]
    pub enforce_validation_gate: bool,
    #[serde(default)]
    pub require_mutation_proof: bool,
    #[serde(default)]
    pub strict_runtime_audit: bool,
}

impl PatchFlags {
    pub const fn all() -> Self {
        Self {
            enforce_validation_gate: true,
            require_mutation_proof: true,
            strict_runtime_audit: true,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.enforce_validation_gate && self.require_mutation_proof && self.strict_runtime_audit
    }

    /// Descriptor keys of the flags that are not set.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.enforce_validation_gate {
            missing.push("enforceValidationGate");
        }
        if !self.require_mutation_proof {
            missing.push("requireMutationProof");
        }
        if !self.strict_runtime_audit {
            missing.push("strictRuntimeAudit");
        }
        missing
    }
}

/// Body of a work-item descriptor file. Only the flags matter here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkItemDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub flags: PatchFlags,
}

/// A patch as found in one of the state collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub file_name: String,
    pub state: PatchState,
    #[serde(default)]
    pub coordinates: Option<PatchCoordinates>,
    #[serde(default)]
    pub flags: PatchFlags,
}

impl WorkItem {
    pub fn new(id: impl Into<String>, state: PatchState, flags: PatchFlags) -> Self {
        let id = id.into();
        Self {
            file_name: super::id::patch_file_name(&id),
            coordinates: PatchCoordinates::parse(&id),
            id,
            state,
            flags,
        }
    }

    /// Eligible for trusted execution only when every obligation is declared.
    pub fn is_trusted_eligible(&self) -> bool {
        self.flags.is_complete()
    }
}

/// Completion report. The body is free-form; only existence and time count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub id: String,
    pub file_name: String,
    pub produced_at: DateTime<Utc>,
    #[serde(default)]
    pub size_bytes: u64,
}

impl CompletionReport {
    pub fn new(id: impl Into<String>, produced_at: DateTime<Utc>) -> Self {
        let id = id.into();
        Self {
            file_name: super::id::report_file_name(&id),
            id,
            produced_at,
            size_bytes: 0,
        }
    }
}
