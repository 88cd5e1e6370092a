use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchCounts {
    pub pending: usize,
    pub executing: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Subsystem names by liveness, each in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemsStatus {
    pub running: Vec<String>,
    pub stopped: Vec<String>,
    /// Subsystems whose probe failed or timed out this tick.
    pub errors: Vec<String>,
}

impl SystemsStatus {
    fn state_of(&self, name: &str) -> Option<&'static str> {
        let has = |list: &[String]| list.iter().any(|n| n == name);
        if has(&self.running) {
            Some("running")
        } else if has(&self.stopped) {
            Some("stopped")
        } else if has(&self.errors) {
            Some("error")
        } else {
            None
        }
    }

    fn names(&self) -> impl Iterator<Item = &String> {
        self.running.iter().chain(&self.stopped).chain(&self.errors)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStatus {
    /// Reported status, `unreachable` on transport failure, `unconfigured`
    /// when no endpoint is set.
    pub status: String,
    pub last_check: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

pub const ENDPOINT_UNREACHABLE: &str = "unreachable";
pub const ENDPOINT_UNCONFIGURED: &str = "unconfigured";
pub const ENDPOINT_RUNNING: &str = "running";

/// One recent completion report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    pub file: String,
    pub modified: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Fully computed view of one monitoring tick. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub tick: u64,
    pub taken_at: DateTime<Utc>,
    pub patches: PatchCounts,
    /// Next pending ids in execution order.
    pub queue: Vec<String>,
    pub systems: SystemsStatus,
    pub endpoint: EndpointStatus,
    /// Most recent first.
    pub recent_activity: Vec<ActivityEntry>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeType {
    Patches,
    System,
    Endpoint,
    Activity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    pub timestamp: DateTime<Utc>,
}

impl ChangeRecord {
    fn new(
        change_type: ChangeType,
        field: impl Into<String>,
        old_value: impl Into<Value>,
        new_value: impl Into<Value>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            change_type,
            field: field.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
            timestamp,
        }
    }
}

/// Field-by-field comparison of two consecutive snapshots.
///
/// Tick numbers and check timestamps never count as changes. Records carry
/// the timestamp of `next`.
pub fn diff(prev: &HealthSnapshot, next: &HealthSnapshot) -> Vec<ChangeRecord> {
    let at = next.taken_at;
    let mut changes = Vec::new();

    let counters = [
        ("patches.pending", prev.patches.pending, next.patches.pending),
        ("patches.executing", prev.patches.executing, next.patches.executing),
        ("patches.completed", prev.patches.completed, next.patches.completed),
        ("patches.failed", prev.patches.failed, next.patches.failed),
    ];
    for (field, old, new) in counters {
        if old != new {
            changes.push(ChangeRecord::new(ChangeType::Patches, field, old, new, at));
        }
    }

    let mut names: Vec<&String> = next.systems.names().collect();
    for name in prev.systems.names() {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    for name in names {
        let old = prev.systems.state_of(name);
        let new = next.systems.state_of(name);
        if old != new {
            changes.push(ChangeRecord::new(
                ChangeType::System,
                format!("systems.{name}"),
                old.map_or(Value::Null, Value::from),
                new.map_or(Value::Null, Value::from),
                at,
            ));
        }
    }

    if prev.endpoint.status != next.endpoint.status {
        changes.push(ChangeRecord::new(
            ChangeType::Endpoint,
            "endpoint.status",
            prev.endpoint.status.as_str(),
            next.endpoint.status.as_str(),
            at,
        ));
    }

    let head = |s: &HealthSnapshot| s.recent_activity.first().map(|a| (a.id.clone(), a.modified));
    if head(prev) != head(next) {
        let id = |s: &HealthSnapshot| {
            s.recent_activity
                .first()
                .map_or(Value::Null, |a| Value::from(a.id.as_str()))
        };
        changes.push(ChangeRecord::new(
            ChangeType::Activity,
            "recentActivity",
            id(prev),
            id(next),
            at,
        ));
    }

    changes
}
