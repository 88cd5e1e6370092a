use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One recorded operation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl OperationRecord {
    pub fn new(kind: impl Into<String>, success: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: kind.into(),
            success,
            details: serde_json::Map::new(),
        }
    }
}

/// Persisted ledger record.
///
/// Unknown fields are ignored and every field has a default, so records
/// written by newer versions stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustLedgerState {
    #[serde(default = "initial_trust_level")]
    pub trust_level: f64,
    #[serde(default)]
    pub operations: VecDeque<OperationRecord>,
    #[serde(default = "Utc::now")]
    pub last_update: DateTime<Utc>,
    #[serde(default)]
    pub violations: u64,
    #[serde(default)]
    pub total_operations: u64,
}

fn initial_trust_level() -> f64 {
    1.0
}

impl Default for TrustLedgerState {
    fn default() -> Self {
        Self {
            trust_level: initial_trust_level(),
            operations: VecDeque::new(),
            last_update: Utc::now(),
            violations: 0,
            total_operations: 0,
        }
    }
}

impl TrustLedgerState {
    /// Append an outcome, evicting the oldest records beyond `capacity`.
    /// Lifetime counters are never touched by eviction.
    pub fn push(&mut self, record: OperationRecord, capacity: usize) {
        self.total_operations = self.total_operations.saturating_add(1);
        if !record.success {
            self.violations = self.violations.saturating_add(1);
        }
        self.operations.push_back(record);
        while self.operations.len() > capacity.max(1) {
            self.operations.pop_front();
        }
    }

    /// `(total - violations) / total`, `1.0` before any operation.
    pub fn lifetime_success_rate(&self) -> f64 {
        if self.total_operations == 0 {
            return 1.0;
        }
        let successes = self.total_operations.saturating_sub(self.violations);
        ratio(successes, self.total_operations)
    }

    /// Success ratio over the last `min(window, len)` retained records.
    pub fn recent_success_rate(&self, window: usize) -> f64 {
        let take = window.min(self.operations.len());
        if take == 0 {
            return 1.0;
        }
        let successes = self
            .operations
            .iter()
            .rev()
            .take(take)
            .filter(|op| op.success)
            .count();
        ratio(successes as u64, take as u64)
    }

    /// Repair records that violate `violations <= total_operations` or
    /// retain more than `capacity` operations.
    pub(crate) fn normalize(&mut self, capacity: usize) {
        while self.operations.len() > capacity.max(1) {
            self.operations.pop_front();
        }
        if self.violations > self.total_operations {
            self.violations = self.total_operations;
        }
        if !self.trust_level.is_finite() {
            self.trust_level = 0.0;
        }
        self.trust_level = self.trust_level.clamp(0.0, 1.0);
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: u64, denominator: u64) -> f64 {
    numerator as f64 / denominator as f64
}
