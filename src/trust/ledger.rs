use super::persist::LedgerStore;
use super::state::{OperationRecord, TrustLedgerState};
use crate::config::TrustConfig;
use crate::error::PersistenceError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Outcome of a gate check for one operation kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateDecision {
    pub kind: String,
    pub high_risk: bool,
    pub required: f64,
    pub trust_level: f64,
    pub allowed: bool,
}

/// Summary view of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrustStatus {
    pub trust_level: f64,
    pub meets_default_threshold: bool,
    pub below_alert_threshold: bool,
    pub retained_operations: usize,
    pub total_operations: u64,
    pub violations: u64,
    pub last_update: DateTime<Utc>,
}

/// `lifetime_weight * lifetime + recent_weight * recent`, clamped to `[0, 1]`.
pub fn compute_trust_level(state: &TrustLedgerState, policy: &TrustConfig) -> f64 {
    let level = policy.lifetime_weight * state.lifetime_success_rate()
        + policy.recent_weight * state.recent_success_rate(policy.recent_window);
    if level.is_finite() {
        level.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Persisted, bounded history of operation outcomes plus the derived trust
/// level that gates further operations.
///
/// Mutations hold the state lock across the persist call, so concurrent
/// writers queue instead of interleaving read-modify-persist cycles.
pub struct TrustLedger {
    policy: TrustConfig,
    store: Arc<dyn LedgerStore>,
    state: Mutex<TrustLedgerState>,
}

impl TrustLedger {
    /// Load the persisted record, or start a fresh ledger at `1.0`.
    pub fn open(policy: TrustConfig, store: Arc<dyn LedgerStore>) -> Result<Self, PersistenceError> {
        let state = match store.load()? {
            Some(mut state) => {
                state.normalize(policy.history_capacity);
                tracing::debug!(
                    store = store.name(),
                    trust_level = state.trust_level,
                    total = state.total_operations,
                    "loaded trust ledger"
                );
                state
            }
            None => {
                let state = TrustLedgerState::default();
                if let Err(error) = store.save(&state) {
                    tracing::warn!(%error, "failed to persist fresh trust ledger");
                }
                state
            }
        };

        Ok(Self {
            policy,
            store,
            state: Mutex::new(state),
        })
    }

    pub fn policy(&self) -> &TrustConfig {
        &self.policy
    }

    fn lock(&self) -> MutexGuard<'_, TrustLedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, state: &TrustLedgerState) -> Result<(), PersistenceError> {
        self.store.save(state).inspect_err(|error| {
            tracing::warn!(%error, store = self.store.name(), "failed to persist trust ledger");
        })
    }

    /// Record one outcome, reassess, and persist the full ledger.
    ///
    /// On a persistence failure the in-memory update is kept and the error
    /// is returned.
    pub fn record_operation(&self, kind: &str, success: bool) -> Result<f64, PersistenceError> {
        self.record(OperationRecord::new(kind, success))
    }

    pub fn record_operation_with_details(
        &self,
        kind: &str,
        success: bool,
        details: serde_json::Map<String, serde_json::Value>,
    ) -> Result<f64, PersistenceError> {
        let mut record = OperationRecord::new(kind, success);
        record.details = details;
        self.record(record)
    }

    fn record(&self, record: OperationRecord) -> Result<f64, PersistenceError> {
        let mut state = self.lock();
        tracing::info!(kind = %record.kind, success = record.success, "recording operation");
        state.push(record, self.policy.history_capacity);
        let level = self.reassess_locked(&mut state);
        self.persist(&state)?;
        Ok(level)
    }

    /// Recompute the trust level from the current record and persist it.
    pub fn assess(&self) -> Result<f64, PersistenceError> {
        let mut state = self.lock();
        let level = self.reassess_locked(&mut state);
        self.persist(&state)?;
        Ok(level)
    }

    fn reassess_locked(&self, state: &mut TrustLedgerState) -> f64 {
        let level = compute_trust_level(state, &self.policy);
        state.trust_level = level;
        state.last_update = Utc::now();
        if level < self.policy.alert_threshold {
            tracing::warn!(
                trust_level = level,
                threshold = self.policy.alert_threshold,
                violations = state.violations,
                "trust level below alert threshold"
            );
        }
        level
    }

    pub fn trust_level(&self) -> f64 {
        self.lock().trust_level
    }

    pub fn is_high_risk(&self, kind: &str) -> bool {
        self.policy.high_risk_kinds.iter().any(|k| k == kind)
    }

    pub fn evaluate(&self, kind: &str) -> GateDecision {
        let high_risk = self.is_high_risk(kind);
        let required = if high_risk {
            self.policy.high_risk_threshold
        } else {
            self.policy.default_threshold
        };
        let trust_level = self.trust_level();
        GateDecision {
            kind: kind.to_string(),
            high_risk,
            required,
            trust_level,
            allowed: trust_level >= required,
        }
    }

    pub fn can_proceed(&self, kind: &str) -> bool {
        self.evaluate(kind).allowed
    }

    pub fn status(&self) -> TrustStatus {
        let state = self.lock();
        TrustStatus {
            trust_level: state.trust_level,
            meets_default_threshold: state.trust_level >= self.policy.default_threshold,
            below_alert_threshold: state.trust_level < self.policy.alert_threshold,
            retained_operations: state.operations.len(),
            total_operations: state.total_operations,
            violations: state.violations,
            last_update: state.last_update,
        }
    }

    /// Copy of the full ledger record.
    pub fn snapshot(&self) -> TrustLedgerState {
        self.lock().clone()
    }
}
