use std::path::PathBuf;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `patchwarden`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; the CLI layer continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum WardenError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Patch / report stores ───────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Ledger / snapshot persistence ───────────────────────────────────
    #[error("persistence: {0}")]
    Persistence(#[from] PersistenceError),

    // ── Health probes ───────────────────────────────────────────────────
    #[error("probe: {0}")]
    Probe(#[from] ProbeError),

    // ── Compliance scanning ─────────────────────────────────────────────
    #[error("scan: {0}")]
    Scan(#[from] ScanError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Store errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {collection} collection at {}: {source}", path.display())]
    Read {
        collection: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("work item {id} not found in {state}")]
    NotFound { id: String, state: String },

    #[error("work item {id} cannot move from {from} to {to}")]
    InvalidTransition { id: String, from: String, to: String },

    #[error("failed to move work item {id} to {to}: {source}")]
    Move {
        id: String,
        to: String,
        #[source]
        source: std::io::Error,
    },
}

// ─── Persistence errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

// ─── Probe errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe {probe} timed out after {after_ms}ms")]
    Timeout { probe: String, after_ms: u64 },

    #[error("probe {probe} transport failure: {message}")]
    Transport { probe: String, message: String },

    #[error("probe {probe} could not run: {message}")]
    Spawn { probe: String, message: String },

    #[error("probe {probe} returned an unexpected reading")]
    UnexpectedReading { probe: String },
}

// ─── Scan errors ─────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("agent {agent} has an invalid pattern {pattern:?}: {source}")]
    Pattern {
        agent: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, WardenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_displays_correctly() {
        let err = WardenError::Config(ConfigError::Validation("bad threshold".into()));
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn invalid_transition_names_both_states() {
        let err = WardenError::Store(StoreError::InvalidTransition {
            id: "v1(P0.1.0)_init".into(),
            from: "failed".into(),
            to: "archived".into(),
        });
        let text = err.to_string();
        assert!(text.contains("failed"));
        assert!(text.contains("archived"));
    }

    #[test]
    fn probe_timeout_displays_duration() {
        let err = WardenError::Probe(ProbeError::Timeout {
            probe: "endpoint".into(),
            after_ms: 5000,
        });
        assert!(err.to_string().contains("5000ms"));
    }

    #[test]
    fn anyhow_interop() {
        let anyhow_err = anyhow::anyhow!("something went wrong");
        let warden_err: WardenError = anyhow_err.into();
        assert!(warden_err.to_string().contains("something went wrong"));
    }

    #[test]
    fn persistence_write_mentions_path() {
        let err = PersistenceError::Write {
            path: PathBuf::from("/tmp/trust-state.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("trust-state.json"));
    }
}
