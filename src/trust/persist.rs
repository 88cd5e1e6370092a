use super::state::TrustLedgerState;
use crate::error::PersistenceError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Durable home of the ledger record. Every save writes the full state.
pub trait LedgerStore: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when nothing has been written yet.
    fn load(&self) -> Result<Option<TrustLedgerState>, PersistenceError>;

    fn save(&self, state: &TrustLedgerState) -> Result<(), PersistenceError>;
}

/// Pretty-printed JSON file, replaced via write-to-temp + rename so a reader
/// only ever sees a complete record.
#[derive(Debug, Clone)]
pub struct JsonFileLedgerStore {
    path: PathBuf,
}

impl JsonFileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LedgerStore for JsonFileLedgerStore {
    fn name(&self) -> &str {
        "json-file"
    }

    fn load(&self) -> Result<Option<TrustLedgerState>, PersistenceError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let parse_err = |source: serde_json::Error| PersistenceError::Parse {
            path: self.path.clone(),
            source,
        };
        // Derived struct visitors also accept sequences; only an object is a
        // ledger record.
        let value: serde_json::Value = serde_json::from_str(&raw).map_err(parse_err)?;
        if !value.is_object() {
            return Err(parse_err(serde::de::Error::custom(
                "ledger record must be a JSON object",
            )));
        }
        let state = serde_json::from_value(value).map_err(parse_err)?;
        Ok(Some(state))
    }

    fn save(&self, state: &TrustLedgerState) -> Result<(), PersistenceError> {
        let data = serde_json::to_vec_pretty(state)?;
        let write_err = |source: std::io::Error| PersistenceError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, data).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

/// In-memory store. `fail_writes` simulates an unavailable disk.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    saved: Mutex<Option<TrustLedgerState>>,
    fail_writes: AtomicBool,
    writes: AtomicU64,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn saved(&self) -> Option<TrustLedgerState> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self) -> Result<Option<TrustLedgerState>, PersistenceError> {
        Ok(self.saved())
    }

    fn save(&self, state: &TrustLedgerState) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "simulated write failure".into(),
            ));
        }
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
