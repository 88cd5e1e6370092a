use super::id::{PATCH_SUFFIX, PatchCoordinates, REPORT_SUFFIX, compare_ids, normalize};
use super::store::{PatchStore, ReportStore, locate_for_move};
use super::types::{CompletionReport, PatchFlags, PatchState, WorkItem, WorkItemDescriptor};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Patch store backed by directories:
///
/// - `root/`            pending
/// - `root/.completed`  completed
/// - `root/.failed`     failed
/// - `root/.archive`    archived
#[derive(Debug, Clone)]
pub struct FsPatchStore {
    root: PathBuf,
}

impl FsPatchStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_dir(&self, state: PatchState) -> PathBuf {
        match state {
            PatchState::Pending => self.root.clone(),
            PatchState::Completed => self.root.join(".completed"),
            PatchState::Failed => self.root.join(".failed"),
            PatchState::Archived => self.root.join(".archive"),
        }
    }

    fn find_file(&self, id: &str, state: PatchState) -> Result<Option<PathBuf>, StoreError> {
        Ok(descriptor_files(&self.state_dir(state), state)?
            .into_iter()
            .find(|path| file_name(path).is_some_and(|name| normalize(name) == id)))
    }
}

impl PatchStore for FsPatchStore {
    fn name(&self) -> &str {
        "fs"
    }

    fn list(&self, state: PatchState) -> Result<Vec<WorkItem>, StoreError> {
        let mut items: Vec<WorkItem> = descriptor_files(&self.state_dir(state), state)?
            .into_iter()
            .filter_map(|path| {
                let name = file_name(&path)?.to_string();
                let id = normalize(&name);
                Some(WorkItem {
                    coordinates: PatchCoordinates::parse(&id),
                    flags: read_flags(&path),
                    file_name: name,
                    id,
                    state,
                })
            })
            .collect();
        items.sort_by(|a, b| compare_ids(&a.id, &b.id));
        Ok(items)
    }

    fn move_item(&self, id: &str, to: PatchState) -> Result<WorkItem, StoreError> {
        let from = locate_for_move(id, to, |state| Ok(self.find_file(id, state)?.is_some()))?;
        let source = self
            .find_file(id, from)?
            .ok_or_else(|| StoreError::NotFound {
                id: id.to_string(),
                state: from.to_string(),
            })?;
        let name = file_name(&source).unwrap_or_default().to_string();

        let target_dir = self.state_dir(to);
        let move_err = |source: std::io::Error| StoreError::Move {
            id: id.to_string(),
            to: to.to_string(),
            source,
        };
        fs::create_dir_all(&target_dir).map_err(move_err)?;
        let target = target_dir.join(&name);
        // rename is atomic on one filesystem, so the item is never in two
        // collections at once.
        fs::rename(&source, &target).map_err(move_err)?;

        tracing::info!(id = %id, from = %from, to = %to, "moved work item");
        Ok(WorkItem {
            id: id.to_string(),
            coordinates: PatchCoordinates::parse(id),
            flags: read_flags(&target),
            file_name: name,
            state: to,
        })
    }
}

/// Report store backed by one directory of `summary-<id>.md` files.
#[derive(Debug, Clone)]
pub struct FsReportStore {
    dir: PathBuf,
}

impl FsReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReportStore for FsReportStore {
    fn name(&self) -> &str {
        "fs"
    }

    fn list_reports(&self) -> Result<Vec<CompletionReport>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    collection: "reports".into(),
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut reports = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = file_name(&path) else {
                continue;
            };
            if !name.ends_with(REPORT_SUFFIX) {
                continue;
            }
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let produced_at = meta
                .modified()
                .map_or_else(|_| Utc::now(), DateTime::<Utc>::from);
            reports.push(CompletionReport {
                id: normalize(name),
                file_name: name.to_string(),
                produced_at,
                size_bytes: meta.len(),
            });
        }
        reports.sort_by(|a, b| b.produced_at.cmp(&a.produced_at));
        Ok(reports)
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

/// Descriptor files directly inside `dir`. A missing directory is an empty
/// collection, any other read failure is a `StoreError`.
fn descriptor_files(dir: &Path, state: PatchState) -> Result<Vec<PathBuf>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Read {
                collection: state.to_string(),
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    Ok(entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| file_name(path).is_some_and(|name| name.ends_with(PATCH_SUFFIX)))
        .collect())
}

fn read_flags(path: &Path) -> PatchFlags {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "failed to read work-item descriptor");
            return PatchFlags::default();
        }
    };
    match serde_json::from_str::<WorkItemDescriptor>(&raw) {
        Ok(descriptor) => descriptor.flags,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "unparseable work-item descriptor");
            PatchFlags::default()
        }
    }
}
