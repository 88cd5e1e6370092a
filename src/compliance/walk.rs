use crate::error::ScanError;
use std::fs;
use std::path::{Path, PathBuf};

/// Which directories to skip and which file extensions to keep.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    pub excluded_dirs: Vec<String>,
    pub extensions: Vec<String>,
}

impl WalkOptions {
    fn is_excluded(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| d == name)
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.trim_start_matches('.') == ext))
    }
}

/// Tracked files under `start` (a file or a directory), in path order.
///
/// Unreadable directories are skipped and reported in the returned errors;
/// the walk always continues.
pub fn collect_sources(start: &Path, options: &WalkOptions) -> (Vec<PathBuf>, Vec<ScanError>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();

    if start.is_file() {
        if options.is_tracked(start) {
            files.push(start.to_path_buf());
        }
    } else if start.is_dir() {
        walk_dir(start, options, &mut files, &mut errors);
    }

    (files, errors)
}

fn walk_dir(dir: &Path, options: &WalkOptions, files: &mut Vec<PathBuf>, errors: &mut Vec<ScanError>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) => {
            tracing::warn!(dir = %dir.display(), error = %source, "skipping unreadable directory");
            errors.push(ScanError::Read {
                path: dir.to_path_buf(),
                source,
            });
            return;
        }
    };

    let mut paths: Vec<PathBuf> = entries.filter_map(Result::ok).map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        let Ok(file_type) = fs::symlink_metadata(&path).map(|m| m.file_type()) else {
            continue;
        };
        if file_type.is_dir() {
            let skip = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| options.is_excluded(n));
            if !skip {
                walk_dir(&path, options, files, errors);
            }
        } else if file_type.is_file() && options.is_tracked(&path) {
            files.push(path);
        }
    }
}
