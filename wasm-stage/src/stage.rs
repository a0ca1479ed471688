//! Reads files from disk into staging order.
//!
//! A file argument is staged under its own file name. A directory argument is
//! walked recursively and every file is staged as `<dir>/<relative/path>`, so
//! the folder structure survives into the manifest and the compilation request.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// A file read from disk, named the way it will be staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

const SKIPPED_DIRS: [&str; 2] = [".git", "target"];

/// Collect every file under `paths`, in argument order. Directory entries are
/// sorted by name so repeated runs stage the same order.
///
/// Two arguments may map to the same staged name (`a/main.cpp` and
/// `b/main.cpp`). Both are returned; staging keeps the last one, and each
/// collision is logged.
pub fn collect_files(paths: &[PathBuf]) -> Result<Vec<DiskFile>> {
    let mut results = Vec::new();
    for path in paths {
        if path.is_dir() {
            let prefix = file_name_of(path)?;
            visit_dir(path, &prefix, &mut results)?;
        } else {
            let name = file_name_of(path)?;
            results.push(read_file(path, name)?);
        }
    }
    warn_on_collisions(&results);
    info!(files = results.len(), "Collected files from disk");
    Ok(results)
}

fn warn_on_collisions(files: &[DiskFile]) {
    let mut seen = HashSet::new();
    for file in files {
        if !seen.insert(file.name.as_str()) {
            warn!(name = %file.name, "Staged name collides with an earlier file; the later file replaces it");
        }
    }
}

fn visit_dir(dir: &Path, prefix: &str, results: &mut Vec<DiskFile>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list directory {}", dir.display()))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let segment = entry.file_name().to_string_lossy().into_owned();
        if path.is_dir() {
            if SKIPPED_DIRS.contains(&segment.as_str()) {
                debug!(path = %path.display(), "Skipping directory");
                continue;
            }
            visit_dir(&path, &format!("{prefix}/{segment}"), results)?;
        } else if path.is_file() {
            results.push(read_file(&path, format!("{prefix}/{segment}"))?);
        }
    }
    Ok(())
}

fn read_file(path: &Path, name: String) -> Result<DiskFile> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file {}", path.display()))?;
    debug!(name = %name, size = bytes.len(), "Read file");
    Ok(DiskFile { name, bytes })
}

fn file_name_of(path: &Path) -> Result<String> {
    // canonicalize so that "." and ".." still yield a folder name
    let resolved = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Path has no file name: {}", path.display()))
}
