//! Directory tree helpers
//!
//! Full recursive copies and file listings used by backup and restore.

use std::fs;
use std::path::{Component, Path};

use walkdir::WalkDir;

use crate::error::{GuardError, GuardResult};

/// Copy every directory and file below `src` into `dst`
///
/// `dst` is created if needed. Symlinks are followed, so a linked
/// directory lands in `dst` as a real tree. A dangling link is an error.
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> GuardResult<usize> {
    fs::create_dir_all(dst).map_err(|e| {
        GuardError::Io(format!("Failed to create {}: {}", dst.display(), e))
    })?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| {
            GuardError::Io(format!("Failed to walk {}: {}", src.display(), e))
        })?;

        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| GuardError::Io(format!("Unexpected path in {}: {}", src.display(), e)))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| {
                GuardError::Io(format!("Failed to create {}: {}", target.display(), e))
            })?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| {
                GuardError::Io(format!(
                    "Failed to copy {} to {}: {}",
                    entry.path().display(),
                    target.display(),
                    e
                ))
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// List all files below `root` as `/`-separated paths relative to `root`, sorted
pub fn list_files(root: &Path) -> GuardResult<Vec<String>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| {
            GuardError::Io(format!("Failed to walk {}: {}", root.display(), e))
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(to_slash_path(relative));
        }
    }

    files.sort();
    Ok(files)
}

/// Remove a directory tree if it exists
pub fn remove_tree(path: &Path) -> GuardResult<()> {
    if !path.exists() {
        return Ok(());
    }
    fs::remove_dir_all(path)
        .map_err(|e| GuardError::Io(format!("Failed to remove {}: {}", path.display(), e)))
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
