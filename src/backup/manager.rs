//! Backup manager for stateguard
//!
//! Creates full copies of a project's state directory, lists and deletes
//! them, and applies the retention cap. Backups are directories named
//! `backup_<YYYYMMDD>_<HHMMSS>_<micros>` so that name order is creation order.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::paths::ProjectPaths;
use crate::config::settings::Settings;
use crate::error::{GuardError, GuardResult};
use crate::storage::{copy_tree, list_files, read_json_required, remove_tree, write_json_atomic};

/// Sidecar file written inside every backup directory
pub const METADATA_FILE: &str = "backup_metadata.json";

/// Prefix shared by all backup directory names
pub const BACKUP_PREFIX: &str = "backup_";

/// How many times a colliding backup name is retried with a fresh timestamp
const NAME_ATTEMPTS: usize = 1000;

/// Metadata about a backup, persisted as its sidecar record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// When the backup was created (RFC 3339)
    pub timestamp: DateTime<Utc>,
    /// Tool version that created the backup
    pub tool_version: String,
    /// Why the backup was taken, e.g. `pre_migration`
    pub reason: String,
    /// Number of files copied
    pub file_count: usize,
    /// Copied files, relative to the backup root
    pub files: Vec<String>,
    /// Full path to the backup directory
    pub backup_path: PathBuf,
}

impl BackupMetadata {
    /// Backup directory name
    pub fn name(&self) -> String {
        self.backup_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.backup_path.display().to_string())
    }
}

/// Manages backup creation, listing and retention for one project
pub struct BackupManager {
    /// Path to backup directory
    pub(super) backup_dir: PathBuf,
    /// Project paths
    pub(super) paths: ProjectPaths,
    /// Number of backups to keep
    max_backups: usize,
    /// Tool version recorded in each sidecar
    tool_version: String,
}

impl BackupManager {
    /// Create a new BackupManager
    pub fn new(paths: ProjectPaths, settings: &Settings) -> Self {
        Self {
            backup_dir: paths.backup_dir(),
            paths,
            max_backups: settings.max_backups.max(1),
            tool_version: settings.tool_version.clone(),
        }
    }

    /// Create a full backup of the state directory
    ///
    /// Returns the path to the created backup directory. A failed copy
    /// leaves no partial backup behind. Retention is applied afterwards;
    /// pruning problems are logged and never fail the backup.
    pub fn create_backup(&self, reason: &str) -> GuardResult<PathBuf> {
        let state_dir = self.paths.state_dir();
        if !state_dir.is_dir() {
            return Err(GuardError::state_dir_not_found(state_dir));
        }

        fs::create_dir_all(&self.backup_dir).map_err(|e| {
            GuardError::Io(format!("Failed to create backup directory: {}", e))
        })?;

        let (backup_path, timestamp) = self.claim_backup_dir()?;

        if let Err(err) = self.populate_backup(&state_dir, &backup_path, timestamp, reason) {
            if let Err(cleanup_err) = fs::remove_dir_all(&backup_path) {
                warn!(
                    path = %backup_path.display(),
                    error = %cleanup_err,
                    "failed to remove partial backup"
                );
            }
            return Err(err);
        }

        info!(path = %backup_path.display(), reason, "created backup");

        match self.enforce_retention() {
            Ok(deleted) if !deleted.is_empty() => {
                debug!(count = deleted.len(), "pruned old backups");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "backup retention failed"),
        }

        Ok(backup_path)
    }

    /// Atomically claim a fresh, timestamped backup directory
    fn claim_backup_dir(&self) -> GuardResult<(PathBuf, DateTime<Utc>)> {
        for _ in 0..NAME_ATTEMPTS {
            let now = Utc::now();
            let name = format!("{}{}", BACKUP_PREFIX, now.format("%Y%m%d_%H%M%S_%6f"));
            let path = self.backup_dir.join(name);

            match fs::create_dir(&path) {
                Ok(()) => return Ok((path, now)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    std::thread::yield_now();
                }
                Err(e) => {
                    return Err(GuardError::Io(format!(
                        "Failed to create backup {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }

        Err(GuardError::Io(
            "Failed to find an unused backup name".into(),
        ))
    }

    fn populate_backup(
        &self,
        state_dir: &Path,
        backup_path: &Path,
        timestamp: DateTime<Utc>,
        reason: &str,
    ) -> GuardResult<()> {
        copy_tree(state_dir, &backup_path.join(self.paths.state_dir_name()))?;

        let files = list_files(backup_path)?;
        let metadata = BackupMetadata {
            timestamp,
            tool_version: self.tool_version.clone(),
            reason: reason.to_string(),
            file_count: files.len(),
            files,
            backup_path: backup_path.to_path_buf(),
        };

        write_json_atomic(backup_path.join(METADATA_FILE), &metadata)
    }

    /// List all labelled backups, newest first
    ///
    /// Directories without a readable sidecar are skipped.
    pub fn list_backups(&self) -> GuardResult<Vec<BackupMetadata>> {
        let mut backups = Vec::new();

        for path in self.backup_dirs()? {
            match read_metadata(&path) {
                Ok(metadata) => backups.push(metadata),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping unlabelled backup"),
            }
        }

        backups.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.backup_path.cmp(&a.backup_path))
        });

        Ok(backups)
    }

    /// Get the most recent backup
    pub fn get_latest_backup(&self) -> GuardResult<Option<BackupMetadata>> {
        Ok(self.list_backups()?.into_iter().next())
    }

    /// Get a specific backup by directory name
    pub fn get_backup(&self, name: &str) -> GuardResult<Option<BackupMetadata>> {
        let path = self.backup_dir.join(name);
        if !path.is_dir() {
            return Ok(None);
        }
        Ok(read_metadata(&path).ok())
    }

    /// Delete a backup directory
    pub fn delete_backup(&self, backup_path: &Path) -> GuardResult<()> {
        if !backup_path.exists() {
            return Err(GuardError::backup_not_found(
                backup_path.display().to_string(),
            ));
        }

        remove_tree(backup_path)?;
        info!(path = %backup_path.display(), "deleted backup");
        Ok(())
    }

    /// Delete the oldest backups beyond the retention cap
    ///
    /// Ordering is by directory name. Individual deletion failures are
    /// logged and skipped. Returns the deleted paths.
    pub fn enforce_retention(&self) -> GuardResult<Vec<PathBuf>> {
        let backups = self.backup_dirs()?;
        let excess = backups.len().saturating_sub(self.max_backups);
        let mut deleted = Vec::new();

        for path in backups.into_iter().take(excess) {
            match fs::remove_dir_all(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "deleted old backup");
                    deleted.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "failed to delete old backup"),
            }
        }

        Ok(deleted)
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Retention cap
    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// All backup directories, oldest first by name
    fn backup_dirs(&self) -> GuardResult<Vec<PathBuf>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.backup_dir).map_err(|e| {
            GuardError::Io(format!("Failed to read backup directory: {}", e))
        })?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                GuardError::Io(format!("Failed to read directory entry: {}", e))
            })?;
            let path = entry.path();
            let is_backup = entry
                .file_name()
                .to_string_lossy()
                .starts_with(BACKUP_PREFIX);
            if is_backup && path.is_dir() {
                dirs.push(path);
            }
        }

        dirs.sort();
        Ok(dirs)
    }
}

/// Read a backup's sidecar, pointing `backup_path` at where it actually lives
fn read_metadata(backup_path: &Path) -> GuardResult<BackupMetadata> {
    let mut metadata: BackupMetadata = read_json_required(backup_path.join(METADATA_FILE))?;
    metadata.backup_path = backup_path.to_path_buf();
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_manager(max_backups: usize) -> (BackupManager, ProjectPaths, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProjectPaths::with_project_dir(temp_dir.path());
        fs::create_dir_all(paths.state_dir().join("workflows")).unwrap();
        fs::write(paths.version_file(), "1.0.0").unwrap();
        fs::write(paths.state_dir().join("workflows").join("ci.yaml"), "name: ci").unwrap();

        let mut settings = Settings::for_tool_version("1.0.0");
        settings.max_backups = max_backups;

        let manager = BackupManager::new(paths.clone(), &settings);
        (manager, paths, temp_dir)
    }

    #[test]
    fn test_create_backup() {
        let (manager, _paths, _temp) = create_test_manager(5);

        let backup_path = manager.create_backup("manual").unwrap();
        assert!(backup_path.is_dir());
        assert!(backup_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("backup_"));
        assert!(backup_path.join(".state").join("version.txt").exists());
    }

    #[test]
    fn test_backup_name_format() {
        let (manager, _paths, _temp) = create_test_manager(5);
        let backup_path = manager.create_backup("manual").unwrap();
        let name = backup_path.file_name().unwrap().to_string_lossy().to_string();

        // backup_YYYYMMDD_HHMMSS_micros
        let parts: Vec<&str> = name.split('_').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert_eq!(parts[3].len(), 6);
    }

    #[test]
    fn test_metadata_sidecar() {
        let (manager, _paths, _temp) = create_test_manager(5);
        let backup_path = manager.create_backup("pre_update_backup").unwrap();

        let metadata: BackupMetadata =
            read_json_required(backup_path.join(METADATA_FILE)).unwrap();
        assert_eq!(metadata.reason, "pre_update_backup");
        assert_eq!(metadata.tool_version, "1.0.0");
        assert_eq!(metadata.file_count, 2);
        assert_eq!(
            metadata.files,
            vec![".state/version.txt", ".state/workflows/ci.yaml"]
        );
        assert_eq!(metadata.backup_path, backup_path);
    }

    #[test]
    fn test_create_without_state_dir_fails() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProjectPaths::with_project_dir(temp_dir.path());
        let manager = BackupManager::new(paths.clone(), &Settings::default());

        let err = manager.create_backup("manual").unwrap_err();
        assert!(err.is_not_found());
        assert!(!paths.backup_dir().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_copy_leaves_no_partial_backup() {
        let (manager, paths, temp) = create_test_manager(5);
        std::os::unix::fs::symlink(temp.path().join("missing"), paths.state_dir().join("dangling"))
            .unwrap();

        let err = manager.create_backup("manual").unwrap_err();
        assert!(matches!(err, GuardError::Io(_)));

        let leftovers: Vec<_> = fs::read_dir(manager.backup_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(BACKUP_PREFIX))
            .collect();
        assert!(leftovers.is_empty());
        assert!(manager.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_rapid_backups_do_not_collide() {
        let (manager, _paths, _temp) = create_test_manager(50);

        let mut created: Vec<PathBuf> = (0..20)
            .map(|_| manager.create_backup("burst").unwrap())
            .collect();
        created.sort();
        created.dedup();

        assert_eq!(created.len(), 20);
        assert_eq!(manager.list_backups().unwrap().len(), 20);
    }

    #[test]
    fn test_list_backups_newest_first() {
        let (manager, _paths, _temp) = create_test_manager(5);

        let first = manager.create_backup("one").unwrap();
        let second = manager.create_backup("two").unwrap();

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0].backup_path, second);
        assert_eq!(backups[1].backup_path, first);
        assert!(backups[0].timestamp >= backups[1].timestamp);
    }

    #[test]
    fn test_retention_keeps_most_recent() {
        let (manager, _paths, _temp) = create_test_manager(5);

        let created: Vec<PathBuf> = (0..8)
            .map(|i| manager.create_backup(&format!("run-{}", i)).unwrap())
            .collect();

        let mut remaining: Vec<PathBuf> = manager
            .list_backups()
            .unwrap()
            .into_iter()
            .map(|b| b.backup_path)
            .collect();
        remaining.sort();

        assert_eq!(remaining.len(), 5);
        assert_eq!(remaining, created[3..].to_vec());
    }

    #[test]
    fn test_enforce_retention_counts_unlabelled_backups() {
        let (manager, paths, _temp) = create_test_manager(2);
        fs::create_dir_all(paths.backup_dir().join("backup_19990101_000000_000000")).unwrap();
        manager.create_backup("a").unwrap();
        manager.create_backup("b").unwrap();

        assert!(!paths
            .backup_dir()
            .join("backup_19990101_000000_000000")
            .exists());
        assert_eq!(manager.list_backups().unwrap().len(), 2);
    }

    #[test]
    fn test_unlabelled_backups_skipped_in_listing() {
        let (manager, paths, _temp) = create_test_manager(5);
        manager.create_backup("labelled").unwrap();

        let legacy = paths.backup_dir().join("backup_20000101_000000_000000");
        fs::create_dir_all(&legacy).unwrap();
        let corrupt = paths.backup_dir().join("backup_20000101_000000_000001");
        fs::create_dir_all(&corrupt).unwrap();
        fs::write(corrupt.join(METADATA_FILE), "{ nope").unwrap();

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].reason, "labelled");
    }

    #[test]
    fn test_get_latest_backup() {
        let (manager, _paths, _temp) = create_test_manager(5);
        assert!(manager.get_latest_backup().unwrap().is_none());

        let path = manager.create_backup("manual").unwrap();
        let latest = manager.get_latest_backup().unwrap().unwrap();
        assert_eq!(latest.backup_path, path);

        let by_name = manager.get_backup(&latest.name()).unwrap().unwrap();
        assert_eq!(by_name, latest);
        assert!(manager.get_backup("backup_missing").unwrap().is_none());
    }

    #[test]
    fn test_delete_backup() {
        let (manager, _paths, _temp) = create_test_manager(5);
        let path = manager.create_backup("manual").unwrap();

        manager.delete_backup(&path).unwrap();
        assert!(!path.exists());

        let err = manager.delete_backup(&path).unwrap_err();
        assert!(err.is_not_found());
    }
}
