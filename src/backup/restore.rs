//! Backup restoration for stateguard
//!
//! Replaces the current state directory with the copy held in a backup.
//! Not transactional: the old state is removed before the backup is copied
//! in, so a crash in between leaves only the backup itself.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::manager::{BackupManager, METADATA_FILE};
use crate::error::{GuardError, GuardResult};
use crate::storage::{copy_tree, remove_tree};

impl BackupManager {
    /// Restore the state directory from a backup
    ///
    /// Accepts the standard layout (state directory copied under its own
    /// name) and the flat layout (state tree directly in the backup root).
    pub fn restore_backup(&self, backup_path: &Path) -> GuardResult<()> {
        if !backup_path.is_dir() {
            return Err(GuardError::backup_not_found(
                backup_path.display().to_string(),
            ));
        }

        let state_dir = self.paths.state_dir();
        let nested = backup_path.join(self.paths.state_dir_name());
        let flat = !nested.is_dir();
        let source = if flat { backup_path } else { nested.as_path() };

        remove_tree(&state_dir)?;
        copy_tree(source, &state_dir)?;

        if flat {
            let sidecar = state_dir.join(METADATA_FILE);
            if sidecar.exists() {
                if let Err(e) = fs::remove_file(&sidecar) {
                    warn!(path = %sidecar.display(), error = %e, "failed to drop copied sidecar");
                }
            }
        }

        info!(
            backup = %backup_path.display(),
            state_dir = %state_dir.display(),
            "restored state directory from backup"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ProjectPaths;
    use crate::config::settings::Settings;
    use tempfile::TempDir;

    fn create_test_env() -> (BackupManager, ProjectPaths, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProjectPaths::with_project_dir(temp_dir.path());
        fs::create_dir_all(paths.state_dir().join("agents")).unwrap();
        fs::write(paths.version_file(), "1.0.0").unwrap();
        fs::write(paths.state_dir().join("agents").join("planner.md"), "# planner").unwrap();

        let manager = BackupManager::new(paths.clone(), &Settings::default());
        (manager, paths, temp_dir)
    }

    #[test]
    fn test_restore_reconstructs_state() {
        let (manager, paths, _temp) = create_test_env();
        let backup = manager.create_backup("manual").unwrap();

        fs::write(paths.version_file(), "9.9.9").unwrap();
        fs::write(paths.state_dir().join("stray.txt"), "new").unwrap();
        fs::remove_file(paths.state_dir().join("agents").join("planner.md")).unwrap();

        manager.restore_backup(&backup).unwrap();

        assert_eq!(fs::read_to_string(paths.version_file()).unwrap(), "1.0.0");
        assert!(paths.state_dir().join("agents").join("planner.md").exists());
        assert!(!paths.state_dir().join("stray.txt").exists());
        assert!(!paths.state_dir().join(METADATA_FILE).exists());
    }

    #[test]
    fn test_restore_when_state_dir_missing() {
        let (manager, paths, _temp) = create_test_env();
        let backup = manager.create_backup("manual").unwrap();

        fs::remove_dir_all(paths.state_dir()).unwrap();
        manager.restore_backup(&backup).unwrap();

        assert_eq!(fs::read_to_string(paths.version_file()).unwrap(), "1.0.0");
    }

    #[test]
    fn test_restore_flat_layout() {
        let (manager, paths, temp) = create_test_env();
        let flat = temp.path().join("old-backup");
        fs::create_dir_all(&flat).unwrap();
        fs::write(flat.join("version.txt"), "0.9.1").unwrap();
        fs::write(flat.join(METADATA_FILE), "{}").unwrap();

        manager.restore_backup(&flat).unwrap();

        assert_eq!(fs::read_to_string(paths.version_file()).unwrap(), "0.9.1");
        assert!(!paths.state_dir().join(METADATA_FILE).exists());
        assert!(!paths.state_dir().join("agents").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_backup_and_restore_linked_directory() {
        let (manager, paths, temp) = create_test_env();
        let shared = temp.path().join("shared-workflows");
        fs::create_dir_all(&shared).unwrap();
        fs::write(shared.join("build.yaml"), "name: build").unwrap();
        std::os::unix::fs::symlink(&shared, paths.state_dir().join("workflows")).unwrap();

        let backup = manager.create_backup("manual").unwrap();
        fs::remove_dir_all(&shared).unwrap();
        manager.restore_backup(&backup).unwrap();

        let workflows = paths.state_dir().join("workflows");
        assert!(fs::symlink_metadata(&workflows).unwrap().is_dir());
        assert_eq!(
            fs::read_to_string(workflows.join("build.yaml")).unwrap(),
            "name: build"
        );
        assert!(paths.state_dir().join("agents").join("planner.md").exists());
    }

    #[test]
    fn test_restore_missing_backup_fails_without_touching_state() {
        let (manager, paths, temp) = create_test_env();

        let err = manager
            .restore_backup(&temp.path().join("nope"))
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(fs::read_to_string(paths.version_file()).unwrap(), "1.0.0");
    }
}
