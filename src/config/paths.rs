//! Path management for stateguard
//!
//! Every location stateguard touches is derived from a single project root.
//!
//! ## Path Resolution Order
//!
//! 1. `STATEGUARD_PROJECT_DIR` environment variable (if set)
//! 2. The current working directory
//!
//! ## Layout
//!
//! ```text
//! <project>/
//!   .state/               state directory (datastore, version marker, ...)
//!     version.txt
//!     state.db
//!   .state-backups/       one directory per backup
//!   .state.lock           advisory migration lock
//!   stateguard.json       optional settings file
//! ```

use std::path::{Path, PathBuf};

use crate::error::GuardError;

/// Default name of the state directory inside a project
pub const DEFAULT_STATE_DIR: &str = ".state";

/// Name of the backup root directory inside a project
pub const BACKUP_DIR: &str = ".state-backups";

/// Name of the version marker file inside the state directory
pub const VERSION_FILE: &str = "version.txt";

/// Manages all paths used by stateguard for one project
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    /// Project root directory
    project_dir: PathBuf,
    /// Name of the state directory below the project root
    state_dir_name: String,
}

impl ProjectPaths {
    /// Create a new ProjectPaths instance
    ///
    /// Path resolution:
    /// 1. `STATEGUARD_PROJECT_DIR` env var (explicit override)
    /// 2. Current working directory
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn new() -> Result<Self, GuardError> {
        let project_dir = if let Ok(custom) = std::env::var("STATEGUARD_PROJECT_DIR") {
            PathBuf::from(custom)
        } else {
            std::env::current_dir().map_err(|e| {
                GuardError::Config(format!("Could not determine current directory: {}", e))
            })?
        };

        Ok(Self::with_project_dir(project_dir))
    }

    /// Create ProjectPaths for an explicit project directory
    pub fn with_project_dir(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            state_dir_name: DEFAULT_STATE_DIR.to_string(),
        }
    }

    /// Use a different state directory name
    pub fn with_state_dir_name(mut self, name: impl Into<String>) -> Self {
        self.state_dir_name = name.into();
        self
    }

    /// Get the project root
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Name of the state directory (e.g. `.state`)
    pub fn state_dir_name(&self) -> &str {
        &self.state_dir_name
    }

    /// Get the state directory (<project>/.state/)
    pub fn state_dir(&self) -> PathBuf {
        self.project_dir.join(&self.state_dir_name)
    }

    /// Get the version marker (<project>/.state/version.txt)
    pub fn version_file(&self) -> PathBuf {
        self.state_dir().join(VERSION_FILE)
    }

    /// Get the datastore file inside the state directory
    pub fn database_file(&self, file_name: &str) -> PathBuf {
        self.state_dir().join(file_name)
    }

    /// Get the backup root (<project>/.state-backups/)
    pub fn backup_dir(&self) -> PathBuf {
        self.project_dir.join(BACKUP_DIR)
    }

    /// Get the advisory lock file (<project>/.state.lock)
    ///
    /// Lives next to the state directory, not inside it, so that restoring
    /// a backup never removes a held lock.
    pub fn lock_file(&self) -> PathBuf {
        self.project_dir.join(format!("{}.lock", self.state_dir_name))
    }

    /// Get the settings file (<project>/stateguard.json)
    pub fn settings_file(&self) -> PathBuf {
        self.project_dir.join("stateguard.json")
    }

    /// Get the workflow definitions directory
    pub fn workflows_dir(&self) -> PathBuf {
        self.state_dir().join("workflows")
    }

    /// Get the agent definitions directory
    pub fn agents_dir(&self) -> PathBuf {
        self.state_dir().join("agents")
    }

    /// Check if the project has a state directory
    pub fn is_initialized(&self) -> bool {
        self.state_dir().is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_custom_project_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProjectPaths::with_project_dir(temp_dir.path());

        assert_eq!(paths.project_dir(), temp_dir.path());
        assert_eq!(paths.state_dir(), temp_dir.path().join(".state"));
        assert_eq!(paths.backup_dir(), temp_dir.path().join(".state-backups"));
        assert_eq!(paths.lock_file(), temp_dir.path().join(".state.lock"));
    }

    #[test]
    fn test_env_var_override() {
        let temp_dir = TempDir::new().unwrap();
        let custom_path = temp_dir.path().to_str().unwrap();

        env::set_var("STATEGUARD_PROJECT_DIR", custom_path);

        let paths = ProjectPaths::new().unwrap();
        assert_eq!(paths.project_dir(), temp_dir.path());

        env::remove_var("STATEGUARD_PROJECT_DIR");
    }

    #[test]
    fn test_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProjectPaths::with_project_dir(temp_dir.path()).with_state_dir_name(".tool");

        assert_eq!(
            paths.version_file(),
            temp_dir.path().join(".tool").join("version.txt")
        );
        assert_eq!(
            paths.database_file("state.db"),
            temp_dir.path().join(".tool").join("state.db")
        );
        assert_eq!(paths.lock_file(), temp_dir.path().join(".tool.lock"));
        assert!(!paths.is_initialized());
    }
}
