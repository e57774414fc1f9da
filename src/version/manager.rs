//! Version compatibility checking
//!
//! Compares the version recorded in a project's state directory with the
//! running tool version and turns the relationship into an action plan.

use std::fs;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::semver::SemanticVersion;
use crate::config::paths::ProjectPaths;
use crate::config::settings::Settings;
use crate::error::{GuardError, GuardResult};

/// How the stored state relates to the running tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityStatus {
    Compatible,
    NeedsMigration,
    Incompatible,
}

/// What the caller should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityAction {
    /// Nothing to do
    Continue,
    /// Run the bridging migrations
    Migrate,
    /// No state yet; create it from scratch
    Initialize,
    /// Stop; the state cannot be used by this tool version
    Error,
}

/// Outcome of a compatibility check. Computed fresh on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityResult {
    pub status: CompatibilityStatus,
    pub action: CompatibilityAction,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_version: Option<String>,
    /// Ordered bridging migration identifiers
    #[serde(default)]
    pub migrations: Vec<String>,
}

impl CompatibilityResult {
    pub fn is_compatible(&self) -> bool {
        self.status == CompatibilityStatus::Compatible
    }

    pub fn needs_migration(&self) -> bool {
        self.action == CompatibilityAction::Migrate
    }

    pub fn is_error(&self) -> bool {
        self.action == CompatibilityAction::Error
    }
}

/// Reads and writes the version marker and classifies compatibility
pub struct VersionManager {
    paths: ProjectPaths,
    settings: Settings,
}

impl VersionManager {
    /// Create a new VersionManager
    pub fn new(paths: ProjectPaths, settings: Settings) -> Self {
        Self { paths, settings }
    }

    /// Decide whether the project's stored state fits the running tool
    ///
    /// # Errors
    ///
    /// Returns `VersionParse` if the version marker (or a configured version)
    /// is malformed, and `Io` if the marker cannot be read.
    pub fn check_compatibility(&self) -> GuardResult<CompatibilityResult> {
        let current = self.settings.tool_version()?;

        if !self.paths.state_dir().is_dir() {
            return Ok(CompatibilityResult {
                status: CompatibilityStatus::Compatible,
                action: CompatibilityAction::Initialize,
                message: "No state directory found; a new project will be initialized".into(),
                from_version: None,
                to_version: Some(current.to_string()),
                migrations: Vec::new(),
            });
        }

        let Some(raw) = self.get_project_version()? else {
            let legacy = SemanticVersion::legacy();
            let migrations = self.bridging_migrations(&legacy, &current)?;
            return Ok(CompatibilityResult {
                status: CompatibilityStatus::NeedsMigration,
                action: CompatibilityAction::Migrate,
                message: format!(
                    "Legacy project without a version marker; migrating to {}",
                    current
                ),
                from_version: Some(legacy.to_string()),
                to_version: Some(current.to_string()),
                migrations,
            });
        };

        let stored: SemanticVersion = raw.parse()?;
        debug!(stored = %stored, current = %current, "checking version compatibility");

        if stored == current || stored.same_series(&current) {
            return Ok(CompatibilityResult {
                status: CompatibilityStatus::Compatible,
                action: CompatibilityAction::Continue,
                message: format!(
                    "Project version {} is compatible with tool version {}",
                    stored, current
                ),
                from_version: Some(stored.to_string()),
                to_version: Some(current.to_string()),
                migrations: Vec::new(),
            });
        }

        let floor = self.settings.min_compatible_version()?;
        if stored >= floor && stored < current {
            let migrations = self.bridging_migrations(&stored, &current)?;
            return Ok(CompatibilityResult {
                status: CompatibilityStatus::NeedsMigration,
                action: CompatibilityAction::Migrate,
                message: format!(
                    "Project version {} must be migrated to {} ({} step(s))",
                    stored,
                    current,
                    migrations.len()
                ),
                from_version: Some(stored.to_string()),
                to_version: Some(current.to_string()),
                migrations,
            });
        }

        let message = if stored > current {
            format!(
                "Project version {} is newer than tool version {}. \
                 Upgrade the tool to {}.{}.x or later, or restore a backup taken \
                 with a version between {} and {}.",
                stored, current, stored.major, stored.minor, floor, current
            )
        } else {
            format!(
                "Project version {} is older than the minimum supported version {}. \
                 Options: upgrade the project with a tool release between {} and {} first, \
                 or back up the state directory and re-initialize the project.",
                stored, floor, floor, current
            )
        };

        Ok(CompatibilityResult {
            status: CompatibilityStatus::Incompatible,
            action: CompatibilityAction::Error,
            message,
            from_version: Some(stored.to_string()),
            to_version: Some(current.to_string()),
            migrations: Vec::new(),
        })
    }

    /// Read the raw version marker, `None` if the file doesn't exist
    pub fn get_project_version(&self) -> GuardResult<Option<String>> {
        let path = self.paths.version_file();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            GuardError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Some(contents.trim().to_string()))
    }

    /// Write the version marker, creating the state directory if needed
    ///
    /// The string is validated first; a malformed version writes nothing.
    pub fn set_project_version(&self, version: &str) -> GuardResult<()> {
        let parsed: SemanticVersion = version.parse()?;
        let path = self.paths.version_file();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                GuardError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        fs::write(&path, parsed.to_string()).map_err(|e| {
            GuardError::Io(format!("Failed to write {}: {}", path.display(), e))
        })?;
        debug!(version = %parsed, "wrote version marker");
        Ok(())
    }

    /// Identifiers for each major.minor boundary crossed between two versions
    ///
    /// The ladder starts at `from`'s series, climbs through every known
    /// release series above it up to `to`'s, and ends at `to`'s series.
    pub fn bridging_migrations(
        &self,
        from: &SemanticVersion,
        to: &SemanticVersion,
    ) -> GuardResult<Vec<String>> {
        let start = from.major_minor();
        let end = to.major_minor();
        if start >= end {
            return Ok(Vec::new());
        }

        let mut ladder = vec![start];
        for release in self.settings.known_releases()? {
            let series = release.major_minor();
            if series > start && series <= end && ladder.last() != Some(&series) {
                ladder.push(series);
            }
        }
        if ladder.last() != Some(&end) {
            ladder.push(end);
        }

        Ok(ladder
            .windows(2)
            .map(|pair| {
                format!(
                    "{}.{}_to_{}.{}",
                    pair[0].0, pair[0].1, pair[1].0, pair[1].1
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_with(current: &str) -> (VersionManager, ProjectPaths, TempDir) {
        let temp = TempDir::new().unwrap();
        let paths = ProjectPaths::with_project_dir(temp.path());
        let settings = Settings::for_tool_version(current);
        (VersionManager::new(paths.clone(), settings), paths, temp)
    }

    fn with_stored(current: &str, stored: &str) -> (VersionManager, TempDir) {
        let (manager, paths, temp) = manager_with(current);
        fs::create_dir_all(paths.state_dir()).unwrap();
        fs::write(paths.version_file(), stored).unwrap();
        (manager, temp)
    }

    #[test]
    fn test_new_project_initializes() {
        let (manager, _paths, _temp) = manager_with("1.1.0");
        let result = manager.check_compatibility().unwrap();
        assert_eq!(result.status, CompatibilityStatus::Compatible);
        assert_eq!(result.action, CompatibilityAction::Initialize);
    }

    #[test]
    fn test_legacy_project_needs_migration() {
        let (manager, paths, _temp) = manager_with("1.1.0");
        fs::create_dir_all(paths.state_dir()).unwrap();

        let result = manager.check_compatibility().unwrap();
        assert_eq!(result.status, CompatibilityStatus::NeedsMigration);
        assert_eq!(result.action, CompatibilityAction::Migrate);
        assert_eq!(result.from_version.as_deref(), Some("0.0.0"));
        assert_eq!(result.to_version.as_deref(), Some("1.1.0"));
        assert_eq!(
            result.migrations,
            vec!["0.0_to_0.9", "0.9_to_0.10", "0.10_to_1.0", "1.0_to_1.1"]
        );
    }

    #[test]
    fn test_same_version_is_compatible() {
        for version in ["0.9.0", "1.1.0", "3.0.2"] {
            let (manager, _temp) = with_stored(version, version);
            let result = manager.check_compatibility().unwrap();
            assert_eq!(result.status, CompatibilityStatus::Compatible);
            assert_eq!(result.action, CompatibilityAction::Continue);
        }
    }

    #[test]
    fn test_patch_difference_is_compatible() {
        let (manager, _temp) = with_stored("1.2.9", "1.2.3");
        let result = manager.check_compatibility().unwrap();
        assert_eq!(result.status, CompatibilityStatus::Compatible);
        assert_eq!(result.action, CompatibilityAction::Continue);
        assert!(result.migrations.is_empty());
    }

    #[test]
    fn test_below_floor_is_incompatible() {
        let (manager, _temp) = with_stored("1.1.0", "0.5.0");
        let result = manager.check_compatibility().unwrap();
        assert_eq!(result.status, CompatibilityStatus::Incompatible);
        assert_eq!(result.action, CompatibilityAction::Error);
        assert!(result.message.contains("0.9.0"));
    }

    #[test]
    fn test_newer_project_is_incompatible() {
        let (manager, _temp) = with_stored("1.1.0", "2.0.0");
        let result = manager.check_compatibility().unwrap();
        assert!(result.is_error());
        assert!(result.message.contains("newer"));
    }

    #[test]
    fn test_older_series_needs_bridging_migrations() {
        let (manager, _temp) = with_stored("1.1.0", "v0.9.4");
        let result = manager.check_compatibility().unwrap();
        assert!(result.needs_migration());
        assert_eq!(result.from_version.as_deref(), Some("0.9.4"));
        assert_eq!(
            result.migrations,
            vec!["0.9_to_0.10", "0.10_to_1.0", "1.0_to_1.1"]
        );
    }

    #[test]
    fn test_unknown_target_series_still_bridged() {
        let (manager, _temp) = with_stored("1.3.0", "1.0.2");
        let result = manager.check_compatibility().unwrap();
        assert_eq!(result.migrations, vec!["1.0_to_1.1", "1.1_to_1.3"]);
    }

    #[test]
    fn test_malformed_marker_is_error() {
        let (manager, _temp) = with_stored("1.1.0", "not-a-version");
        let err = manager.check_compatibility().unwrap_err();
        assert!(matches!(err, GuardError::VersionParse { .. }));
    }

    #[test]
    fn test_set_and_get_project_version() {
        let (manager, paths, _temp) = manager_with("1.1.0");
        assert!(manager.get_project_version().unwrap().is_none());

        manager.set_project_version("v1.0.3").unwrap();
        assert!(paths.state_dir().is_dir());
        assert_eq!(manager.get_project_version().unwrap().as_deref(), Some("1.0.3"));
    }

    #[test]
    fn test_set_invalid_version_writes_nothing() {
        let (manager, paths, _temp) = manager_with("1.1.0");
        assert!(manager.set_project_version("1.0").is_err());
        assert!(!paths.version_file().exists());
    }
}
