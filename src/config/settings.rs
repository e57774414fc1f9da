//! Settings for stateguard
//!
//! Holds the tool version, the compatibility floor, backup retention and the
//! expectations the health check audits against. A `Settings` value is
//! constructed explicitly and handed to each component; nothing reads it
//! from global state.

use serde::{Deserialize, Serialize};

use super::paths::ProjectPaths;
use crate::error::{GuardError, GuardResult};
use crate::storage::file_io::{read_json_required, write_json_atomic};
use crate::version::SemanticVersion;

/// Settings for one stateguard project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Version of the running tool. The three version fields belong to the
    /// binary: `save` does not write them and `load_or_default` ignores them.
    #[serde(skip, default = "default_tool_version")]
    pub tool_version: String,

    /// Oldest stored version that can still be migrated
    #[serde(skip, default = "default_min_compatible_version")]
    pub min_compatible_version: String,

    /// Released versions, oldest first. Their major.minor pairs are the
    /// boundaries a stored project has to be migrated across.
    #[serde(skip, default = "default_known_releases")]
    pub known_releases: Vec<String>,

    /// Number of backups kept per project
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,

    /// Datastore file name inside the state directory
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Files besides the datastore that must exist inside the state directory
    #[serde(default = "default_required_files")]
    pub required_files: Vec<String>,

    /// Tables that must exist in the datastore
    #[serde(default = "default_required_tables")]
    pub required_tables: Vec<String>,

    /// Agents the agent catalog must provide
    #[serde(default = "default_expected_agents")]
    pub expected_agents: Vec<String>,
}

fn default_tool_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_min_compatible_version() -> String {
    "0.9.0".to_string()
}

fn default_known_releases() -> Vec<String> {
    ["0.9.0", "0.10.0", "1.0.0", "1.1.0"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_backups() -> usize {
    5
}

fn default_database_file() -> String {
    "state.db".to_string()
}

fn default_required_files() -> Vec<String> {
    vec!["version.txt".to_string()]
}

fn default_required_tables() -> Vec<String> {
    ["schema_version", "workflow_runs", "step_results", "agent_invocations"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_expected_agents() -> Vec<String> {
    ["planner", "implementer", "reviewer"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tool_version: default_tool_version(),
            min_compatible_version: default_min_compatible_version(),
            known_releases: default_known_releases(),
            max_backups: default_max_backups(),
            database_file: default_database_file(),
            required_files: default_required_files(),
            required_tables: default_required_tables(),
            expected_agents: default_expected_agents(),
        }
    }
}

impl Settings {
    /// Default settings with a specific tool version
    pub fn for_tool_version(version: impl Into<String>) -> Self {
        Self {
            tool_version: version.into(),
            ..Self::default()
        }
    }

    /// Load settings from disk, or fall back to defaults if the file doesn't exist
    pub fn load_or_default(paths: &ProjectPaths) -> GuardResult<Self> {
        let settings_path = paths.settings_file();

        let settings = if settings_path.exists() {
            read_json_required::<Settings, _>(&settings_path).map_err(|e| {
                GuardError::Config(format!("Failed to load settings file: {}", e))
            })?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &ProjectPaths) -> GuardResult<()> {
        self.validate()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// Check that every version string parses and retention keeps something
    pub fn validate(&self) -> GuardResult<()> {
        self.tool_version()?;
        self.min_compatible_version()?;
        self.known_releases()?;

        if self.max_backups == 0 {
            return Err(GuardError::Config(
                "max_backups must be at least 1".into(),
            ));
        }
        if self.database_file.trim().is_empty() {
            return Err(GuardError::Config("database_file cannot be empty".into()));
        }

        Ok(())
    }

    /// Every file the state directory must hold, datastore first
    pub fn required_state_files(&self) -> Vec<String> {
        let mut files = vec![self.database_file.clone()];
        for file in &self.required_files {
            if !files.contains(file) {
                files.push(file.clone());
            }
        }
        files
    }

    /// Parsed running tool version
    pub fn tool_version(&self) -> GuardResult<SemanticVersion> {
        self.tool_version.parse()
    }

    /// Parsed compatibility floor
    pub fn min_compatible_version(&self) -> GuardResult<SemanticVersion> {
        self.min_compatible_version.parse()
    }

    /// Parsed known releases, sorted oldest first
    pub fn known_releases(&self) -> GuardResult<Vec<SemanticVersion>> {
        let mut releases = self
            .known_releases
            .iter()
            .map(|v| v.parse())
            .collect::<GuardResult<Vec<SemanticVersion>>>()?;
        releases.sort();
        Ok(releases)
    }
}
