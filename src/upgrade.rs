//! Project initialization and the upgrade flow
//!
//! `run_upgrade` ties the components together: check compatibility, then
//! initialize, migrate behind a pre-update backup, or stop, then stamp the
//! version marker and audit the result.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::backup::BackupManager;
use crate::config::paths::ProjectPaths;
use crate::config::settings::Settings;
use crate::error::{GuardError, GuardResult};
use crate::health::{HealthCheckReport, SystemHealthCheck};
use crate::migration::{builtin, MigrationRunner};
use crate::version::{CompatibilityAction, CompatibilityResult, VersionManager};

/// Backup reason used before an upgrade migrates anything
pub const PRE_UPDATE_BACKUP: &str = "pre_update_backup";

/// What an upgrade did
#[derive(Debug)]
pub struct UpgradeOutcome {
    pub compatibility: CompatibilityResult,
    /// Backup taken before migrating, if any
    pub backup: Option<PathBuf>,
    /// Schema versions applied
    pub applied: Vec<i64>,
    pub health: HealthCheckReport,
}

/// Name of the workflow definition written into a new project
pub const DEFAULT_WORKFLOW: &str = "default";

/// Create the state directory, default catalogs, schema and version marker
///
/// Returns `false` without touching anything if the project already has a
/// state directory.
pub fn initialize_project(paths: &ProjectPaths, settings: &Settings) -> GuardResult<bool> {
    if paths.is_initialized() {
        return Ok(false);
    }

    for dir in [paths.state_dir(), paths.workflows_dir(), paths.agents_dir()] {
        fs::create_dir_all(&dir)
            .map_err(|e| GuardError::Io(format!("Failed to create {}: {}", dir.display(), e)))?;
    }
    seed_catalogs(paths, settings)?;

    VersionManager::new(paths.clone(), settings.clone())
        .set_project_version(&settings.tool_version)?;
    MigrationRunner::new(paths.clone(), settings).run_migrations(&builtin::migrations())?;

    if !paths.settings_file().exists() {
        settings.save(paths)?;
    }

    info!(project = %paths.project_dir().display(), "initialized project");
    Ok(true)
}

/// Write the default workflow and one definition per expected agent
fn seed_catalogs(paths: &ProjectPaths, settings: &Settings) -> GuardResult<()> {
    let mut workflow = format!(
        "name: {}\ndescription: Plan, implement and review a change\nsteps:\n",
        DEFAULT_WORKFLOW
    );
    for agent in &settings.expected_agents {
        workflow.push_str(&format!("  - agent: {}\n", agent));
    }
    if settings.expected_agents.is_empty() {
        workflow.push_str("  []\n");
    }
    write_new(&paths.workflows_dir().join(format!("{}.yaml", DEFAULT_WORKFLOW)), &workflow)?;

    for agent in &settings.expected_agents {
        write_new(
            &paths.agents_dir().join(format!("{}.md", agent)),
            &format!("# {}\n", agent),
        )?;
    }
    Ok(())
}

fn write_new(path: &Path, contents: &str) -> GuardResult<()> {
    if path.exists() {
        return Ok(());
    }
    fs::write(path, contents)
        .map_err(|e| GuardError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

/// Bring a project up to the running tool version
///
/// # Errors
///
/// `Validation` when the stored state is incompatible; otherwise whatever
/// the backup or migration step reports (including `Restored` and
/// `RecoveryFailed` from a failed migration).
pub fn run_upgrade(
    paths: &ProjectPaths,
    settings: &Settings,
    verbose: bool,
) -> GuardResult<UpgradeOutcome> {
    let versions = VersionManager::new(paths.clone(), settings.clone());
    let compatibility = versions.check_compatibility()?;
    let runner = MigrationRunner::new(paths.clone(), settings);

    let mut backup = None;
    let applied = match compatibility.action {
        CompatibilityAction::Error => {
            return Err(GuardError::Validation(compatibility.message));
        }
        CompatibilityAction::Initialize => {
            initialize_project(paths, settings)?;
            runner
                .applied_migrations()?
                .into_iter()
                .map(|m| m.version)
                .collect()
        }
        CompatibilityAction::Migrate => {
            info!(
                from = compatibility.from_version.as_deref().unwrap_or("unknown"),
                to = %settings.tool_version,
                steps = ?compatibility.migrations,
                "migrating project"
            );
            backup = Some(BackupManager::new(paths.clone(), settings).create_backup(PRE_UPDATE_BACKUP)?);
            runner.run_migrations(&builtin::migrations())?
        }
        CompatibilityAction::Continue => runner.run_migrations(&builtin::migrations())?,
    };

    versions.set_project_version(&settings.tool_version)?;

    let health = SystemHealthCheck::with_default_catalogs(paths.clone(), settings.clone())
        .run_post_update_check(verbose);

    Ok(UpgradeOutcome {
        compatibility,
        backup,
        applied,
        health,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::CompatibilityStatus;
    use tempfile::TempDir;

    fn setup() -> (ProjectPaths, Settings, TempDir) {
        let temp = TempDir::new().unwrap();
        let paths = ProjectPaths::with_project_dir(temp.path());
        (paths, Settings::for_tool_version("1.1.0"), temp)
    }

    #[test]
    fn test_initialize_creates_layout() {
        let (paths, settings, _temp) = setup();

        assert!(initialize_project(&paths, &settings).unwrap());
        assert!(!initialize_project(&paths, &settings).unwrap());

        assert!(paths.workflows_dir().join("default.yaml").is_file());
        for agent in &settings.expected_agents {
            assert!(paths.agents_dir().join(format!("{}.md", agent)).is_file());
        }
        assert!(paths.settings_file().is_file());
        assert_eq!(fs::read_to_string(paths.version_file()).unwrap(), "1.1.0");
        let runner = MigrationRunner::new(paths.clone(), &settings);
        assert_eq!(runner.current_version().unwrap(), builtin::latest_version());
    }

    #[test]
    fn test_upgrade_new_project() {
        let (paths, settings, _temp) = setup();

        let outcome = run_upgrade(&paths, &settings, false).unwrap();

        assert_eq!(outcome.compatibility.action, CompatibilityAction::Initialize);
        assert_eq!(outcome.applied, vec![1, 2, 3]);
        assert!(outcome.backup.is_none());
        assert!(outcome.health.all_passed(), "{:?}", outcome.health.failed_checks());
    }

    #[test]
    fn test_upgrade_legacy_project_backs_up_and_migrates() {
        let (paths, settings, _temp) = setup();
        fs::create_dir_all(paths.state_dir()).unwrap();
        fs::write(paths.state_dir().join("notes.txt"), "keep me").unwrap();

        let outcome = run_upgrade(&paths, &settings, false).unwrap();

        assert_eq!(outcome.compatibility.status, CompatibilityStatus::NeedsMigration);
        assert_eq!(outcome.applied, vec![1, 2, 3]);
        let backup = outcome.backup.unwrap();
        assert!(backup.join(".state").join("notes.txt").is_file());
        assert_eq!(fs::read_to_string(paths.version_file()).unwrap(), "1.1.0");

        let reasons: Vec<String> = BackupManager::new(paths.clone(), &settings)
            .list_backups()
            .unwrap()
            .into_iter()
            .map(|b| b.reason)
            .collect();
        assert!(reasons.contains(&PRE_UPDATE_BACKUP.to_string()));
        assert!(reasons.contains(&"pre_migration".to_string()));
    }

    #[test]
    fn test_upgrade_incompatible_project_stops() {
        let (paths, settings, _temp) = setup();
        fs::create_dir_all(paths.state_dir()).unwrap();
        fs::write(paths.version_file(), "0.5.0").unwrap();

        let err = run_upgrade(&paths, &settings, false).unwrap_err();

        assert!(err.is_validation());
        assert_eq!(fs::read_to_string(paths.version_file()).unwrap(), "0.5.0");
        assert!(!MigrationRunner::new(paths, &settings).database_path().exists());
    }

    #[test]
    fn test_upgrade_current_project_is_noop() {
        let (paths, settings, _temp) = setup();
        initialize_project(&paths, &settings).unwrap();
        let before = BackupManager::new(paths.clone(), &settings)
            .list_backups()
            .unwrap()
            .len();

        let outcome = run_upgrade(&paths, &settings, false).unwrap();

        assert_eq!(outcome.compatibility.action, CompatibilityAction::Continue);
        assert!(outcome.applied.is_empty());
        let after = BackupManager::new(paths, &settings).list_backups().unwrap().len();
        assert_eq!(before, after);
    }
}
