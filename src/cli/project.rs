//! Project-level CLI commands: init, check, health and upgrade

use crate::config::paths::ProjectPaths;
use crate::config::settings::Settings;
use crate::display::{format_compatibility, format_health_report};
use crate::error::GuardResult;
use crate::health::SystemHealthCheck;
use crate::upgrade::{initialize_project, run_upgrade};
use crate::version::VersionManager;

/// Handle `init`
pub fn handle_init_command(paths: &ProjectPaths, settings: &Settings) -> GuardResult<()> {
    println!("Initializing stateguard at: {}", paths.project_dir().display());
    if !initialize_project(paths, settings)? {
        println!("Project is already initialized.");
        println!("Run 'stateguard check' to see whether it needs migrating.");
        return Ok(());
    }

    println!("Initialization complete!");
    println!();
    println!("State directory: {}", paths.state_dir().display());
    println!("Add workflow definitions to {}", paths.workflows_dir().display());
    println!("Add agent definitions to {}", paths.agents_dir().display());
    Ok(())
}

/// Handle `check`; returns whether the project is usable
pub fn handle_check_command(
    paths: &ProjectPaths,
    settings: &Settings,
    json: bool,
) -> GuardResult<bool> {
    let result = VersionManager::new(paths.clone(), settings.clone()).check_compatibility()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", format_compatibility(&result));
    }

    Ok(!result.is_error())
}

/// Handle `health`; returns whether every check passed
pub fn handle_health_command(
    paths: &ProjectPaths,
    settings: &Settings,
    verbose: bool,
) -> GuardResult<bool> {
    let report = SystemHealthCheck::with_default_catalogs(paths.clone(), settings.clone())
        .run_post_update_check(verbose);
    print!("{}", format_health_report(&report));
    Ok(report.all_passed())
}

/// Handle `upgrade`; returns whether the upgraded project is healthy
pub fn handle_upgrade_command(
    paths: &ProjectPaths,
    settings: &Settings,
    verbose: bool,
) -> GuardResult<bool> {
    println!("Upgrading project to {}...", settings.tool_version);
    let outcome = run_upgrade(paths, settings, verbose)?;

    println!("{}", outcome.compatibility.message);
    if let Some(backup) = &outcome.backup {
        println!("Pre-update backup: {}", backup.display());
    }
    if outcome.applied.is_empty() {
        println!("No schema migrations needed.");
    } else {
        println!("Applied schema migrations: {:?}", outcome.applied);
    }
    println!();
    print!("{}", format_health_report(&outcome.health));

    Ok(outcome.health.all_passed())
}
