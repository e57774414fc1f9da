//! Version CLI commands

use clap::Subcommand;

use crate::config::paths::ProjectPaths;
use crate::config::settings::Settings;
use crate::error::GuardResult;
use crate::version::VersionManager;

/// Version subcommands
#[derive(Subcommand)]
pub enum VersionCommands {
    /// Show the tool version and the version recorded in the project
    Show,

    /// Overwrite the project's version marker
    Set {
        /// Semantic version, e.g. 1.1.0
        version: String,
    },
}

/// Handle a version command
pub fn handle_version_command(
    paths: &ProjectPaths,
    settings: &Settings,
    cmd: VersionCommands,
) -> GuardResult<()> {
    let manager = VersionManager::new(paths.clone(), settings.clone());

    match cmd {
        VersionCommands::Show => {
            println!("Tool version:    {}", settings.tool_version);
            match manager.get_project_version()? {
                Some(version) => println!("Project version: {}", version),
                None if paths.is_initialized() => println!("Project version: none (legacy project)"),
                None => println!("Project version: none (not initialized)"),
            }
            println!("Minimum compatible: {}", settings.min_compatible_version);
        }

        VersionCommands::Set { version } => {
            manager.set_project_version(&version)?;
            println!("Project version set to {}", version);
        }
    }

    Ok(())
}
