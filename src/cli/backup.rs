//! Backup CLI commands
//!
//! Implements CLI commands for backup management.

use clap::Subcommand;
use std::path::Path;

use crate::backup::{BackupManager, BackupMetadata};
use crate::config::paths::ProjectPaths;
use crate::config::settings::Settings;
use crate::display::{format_backup_details, format_backup_list};
use crate::error::{GuardError, GuardResult};

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a new backup of the state directory
    Create {
        /// Why the backup is being taken
        #[arg(short, long, default_value = "manual")]
        reason: String,
    },

    /// List all available backups (details with --verbose)
    List,

    /// Show information about a specific backup
    Info {
        /// Backup name or path (use 'latest' for most recent)
        backup: String,
    },

    /// Restore the state directory from a backup
    Restore {
        /// Backup name or path (use 'latest' for most recent)
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete a backup
    Delete {
        /// Backup name or path
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a backup command
pub fn handle_backup_command(
    paths: &ProjectPaths,
    settings: &Settings,
    cmd: BackupCommands,
    verbose: bool,
) -> GuardResult<()> {
    let manager = BackupManager::new(paths.clone(), settings);

    match cmd {
        BackupCommands::Create { reason } => {
            println!("Creating backup...");
            let backup_path = manager.create_backup(&reason)?;
            println!("Backup created: {}", file_name(&backup_path));
            println!("Location: {}", backup_path.display());
        }

        BackupCommands::List => {
            let backups = manager.list_backups()?;
            print!("{}", format_backup_list(&backups, verbose, chrono::Utc::now()));
        }

        BackupCommands::Info { backup } => {
            let metadata = resolve_backup(&manager, &backup)?;
            print!("{}", format_backup_details(&metadata));
        }

        BackupCommands::Restore { backup, force } => {
            let metadata = resolve_backup(&manager, &backup)?;

            println!("Backup Information");
            println!("==================");
            println!("Name: {}", metadata.name());
            println!(
                "Created: {}",
                metadata.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("Reason: {}", metadata.reason);
            println!("Files: {}", metadata.file_count);
            println!();

            if !force {
                println!("WARNING: This will replace the entire state directory!");
                println!("To proceed, run again with --force flag:");
                println!("  stateguard backup restore {} --force", backup);
                return Ok(());
            }

            // Keep the current state unless the extra backup would prune the one being restored
            if paths.is_initialized() && survives_one_more(&manager, &metadata)? {
                println!("Creating backup of current state before restore...");
                let pre_restore = manager.create_backup("pre_restore")?;
                println!("Pre-restore backup saved: {}", file_name(&pre_restore));
                println!();
            }

            println!("Restoring from backup...");
            manager.restore_backup(&metadata.backup_path)?;
            println!("Restore complete!");
        }

        BackupCommands::Delete { backup, force } => {
            let metadata = resolve_backup(&manager, &backup)?;

            if !force {
                println!("This will permanently delete {}.", metadata.name());
                println!("To proceed, run again with --force flag:");
                println!("  stateguard backup delete {} --force", backup);
                return Ok(());
            }

            manager.delete_backup(&metadata.backup_path)?;
            println!("Deleted backup {}.", metadata.name());
        }
    }

    Ok(())
}

/// Resolve a backup identifier to its metadata
fn resolve_backup(manager: &BackupManager, backup: &str) -> GuardResult<BackupMetadata> {
    // Handle "latest" keyword
    if backup.eq_ignore_ascii_case("latest") {
        return manager
            .get_latest_backup()?
            .ok_or_else(|| GuardError::backup_not_found("latest"));
    }

    // A full path resolves by its directory name
    let name = Path::new(backup)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| backup.to_string());

    manager
        .get_backup(&name)?
        .ok_or_else(|| GuardError::backup_not_found(backup))
}

/// Whether `backup` would still exist after one more backup is created
fn survives_one_more(manager: &BackupManager, backup: &BackupMetadata) -> GuardResult<bool> {
    let backups = manager.list_backups()?;
    let position = backups
        .iter()
        .position(|b| b.backup_path == backup.backup_path)
        .unwrap_or(backups.len());
    Ok(position + 1 < manager.max_backups())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
