//! Migration CLI commands

use clap::Subcommand;

use crate::config::paths::ProjectPaths;
use crate::config::settings::Settings;
use crate::display::format_migration_status;
use crate::error::GuardResult;
use crate::migration::{builtin, MigrationLock, MigrationRunner};

/// Migration subcommands
#[derive(Subcommand)]
pub enum MigrateCommands {
    /// Show applied and pending schema migrations
    Status,

    /// Apply all pending schema migrations
    Run,

    /// Revert schema migrations newer than TARGET
    Rollback {
        /// Schema version to roll back to (0 reverts everything)
        target: i64,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Remove a migration lock left behind by a crashed process
    Unlock {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a migrate command
pub fn handle_migrate_command(
    paths: &ProjectPaths,
    settings: &Settings,
    cmd: MigrateCommands,
) -> GuardResult<()> {
    let runner = MigrationRunner::new(paths.clone(), settings);
    let migrations = builtin::migrations();

    match cmd {
        MigrateCommands::Status => {
            let current = runner.current_version()?;
            let applied = runner.applied_migrations()?;
            let pending = runner.pending(&migrations)?;
            print!("{}", format_migration_status(current, &applied, &pending));
        }

        MigrateCommands::Run => {
            let applied = runner.run_migrations(&migrations)?;
            if applied.is_empty() {
                println!("Schema is up to date (version {}).", runner.current_version()?);
            } else {
                println!("Applied {} migration(s): {:?}", applied.len(), applied);
                println!("Schema version: {}", runner.current_version()?);
            }
        }

        MigrateCommands::Rollback { target, force } => {
            let current = runner.current_version()?;
            if target >= current {
                println!("Nothing to roll back (schema version {}).", current);
                return Ok(());
            }

            if !force {
                println!(
                    "WARNING: This will revert schema version {} down to {}.",
                    current, target
                );
                println!("To proceed, run again with --force flag:");
                println!("  stateguard migrate rollback {} --force", target);
                return Ok(());
            }

            let reverted = runner.rollback_migration(target, &migrations)?;
            println!("Reverted {} migration(s): {:?}", reverted.len(), reverted);
            println!("Schema version: {}", runner.current_version()?);
        }

        MigrateCommands::Unlock { force } => {
            if !paths.lock_file().exists() {
                println!("No migration lock held.");
                return Ok(());
            }

            match MigrationLock::holder(paths) {
                Some(info) => println!(
                    "Lock held by '{}' (pid {}) since {}",
                    info.operation,
                    info.pid,
                    info.created_at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                None => println!("Lock file {} is unreadable", paths.lock_file().display()),
            }

            if !force {
                println!("Only remove the lock if that process is no longer running.");
                println!("To proceed, run again with --force flag:");
                println!("  stateguard migrate unlock --force");
                return Ok(());
            }

            if MigrationLock::force_release(paths)? {
                println!("Migration lock removed.");
            }
        }
    }

    Ok(())
}
