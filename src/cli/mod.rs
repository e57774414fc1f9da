//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the library components.

pub mod backup;
pub mod migrate;
pub mod project;
pub mod version;

pub use backup::{handle_backup_command, BackupCommands};
pub use migrate::{handle_migrate_command, MigrateCommands};
pub use project::{
    handle_check_command, handle_health_command, handle_init_command, handle_upgrade_command,
};
pub use version::{handle_version_command, VersionCommands};
