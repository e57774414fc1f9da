//! Backup system for stateguard
//!
//! Full, timestamped copies of a project's state directory with a fixed
//! retention cap and restore support.
//!
//! # Architecture
//!
//! - `manager`: creates, lists, deletes and prunes backups
//! - `restore`: replaces the state directory with a backup
//! - `guard`: runs a destructive operation behind a backup and restores it
//!   on failure
//!
//! # Backup Format
//!
//! ```text
//! <project>/.state-backups/backup_20250101_120000_123456/
//!   .state/                 full copy of the state directory
//!   backup_metadata.json    timestamp, tool_version, reason, file_count,
//!                           files, backup_path
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use stateguard::backup::BackupManager;
//! use stateguard::config::{ProjectPaths, Settings};
//!
//! let paths = ProjectPaths::new()?;
//! let settings = Settings::load_or_default(&paths)?;
//! let backups = BackupManager::new(paths, &settings);
//!
//! let backup_path = backups.create_backup("manual")?;
//! backups.restore_backup(&backup_path)?;
//! ```

mod guard;
mod manager;
mod restore;

pub use manager::{BackupManager, BackupMetadata, BACKUP_PREFIX, METADATA_FILE};
