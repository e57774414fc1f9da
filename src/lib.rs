//! stateguard - keeps a project's persisted state safe across tool upgrades
//!
//! Before anything destructive happens the library answers three questions:
//! is the stored state compatible with the running tool, can it be migrated
//! safely, and can it be restored exactly as it was if migration fails.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Project paths and explicitly constructed settings
//! - `error`: Custom error types
//! - `storage`: Atomic JSON files and directory tree copies
//! - `version`: Semantic versions and compatibility checking
//! - `backup`: Timestamped backups, restore and retention
//! - `migration`: Transactional schema migrations with rollback
//! - `health`: Read-only post-update health checks
//! - `upgrade`: Project initialization and the end-to-end upgrade flow
//! - `display`, `cli`: Terminal output and command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use stateguard::config::{ProjectPaths, Settings};
//! use stateguard::upgrade::run_upgrade;
//!
//! let paths = ProjectPaths::new()?;
//! let settings = Settings::load_or_default(&paths)?;
//! let outcome = run_upgrade(&paths, &settings, false)?;
//! assert!(outcome.health.all_passed());
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod health;
pub mod migration;
pub mod storage;
pub mod upgrade;
pub mod version;

pub use error::{GuardError, GuardResult};
