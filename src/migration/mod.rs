//! Datastore schema migrations
//!
//! - `model`: the `Migration` type (versioned up/down transforms)
//! - `runner`: applies and reverts migrations transactionally, behind a
//!   backup and the project lock
//! - `lock`: advisory one-run-per-project lock
//! - `builtin`: the tool's own schema
//!
//! # Example
//!
//! ```rust,ignore
//! use stateguard::config::{ProjectPaths, Settings};
//! use stateguard::migration::{builtin, MigrationRunner};
//!
//! let paths = ProjectPaths::new()?;
//! let settings = Settings::load_or_default(&paths)?;
//! let runner = MigrationRunner::new(paths, &settings);
//! let applied = runner.run_migrations(&builtin::migrations())?;
//! ```

pub mod builtin;
mod lock;
mod model;
mod runner;

pub use lock::{LockInfo, MigrationLock};
pub use model::{Migration, Transform};
pub use runner::{AppliedMigration, MigrationRunner, PRE_MIGRATION, PRE_ROLLBACK, TRACKING_TABLE};
