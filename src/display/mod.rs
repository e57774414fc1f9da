//! Display formatting for terminal output
//!
//! Plain-text renderings of compatibility results, backups, migration
//! status and health reports.

pub mod backup;
pub mod health;
pub mod migration;
pub mod version;

pub use backup::{format_backup_details, format_backup_list, format_duration};
pub use health::format_health_report;
pub use migration::format_migration_status;
pub use version::format_compatibility;
