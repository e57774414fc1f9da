//! Custom error types for stateguard
//!
//! This module defines the error hierarchy for the library using thiserror.
//! Every failure is raised with an explicit kind at the point where it
//! happens, so callers can match on the variant instead of the message.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for stateguard operations
#[derive(Error, Debug)]
pub enum GuardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors (copy, remove, read, write)
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Datastore errors outside of a migration transform
    #[error("Database error: {0}")]
    Database(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Malformed semantic version string
    #[error("Invalid version '{input}': {reason}")]
    VersionParse { input: String, reason: String },

    /// Validation errors, raised before anything is mutated
    #[error("Validation error: {0}")]
    Validation(String),

    /// Another process holds the migration lock
    #[error("Project is locked: {0}")]
    Locked(String),

    /// An `up` transform failed
    #[error("Migration {version} failed: {message}")]
    Migration { version: i64, message: String },

    /// A `down` transform failed
    #[error("Rollback of migration {version} failed: {message}")]
    Rollback { version: i64, message: String },

    /// The guarded operation failed and the backup was restored
    #[error("{source}; state was restored from backup {}", .backup.display())]
    Restored {
        #[source]
        source: Box<GuardError>,
        backup: PathBuf,
    },

    /// The guarded operation failed and restoring the backup failed as well
    #[error(
        "{source}; restoring backup {} also failed: {restore_error}",
        .backup.display()
    )]
    RecoveryFailed {
        #[source]
        source: Box<GuardError>,
        restore_error: Box<GuardError>,
        backup: PathBuf,
    },
}

impl GuardError {
    /// Create a "not found" error for the state directory
    pub fn state_dir_not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            entity_type: "State directory",
            identifier: path.into().display().to_string(),
        }
    }

    /// Create a "not found" error for backups
    pub fn backup_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if a failed operation was followed by a successful restore
    pub fn was_restored(&self) -> bool {
        matches!(self, Self::Restored { .. })
    }

    /// Check if both the operation and the restore of its backup failed
    pub fn is_recovery_failed(&self) -> bool {
        matches!(self, Self::RecoveryFailed { .. })
    }

    /// The backup that was (or should have been) restored, if any
    pub fn backup_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Restored { backup, .. } | Self::RecoveryFailed { backup, .. } => Some(backup),
            _ => None,
        }
    }

    /// The original failure, unwrapping restore context
    pub fn root_cause(&self) -> &GuardError {
        match self {
            Self::Restored { source, .. } | Self::RecoveryFailed { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for GuardError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GuardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<rusqlite::Error> for GuardError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for stateguard operations
pub type GuardResult<T> = Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GuardError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = GuardError::backup_not_found("backup_20250101_120000_000001");
        assert_eq!(
            err.to_string(),
            "Backup not found: backup_20250101_120000_000001"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_restored_error_names_backup_and_cause() {
        let err = GuardError::Restored {
            source: Box::new(GuardError::Migration {
                version: 2,
                message: "table exists".into(),
            }),
            backup: PathBuf::from("/tmp/backup_x"),
        };
        let text = err.to_string();
        assert!(text.contains("Migration 2 failed: table exists"));
        assert!(text.contains("restored from backup /tmp/backup_x"));
        assert!(err.was_restored());
        assert!(!err.is_recovery_failed());
        assert!(matches!(err.root_cause(), GuardError::Migration { version: 2, .. }));
    }

    #[test]
    fn test_recovery_failed_names_both_failures() {
        let err = GuardError::RecoveryFailed {
            source: Box::new(GuardError::Rollback {
                version: 3,
                message: "boom".into(),
            }),
            restore_error: Box::new(GuardError::Io("disk full".into())),
            backup: PathBuf::from("/tmp/backup_y"),
        };
        let text = err.to_string();
        assert!(text.contains("Rollback of migration 3 failed: boom"));
        assert!(text.contains("I/O error: disk full"));
        assert!(err.is_recovery_failed());
        assert_eq!(err.backup_path(), Some(&PathBuf::from("/tmp/backup_y")));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let guard_err: GuardError = io_err.into();
        assert!(matches!(guard_err, GuardError::Io(_)));
    }
}
