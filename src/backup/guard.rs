//! Backup-then-mutate control flow
//!
//! A destructive operation runs only after a backup of the state directory
//! has been confirmed. If the operation fails the backup is restored and
//! the error says whether that restore worked.

use std::path::Path;

use tracing::{error, warn};

use super::manager::BackupManager;
use crate::error::{GuardError, GuardResult};

impl BackupManager {
    /// Run `operation` under the protection of a fresh backup
    ///
    /// The operation receives the backup path. On failure the backup is
    /// restored and the error is wrapped in `GuardError::Restored`, or in
    /// `GuardError::RecoveryFailed` when the restore fails too. Any resource
    /// the operation holds (such as a datastore connection) must be released
    /// before it returns, because the restore replaces the files underneath.
    pub fn guarded<T, F>(&self, reason: &str, operation: F) -> GuardResult<T>
    where
        F: FnOnce(&Path) -> GuardResult<T>,
    {
        let backup = self.create_backup(reason)?;

        match operation(&backup) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(reason, error = %err, "operation failed, restoring backup");
                match self.restore_backup(&backup) {
                    Ok(()) => Err(GuardError::Restored {
                        source: Box::new(err),
                        backup,
                    }),
                    Err(restore_err) => {
                        error!(
                            backup = %backup.display(),
                            error = %restore_err,
                            "restoring backup failed; state may be inconsistent"
                        );
                        Err(GuardError::RecoveryFailed {
                            source: Box::new(err),
                            restore_error: Box::new(restore_err),
                            backup,
                        })
                    }
                }
            }
        }
    }
}
