//! Advisory migration lock
//!
//! At most one migration run per project at a time. The lock is a file next
//! to the state directory created with `create_new`, holding the owner's pid,
//! the acquisition time and the operation name. Dropping the guard removes it.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::paths::ProjectPaths;
use crate::error::{GuardError, GuardResult};
use crate::storage::read_json_required;

/// Contents of the lock file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub created_at: DateTime<Utc>,
    pub operation: String,
}

/// Held advisory lock; released on drop
#[derive(Debug)]
pub struct MigrationLock {
    path: PathBuf,
    released: bool,
}

impl MigrationLock {
    /// Acquire the lock for `operation`, failing if anyone else holds it
    pub fn acquire(paths: &ProjectPaths, operation: &str) -> GuardResult<Self> {
        let path = paths.lock_file();

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let holder = match Self::holder(paths) {
                    Some(info) => format!(
                        "'{}' by pid {} since {}",
                        info.operation,
                        info.pid,
                        info.created_at.to_rfc3339()
                    ),
                    None => "an unknown process".to_string(),
                };
                return Err(GuardError::Locked(format!(
                    "{} is held by {} (run `stateguard migrate unlock` if that process is gone)",
                    path.display(),
                    holder
                )));
            }
            Err(e) => {
                return Err(GuardError::Io(format!(
                    "Failed to create lock {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let info = LockInfo {
            pid: std::process::id(),
            created_at: Utc::now(),
            operation: operation.to_string(),
        };
        let written = serde_json::to_vec_pretty(&info)
            .map_err(GuardError::from)
            .and_then(|bytes| file.write_all(&bytes).map_err(GuardError::from))
            .and_then(|()| file.sync_all().map_err(GuardError::from));
        if let Err(e) = written {
            if let Err(cleanup_err) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %cleanup_err, "failed to remove half-written lock");
            }
            return Err(e);
        }

        debug!(path = %path.display(), operation, "acquired migration lock");
        Ok(Self {
            path,
            released: false,
        })
    }

    /// Who holds the lock, if it exists and is readable
    pub fn holder(paths: &ProjectPaths) -> Option<LockInfo> {
        read_json_required(paths.lock_file()).ok()
    }

    /// Remove a lock left behind by a crashed process
    ///
    /// Returns whether a lock file was removed.
    pub fn force_release(paths: &ProjectPaths) -> GuardResult<bool> {
        let path = paths.lock_file();
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|e| {
            GuardError::Io(format!("Failed to remove lock {}: {}", path.display(), e))
        })?;
        warn!(path = %path.display(), "forcibly released migration lock");
        Ok(true)
    }

    /// Release the lock explicitly
    pub fn release(mut self) -> GuardResult<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> GuardResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                GuardError::Io(format!("Failed to remove lock {}: {}", self.path.display(), e))
            })?;
        }
        Ok(())
    }
}

impl Drop for MigrationLock {
    fn drop(&mut self) {
        if let Err(e) = self.release_inner() {
            warn!(error = %e, "failed to release migration lock");
        }
    }
}
