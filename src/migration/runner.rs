//! Transactional migration runner
//!
//! Applies and reverts migrations against the project's datastore. Every
//! mutating run holds the project lock, takes a backup first, and performs
//! all transforms plus tracking-table updates inside a single transaction.
//! If anything fails the transaction is rolled back, the connection closed,
//! and the backup restored.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OpenFlags};
use serde::Serialize;
use tracing::{debug, info};

use super::lock::MigrationLock;
use super::model::Migration;
use crate::backup::BackupManager;
use crate::config::paths::ProjectPaths;
use crate::config::settings::Settings;
use crate::error::{GuardError, GuardResult};

/// Name of the table recording applied migrations
pub const TRACKING_TABLE: &str = "schema_version";

/// Backup reason used before applying migrations
pub const PRE_MIGRATION: &str = "pre_migration";

/// Backup reason used before reverting migrations
pub const PRE_ROLLBACK: &str = "pre_rollback";

const CREATE_TRACKING_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    description TEXT,
    applied_at TEXT
)";

/// One row of the tracking table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
    pub applied_at: String,
}

/// Advances or reverts the datastore schema for one project
pub struct MigrationRunner {
    paths: ProjectPaths,
    database_path: PathBuf,
    backups: BackupManager,
}

impl MigrationRunner {
    /// Create a new MigrationRunner
    pub fn new(paths: ProjectPaths, settings: &Settings) -> Self {
        Self {
            database_path: paths.database_file(&settings.database_file),
            backups: BackupManager::new(paths.clone(), settings),
            paths,
        }
    }

    /// Path to the datastore file
    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// Backup manager used for pre-migration backups
    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Highest applied version; 0 when there is no datastore or tracking table
    pub fn current_version(&self) -> GuardResult<i64> {
        match self.open_existing()? {
            Some(conn) => max_version(&conn),
            None => Ok(0),
        }
    }

    /// All tracking rows, oldest version first
    pub fn applied_migrations(&self) -> GuardResult<Vec<AppliedMigration>> {
        let Some(conn) = self.open_existing()? else {
            return Ok(Vec::new());
        };
        if !tracking_table_exists(&conn)? {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(
            "SELECT version, COALESCE(description, ''), COALESCE(applied_at, '')
             FROM schema_version ORDER BY version",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AppliedMigration {
                version: row.get(0)?,
                description: row.get(1)?,
                applied_at: row.get(2)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(GuardError::from)
    }

    /// Migrations from `migrations` newer than the current version, ascending
    pub fn pending<'a>(&self, migrations: &'a [Migration]) -> GuardResult<Vec<&'a Migration>> {
        let current = self.current_version()?;
        Ok(select_pending(migrations, current))
    }

    /// Apply every migration newer than the current version
    ///
    /// Returns the versions applied, in order. Nothing is backed up or
    /// changed when there is nothing to apply.
    ///
    /// # Errors
    ///
    /// - `Validation` for non-positive or duplicate versions
    /// - `Locked` when another run holds the project lock
    /// - `NotFound` when the state directory is missing
    /// - `Restored` wrapping the `Migration` failure after a successful restore
    /// - `RecoveryFailed` when restoring the pre-migration backup failed too
    pub fn run_migrations(&self, migrations: &[Migration]) -> GuardResult<Vec<i64>> {
        validate_registry(migrations)?;
        let _lock = MigrationLock::acquire(&self.paths, "run_migrations")?;

        let current = {
            let conn = self.open()?;
            conn.execute_batch(CREATE_TRACKING_TABLE)?;
            max_version(&conn)?
        };

        let pending = select_pending(migrations, current);
        if pending.is_empty() {
            debug!(current, "no pending migrations");
            return Ok(Vec::new());
        }

        info!(
            current,
            latest = pending.last().map(|m| m.version).unwrap_or(current),
            count = pending.len(),
            "applying migrations"
        );

        self.backups.guarded(PRE_MIGRATION, |_| {
            let mut conn = self.open()?;
            let tx = conn.transaction()?;

            for migration in &pending {
                debug!(version = migration.version, description = %migration.description, "applying migration");
                migration
                    .apply_up(&tx)
                    .and_then(|()| {
                        tx.execute(
                            "INSERT INTO schema_version (version, description, applied_at)
                             VALUES (?1, ?2, ?3)",
                            params![migration.version, migration.description, now()],
                        )
                        .map(|_| ())
                        .map_err(GuardError::from)
                    })
                    .map_err(|e| GuardError::Migration {
                        version: migration.version,
                        message: e.to_string(),
                    })?;
            }

            tx.commit()?;
            Ok(pending.iter().map(|m| m.version).collect())
        })
    }

    /// Revert every applied migration newer than `target_version`
    ///
    /// Every migration to revert must be in `migrations` and define a `down`
    /// transform; this is checked before anything is touched. Returns the
    /// versions reverted, most recent first.
    ///
    /// # Errors
    ///
    /// Same as [`MigrationRunner::run_migrations`], with `Rollback` as the
    /// wrapped failure and `Validation` for missing or irreversible migrations.
    pub fn rollback_migration(
        &self,
        target_version: i64,
        migrations: &[Migration],
    ) -> GuardResult<Vec<i64>> {
        validate_registry(migrations)?;
        if target_version < 0 {
            return Err(GuardError::Validation(format!(
                "Rollback target must not be negative (got {})",
                target_version
            )));
        }

        let _lock = MigrationLock::acquire(&self.paths, "rollback_migration")?;

        let to_rollback = match self.open_existing()? {
            Some(conn) if tracking_table_exists(&conn)? => {
                applied_versions_above(&conn, target_version)?
            }
            _ => Vec::new(),
        };
        if to_rollback.is_empty() {
            debug!(target_version, "nothing to roll back");
            return Ok(Vec::new());
        }

        let by_version: HashMap<i64, &Migration> =
            migrations.iter().map(|m| (m.version, m)).collect();
        let mut problems = Vec::new();
        let mut plan = Vec::with_capacity(to_rollback.len());
        for version in &to_rollback {
            match by_version.get(version) {
                None => problems.push(format!("migration {} is not in the provided set", version)),
                Some(m) if !m.has_down() => problems.push(format!(
                    "migration {} ({}) has no down transform",
                    version, m.description
                )),
                Some(m) => plan.push(*m),
            }
        }
        if !problems.is_empty() {
            return Err(GuardError::Validation(format!(
                "Cannot roll back to version {}: {}",
                target_version,
                problems.join("; ")
            )));
        }

        info!(target_version, count = plan.len(), "rolling back migrations");

        self.backups.guarded(PRE_ROLLBACK, |_| {
            let mut conn = self.open()?;
            let tx = conn.transaction()?;

            for migration in &plan {
                debug!(version = migration.version, "reverting migration");
                migration
                    .apply_down(&tx)
                    .and_then(|_| {
                        tx.execute(
                            "DELETE FROM schema_version WHERE version = ?1",
                            params![migration.version],
                        )
                        .map(|_| ())
                        .map_err(GuardError::from)
                    })
                    .map_err(|e| GuardError::Rollback {
                        version: migration.version,
                        message: e.to_string(),
                    })?;
            }

            tx.commit()?;
            Ok(to_rollback.clone())
        })
    }

    /// Open (creating if needed) the datastore; the state directory must exist
    fn open(&self) -> GuardResult<Connection> {
        let state_dir = self.paths.state_dir();
        if !state_dir.is_dir() {
            return Err(GuardError::state_dir_not_found(state_dir));
        }
        Connection::open(&self.database_path).map_err(|e| {
            GuardError::Database(format!(
                "Failed to open {}: {}",
                self.database_path.display(),
                e
            ))
        })
    }

    /// Open the datastore read-only without creating it
    fn open_existing(&self) -> GuardResult<Option<Connection>> {
        if !self.database_path.is_file() {
            return Ok(None);
        }
        let conn = Connection::open_with_flags(&self.database_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| {
                GuardError::Database(format!(
                    "Failed to open {}: {}",
                    self.database_path.display(),
                    e
                ))
            })?;
        Ok(Some(conn))
    }
}

/// Reject registries the runner cannot reason about
fn validate_registry(migrations: &[Migration]) -> GuardResult<()> {
    let mut seen = HashSet::new();
    for migration in migrations {
        if migration.version <= 0 {
            return Err(GuardError::Validation(format!(
                "Migration version must be positive (got {} for '{}')",
                migration.version, migration.description
            )));
        }
        if !seen.insert(migration.version) {
            return Err(GuardError::Validation(format!(
                "Duplicate migration version {}",
                migration.version
            )));
        }
    }
    Ok(())
}

fn select_pending(migrations: &[Migration], current: i64) -> Vec<&Migration> {
    let mut pending: Vec<&Migration> = migrations.iter().filter(|m| m.version > current).collect();
    pending.sort_by_key(|m| m.version);
    pending
}

pub(crate) fn tracking_table_exists(conn: &Connection) -> GuardResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![TRACKING_TABLE],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn max_version(conn: &Connection) -> GuardResult<i64> {
    if !tracking_table_exists(conn)? {
        return Ok(0);
    }
    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn applied_versions_above(conn: &Connection, target: i64) -> GuardResult<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT version FROM schema_version WHERE version > ?1 ORDER BY version DESC")?;
    let rows = stmt.query_map(params![target], |row| row.get(0))?;
    rows.collect::<Result<Vec<i64>, _>>().map_err(GuardError::from)
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
