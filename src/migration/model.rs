//! Migration definitions
//!
//! A migration is a versioned transform of the datastore with an optional
//! inverse. Migrations are supplied by the caller and never persisted; only
//! the fact that one was applied is recorded in the tracking table.

use std::fmt;

use rusqlite::Connection;

use crate::error::GuardResult;

/// A state transform run against an open datastore connection
///
/// Inside the runner the connection is a transaction, so everything the
/// transform does commits or rolls back with the rest of the batch.
pub type Transform = Box<dyn Fn(&Connection) -> GuardResult<()> + Send + Sync>;

/// A versioned, optionally reversible datastore transform
pub struct Migration {
    /// Unique, positive version number
    pub version: i64,
    /// Human-readable description
    pub description: String,
    up: Transform,
    down: Option<Transform>,
}

impl Migration {
    /// Create an irreversible migration from a closure
    pub fn new<F>(version: i64, description: impl Into<String>, up: F) -> Self
    where
        F: Fn(&Connection) -> GuardResult<()> + Send + Sync + 'static,
    {
        Self {
            version,
            description: description.into(),
            up: Box::new(up),
            down: None,
        }
    }

    /// Create an irreversible migration from an SQL script
    pub fn sql(version: i64, description: impl Into<String>, up_sql: impl Into<String>) -> Self {
        let script = up_sql.into();
        Self::new(version, description, move |conn| {
            conn.execute_batch(&script)?;
            Ok(())
        })
    }

    /// Attach an inverse transform
    pub fn with_down<F>(mut self, down: F) -> Self
    where
        F: Fn(&Connection) -> GuardResult<()> + Send + Sync + 'static,
    {
        self.down = Some(Box::new(down));
        self
    }

    /// Attach an inverse SQL script
    pub fn with_down_sql(self, down_sql: impl Into<String>) -> Self {
        let script = down_sql.into();
        self.with_down(move |conn| {
            conn.execute_batch(&script)?;
            Ok(())
        })
    }

    /// Whether this migration can take part in a rollback
    pub fn has_down(&self) -> bool {
        self.down.is_some()
    }

    pub(crate) fn apply_up(&self, conn: &Connection) -> GuardResult<()> {
        (self.up)(conn)
    }

    /// Returns `Ok(false)` when there is no inverse to run
    pub(crate) fn apply_down(&self, conn: &Connection) -> GuardResult<bool> {
        match &self.down {
            Some(down) => down(conn).map(|()| true),
            None => Ok(false),
        }
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("description", &self.description)
            .field("reversible", &self.has_down())
            .finish()
    }
}
