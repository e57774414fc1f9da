//! The tool's own datastore schema
//!
//! Every table listed in `Settings::required_tables` (apart from the
//! tracking table) is created here.

use super::model::Migration;

/// Built-in migrations, oldest first
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration::sql(
            1,
            "create workflow_runs",
            "CREATE TABLE workflow_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workflow_name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                started_at TEXT NOT NULL,
                finished_at TEXT
            );",
        )
        .with_down_sql("DROP TABLE workflow_runs;"),
        Migration::sql(
            2,
            "create step_results",
            "CREATE TABLE step_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id INTEGER NOT NULL REFERENCES workflow_runs(id) ON DELETE CASCADE,
                step_name TEXT NOT NULL,
                status TEXT NOT NULL,
                output TEXT,
                recorded_at TEXT NOT NULL
            );",
        )
        .with_down_sql("DROP TABLE step_results;"),
        Migration::sql(
            3,
            "create agent_invocations",
            "CREATE TABLE agent_invocations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id INTEGER REFERENCES workflow_runs(id) ON DELETE SET NULL,
                agent_name TEXT NOT NULL,
                prompt_tokens INTEGER NOT NULL DEFAULT 0,
                completion_tokens INTEGER NOT NULL DEFAULT 0,
                invoked_at TEXT NOT NULL
            );
            CREATE INDEX idx_agent_invocations_agent ON agent_invocations(agent_name);",
        )
        .with_down_sql(
            "DROP INDEX IF EXISTS idx_agent_invocations_agent;
             DROP TABLE agent_invocations;",
        ),
    ]
}

/// Highest built-in version
pub fn latest_version() -> i64 {
    migrations().iter().map(|m| m.version).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ProjectPaths;
    use crate::config::settings::Settings;
    use crate::migration::runner::MigrationRunner;
    use rusqlite::Connection;
    use std::fs;
    use tempfile::TempDir;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn test_versions_are_contiguous_and_reversible() {
        let all = migrations();
        let versions: Vec<i64> = all.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
        assert!(all.iter().all(|m| m.has_down()));
        assert_eq!(latest_version(), 3);
    }

    #[test]
    fn test_creates_required_tables() {
        let temp = TempDir::new().unwrap();
        let paths = ProjectPaths::with_project_dir(temp.path());
        fs::create_dir_all(paths.state_dir()).unwrap();
        let settings = Settings::default();
        let runner = MigrationRunner::new(paths, &settings);

        runner.run_migrations(&migrations()).unwrap();

        let conn = Connection::open(runner.database_path()).unwrap();
        let tables = table_names(&conn);
        for required in &settings.required_tables {
            assert!(tables.contains(required), "missing {required}");
        }
    }

    #[test]
    fn test_full_rollback_leaves_only_tracking_table() {
        let temp = TempDir::new().unwrap();
        let paths = ProjectPaths::with_project_dir(temp.path());
        fs::create_dir_all(paths.state_dir()).unwrap();
        let runner = MigrationRunner::new(paths, &Settings::default());

        runner.run_migrations(&migrations()).unwrap();
        let reverted = runner.rollback_migration(0, &migrations()).unwrap();

        assert_eq!(reverted, vec![3, 2, 1]);
        let conn = Connection::open(runner.database_path()).unwrap();
        let tables: Vec<String> = table_names(&conn)
            .into_iter()
            .filter(|t| !t.starts_with("sqlite_"))
            .collect();
        assert_eq!(tables, vec!["schema_version".to_string()]);
    }
}
