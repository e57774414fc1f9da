//! Post-update health checks
//!
//! Five independent, read-only audits of a project. Expected problems are
//! reported as failed results with a fix suggestion; an unexpected error in
//! a check becomes a failed result too, so a report is always produced.

use std::collections::BTreeSet;

use git2::{ErrorCode, Repository};
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info, warn};

use super::catalog::{AgentCatalog, FsAgentCatalog, FsWorkflowCatalog, WorkflowCatalog};
use super::report::{HealthCheckReport, HealthCheckResult};
use crate::config::paths::ProjectPaths;
use crate::config::settings::Settings;
use crate::error::GuardResult;

pub const CONFIG_FILES: &str = "config_files";
pub const DATABASE_SCHEMA: &str = "database_schema";
pub const WORKFLOWS: &str = "workflows";
pub const AGENTS: &str = "agents";
pub const GIT: &str = "git";

/// Read-only auditor for one project
pub struct SystemHealthCheck {
    paths: ProjectPaths,
    settings: Settings,
    workflows: Box<dyn WorkflowCatalog>,
    agents: Box<dyn AgentCatalog>,
}

impl SystemHealthCheck {
    pub fn new(
        paths: ProjectPaths,
        settings: Settings,
        workflows: Box<dyn WorkflowCatalog>,
        agents: Box<dyn AgentCatalog>,
    ) -> Self {
        Self {
            paths,
            settings,
            workflows,
            agents,
        }
    }

    /// Use the catalogs stored in the project's state directory
    pub fn with_default_catalogs(paths: ProjectPaths, settings: Settings) -> Self {
        let workflows = Box::new(FsWorkflowCatalog::new(paths.workflows_dir()));
        let agents = Box::new(FsAgentCatalog::new(paths.agents_dir()));
        Self::new(paths, settings, workflows, agents)
    }

    /// Run every check
    ///
    /// Details are kept only when `verbose` is set, in which case each
    /// result is also logged.
    pub fn run_post_update_check(&self, verbose: bool) -> HealthCheckReport {
        let checks: [(&str, fn(&Self) -> GuardResult<HealthCheckResult>); 5] = [
            (CONFIG_FILES, Self::check_config_files),
            (DATABASE_SCHEMA, Self::check_database_schema),
            (WORKFLOWS, Self::check_workflows),
            (AGENTS, Self::check_agents),
            (GIT, Self::check_git),
        ];

        let results = checks
            .iter()
            .map(|(name, check)| {
                let mut result = check(self).unwrap_or_else(|e| {
                    warn!(check = *name, error = %e, "health check errored");
                    HealthCheckResult::fail(
                        name,
                        format!("Check could not run: {}", e),
                        "Re-run with --verbose and inspect the error",
                    )
                });
                if verbose {
                    info!(check = *name, passed = result.passed, "{}", result.message);
                } else {
                    result.details.clear();
                }
                result
            })
            .collect();

        HealthCheckReport::new(results)
    }

    /// State directory exists and holds every required file
    pub fn check_config_files(&self) -> GuardResult<HealthCheckResult> {
        let state_dir = self.paths.state_dir();
        if !state_dir.is_dir() {
            return Ok(HealthCheckResult::fail(
                CONFIG_FILES,
                format!("State directory {} does not exist", state_dir.display()),
                "Run `stateguard init` or restore a backup",
            ));
        }

        let required = self.settings.required_state_files();
        let (present, missing): (Vec<&String>, Vec<&String>) =
            required.iter().partition(|f| state_dir.join(f).is_file());

        let details = present.iter().map(|f| format!("found {}", f)).collect();
        if missing.is_empty() {
            Ok(HealthCheckResult::pass(
                CONFIG_FILES,
                format!("All {} required files present", present.len()),
            )
            .with_details(details))
        } else {
            Ok(HealthCheckResult::fail(
                CONFIG_FILES,
                format!("Missing required files: {}", join(&missing)),
                "Run `stateguard upgrade` or restore the latest backup",
            )
            .with_details(details))
        }
    }

    /// Datastore exists and contains every required table
    pub fn check_database_schema(&self) -> GuardResult<HealthCheckResult> {
        let db_path = self.paths.database_file(&self.settings.database_file);
        if !db_path.is_file() {
            return Ok(HealthCheckResult::fail(
                DATABASE_SCHEMA,
                format!("Datastore {} does not exist", db_path.display()),
                "Run `stateguard migrate run`",
            ));
        }

        let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;

        let missing: Vec<&String> = self
            .settings
            .required_tables
            .iter()
            .filter(|t| !tables.contains(*t))
            .collect();
        let details = tables.iter().map(|t| format!("table {}", t)).collect();

        if missing.is_empty() {
            Ok(HealthCheckResult::pass(
                DATABASE_SCHEMA,
                format!("All {} required tables present", self.settings.required_tables.len()),
            )
            .with_details(details))
        } else {
            Ok(HealthCheckResult::fail(
                DATABASE_SCHEMA,
                format!("Missing tables: {}", join(&missing)),
                "Run `stateguard migrate run`",
            )
            .with_details(details))
        }
    }

    /// At least one workflow definition loads
    pub fn check_workflows(&self) -> GuardResult<HealthCheckResult> {
        match self.workflows.list_workflows() {
            Ok(workflows) if workflows.is_empty() => Ok(HealthCheckResult::fail(
                WORKFLOWS,
                "No workflows found",
                format!("Add workflow definitions to {}", self.paths.workflows_dir().display()),
            )),
            Ok(workflows) => Ok(HealthCheckResult::pass(
                WORKFLOWS,
                format!("{} workflows loaded", workflows.len()),
            )
            .with_details(workflows.into_iter().map(|w| w.name).collect())),
            Err(e) => {
                debug!(error = %e, "workflow catalog failed");
                Ok(HealthCheckResult::fail(
                    WORKFLOWS,
                    format!("Workflows could not be loaded: {}", e),
                    "Fix or remove the offending workflow definition",
                ))
            }
        }
    }

    /// Agent catalog loads and contains every expected agent
    pub fn check_agents(&self) -> GuardResult<HealthCheckResult> {
        let agents = match self.agents.list_agents() {
            Ok(agents) => agents,
            Err(e) => {
                debug!(error = %e, "agent catalog failed");
                return Ok(HealthCheckResult::fail(
                    AGENTS,
                    format!("Agents could not be loaded: {}", e),
                    format!("Add agent definitions to {}", self.paths.agents_dir().display()),
                ));
            }
        };

        let missing: Vec<&String> = self
            .settings
            .expected_agents
            .iter()
            .filter(|a| !agents.contains(*a))
            .collect();

        if missing.is_empty() {
            Ok(HealthCheckResult::pass(AGENTS, format!("{} agents available", agents.len()))
                .with_details(agents))
        } else {
            Ok(HealthCheckResult::fail(
                AGENTS,
                format!("Missing agents: {}", join(&missing)),
                format!("Add the missing agents to {}", self.paths.agents_dir().display()),
            )
            .with_details(agents))
        }
    }

    /// The repository containing the project, if any, is usable
    pub fn check_git(&self) -> GuardResult<HealthCheckResult> {
        let repo = match Repository::discover(self.paths.project_dir()) {
            Ok(repo) => repo,
            Err(e) if e.code() == ErrorCode::NotFound => {
                return Ok(HealthCheckResult::pass(GIT, "No git repository (optional)"));
            }
            Err(e) => {
                return Ok(HealthCheckResult::fail(
                    GIT,
                    format!("Git repository could not be opened: {}", e.message()),
                    "Check the repository with `git status`",
                ))
            }
        };

        if repo.is_bare() {
            return Ok(HealthCheckResult::fail(
                GIT,
                "Project repository is bare",
                "Use a repository with a working tree",
            ));
        }

        let details = repo
            .workdir()
            .map(|w| vec![format!("workdir {}", w.display())])
            .unwrap_or_default();
        Ok(HealthCheckResult::pass(GIT, "Git repository accessible").with_details(details))
    }
}

fn join(items: &[&String]) -> String {
    items.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
}
