//! Workflow and agent catalogs consulted by the health check
//!
//! The health check only needs to know whether definitions load. The
//! filesystem implementations read them from the state directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{GuardError, GuardResult};

/// A workflow definition as stored on disk
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<serde_yaml::Value>,
}

/// Source of workflow definitions
pub trait WorkflowCatalog {
    fn list_workflows(&self) -> GuardResult<Vec<WorkflowDefinition>>;
}

/// Source of agent names
pub trait AgentCatalog {
    fn list_agents(&self) -> GuardResult<Vec<String>>;
}

/// Reads `*.yaml` / `*.yml` workflow files from a directory
#[derive(Debug, Clone)]
pub struct FsWorkflowCatalog {
    dir: PathBuf,
}

impl FsWorkflowCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl WorkflowCatalog for FsWorkflowCatalog {
    fn list_workflows(&self) -> GuardResult<Vec<WorkflowDefinition>> {
        let mut workflows = Vec::new();
        for path in sorted_entries(&self.dir, "Workflow directory")? {
            let is_yaml = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            );
            if !is_yaml {
                continue;
            }

            let contents = fs::read_to_string(&path)
                .map_err(|e| GuardError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
            let workflow: WorkflowDefinition = serde_yaml::from_str(&contents).map_err(|e| {
                GuardError::Validation(format!("Invalid workflow {}: {}", path.display(), e))
            })?;
            workflows.push(workflow);
        }
        Ok(workflows)
    }
}

/// Treats every file in a directory as one agent, named by its file stem
#[derive(Debug, Clone)]
pub struct FsAgentCatalog {
    dir: PathBuf,
}

impl FsAgentCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl AgentCatalog for FsAgentCatalog {
    fn list_agents(&self) -> GuardResult<Vec<String>> {
        Ok(sorted_entries(&self.dir, "Agent directory")?
            .iter()
            .filter(|p| p.is_file())
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect())
    }
}

fn sorted_entries(dir: &Path, entity_type: &'static str) -> GuardResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(GuardError::NotFound {
            entity_type,
            identifier: dir.display().to_string(),
        });
    }
    let mut entries = fs::read_dir(dir)
        .map_err(|e| GuardError::Io(format!("Failed to read {}: {}", dir.display(), e)))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect::<Vec<_>>();
    entries.sort();
    Ok(entries)
}
