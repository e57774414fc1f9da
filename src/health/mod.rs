//! Post-update health verification
//!
//! - `report`: `HealthCheckResult` and the aggregated `HealthCheckReport`
//! - `catalog`: workflow and agent catalogs the checks consult
//! - `checks`: `SystemHealthCheck`, the five read-only audits

pub mod catalog;
pub mod checks;
pub mod report;

pub use catalog::{AgentCatalog, FsAgentCatalog, FsWorkflowCatalog, WorkflowCatalog, WorkflowDefinition};
pub use checks::SystemHealthCheck;
pub use report::{HealthCheckReport, HealthCheckResult};
