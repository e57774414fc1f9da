//! Health check results

use serde::Serialize;

/// Outcome of a single health check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCheckResult {
    pub check_name: String,
    pub passed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_suggestion: Option<String>,
    /// Extra lines shown in verbose mode
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl HealthCheckResult {
    /// A passing result
    pub fn pass(check_name: &str, message: impl Into<String>) -> Self {
        Self {
            check_name: check_name.to_string(),
            passed: true,
            message: message.into(),
            fix_suggestion: None,
            details: Vec::new(),
        }
    }

    /// A failing result with a suggested fix
    pub fn fail(check_name: &str, message: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            check_name: check_name.to_string(),
            passed: false,
            message: message.into(),
            fix_suggestion: Some(fix.into()),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

/// All results of one post-update check
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthCheckReport {
    pub results: Vec<HealthCheckResult>,
}

impl HealthCheckReport {
    pub fn new(results: Vec<HealthCheckResult>) -> Self {
        Self { results }
    }

    /// Whether every check passed
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Checks that failed, in run order
    pub fn failed_checks(&self) -> Vec<&HealthCheckResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let report = HealthCheckReport::new(vec![
            HealthCheckResult::pass("config_files", "ok"),
            HealthCheckResult::fail("workflows", "none found", "add a workflow"),
            HealthCheckResult::pass("git", "ok"),
        ]);

        assert!(!report.all_passed());
        assert_eq!(report.passed_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.failed_checks()[0].check_name, "workflows");
    }

    #[test]
    fn test_empty_report_passes() {
        let report = HealthCheckReport::default();
        assert!(report.all_passed());
        assert_eq!(report.failed_count(), 0);
    }

    #[test]
    fn test_serialization_omits_empty_fields() {
        let json = serde_json::to_string(&HealthCheckResult::pass("git", "ok")).unwrap();
        assert!(!json.contains("fix_suggestion"));
        assert!(!json.contains("details"));
    }
}
