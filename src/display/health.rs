//! Health report display formatting

use crate::health::HealthCheckReport;

/// Format a health report, one line per check
pub fn format_health_report(report: &HealthCheckReport) -> String {
    let name_width = report
        .results
        .iter()
        .map(|r| r.check_name.len())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    output.push_str("Health Check\n");
    output.push_str("============\n");

    for result in &report.results {
        let marker = if result.passed { "PASS" } else { "FAIL" };
        output.push_str(&format!(
            "[{}] {:<name_width$}  {}\n",
            marker,
            result.check_name,
            result.message,
            name_width = name_width,
        ));
        for detail in &result.details {
            output.push_str(&format!("       {}\n", detail));
        }
        if let Some(fix) = &result.fix_suggestion {
            output.push_str(&format!("       fix: {}\n", fix));
        }
    }

    output.push_str(&format!(
        "\n{} passed, {} failed\n",
        report.passed_count(),
        report.failed_count()
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthCheckResult;

    #[test]
    fn test_format_health_report() {
        let report = HealthCheckReport::new(vec![
            HealthCheckResult::pass("git", "No git repository (optional)"),
            HealthCheckResult::fail("workflows", "No workflows found", "Add workflow definitions")
                .with_details(vec!["searched .state/workflows".to_string()]),
        ]);

        let output = format_health_report(&report);
        assert!(output.contains("[PASS] git"));
        assert!(output.contains("[FAIL] workflows"));
        assert!(output.contains("fix: Add workflow definitions"));
        assert!(output.contains("searched .state/workflows"));
        assert!(output.contains("1 passed, 1 failed"));
    }
}
