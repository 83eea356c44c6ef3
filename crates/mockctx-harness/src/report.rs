//! Report generation for replay results.

use serde::{Deserialize, Serialize};

use crate::verify::VerificationSummary;

/// A replay report over one or more scenario suites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub title: String,
    /// Suites included, in load order.
    pub suites: Vec<String>,
    /// Timestamp (UTC).
    pub timestamp: String,
    pub summary: VerificationSummary,
}

impl ReplayReport {
    /// Render the report as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));
        out.push_str(&format!("- Suites: {}\n", self.suites.join(", ")));
        out.push_str(&format!("- Timestamp: {}\n", self.timestamp));
        out.push_str(&format!("- Total: {}\n", self.summary.total));
        out.push_str(&format!("- Passed: {}\n", self.summary.passed));
        out.push_str(&format!("- Failed: {}\n\n", self.summary.failed));

        out.push_str("| Suite | Scenario | Check | Expected | Status |\n");
        out.push_str("|-------|----------|-------|----------|--------|\n");
        for r in &self.summary.results {
            let expected = if r.expected_pass { "pass" } else { "fail" };
            let status = if r.passed { "PASS" } else { "FAIL" };
            out.push_str(&format!(
                "| {} | {} | `{}` | {} | {} |\n",
                r.suite, r.scenario, r.check, expected, status
            ));
        }

        let failures: Vec<_> = self.summary.results.iter().filter(|r| !r.passed).collect();
        if !failures.is_empty() {
            out.push_str("\n## Failures\n\n");
            for r in failures {
                out.push_str(&format!("- {} / {}: `{}`", r.suite, r.scenario, r.check));
                if r.diagnostics.is_empty() {
                    out.push_str(" (no diagnostics)\n");
                } else {
                    out.push('\n');
                    for d in &r.diagnostics {
                        out.push_str(&format!("  - {d}\n"));
                    }
                }
            }
        }
        out
    }

    /// Render the report as JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::VerificationResult;

    fn report() -> ReplayReport {
        let results = vec![
            VerificationResult {
                suite: "core".to_string(),
                scenario: "clean".to_string(),
                check: "no_failure".to_string(),
                passed: true,
                expected_pass: true,
                actual_pass: true,
                diagnostics: Vec::new(),
            },
            VerificationResult {
                suite: "core".to_string(),
                scenario: "fresh".to_string(),
                check: "failed_with_fatal".to_string(),
                passed: false,
                expected_pass: true,
                actual_pass: false,
                diagnostics: vec!["a fatal was expected to occur but did not".to_string()],
            },
        ];
        ReplayReport {
            title: "Replay".to_string(),
            suites: vec!["core".to_string()],
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            summary: VerificationSummary::from_results(results),
        }
    }

    #[test]
    fn markdown_lists_results_and_failures() {
        let md = report().to_markdown();
        assert!(md.starts_with("# Replay\n"));
        assert!(md.contains("- Failed: 1\n"));
        assert!(md.contains("| core | clean | `no_failure` | pass | PASS |"));
        assert!(md.contains("## Failures"));
        assert!(md.contains("  - a fatal was expected to occur but did not\n"));
    }

    #[test]
    fn json_round_trips_summary_counts() {
        let json = report().to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["summary"]["failed"], 1);
    }
}
