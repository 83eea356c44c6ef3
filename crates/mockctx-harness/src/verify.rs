//! Outcome comparison and verification.

use serde::{Deserialize, Serialize};

/// Result of checking one expectation of one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Suite the scenario came from.
    pub suite: String,
    /// Name of the scenario.
    pub scenario: String,
    /// Check label, e.g. `failed_with_error_message("boom")`.
    pub check: String,
    /// Whether the observed outcome matched the expected one.
    pub passed: bool,
    /// Expected outcome: did the check pass?
    pub expected_pass: bool,
    /// Observed outcome.
    pub actual_pass: bool,
    /// Diagnostics the check reported upstream, if any.
    pub diagnostics: Vec<String>,
}

/// Aggregate verification summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<VerificationResult>,
}

impl VerificationSummary {
    #[must_use]
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total,
            passed,
            failed: total - passed,
            results,
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
