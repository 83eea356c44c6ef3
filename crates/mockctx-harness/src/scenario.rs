//! Scenario loading and validation.
//!
//! A scenario scripts a sequence of calls against a [`MockedContext`] and
//! lists the retroactive assertions to check afterwards, each with the
//! outcome it should have.
//!
//! [`MockedContext`]: mockctx_core::MockedContext

use std::path::{Path, PathBuf};

use mockctx_core::{Arg, Method};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no scenario JSON files found in {}", .0.display())]
    EmptyDirectory(PathBuf),
    #[error("scenario '{scenario}': {reason}")]
    Invalid { scenario: String, reason: String },
}

/// One scripted call on the double.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedCall {
    pub method: Method,
    /// Template for `report_errorf`, `report_fatalf` and `logf`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Arg>,
}

/// Retroactive assertion to run after the calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    NoFailure,
    FailedWithError,
    FailedWithErrorMessage,
    FailedWithFatal,
    FailedWithFatalMessage,
    AbortWasCalled,
    /// The double's own `has_failed` answer, rather than an assertion.
    HasFailed,
}

impl Check {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoFailure => "no_failure",
            Self::FailedWithError => "failed_with_error",
            Self::FailedWithErrorMessage => "failed_with_error_message",
            Self::FailedWithFatal => "failed_with_fatal",
            Self::FailedWithFatalMessage => "failed_with_fatal_message",
            Self::AbortWasCalled => "abort_was_called",
            Self::HasFailed => "has_failed",
        }
    }

    #[must_use]
    pub const fn needs_message(self) -> bool {
        matches!(
            self,
            Self::FailedWithErrorMessage | Self::FailedWithFatalMessage
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expectation {
    pub check: Check,
    /// Expected message for the `*_message` checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whether the check should pass (the upstream context stays clean).
    pub passes: bool,
}

impl Expectation {
    /// Display label used in reports, e.g. `failed_with_error_message("boom")`.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.message {
            Some(message) => format!("{}({message:?})", self.check.name()),
            None => self.check.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub calls: Vec<ScriptedCall>,
    pub expectations: Vec<Expectation>,
}

impl Scenario {
    fn invalid(&self, reason: impl Into<String>) -> ScenarioError {
        ScenarioError::Invalid {
            scenario: self.name.clone(),
            reason: reason.into(),
        }
    }

    /// Reject scripts the runner cannot replay faithfully.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.expectations.is_empty() {
            return Err(self.invalid("no expectations"));
        }
        for (i, call) in self.calls.iter().enumerate() {
            let method = call.method;
            if method.is_formatted() && call.format.is_none() {
                return Err(self.invalid(format!("call {i}: {method} needs a format")));
            }
            if !method.is_formatted() && call.format.is_some() {
                return Err(self.invalid(format!("call {i}: {method} takes no format")));
            }
            let takes_args = !matches!(
                method,
                Method::AbortNow | Method::HasFailed | Method::RegisterCleanup
            );
            if !takes_args && !call.args.is_empty() {
                return Err(self.invalid(format!("call {i}: {method} takes no arguments")));
            }
        }
        for expectation in &self.expectations {
            let check = expectation.check;
            match (check.needs_message(), expectation.message.is_some()) {
                (true, false) => {
                    return Err(self.invalid(format!("{} needs a message", check.name())));
                }
                (false, true) => {
                    return Err(self.invalid(format!("{} takes no message", check.name())));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// A named collection of scenarios, stored as one JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub version: String,
    pub suite: String,
    pub scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    /// Parse and validate a scenario set.
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let set: Self = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load `path` itself, or every `*.json` file in it (sorted by name)
    /// when it is a directory.
    pub fn load_path(path: &Path) -> Result<Vec<Self>, ScenarioError> {
        if !path.is_dir() {
            return Ok(vec![Self::from_file(path)?]);
        }
        let mut paths: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        paths.sort();
        if paths.is_empty() {
            return Err(ScenarioError::EmptyDirectory(path.to_path_buf()));
        }
        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.scenarios.iter().try_for_each(Scenario::validate)
    }
}
