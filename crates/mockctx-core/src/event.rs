//! Recorded calls and the failure taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::arg::Arg;
use crate::render::{self, RenderError};

/// One of the nine [`TestContext`](crate::TestContext) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    ReportError,
    ReportErrorf,
    ReportFatal,
    ReportFatalf,
    AbortNow,
    Log,
    Logf,
    HasFailed,
    RegisterCleanup,
}

impl Method {
    pub const ALL: [Self; 9] = [
        Self::ReportError,
        Self::ReportErrorf,
        Self::ReportFatal,
        Self::ReportFatalf,
        Self::AbortNow,
        Self::Log,
        Self::Logf,
        Self::HasFailed,
        Self::RegisterCleanup,
    ];

    /// Operations whose invocation marks a test as failed.
    pub const FAILURES: [Self; 5] = [
        Self::ReportError,
        Self::ReportErrorf,
        Self::ReportFatal,
        Self::ReportFatalf,
        Self::AbortNow,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReportError => "report_error",
            Self::ReportErrorf => "report_errorf",
            Self::ReportFatal => "report_fatal",
            Self::ReportFatalf => "report_fatalf",
            Self::AbortNow => "abort_now",
            Self::Log => "log",
            Self::Logf => "logf",
            Self::HasFailed => "has_failed",
            Self::RegisterCleanup => "register_cleanup",
        }
    }

    /// Parse a method name as produced by [`Method::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    #[must_use]
    pub const fn failure_kind(self) -> Option<FailureKind> {
        match self {
            Self::ReportError | Self::ReportErrorf => Some(FailureKind::Error),
            Self::ReportFatal | Self::ReportFatalf => Some(FailureKind::Fatal),
            Self::AbortNow => Some(FailureKind::Abort),
            Self::Log | Self::Logf | Self::HasFailed | Self::RegisterCleanup => None,
        }
    }

    #[must_use]
    pub const fn is_failure(self) -> bool {
        self.failure_kind().is_some()
    }

    /// Formatted variants carry their template as argument 0.
    #[must_use]
    pub const fn is_formatted(self) -> bool {
        matches!(self, Self::ReportErrorf | Self::ReportFatalf | Self::Logf)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Class of a failure-signaling operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// `report_error` / `report_errorf`
    Error,
    /// `report_fatal` / `report_fatalf`
    Fatal,
    /// `abort_now`
    Abort,
}

impl FailureKind {
    #[must_use]
    pub const fn matches(self, method: Method) -> bool {
        matches!(
            (self, method.failure_kind()),
            (Self::Error, Some(Self::Error))
                | (Self::Fatal, Some(Self::Fatal))
                | (Self::Abort, Some(Self::Abort))
        )
    }
}

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallEvent {
    method: Method,
    arguments: Vec<Arg>,
}

impl CallEvent {
    pub(crate) fn new(method: Method, arguments: Vec<Arg>) -> Self {
        Self { method, arguments }
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Arguments in call order; for formatted methods the template comes first.
    #[must_use]
    pub fn arguments(&self) -> &[Arg] {
        &self.arguments
    }

    /// The message this call would have printed.
    pub fn rendered_message(&self) -> Result<String, RenderError> {
        if !self.method.is_formatted() {
            return Ok(render::render_plain(&self.arguments));
        }
        let (template, values) = self
            .arguments
            .split_first()
            .ok_or(RenderError::MissingTemplate)?;
        let template = template.as_str().ok_or(RenderError::MissingTemplate)?;
        render::render_format(template, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    #[test]
    fn exactly_five_methods_signal_failure() {
        let failing: Vec<Method> = Method::ALL.into_iter().filter(|m| m.is_failure()).collect();
        assert_eq!(failing, Method::FAILURES.to_vec());
        assert!(!Method::Log.is_failure());
        assert!(!Method::Logf.is_failure());
        assert!(!Method::HasFailed.is_failure());
        assert!(!Method::RegisterCleanup.is_failure());
    }

    #[test]
    fn kinds_pair_plain_and_formatted_variants() {
        assert!(FailureKind::Error.matches(Method::ReportError));
        assert!(FailureKind::Error.matches(Method::ReportErrorf));
        assert!(!FailureKind::Error.matches(Method::ReportFatal));
        assert!(FailureKind::Fatal.matches(Method::ReportFatalf));
        assert!(FailureKind::Abort.matches(Method::AbortNow));
        assert!(!FailureKind::Abort.matches(Method::Log));
    }

    #[test]
    fn names_round_trip() {
        for method in Method::ALL {
            assert_eq!(Method::from_name(method.name()), Some(method));
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.name()));
        }
        assert_eq!(Method::from_name("fail_now"), None);
    }

    #[test]
    fn plain_event_joins_arguments() {
        let event = CallEvent::new(Method::ReportError, args!["code", 7].to_vec());
        assert_eq!(event.rendered_message().unwrap(), "code 7");
    }

    #[test]
    fn formatted_event_renders_template() {
        let event = CallEvent::new(Method::ReportFatalf, args!["a %s error", "fatal"].to_vec());
        assert_eq!(event.rendered_message().unwrap(), "a fatal error");
    }

    #[test]
    fn formatted_event_without_template_fails_to_render() {
        let empty = CallEvent::new(Method::ReportErrorf, Vec::new());
        assert_eq!(empty.rendered_message(), Err(RenderError::MissingTemplate));

        let numeric = CallEvent::new(Method::ReportErrorf, args![5].to_vec());
        assert_eq!(numeric.rendered_message(), Err(RenderError::MissingTemplate));
    }
}
