//! Scenario replay engine.

use std::sync::Arc;

use mockctx_core::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};
use mockctx_core::{MockedContext, Method, StandardContext, TestContext};

use crate::scenario::{Check, Expectation, Scenario, ScenarioSet, ScriptedCall};
use crate::verify::VerificationResult;

/// Replays scenario sets against fresh doubles and collects verification
/// results.
///
/// Every expectation gets its own upstream context and double, so one
/// check's diagnostics never leak into another's outcome.
#[derive(Debug, Default)]
pub struct ScenarioRunner {
    emitter: Option<LogEmitter>,
}

impl ScenarioRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log every replayed call and check outcome through `emitter`.
    #[must_use]
    pub fn with_emitter(emitter: LogEmitter) -> Self {
        Self {
            emitter: Some(emitter),
        }
    }

    /// Run all scenarios in a set and return one result per expectation.
    pub fn run(&mut self, set: &ScenarioSet) -> Vec<VerificationResult> {
        let mut results = Vec::new();
        for scenario in &set.scenarios {
            for (i, expectation) in scenario.expectations.iter().enumerate() {
                let result = self.check(set, scenario, expectation, i == 0);
                results.push(result);
            }
        }
        if let Some(emitter) = self.emitter.as_mut() {
            let _ = emitter.flush();
        }
        results
    }

    fn check(
        &mut self,
        set: &ScenarioSet,
        scenario: &Scenario,
        expectation: &Expectation,
        log_calls: bool,
    ) -> VerificationResult {
        let upstream = StandardContext::silent(format!("{}/{}", set.suite, scenario.name));
        let double = MockedContext::new(&upstream);
        for call in &scenario.calls {
            replay(&double, call);
        }
        if log_calls {
            self.log_calls(&scenario.name, &double);
        }

        let actual_pass = match expectation.check {
            // Answers the double's own query; nothing is reported upstream.
            Check::HasFailed => double.has_failed(),
            check => {
                assert_with(&double, check, expectation.message.as_deref());
                !upstream.has_failed()
            }
        };
        let result = VerificationResult {
            suite: set.suite.clone(),
            scenario: scenario.name.clone(),
            check: expectation.label(),
            passed: actual_pass == expectation.passes,
            expected_pass: expectation.passes,
            actual_pass,
            diagnostics: upstream.messages().into_iter().map(|m| m.message).collect(),
        };
        self.log_result(&result);
        result
    }

    fn log_calls(&mut self, scenario: &str, double: &MockedContext<'_>) {
        let Some(emitter) = self.emitter.as_mut() else {
            return;
        };
        for call in double.calls() {
            let message = match call.rendered_message() {
                Ok(message) => message,
                Err(err) => format!("<unrenderable: {err}>"),
            };
            let entry = LogEntry::new("", LogLevel::Debug, "replay_call")
                .with_method(call.method())
                .with_message(message)
                .with_details(serde_json::json!({ "scenario": scenario }));
            // Logging problems never change verification results.
            let _ = emitter.emit_entry(entry);
        }
    }

    fn log_result(&mut self, result: &VerificationResult) {
        let Some(emitter) = self.emitter.as_mut() else {
            return;
        };
        let (level, outcome) = if result.passed {
            (LogLevel::Info, Outcome::Pass)
        } else {
            (LogLevel::Error, Outcome::Fail)
        };
        let entry = LogEntry::new("", level, "check")
            .with_message(&result.check)
            .with_outcome(outcome)
            .with_details(serde_json::json!({
                "scenario": result.scenario,
                "expected_pass": result.expected_pass,
                "actual_pass": result.actual_pass,
                "diagnostics": result.diagnostics,
            }));
        let _ = emitter.emit_entry(entry);
    }
}

fn replay(double: &MockedContext<'_>, call: &ScriptedCall) {
    let format = call.format.as_deref().unwrap_or_default();
    let args = call.args.as_slice();
    match call.method {
        Method::ReportError => double.report_error(args),
        Method::ReportErrorf => double.report_errorf(format, args),
        Method::ReportFatal => double.report_fatal(args),
        Method::ReportFatalf => double.report_fatalf(format, args),
        Method::AbortNow => double.abort_now(),
        Method::Log => double.log(args),
        Method::Logf => double.logf(format, args),
        Method::HasFailed => {
            let _ = double.has_failed();
        }
        Method::RegisterCleanup => double.register_cleanup(Arc::new(|| {})),
    }
}

fn assert_with(double: &MockedContext<'_>, check: Check, message: Option<&str>) {
    let message = message.unwrap_or_default();
    match check {
        Check::NoFailure => double.assert_no_failure(),
        Check::FailedWithError => double.assert_failed_with_error(),
        Check::FailedWithErrorMessage => double.assert_failed_with_error_message(message),
        Check::FailedWithFatal => double.assert_failed_with_fatal(),
        Check::FailedWithFatalMessage => double.assert_failed_with_fatal_message(message),
        Check::AbortWasCalled => double.assert_abort_was_called(),
        Check::HasFailed => {}
    }
}
