//! Call-ledger double for [`TestContext`].
//!
//! [`MockedContext`] records every operation as a [`CallEvent`] and never
//! fails, unwinds or stops the caller, so a fixture's failure paths can be
//! exercised inside an ordinary test. Once the fixture has run, the
//! `assert_*` methods check the recorded history and report any mismatch
//! through the upstream context the double was built with.
//!
//! ```
//! use mockctx_core::{args, MockedContext, StandardContext, TestContext};
//!
//! let upstream = StandardContext::silent("doc");
//! let double = MockedContext::new(&upstream);
//!
//! double.report_errorf("an %s occurred", args!["error"]);
//! double.assert_failed_with_error_message("an error occurred");
//!
//! assert!(double.has_failed());
//! assert!(!upstream.has_failed());
//! ```

use std::cell::RefCell;
use std::fmt;

use crate::arg::Arg;
use crate::args;
use crate::contract::{CleanupFn, TestContext};
use crate::event::{CallEvent, FailureKind, Method};

/// A [`TestContext`] that records calls instead of acting on them.
///
/// State lives in `RefCell`s: one instance per test case, used from one
/// thread.
pub struct MockedContext<'a> {
    upstream: &'a dyn TestContext,
    history: RefCell<Vec<CallEvent>>,
    cleanups: RefCell<Vec<CleanupFn>>,
}

impl<'a> MockedContext<'a> {
    /// Create a double whose assertion failures are reported to `upstream`.
    #[must_use]
    pub fn new(upstream: &'a dyn TestContext) -> Self {
        Self {
            upstream,
            history: RefCell::new(Vec::new()),
            cleanups: RefCell::new(Vec::new()),
        }
    }

    fn record(&self, method: Method, arguments: Vec<Arg>) {
        self.history
            .borrow_mut()
            .push(CallEvent::new(method, arguments));
    }

    fn record_formatted(&self, method: Method, format: &str, args: &[Arg]) {
        let mut arguments = Vec::with_capacity(1 + args.len());
        arguments.push(Arg::from(format));
        arguments.extend_from_slice(args);
        self.record(method, arguments);
    }

    fn any_call(&self, predicate: impl Fn(Method) -> bool) -> bool {
        self.history.borrow().iter().any(|e| predicate(e.method()))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Snapshot of every recorded call, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<CallEvent> {
        self.history.borrow().clone()
    }

    #[must_use]
    pub fn call_count(&self, method: Method) -> usize {
        self.history
            .borrow()
            .iter()
            .filter(|e| e.method() == method)
            .count()
    }

    /// Copy of the registered cleanups in registration order.
    ///
    /// The double never runs them; the caller decides if and how.
    #[must_use]
    pub fn cleanups(&self) -> Vec<CleanupFn> {
        self.cleanups.borrow().clone()
    }

    /// First call of `kind`, in call order, whose rendered message equals
    /// `expected` exactly. Calls whose message cannot be rendered never match.
    #[must_use]
    pub fn find_call_with_message(&self, kind: FailureKind, expected: &str) -> Option<CallEvent> {
        self.history
            .borrow()
            .iter()
            .filter(|e| kind.matches(e.method()))
            .find(|e| e.rendered_message().is_ok_and(|m| m == expected))
            .cloned()
    }

    /// Rendered messages of every call of `kind` that renders, oldest first.
    #[must_use]
    pub fn messages(&self, kind: FailureKind) -> Vec<String> {
        self.history
            .borrow()
            .iter()
            .filter(|e| kind.matches(e.method()))
            .filter_map(|e| e.rendered_message().ok())
            .collect()
    }

    /// Rendered `log` / `logf` output, oldest first.
    #[must_use]
    pub fn logged_messages(&self) -> Vec<String> {
        self.history
            .borrow()
            .iter()
            .filter(|e| matches!(e.method(), Method::Log | Method::Logf))
            .filter_map(|e| e.rendered_message().ok())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    /// Reports once upstream for every failure-signaling method that was called.
    pub fn assert_no_failure(&self) {
        let offenders: Vec<(Method, usize)> = Method::FAILURES
            .into_iter()
            .map(|m| (m, self.call_count(m)))
            .filter(|&(_, count)| count > 0)
            .collect();
        for (method, count) in offenders {
            self.upstream.report_errorf(
                "no failure was expected but %s was called %d time(s)",
                args![method.name(), count],
            );
        }
    }

    /// Reports upstream unless `report_error` or `report_errorf` was called.
    pub fn assert_failed_with_error(&self) {
        if !self.any_call(|m| FailureKind::Error.matches(m)) {
            self.upstream
                .report_error(args!["an error was expected to occur but did not"]);
        }
    }

    /// Reports upstream unless an error call rendered exactly `expected`.
    pub fn assert_failed_with_error_message(&self, expected: &str) {
        if self
            .find_call_with_message(FailureKind::Error, expected)
            .is_none()
        {
            self.upstream.report_errorf(
                "an error with message '%s' was expected to occur but did not",
                args![expected],
            );
        }
    }

    /// Reports upstream unless `report_fatal` or `report_fatalf` was called.
    pub fn assert_failed_with_fatal(&self) {
        if !self.any_call(|m| FailureKind::Fatal.matches(m)) {
            self.upstream
                .report_error(args!["a fatal was expected to occur but did not"]);
        }
    }

    /// Reports upstream unless a fatal call rendered exactly `expected`.
    pub fn assert_failed_with_fatal_message(&self, expected: &str) {
        if self
            .find_call_with_message(FailureKind::Fatal, expected)
            .is_none()
        {
            self.upstream.report_errorf(
                "a fatal error with message '%s' was expected to occur but did not",
                args![expected],
            );
        }
    }

    /// Reports upstream unless `abort_now` was called.
    pub fn assert_abort_was_called(&self) {
        if !self.any_call(|m| m == Method::AbortNow) {
            self.upstream
                .report_error(args!["abort_now was expected to be called but was not"]);
        }
    }
}

impl TestContext for MockedContext<'_> {
    fn report_error(&self, args: &[Arg]) {
        self.record(Method::ReportError, args.to_vec());
    }

    fn report_errorf(&self, format: &str, args: &[Arg]) {
        self.record_formatted(Method::ReportErrorf, format, args);
    }

    fn report_fatal(&self, args: &[Arg]) {
        self.record(Method::ReportFatal, args.to_vec());
    }

    fn report_fatalf(&self, format: &str, args: &[Arg]) {
        self.record_formatted(Method::ReportFatalf, format, args);
    }

    fn abort_now(&self) {
        self.record(Method::AbortNow, Vec::new());
    }

    fn log(&self, args: &[Arg]) {
        self.record(Method::Log, args.to_vec());
    }

    fn logf(&self, format: &str, args: &[Arg]) {
        self.record_formatted(Method::Logf, format, args);
    }

    fn has_failed(&self) -> bool {
        // Scan before recording: the query itself is not a failure.
        let failed = self.any_call(Method::is_failure);
        self.record(Method::HasFailed, Vec::new());
        failed
    }

    fn register_cleanup(&self, callback: CleanupFn) {
        self.cleanups.borrow_mut().push(callback);
        self.record(Method::RegisterCleanup, Vec::new());
    }
}

impl fmt::Debug for MockedContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockedContext")
            .field("history", &*self.history.borrow())
            .field("cleanups", &self.cleanups.borrow().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::StandardContext;

    #[test]
    fn every_operation_appends_one_event() {
        let upstream = StandardContext::silent("ledger");
        let double = MockedContext::new(&upstream);

        double.report_error(args!["e"]);
        double.report_errorf("%s", args!["ef"]);
        double.report_fatal(args!["f"]);
        double.report_fatalf("%d", args![1]);
        double.abort_now();
        double.log(args!["l"]);
        double.logf("%s", args!["lf"]);
        let _ = double.has_failed();
        double.register_cleanup(Arc::new(|| {}));

        let methods: Vec<Method> = double.calls().iter().map(CallEvent::method).collect();
        assert_eq!(methods, Method::ALL.to_vec());
    }

    #[test]
    fn formatted_calls_keep_template_first_and_values_unrendered() {
        let upstream = StandardContext::silent("ledger");
        let double = MockedContext::new(&upstream);

        double.report_errorf("value %d of %s", args![3, "x"]);

        let calls = double.calls();
        assert_eq!(
            calls[0].arguments(),
            &[Arg::from("value %d of %s"), Arg::Int(3), Arg::from("x")]
        );
    }

    #[test]
    fn has_failed_is_not_itself_a_failure() {
        let upstream = StandardContext::silent("ledger");
        let double = MockedContext::new(&upstream);

        assert!(!double.has_failed());
        assert!(!double.has_failed());
        assert_eq!(double.call_count(Method::HasFailed), 2);
        double.assert_no_failure();
        assert!(!upstream.has_failed());
    }

    #[test]
    fn snapshots_are_independent_of_the_ledger() {
        let upstream = StandardContext::silent("ledger");
        let double = MockedContext::new(&upstream);
        double.register_cleanup(Arc::new(|| {}));

        let mut snapshot = double.cleanups();
        snapshot.clear();
        assert_eq!(double.cleanups().len(), 1);

        let mut calls = double.calls();
        calls.clear();
        assert_eq!(double.calls().len(), 1);
    }

    #[test]
    fn unrenderable_calls_are_skipped_by_message_queries() {
        let upstream = StandardContext::silent("ledger");
        let double = MockedContext::new(&upstream);

        double.report_errorf("%d", args!["not a number"]);
        double.report_error(args!["plain"]);

        assert_eq!(double.messages(FailureKind::Error), vec!["plain".to_string()]);
        assert!(
            double
                .find_call_with_message(FailureKind::Error, "%d")
                .is_none()
        );
    }

    #[test]
    fn logged_messages_render_both_variants() {
        let upstream = StandardContext::silent("ledger");
        let double = MockedContext::new(&upstream);

        double.log(args!["step", 1]);
        double.logf("step %d", args![2]);

        assert_eq!(double.logged_messages(), vec!["step 1", "step 2"]);
        assert!(!double.has_failed());
    }
}
