//! A real [`TestContext`] for ordinary tests.
//!
//! [`StandardContext`] behaves the way a test runner's own context does:
//! errors mark the test failed, fatal reports and [`abort_now`] also unwind
//! the current thread, and queued cleanups run last-registered-first when the
//! context is dropped. Each report is kept in memory and written as a
//! structured log line.
//!
//! It is also the usual upstream sink for a [`MockedContext`]: the double's
//! assertions only ever call `report_error` / `report_errorf`, which never
//! unwind.
//!
//! [`abort_now`]: TestContext::abort_now
//! [`MockedContext`]: crate::MockedContext

use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;

use crate::arg::Arg;
use crate::config;
use crate::contract::{CleanupFn, TestContext};
use crate::event::Method;
use crate::render;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};

/// Panic payload raised by fatal reports.
///
/// Test code can recognise it with `std::panic::catch_unwind` and
/// `downcast_ref::<FatalAbort>()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalAbort {
    pub context: String,
    pub message: String,
}

impl fmt::Display for FatalAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: fatal: {}", self.context, self.message)
    }
}

/// A message reported through a [`StandardContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedMessage {
    pub level: LogLevel,
    pub method: Method,
    pub message: String,
}

struct State {
    failed: bool,
    messages: Vec<ReportedMessage>,
    cleanups: Vec<CleanupFn>,
    emitter: Option<LogEmitter>,
}

/// Thread-safe test context with real failure semantics.
pub struct StandardContext {
    name: String,
    state: Mutex<State>,
}

impl StandardContext {
    /// Create a context logging to the sink selected by `MOCKCTX_LOG`.
    ///
    /// A sink that cannot be opened is reported on stderr and logging is
    /// disabled for this context.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let run_id = format!("pid{}", std::process::id());
        let emitter = match config::log_sink().open(&name, &run_id) {
            Ok(emitter) => emitter,
            Err(err) => {
                eprintln!("mockctx: cannot open log sink for {name}: {err}");
                None
            }
        };
        Self::with_emitter(name, emitter)
    }

    /// Create a context with no log output.
    #[must_use]
    pub fn silent(name: impl Into<String>) -> Self {
        Self::with_emitter(name, None)
    }

    #[must_use]
    pub fn with_emitter(name: impl Into<String>, emitter: Option<LogEmitter>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(State {
                failed: false,
                messages: Vec::new(),
                cleanups: Vec::new(),
                emitter,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every message reported so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<ReportedMessage> {
        self.state.lock().messages.clone()
    }

    /// Run and discard queued cleanups, last registered first.
    ///
    /// Cleanups registered while this runs are run in the same pass.
    pub fn run_cleanups(&self) {
        loop {
            // Release the lock before calling out: a cleanup may report.
            let next = self.state.lock().cleanups.pop();
            match next {
                Some(cleanup) => cleanup(),
                None => break,
            }
        }
    }

    fn report(&self, level: LogLevel, method: Method, message: String) {
        let mut state = self.state.lock();
        if method.is_failure() {
            state.failed = true;
        }
        if let Some(emitter) = state.emitter.as_mut() {
            let outcome = if method.is_failure() {
                Outcome::Fail
            } else {
                Outcome::Pass
            };
            let entry = LogEntry::new("", level, "report")
                .with_context(&self.name)
                .with_method(method)
                .with_message(&message)
                .with_outcome(outcome);
            // A broken log sink must not change test outcomes.
            let _ = emitter.emit_entry(entry).and_then(|()| emitter.flush());
        }
        state.messages.push(ReportedMessage {
            level,
            method,
            message,
        });
    }

    fn fail_fatally(&self, method: Method, message: String) -> ! {
        self.report(LogLevel::Fatal, method, message.clone());
        std::panic::panic_any(FatalAbort {
            context: self.name.clone(),
            message,
        })
    }
}

/// Render a formatted report; templates that do not render are kept with the
/// reason appended rather than dropped.
fn render_or_annotate(format: &str, args: &[Arg]) -> String {
    match render::render_format(format, args) {
        Ok(message) => message,
        Err(err) => format!("{format} (render error: {err})"),
    }
}

impl TestContext for StandardContext {
    fn report_error(&self, args: &[Arg]) {
        self.report(LogLevel::Error, Method::ReportError, render::render_plain(args));
    }

    fn report_errorf(&self, format: &str, args: &[Arg]) {
        self.report(
            LogLevel::Error,
            Method::ReportErrorf,
            render_or_annotate(format, args),
        );
    }

    fn report_fatal(&self, args: &[Arg]) {
        self.fail_fatally(Method::ReportFatal, render::render_plain(args));
    }

    fn report_fatalf(&self, format: &str, args: &[Arg]) {
        self.fail_fatally(Method::ReportFatalf, render_or_annotate(format, args));
    }

    fn abort_now(&self) {
        self.fail_fatally(Method::AbortNow, String::new());
    }

    fn log(&self, args: &[Arg]) {
        self.report(LogLevel::Info, Method::Log, render::render_plain(args));
    }

    fn logf(&self, format: &str, args: &[Arg]) {
        self.report(LogLevel::Info, Method::Logf, render_or_annotate(format, args));
    }

    fn has_failed(&self) -> bool {
        self.state.lock().failed
    }

    fn register_cleanup(&self, callback: CleanupFn) {
        self.state.lock().cleanups.push(callback);
    }
}

impl Drop for StandardContext {
    fn drop(&mut self) {
        self.run_cleanups();
    }
}

impl fmt::Debug for StandardContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("StandardContext")
            .field("name", &self.name)
            .field("failed", &state.failed)
            .field("messages", &state.messages)
            .field("cleanups", &state.cleanups.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::Arc;

    use super::*;
    use crate::args;
    use crate::structured_log::{SharedBuffer, validate_log_line};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn context_is_shareable_across_threads() {
        assert_send_sync::<StandardContext>();
    }

    #[test]
    fn configured_context_starts_clean() {
        let ctx = StandardContext::new("configured");
        assert_eq!(ctx.name(), "configured");
        assert!(!ctx.has_failed());
        assert!(ctx.messages().is_empty());
    }

    #[test]
    fn errors_mark_failed_and_keep_running() {
        let ctx = StandardContext::silent("errors");
        assert!(!ctx.has_failed());

        ctx.report_errorf("expected %d, got %d", args![1, 2]);
        ctx.report_error(args!["second"]);

        assert!(ctx.has_failed());
        let messages: Vec<String> = ctx.messages().into_iter().map(|m| m.message).collect();
        assert_eq!(messages, vec!["expected 1, got 2", "second"]);
    }

    #[test]
    fn logs_do_not_fail() {
        let ctx = StandardContext::silent("logs");
        ctx.log(args!["hello", 1]);
        ctx.logf("%s!", args!["done"]);
        assert!(!ctx.has_failed());
        assert_eq!(ctx.messages()[0].level, LogLevel::Info);
    }

    #[test]
    fn fatal_unwinds_with_payload() {
        let ctx = StandardContext::silent("fatal");
        let result = catch_unwind(AssertUnwindSafe(|| {
            ctx.report_fatalf("boom %d", args![3]);
        }));

        let payload = result.unwrap_err();
        let abort = payload.downcast_ref::<FatalAbort>().unwrap();
        assert_eq!(abort.context, "fatal");
        assert_eq!(abort.message, "boom 3");
        assert!(ctx.has_failed());
    }

    #[test]
    fn abort_now_unwinds_without_message() {
        let ctx = StandardContext::silent("abort");
        let result = catch_unwind(AssertUnwindSafe(|| ctx.abort_now()));
        let payload = result.unwrap_err();
        assert_eq!(payload.downcast_ref::<FatalAbort>().unwrap().message, "");
        assert!(ctx.has_failed());
    }

    #[test]
    fn unrenderable_template_is_annotated() {
        let ctx = StandardContext::silent("annotate");
        ctx.report_errorf("%d", args!["x"]);
        let message = &ctx.messages()[0].message;
        assert!(message.starts_with("%d (render error:"), "{message}");
    }

    #[test]
    fn cleanups_run_last_registered_first_on_drop() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        {
            let ctx = StandardContext::silent("cleanup");
            for i in 1..=3 {
                let order = Arc::clone(&order);
                ctx.register_cleanup(Arc::new(move || order.lock().push(i)));
            }
        }
        assert_eq!(*order.lock(), vec![3, 2, 1]);
    }

    #[test]
    fn cleanups_run_once() {
        let runs = Arc::new(parking_lot::Mutex::new(0));
        let ctx = StandardContext::silent("once");
        let counter = Arc::clone(&runs);
        ctx.register_cleanup(Arc::new(move || *counter.lock() += 1));

        ctx.run_cleanups();
        ctx.run_cleanups();
        drop(ctx);
        assert_eq!(*runs.lock(), 1);
    }

    #[test]
    fn reports_are_emitted_as_valid_log_lines() {
        let buffer = SharedBuffer::default();
        let emitter = LogEmitter::to_writer(buffer.clone(), "emit", "run-1");
        let ctx = StandardContext::with_emitter("emit", Some(emitter));

        ctx.log(args!["started"]);
        ctx.report_error(args!["broken"]);

        let contents = buffer.contents();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for (i, line) in lines.iter().enumerate() {
            let entry = validate_log_line(line, i + 1).unwrap();
            assert_eq!(entry.context.as_deref(), Some("emit"));
        }
        let last: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(last["level"], "error");
        assert_eq!(last["method"], "report_error");
        assert_eq!(last["message"], "broken");
        assert_eq!(last["outcome"], "fail");
    }
}
