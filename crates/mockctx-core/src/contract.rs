//! The capability set a test runner exposes to the code under test.

use std::sync::Arc;

use crate::arg::Arg;

/// A teardown callback queued with [`TestContext::register_cleanup`].
pub type CleanupFn = Arc<dyn Fn() + Send + Sync>;

/// Operations available to fixtures and test helpers.
///
/// Both [`StandardContext`](crate::StandardContext) and
/// [`MockedContext`](crate::MockedContext) implement this trait, so a fixture
/// written against it runs unmodified against either.
pub trait TestContext {
    /// Mark the test failed and continue.
    fn report_error(&self, args: &[Arg]);

    /// Formatted form of [`report_error`](Self::report_error).
    fn report_errorf(&self, format: &str, args: &[Arg]);

    /// Mark the test failed and stop it.
    fn report_fatal(&self, args: &[Arg]);

    /// Formatted form of [`report_fatal`](Self::report_fatal).
    fn report_fatalf(&self, format: &str, args: &[Arg]);

    /// Mark the test failed and stop it without a message.
    fn abort_now(&self);

    fn log(&self, args: &[Arg]);

    fn logf(&self, format: &str, args: &[Arg]);

    fn has_failed(&self) -> bool;

    /// Queue `callback` to run when the test finishes.
    fn register_cleanup(&self, callback: CleanupFn);
}

impl<T: TestContext + ?Sized> TestContext for &T {
    fn report_error(&self, args: &[Arg]) {
        (**self).report_error(args);
    }

    fn report_errorf(&self, format: &str, args: &[Arg]) {
        (**self).report_errorf(format, args);
    }

    fn report_fatal(&self, args: &[Arg]) {
        (**self).report_fatal(args);
    }

    fn report_fatalf(&self, format: &str, args: &[Arg]) {
        (**self).report_fatalf(format, args);
    }

    fn abort_now(&self) {
        (**self).abort_now();
    }

    fn log(&self, args: &[Arg]) {
        (**self).log(args);
    }

    fn logf(&self, format: &str, args: &[Arg]) {
        (**self).logf(format, args);
    }

    fn has_failed(&self) -> bool {
        (**self).has_failed()
    }

    fn register_cleanup(&self, callback: CleanupFn) {
        (**self).register_cleanup(callback);
    }
}
