//! Test double for a test-runner context.
//!
//! This crate provides:
//! - [`TestContext`]: the capability set a test runner exposes to fixtures
//! - [`MockedContext`]: a double that records every call instead of failing,
//!   with retroactive assertions over the recorded calls
//! - [`StandardContext`]: a real context that fails, unwinds on fatal reports,
//!   and runs cleanups on drop
//! - Message rendering for plain and printf-style formatted reports
//! - Structured JSONL logging and environment configuration

#![forbid(unsafe_code)]

pub mod arg;
pub mod config;
pub mod contract;
pub mod event;
pub mod mocked;
pub mod render;
pub mod standard;
pub mod structured_log;

pub use arg::Arg;
pub use contract::{CleanupFn, TestContext};
pub use event::{CallEvent, FailureKind, Method};
pub use mocked::MockedContext;
pub use render::RenderError;
pub use standard::{FatalAbort, ReportedMessage, StandardContext};

/// Build an argument slice for the reporting operations.
///
/// ```
/// use mockctx_core::{args, Arg};
///
/// let values: &[Arg] = args!["an", 1, true];
/// assert_eq!(values.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        &[] as &[$crate::Arg]
    };
    ($($value:expr),+ $(,)?) => {
        &[$($crate::Arg::from($value)),+] as &[$crate::Arg]
    };
}
