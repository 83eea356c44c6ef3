//! Scenario replay harness for mockctx.
//!
//! This crate provides:
//! - Scenario fixtures: scripted calls plus expected assertion outcomes, as JSON
//! - Replay: run each script against a fresh `MockedContext` and check it
//! - Report generation: human-readable + machine-readable replay reports

#![forbid(unsafe_code)]

pub mod report;
pub mod runner;
pub mod scenario;
pub mod verify;

pub use report::ReplayReport;
pub use runner::ScenarioRunner;
pub use scenario::{Check, Expectation, Scenario, ScenarioError, ScenarioSet, ScriptedCall};
pub use verify::{VerificationResult, VerificationSummary};
