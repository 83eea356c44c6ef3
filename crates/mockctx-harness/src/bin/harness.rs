//! CLI entrypoint for the mockctx replay harness.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mockctx_core::structured_log::{self, LogEmitter};
use mockctx_harness::{ReplayReport, ScenarioRunner, ScenarioSet, VerificationSummary};

/// Replay tooling for mockctx.
#[derive(Debug, Parser)]
#[command(name = "mockctx-harness")]
#[command(about = "Scenario replay harness for mockctx")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay scenario fixtures against the double and verify outcomes.
    Replay {
        /// Scenario JSON file, or a directory of them.
        #[arg(long)]
        scenarios: PathBuf,
        /// Output report path (markdown).
        #[arg(long)]
        report: Option<PathBuf>,
        /// Output report path (JSON). If omitted with --report, written next to it.
        #[arg(long)]
        json: Option<PathBuf>,
        /// Structured JSONL log output path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Optional fixed timestamp string for deterministic report generation.
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Validate a structured JSONL log file.
    ValidateLog {
        /// JSONL log path.
        #[arg(long)]
        log: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            scenarios,
            report,
            json,
            log,
            timestamp,
        } => {
            eprintln!("Replaying scenarios from {}", scenarios.display());
            let sets = ScenarioSet::load_path(&scenarios)?;

            let mut runner = match &log {
                Some(path) => {
                    let run_id = format!("pid{}", std::process::id());
                    ScenarioRunner::with_emitter(LogEmitter::to_file(path, "replay", &run_id)?)
                }
                None => ScenarioRunner::new(),
            };
            let mut results = Vec::new();
            for set in &sets {
                results.extend(runner.run(set));
            }

            let report_doc = ReplayReport {
                title: String::from("mockctx Replay Report"),
                suites: sets.iter().map(|s| s.suite.clone()).collect(),
                timestamp: timestamp.unwrap_or_else(structured_log::now_utc),
                summary: VerificationSummary::from_results(results),
            };

            eprintln!(
                "Replay complete: total={}, passed={}, failed={}",
                report_doc.summary.total, report_doc.summary.passed, report_doc.summary.failed
            );

            if let Some(report_path) = &report {
                eprintln!("Writing report to {}", report_path.display());
                std::fs::write(report_path, report_doc.to_markdown())?;
            }
            let json_path = json.or_else(|| report.as_ref().map(|p| p.with_extension("json")));
            if let Some(json_path) = json_path {
                std::fs::write(&json_path, report_doc.to_json())?;
                eprintln!("Wrote JSON report to {}", json_path.display());
            }
            if report.is_none() {
                print!("{}", report_doc.to_markdown());
            }

            if !report_doc.summary.all_passed() {
                return Err("Scenario replay failed".into());
            }
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = structured_log::validate_log_file(&log)?;
            for err in &errors {
                eprintln!("{err}");
            }
            eprintln!(
                "Validated {}: lines={lines}, errors={}",
                log.display(),
                errors.len()
            );
            if !errors.is_empty() {
                return Err(format!("{} invalid log line(s)", errors.len()).into());
            }
        }
    }

    Ok(())
}
