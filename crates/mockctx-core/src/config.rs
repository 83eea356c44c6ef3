//! Environment configuration.
//!
//! The log sink of [`StandardContext`](crate::StandardContext) is set via the
//! `MOCKCTX_LOG` environment variable:
//! - `stderr` (default): one JSONL line per report on stderr.
//! - `off`: no log output.
//! - `file:<path>`: append JSONL lines to `<path>`.

use std::path::PathBuf;
use std::sync::OnceLock;

use crate::structured_log::LogEmitter;

pub const LOG_ENV: &str = "MOCKCTX_LOG";

/// Where standard contexts write their structured log.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum LogSink {
    #[default]
    Stderr,
    Off,
    File(PathBuf),
}

impl LogSink {
    /// Parse from string (case-insensitive keywords). Unknown values fall back
    /// to [`LogSink::Stderr`].
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        let trimmed = s.trim();
        if let Some(path) = trimmed.strip_prefix("file:")
            && !path.is_empty()
        {
            return Self::File(PathBuf::from(path));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "off" | "none" | "quiet" | "0" => Self::Off,
            _ => Self::Stderr,
        }
    }

    /// Open an emitter for one context. `Ok(None)` means logging is off.
    pub fn open(&self, context: &str, run_id: &str) -> std::io::Result<Option<LogEmitter>> {
        match self {
            Self::Stderr => Ok(Some(LogEmitter::to_stderr(context, run_id))),
            Self::Off => Ok(None),
            Self::File(path) => LogEmitter::append_to_file(path, context, run_id).map(Some),
        }
    }
}

static CACHED_SINK: OnceLock<LogSink> = OnceLock::new();

/// The configured log sink (reads the environment on first call, caches
/// thereafter).
#[must_use]
pub fn log_sink() -> LogSink {
    CACHED_SINK
        .get_or_init(|| {
            std::env::var(LOG_ENV)
                .map(|v| LogSink::from_str_loose(&v))
                .unwrap_or_default()
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keywords_loosely() {
        assert_eq!(LogSink::from_str_loose("stderr"), LogSink::Stderr);
        assert_eq!(LogSink::from_str_loose(" OFF "), LogSink::Off);
        assert_eq!(LogSink::from_str_loose("none"), LogSink::Off);
        assert_eq!(LogSink::from_str_loose("verbose"), LogSink::Stderr);
        assert_eq!(LogSink::from_str_loose(""), LogSink::Stderr);
    }

    #[test]
    fn parses_file_sink() {
        assert_eq!(
            LogSink::from_str_loose("file:/tmp/ctx.jsonl"),
            LogSink::File(PathBuf::from("/tmp/ctx.jsonl"))
        );
        assert_eq!(LogSink::from_str_loose("file:"), LogSink::Stderr);
    }

    #[test]
    fn off_sink_opens_nothing() {
        assert!(LogSink::Off.open("ctx", "run").unwrap().is_none());
        assert!(LogSink::Stderr.open("ctx", "run").unwrap().is_some());
    }

    #[test]
    fn file_sink_appends() {
        let path = std::env::temp_dir().join(format!("mockctx-config-{}.jsonl", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let sink = LogSink::File(path.clone());
        for _ in 0..2 {
            let mut emitter = sink.open("ctx", "run").unwrap().unwrap();
            emitter
                .emit(crate::structured_log::LogLevel::Info, "line")
                .unwrap();
            emitter.flush().unwrap();
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        let _ = std::fs::remove_file(&path);
    }
}
