//! Hook log files.
//!
//! Every hook appends human-readable lines to its own `<hook>.log`, and
//! every run adds a `<hook name> <duration_ms> <outcome>` line to the shared
//! `performance.log`. When `debug_logging` is enabled in the project config,
//! the raw event of each invocation is also appended as a JSONL line to
//! `hook-events.jsonl`.
//!
//! Errors are silently ignored: logging never breaks hook execution.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shared performance log file name.
pub const PERFORMANCE_LOG: &str = "performance.log";

/// Raw event log file name.
pub const HOOK_EVENTS_FILE: &str = "hook-events.jsonl";

/// Appends to the hook log directory.
#[derive(Debug, Clone, Default)]
pub struct HookLog {
    dir: Option<PathBuf>,
}

impl HookLog {
    /// Log into `dir`, created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: Some(dir.into()) }
    }

    /// A log that writes nothing.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { dir: None }
    }

    /// The log directory, if logging is enabled.
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Append a timestamped line to `<hook>.log`.
    pub fn append(&self, hook: &str, message: &str) {
        let timestamp = chrono::Utc::now().to_rfc3339();
        // Keep one entry per line even for multi-line messages
        let message = message.replace('\n', " | ");
        self.write_line(&format!("{hook}.log"), &format!("[{timestamp}] {message}"));
    }

    /// Append a line to the shared performance log.
    pub fn record_performance(&self, hook: &str, duration: Duration, outcome: &str) {
        self.write_line(PERFORMANCE_LOG, &format!("{hook} {} {outcome}", duration.as_millis()));
    }

    /// Append the raw hook event as a JSONL line.
    ///
    /// Input that is not valid JSON is stored as a string.
    pub fn log_event(&self, hook: &str, raw_input: &str) {
        let input_value: serde_json::Value = serde_json::from_str(raw_input)
            .unwrap_or_else(|_| serde_json::Value::String(raw_input.to_string()));

        let entry = serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "hook_type": hook,
            "input": input_value,
        });
        self.write_line(HOOK_EVENTS_FILE, &entry.to_string());
    }

    fn write_line(&self, file_name: &str, line: &str) {
        let Some(dir) = &self.dir else {
            return;
        };

        if std::fs::create_dir_all(dir).is_err() {
            return;
        }

        let Ok(mut file) = OpenOptions::new().create(true).append(true).open(dir.join(file_name))
        else {
            return;
        };

        let _ = writeln!(file, "{line}");
    }
}
