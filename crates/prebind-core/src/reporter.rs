//! Reporter trait for dependency injection
//!
//! This trait allows core logic to report progress and status without
//! being coupled to a specific terminal implementation. Core code only ever
//! writes to a reporter, it never reads from one.

use std::sync::{Mutex, PoisonError};

/// Sink for user-facing messages.
pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Native dependency resolution").
    fn section(&self, title: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Display a final summary of multiple operations.
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        (**self).summary(count, action, elapsed_secs);
    }
}

/// A no-op reporter for silent operations (e.g., verification, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, _: usize, _: &str, _: f64) {}
}

/// Severity of a recorded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational and success messages.
    Info,
    /// Warnings.
    Warning,
    /// Errors.
    Error,
}

/// A reporter that keeps every message in memory.
///
/// Useful for tests and for callers that want to inspect what happened.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded messages in order.
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded messages of one severity.
    pub fn of(&self, severity: Severity) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, msg)| msg)
            .collect()
    }

    fn push(&self, severity: Severity, msg: String) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((severity, msg));
    }
}

impl Reporter for RecordingReporter {
    fn section(&self, title: &str) {
        self.push(Severity::Info, title.to_string());
    }
    fn info(&self, msg: &str) {
        self.push(Severity::Info, msg.to_string());
    }
    fn success(&self, msg: &str) {
        self.push(Severity::Info, msg.to_string());
    }
    fn warning(&self, msg: &str) {
        self.push(Severity::Warning, msg.to_string());
    }
    fn error(&self, msg: &str) {
        self.push(Severity::Error, msg.to_string());
    }
    fn summary(&self, count: usize, action: &str, _: f64) {
        self.push(Severity::Info, format!("{count} {action}"));
    }
}
