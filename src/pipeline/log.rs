// ABOUTME: Ordered transcript of a pipeline run's status and error lines.
// ABOUTME: Mirrors each entry to tracing and, when attached, to the CLI output.

use crate::diagnostics::{Diagnostics, Warning};
use crate::output::Output;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Status,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// The log sink attached to an execution context.
///
/// A `RunLog` without an output only records, which is what tests use.
/// Warnings are collected separately and shown once the run is over.
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Vec<LogEntry>,
    diagnostics: Diagnostics,
    output: Option<Output>,
}

impl RunLog {
    pub fn with_output(output: Output) -> Self {
        Self {
            output: Some(output),
            ..Self::default()
        }
    }

    pub fn status(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        if let Some(output) = &self.output {
            output.progress(&message);
        }
        self.push(LogLevel::Status, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}", message);
        if let Some(output) = &self.output {
            output.error(&message);
        }
        self.push(LogLevel::Error, message);
    }

    pub fn warn(&mut self, warning: Warning) {
        self.diagnostics.warn(warning);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.message.as_str())
    }

    /// Whether any entry contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages().any(|m| m.contains(needle))
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.level == LogLevel::Error)
            .map(|e| e.message.as_str())
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn output(&self) -> Option<&Output> {
        self.output.as_ref()
    }

    fn push(&mut self, level: LogLevel, message: String) {
        self.entries.push(LogEntry { level, message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_entries_in_order() {
        let mut log = RunLog::default();
        log.status("one");
        log.error("two");
        log.status("three");

        assert_eq!(log.messages().collect::<Vec<_>>(), vec!["one", "two", "three"]);
        assert_eq!(log.errors().collect::<Vec<_>>(), vec!["two"]);
    }

    #[test]
    fn warnings_go_to_diagnostics_not_entries() {
        let mut log = RunLog::default();
        log.warn(Warning::port_skipped("53/udp"));

        assert!(log.entries().is_empty());
        assert!(log.diagnostics().has_warnings());
    }
}
