//! Narrow logging capability handed to discovery and update application.
//!
//! Library code never talks to a global logger directly; it receives a
//! [`LogSink`]. The binary uses [`TracingLog`], tests use [`RecordingLog`]
//! or [`NoopLog`].

use std::cell::RefCell;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

pub trait LogSink {
    fn log(&self, severity: Severity, message: &str);

    fn debug(&self, message: &str) {
        self.log(Severity::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(Severity::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Severity::Warn, message);
    }
}

/// Forwards to the `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl LogSink for TracingLog {
    fn log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => tracing::debug!("{message}"),
            Severity::Info => tracing::info!("{message}"),
            Severity::Warn => tracing::warn!("{message}"),
            Severity::Error => tracing::error!("{message}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLog;

impl LogSink for NoopLog {
    fn log(&self, _severity: Severity, _message: &str) {}
}

/// Keeps every entry in memory.
#[derive(Debug, Default)]
pub struct RecordingLog {
    entries: RefCell<Vec<(Severity, String)>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.borrow().clone()
    }

    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(level, _)| *level == severity)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl LogSink for RecordingLog {
    fn log(&self, severity: Severity, message: &str) {
        self.entries.borrow_mut().push((severity, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_log_filters_by_severity() {
        let log = RecordingLog::new();
        log.debug("scanning");
        log.warn("module missing");
        log.warn("module unreadable");
        assert_eq!(log.entries().len(), 3);
        assert_eq!(
            log.messages(Severity::Warn),
            vec!["module missing", "module unreadable"]
        );
        assert!(log.messages(Severity::Error).is_empty());
    }
}
