//! Diagnostic reporting sink.
//!
//! Every failure the engine observes, fatal or not, is reported here with a
//! severity and the name of the operation that saw it. Whether a failure
//! aborts the build is decided elsewhere.

use std::cell::RefCell;
use std::fmt;

/// How bad a reported failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        })
    }
}

/// Receives diagnostics from the reader, the pruners and the orchestrator.
pub trait ErrorSink {
    fn report(&self, severity: Severity, operation: &str, message: &str);
}

/// Forwards reports to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, severity: Severity, operation: &str, message: &str) {
        match severity {
            Severity::Info => tracing::info!(%severity, operation, "{message}"),
            Severity::Warning => tracing::warn!(%severity, operation, "{message}"),
            Severity::Error | Severity::Fatal => tracing::error!(%severity, operation, "{message}"),
        }
    }
}

/// One recorded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub severity: Severity,
    pub operation: String,
    pub message: String,
}

/// Keeps reports in memory, and also forwards them to `tracing`.
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: RefCell<Vec<Report>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.borrow().clone()
    }

    /// Reports at or above `severity`.
    pub fn at_least(&self, severity: Severity) -> Vec<Report> {
        self.reports
            .borrow()
            .iter()
            .filter(|r| r.severity >= severity)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }
}

impl ErrorSink for CollectingSink {
    fn report(&self, severity: Severity, operation: &str, message: &str) {
        TracingSink.report(severity, operation, message);
        self.reports.borrow_mut().push(Report {
            severity,
            operation: operation.to_string(),
            message: message.to_string(),
        });
    }
}

impl<S: ErrorSink + ?Sized> ErrorSink for &S {
    fn report(&self, severity: Severity, operation: &str, message: &str) {
        (**self).report(severity, operation, message);
    }
}
