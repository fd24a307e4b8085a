//! Diagnostics sink: the ordered stream of findings produced by one pass.
//!
//! Messages are kept in emission order so that consumers can match them as
//! substrings and so that two passes over the same input produce the same
//! stream. Every entry is also forwarded to `tracing`.

use crate::error::{ConfigError, ErrorClass};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<ErrorClass>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Collector used while a pass is running.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding at its own severity.
    pub fn report(&mut self, err: ConfigError) {
        let severity = err.severity();
        self.report_as(severity, err);
    }

    /// Record a finding at an explicit severity.
    pub fn report_as(&mut self, severity: Severity, err: ConfigError) {
        self.push(Diagnostic {
            severity,
            class: Some(err.class()),
            message: err.to_string(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Info,
            class: None,
            message: message.into(),
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            class: None,
            message: message.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Freeze the stream into the report of this pass.
    pub fn into_report(self, conf_is_correct: bool) -> ValidationReport {
        ValidationReport {
            diagnostics: self.entries,
            conf_is_correct,
        }
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::error!(class = ?diagnostic.class, "{}", diagnostic.message),
            Severity::Warning => tracing::warn!(class = ?diagnostic.class, "{}", diagnostic.message),
            Severity::Info => tracing::info!("{}", diagnostic.message),
        }
        self.entries.push(diagnostic);
    }
}

/// Outcome of one validation pass. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    diagnostics: Vec<Diagnostic>,
    conf_is_correct: bool,
}

impl ValidationReport {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn conf_is_correct(&self) -> bool {
        self.conf_is_correct
    }

    /// True when any message contains `pattern`.
    pub fn contains(&self, pattern: &str) -> bool {
        self.diagnostics.iter().any(|d| d.message.contains(pattern))
    }

    /// Number of messages containing `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.message.contains(pattern))
            .count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }
}
