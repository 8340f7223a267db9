//! Diagnostics collected while translating
//!
//! Parsing never unwinds on a recoverable problem. Instead each problem is
//! recorded here as it happens, mirrored to the `log` facade, and handed back
//! to the caller alongside the generated code.

use crate::parser::ast::SourceLocation;
use log::{error, warn};
use std::fmt;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single positioned message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.location, self.message)
    }
}

/// Ordered accumulator of diagnostics
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warning(&mut self, message: impl Into<String>, location: SourceLocation) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            location,
        });
    }

    pub fn error(&mut self, message: impl Into<String>, location: SourceLocation) {
        self.push(Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            location,
        });
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => warn!("{}", diagnostic),
            Severity::Error => error!("{}", diagnostic),
        }
        self.items.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.items.len() - self.error_count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }
}
