//! Diagnostics reported while parsing.
//!
//! The parser never terminates the process and never writes to a fixed log;
//! every problem it can recover from is handed to a [`DiagnosticSink`].

use std::fmt;
use std::fmt::{Display, Formatter};

/// A 1-based position within the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Location { line, column }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The statement was discarded.
    Error,
    /// The statement took effect, possibly with surprising semantics.
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One recovered problem: where, how bad, and what happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub location: Location,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error<S: Into<String>>(location: Location, message: S) -> Self {
        Diagnostic {
            location,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning<S: Into<String>>(location: Location, message: S) -> Self {
        Diagnostic {
            location,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.severity, self.message)
    }
}

/// Collaborator receiving every recovered problem during a parse.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// The default sink: collect everything in order.
impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// A sink that counts reports without keeping them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountingSink {
    pub errors: usize,
    pub warnings: usize,
}

impl DiagnosticSink for CountingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
    }
}
