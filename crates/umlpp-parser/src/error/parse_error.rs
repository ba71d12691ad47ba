//! The ParseError type returned by a failed parse.
//!
//! [`ParseError`] wraps the [`Diagnostic`]s of one document. Parsing stops
//! at the first malformed directive, so in practice it holds one diagnostic.

use std::fmt;

use crate::error::Diagnostic;

/// Error type for a failed parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    /// Create a new parse error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Byte offset at which parsing failed.
    ///
    /// This is the start of the first primary label, or `0` when no
    /// diagnostic carries one.
    pub fn position(&self) -> usize {
        self.diagnostics
            .iter()
            .find_map(|diag| diag.primary_label())
            .map(|label| label.span().start())
            .unwrap_or(0)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{} at offset {}", first, self.position())?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}
