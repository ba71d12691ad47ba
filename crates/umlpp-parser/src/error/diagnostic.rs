//! The core diagnostic type.
//!
//! A [`Diagnostic`] describes one parse failure: an optional error code,
//! a message, labelled source spans and optional help text.

use std::fmt;

use crate::{
    error::{error_code::ErrorCode, label::Label},
    span::Span,
};

/// A diagnostic message with source location information.
///
/// ```text
/// error[E103]: expected a function name
///   |
/// 1 | !function
///   |          ^ name missing here
///   = help: write `!function $name()`
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use umlpp_parser::error::{Diagnostic, ErrorCode};
    /// # use umlpp_parser::Span;
    ///
    /// let diag = Diagnostic::error("unterminated string literal")
    ///     .with_code(ErrorCode::E001)
    ///     .with_label(Span::new(6..10), "string starts here");
    /// assert_eq!(diag.to_string(), "error[E001]: unterminated string literal");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Labels in the order they were attached.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Where parsing stopped, when known.
    pub fn primary_label(&self) -> Option<&Label> {
        self.labels.iter().find(|label| label.is_primary())
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Mark where parsing stopped.
    pub fn with_label(self, span: Span, message: impl Into<String>) -> Self {
        self.with(Label::primary(span, message))
    }

    /// Point at the enclosing directive or block.
    pub fn with_secondary_label(self, span: Span, message: impl Into<String>) -> Self {
        self.with(Label::secondary(span, message))
    }

    fn with(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "error[{code}]: {}", self.message),
            None => write!(f, "error: {}", self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_builder_chain() {
        let diag = Diagnostic::error("expected a function name")
            .with_code(ErrorCode::E103)
            .with_label(Span::new(9..9), "name missing here")
            .with_secondary_label(Span::new(0..9), "in this declaration")
            .with_help("write `!function $name()`");

        assert_eq!(diag.code(), Some(ErrorCode::E103));
        assert_eq!(diag.message(), "expected a function name");
        assert_eq!(diag.labels().len(), 2);
        assert_eq!(diag.primary_label().map(|l| l.span()), Some(Span::new(9..9)));
        assert_eq!(diag.help(), Some("write `!function $name()`"));
    }

    #[test]
    fn test_diagnostic_display_without_code() {
        let diag = Diagnostic::error("unexpected token");
        assert_eq!(diag.to_string(), "error: unexpected token");
    }
}
