//! Labelled source spans attached to diagnostics.

use std::fmt;

use crate::span::Span;

/// Whether a [`Label`] marks the failure point or surrounding context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelStyle {
    /// Where parsing stopped
    Primary,
    /// The directive or block that was being parsed
    Secondary,
}

/// A message pinned to a byte range of the preprocessed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    style: LabelStyle,
    span: Span,
    message: String,
}

impl Label {
    pub fn new(style: LabelStyle, span: Span, message: impl Into<String>) -> Self {
        Self {
            style,
            span,
            message: message.into(),
        }
    }

    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self::new(LabelStyle::Primary, span, message)
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self::new(LabelStyle::Secondary, span, message)
    }

    pub fn style(&self) -> LabelStyle {
        self.style
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.style == LabelStyle::Primary
    }
}

impl fmt::Display for Label {
    /// `message (start..end)`, the form used in plain-text logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_styles() {
        let stop = Label::primary(Span::new(10..20), "expected `)`");
        let directive = Label::secondary(Span::new(0..9), "in this `!procedure`");

        assert!(stop.is_primary());
        assert_eq!(stop.style(), LabelStyle::Primary);
        assert_eq!(stop.span().start(), 10);
        assert!(!directive.is_primary());
        assert_eq!(directive.span().end(), 9);
    }

    #[test]
    fn test_display_includes_range() {
        let label = Label::new(LabelStyle::Secondary, Span::new(3..7), "in this `!include`");
        assert_eq!(label.to_string(), "in this `!include` (3..7)");
    }
}
