//! Error codes for the umlpp diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexical errors
//! - `E1xx` - Directive grammar errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but not closed on the same line.
    E001,

    /// Unexpected token.
    ///
    /// A directive keyword was recognised but what follows does not fit its
    /// grammar.
    E100,

    /// Incomplete input.
    ///
    /// The input ended in the middle of a directive.
    E101,

    /// Unterminated block.
    ///
    /// A block directive (`!if`, `!while`, `!function`, `!procedure`,
    /// `!definelong`) has no matching terminator.
    E102,

    /// Missing declaration name.
    ///
    /// A function, procedure or define keyword is not followed by a name.
    E103,

    /// Malformed include target.
    ///
    /// An include directive has no target, or an angle-bracket target is not
    /// closed.
    E104,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E102 => "unterminated block",
            ErrorCode::E103 => "missing declaration name",
            ErrorCode::E104 => "malformed include target",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
