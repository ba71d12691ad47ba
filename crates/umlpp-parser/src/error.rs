//! Error and diagnostic types for the umlpp parser.
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with an optional [`ErrorCode`], labelled
//! source locations and help text. A failed parse returns a [`ParseError`]
//! wrapping the diagnostics of that document.
//!
//! # Example
//!
//! ```
//! # use umlpp_parser::error::{Diagnostic, ErrorCode};
//! # use umlpp_parser::Span;
//!
//! let diag = Diagnostic::error("expected a function name")
//!     .with_code(ErrorCode::E103)
//!     .with_label(Span::new(9..9), "name missing here")
//!     .with_secondary_label(Span::new(0..9), "in this declaration")
//!     .with_help("write `!function $name()`");
//! ```

mod diagnostic;
mod error_code;
mod label;
mod parse_error;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::{Label, LabelStyle};
pub use parse_error::ParseError;
