//! Rendering of [`UmlppError`] through miette.
//!
//! A parse error becomes one report per parser diagnostic, each carrying the
//! document text so labels show up as annotated snippets. Every other error
//! is a single report with a stable code and, where it helps, a hint.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceCode, SourceSpan};

use umlpp::UmlppError;
use umlpp_parser::{Diagnostic, Span, error::Label};

/// One renderable report.
#[derive(Debug)]
pub enum Report<'a> {
    /// A parser diagnostic over the document it was raised for
    Parse { diag: &'a Diagnostic, src: &'a str },
    /// An error without a source location
    Plain(&'a UmlppError),
}

impl Report<'_> {
    fn plain_code(err: &UmlppError) -> &'static str {
        match err {
            UmlppError::Io(_) => "umlpp::io",
            UmlppError::Parse { .. } => "umlpp::parse",
            UmlppError::DocumentNotFound(_) => "umlpp::document_not_found",
            UmlppError::MissingContent => "umlpp::missing_content",
            UmlppError::Fetch(_) => "umlpp::fetch",
        }
    }

    fn plain_help(err: &UmlppError) -> Option<&'static str> {
        match err {
            UmlppError::DocumentNotFound(_) => {
                Some("send the document content once so it can be registered")
            }
            UmlppError::MissingContent => Some("pass a document key, its content or both"),
            UmlppError::Fetch(_) => Some("check the `[stdlib] index` setting and network access"),
            UmlppError::Io(_) | UmlppError::Parse { .. } => None,
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Parse { diag, .. } => f.write_str(diag.message()),
            Report::Plain(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Report<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Report::Parse { .. } => None,
            Report::Plain(err) => err.source(),
        }
    }
}

impl MietteDiagnostic for Report<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Report::Parse { diag, .. } => diag
                .code()
                .map(|code| Box::new(code) as Box<dyn fmt::Display>),
            Report::Plain(err) => Some(Box::new(Self::plain_code(err))),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self {
            Report::Parse { diag, .. } => diag.help(),
            Report::Plain(err) => Self::plain_help(err),
        };
        help.map(|help| Box::new(help) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        match self {
            Report::Parse { src, .. } => Some(src as &dyn SourceCode),
            Report::Plain(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let Report::Parse { diag, .. } = self else {
            return None;
        };
        if diag.labels().is_empty() {
            return None;
        }
        Some(Box::new(diag.labels().iter().map(labeled_span)))
    }
}

fn labeled_span(label: &Label) -> LabeledSpan {
    let span = source_span(label.span());
    let message = Some(label.message().to_string());
    if label.is_primary() {
        LabeledSpan::new_primary_with_span(message, span)
    } else {
        LabeledSpan::new_with_span(message, span)
    }
}

fn source_span(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Split `err` into the reports to print, in order.
pub fn reports(err: &UmlppError) -> Vec<Report<'_>> {
    match err {
        UmlppError::Parse { err, src } => err
            .diagnostics()
            .iter()
            .map(|diag| Report::Parse { diag, src })
            .collect(),
        other => vec![Report::Plain(other)],
    }
}
