//! Error types for umlpp operations.
//!
//! [`UmlppError`] is returned by the [`CompletionEngine`](crate::CompletionEngine)
//! façade. [`FetchError`] and [`ResolveError`] describe failures while
//! loading included documents; those never escape an include resolution and
//! are only logged. [`ServiceError`] is the tagged error carried back across
//! the completion service boundary.

use std::{fmt, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use umlpp_parser::ParseError;

/// The main error type for umlpp operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the source text next to the structured
/// [`ParseError`], so callers can render labelled reports.
#[derive(Debug, Error)]
pub enum UmlppError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("no content given for an unsaved document")]
    MissingContent,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl UmlppError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}

/// Failure reported by a [`DocumentSource`](crate::fetch::DocumentSource).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("document not found: {url}")]
    NotFound { url: String },

    #[error("failed to fetch {url}: {message}")]
    Transport { url: String, message: String },

    #[error("fetching {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("failed to decode {url}: {message}")]
    Decode { url: String, message: String },
}

/// Failure to turn an include key into a parsed document.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to parse {key}: {err}")]
    Parse { key: String, err: ParseError },
}

/// Stable error codes returned by the completion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceErrorCode {
    UnknownOperation,
    InvalidParams,
    ParseError,
    DocumentNotFound,
    FetchFailed,
    Internal,
}

impl ServiceErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceErrorCode::UnknownOperation => "unknown_operation",
            ServiceErrorCode::InvalidParams => "invalid_params",
            ServiceErrorCode::ParseError => "parse_error",
            ServiceErrorCode::DocumentNotFound => "document_not_found",
            ServiceErrorCode::FetchFailed => "fetch_failed",
            ServiceErrorCode::Internal => "internal",
        }
    }
}

impl fmt::Display for ServiceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged error result of a completion service request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct ServiceError {
    pub code: ServiceErrorCode,
    pub message: String,
}

impl ServiceError {
    pub fn new(code: ServiceErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unknown_operation(operation: &str) -> Self {
        Self::new(
            ServiceErrorCode::UnknownOperation,
            format!("unknown operation `{operation}`"),
        )
    }

    pub fn invalid_params(err: impl fmt::Display) -> Self {
        Self::new(ServiceErrorCode::InvalidParams, err.to_string())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorCode::Internal, message)
    }
}

impl From<UmlppError> for ServiceError {
    fn from(err: UmlppError) -> Self {
        let code = match &err {
            UmlppError::Parse { .. } => ServiceErrorCode::ParseError,
            UmlppError::DocumentNotFound(_) => ServiceErrorCode::DocumentNotFound,
            UmlppError::MissingContent => ServiceErrorCode::InvalidParams,
            UmlppError::Fetch(_) => ServiceErrorCode::FetchFailed,
            UmlppError::Io(_) => ServiceErrorCode::Internal,
        };
        Self::new(code, err.to_string())
    }
}
