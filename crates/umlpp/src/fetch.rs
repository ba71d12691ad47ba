//! The document source collaborator and the payloads it returns.
//!
//! Transport is the embedder's concern: the engine only ever asks a
//! [`DocumentSource`] for a document by URL or for the standard library
//! listing, and wraps every such call in the configured timeout.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// How [`Document::content`] is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContentEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "base64")]
    Base64,
}

/// Raw content of an include target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub encoding: ContentEncoding,
}

impl Document {
    pub fn utf8(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            encoding: ContentEncoding::Utf8,
        }
    }

    pub fn base64(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            encoding: ContentEncoding::Base64,
        }
    }

    /// Decode the payload into document text.
    ///
    /// Base64 payloads may be wrapped across lines; whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`] when the payload is not valid base64
    /// or does not decode to UTF-8.
    pub fn decode(self, url: &str) -> Result<String, FetchError> {
        match self.encoding {
            ContentEncoding::Utf8 => Ok(self.content),
            ContentEncoding::Base64 => {
                let compact: String = self
                    .content
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect();
                let bytes = STANDARD.decode(compact).map_err(|err| FetchError::Decode {
                    url: url.to_string(),
                    message: err.to_string(),
                })?;
                String::from_utf8(bytes).map_err(|err| FetchError::Decode {
                    url: url.to_string(),
                    message: err.to_string(),
                })
            }
        }
    }
}

/// One standard library module: the bare include path and where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StdlibEntry {
    pub path: String,
    pub url: String,
}

impl StdlibEntry {
    pub fn new(path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
        }
    }
}

/// Supplies include targets and the standard library listing.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the document stored at `url`.
    async fn fetch_document(&self, url: &str) -> Result<Document, FetchError>;

    /// Fetch the flat standard library module listing.
    async fn fetch_stdlib_index(&self) -> Result<Vec<StdlibEntry>, FetchError>;
}

/// Run `fetch`, failing with [`FetchError::Timeout`] once `timeout` elapses.
pub(crate) async fn with_timeout<T, F>(
    url: &str,
    timeout: Option<Duration>,
    fetch: F,
) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    let Some(limit) = timeout else {
        return fetch.await;
    };
    match tokio::time::timeout(limit, fetch).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: url.to_string(),
            timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
