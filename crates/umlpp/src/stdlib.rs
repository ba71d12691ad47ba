//! Lazily fetched standard library index.

use std::{sync::Arc, time::Duration};

use log::{debug, info, warn};
use tokio::sync::OnceCell;

use crate::{
    error::FetchError,
    fetch::{DocumentSource, StdlibEntry, with_timeout},
};

const INDEX_NAME: &str = "stdlib-index";

/// The listing behind angle-bracket includes.
///
/// The listing is fetched on first use. Concurrent first callers share one
/// fetch; a failed fetch is not kept, so the next call tries again.
pub struct StdlibIndex {
    source: Arc<dyn DocumentSource>,
    entries: OnceCell<Arc<Vec<StdlibEntry>>>,
    extension: String,
    timeout: Option<Duration>,
}

impl StdlibIndex {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        extension: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            source,
            entries: OnceCell::new(),
            extension: extension.into(),
            timeout,
        }
    }

    /// The full listing, fetching it if needed.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] of the underlying fetch, including a
    /// timeout.
    pub async fn entries(&self) -> Result<Arc<Vec<StdlibEntry>>, FetchError> {
        let entries = self
            .entries
            .get_or_try_init(|| async {
                debug!("Fetching standard library index");
                let entries = with_timeout(
                    INDEX_NAME,
                    self.timeout,
                    self.source.fetch_stdlib_index(),
                )
                .await?;
                info!(entries = entries.len(); "Standard library index loaded");
                Ok::<_, FetchError>(Arc::new(entries))
            })
            .await?;
        Ok(Arc::clone(entries))
    }

    /// The URL of the module included as `<path>`.
    ///
    /// Both the bare path and the path with the configured extension match.
    /// An unavailable index resolves nothing.
    pub async fn resolve(&self, path: &str) -> Option<String> {
        let entries = match self.entries().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path, err:% = err; "Standard library index unavailable");
                return None;
            }
        };
        let with_extension = format!("{path}{}", self.extension);
        entries
            .iter()
            .find(|entry| entry.path == path || entry.path == with_extension)
            .map(|entry| entry.url.clone())
    }

    /// Entries whose path starts with `prefix`, in listing order.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] of the index fetch.
    pub async fn paths_matching(&self, prefix: &str) -> Result<Vec<StdlibEntry>, FetchError> {
        let entries = self.entries().await?;
        Ok(entries
            .iter()
            .filter(|entry| entry.path.starts_with(prefix))
            .cloned()
            .collect())
    }
}
