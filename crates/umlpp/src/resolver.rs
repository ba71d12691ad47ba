//! Turning `!include` statements into loaded documents.

use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use log::{debug, info, warn};
use url::Url;

use umlpp_parser::{IncludeKind, IncludeStatement};

use crate::{
    config::FetchConfig,
    context::{FileContext, SourceDocument},
    error::ResolveError,
    fetch::{DocumentSource, with_timeout},
    registry::ContextRegistry,
    stdlib::StdlibIndex,
};

/// Resolves include targets to keys and loads them through the registry.
pub struct IncludeResolver {
    registry: Arc<ContextRegistry>,
    stdlib: Arc<StdlibIndex>,
    source: Arc<dyn DocumentSource>,
    timeout: Option<Duration>,
}

impl IncludeResolver {
    pub fn new(
        registry: Arc<ContextRegistry>,
        stdlib: Arc<StdlibIndex>,
        source: Arc<dyn DocumentSource>,
        fetch: &FetchConfig,
    ) -> Self {
        Self {
            registry,
            stdlib,
            source,
            timeout: fetch.timeout(),
        }
    }

    pub fn registry(&self) -> &Arc<ContextRegistry> {
        &self.registry
    }

    pub fn stdlib(&self) -> &Arc<StdlibIndex> {
        &self.stdlib
    }

    /// The canonical key of `include` as seen from the document keyed
    /// `base`.
    ///
    /// Returns `None` for targets that cannot be resolved: a module missing
    /// from the standard library, or a relative path in an unsaved document.
    /// A `!PART` tag does not change the key.
    pub async fn resolve_key(
        &self,
        base: Option<&str>,
        include: &IncludeStatement,
    ) -> Option<String> {
        let location = include.target.inner();
        match include.kind {
            IncludeKind::Standard => {
                let key = self.stdlib.resolve(location).await;
                if key.is_none() {
                    warn!(
                        directive = include.directive.as_str(),
                        module = location;
                        "Standard library module not found"
                    );
                }
                key
            }
            IncludeKind::Url => Some(location.clone()),
            IncludeKind::Path => {
                let Some(base) = base else {
                    debug!(
                        directive = include.directive.as_str(),
                        location;
                        "Skipping relative include in unsaved document"
                    );
                    return None;
                };
                match Url::parse(base).and_then(|base| base.join(location)) {
                    Ok(url) => Some(url.to_string()),
                    Err(err) => {
                        warn!(base, location, err:% = err; "Cannot resolve relative include");
                        None
                    }
                }
            }
        }
    }

    /// The document stored under `key`, fetching and parsing it on first
    /// use.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] when the fetch fails or times out, the
    /// payload cannot be decoded, or the document does not parse. Nothing is
    /// cached in that case.
    pub async fn load(&self, key: &str) -> Result<Arc<FileContext>, ResolveError> {
        self.registry
            .get_or_load(key, || async {
                let document =
                    with_timeout(key, self.timeout, self.source.fetch_document(key)).await?;
                let text = document.decode(key)?;
                let context = SourceDocument::new(Some(key.to_string()), text)
                    .parse()
                    .map_err(|err| ResolveError::Parse {
                        key: key.to_string(),
                        err,
                    })?;
                info!(url = key; "Resolved include");
                Ok::<_, ResolveError>(Arc::new(context))
            })
            .await
    }

    /// Load every include of `context`, keeping declaration order.
    ///
    /// Includes that cannot be resolved, fetched or parsed are logged and
    /// left out.
    pub async fn resolve_includes(&self, context: &FileContext) -> Vec<Arc<FileContext>> {
        let symbols = context.symbols();
        let base = context.key();

        let loads = symbols.includes().iter().map(|include| async move {
            let key = self.resolve_key(base, include).await?;
            match self.load(&key).await {
                Ok(child) => Some(child),
                Err(err) => {
                    warn!(url = key, err:% = err; "Include contributes no symbols");
                    None
                }
            }
        });
        let includes: Vec<Arc<FileContext>> =
            join_all(loads).await.into_iter().flatten().collect();

        debug!(
            key:? = base,
            ephemeral = context.is_ephemeral(),
            requested = symbols.includes().len(),
            resolved = includes.len();
            "Resolved includes"
        );
        includes
    }
}
