//! # umlpp
//!
//! Include-aware completion for the umlpp diagram preprocessor language.
//!
//! [`CompletionEngine`] answers editor queries (suggestions, call argument
//! names, callable lookup, standard library paths) for a document and
//! everything it includes. Documents are parsed with [`umlpp_parser`];
//! include targets are fetched through a [`DocumentSource`] supplied by the
//! embedder and cached in a shared [`ContextRegistry`].
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use umlpp::{
//!     CompletionEngine, DocumentRef, DocumentSource, EngineConfig, Range,
//!     error::FetchError,
//!     fetch::{Document, StdlibEntry},
//! };
//!
//! struct Offline;
//!
//! #[async_trait]
//! impl DocumentSource for Offline {
//!     async fn fetch_document(&self, url: &str) -> Result<Document, FetchError> {
//!         Err(FetchError::NotFound { url: url.to_string() })
//!     }
//!
//!     async fn fetch_stdlib_index(&self) -> Result<Vec<StdlibEntry>, FetchError> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), umlpp::UmlppError> {
//! let engine = CompletionEngine::new(Arc::new(Offline), EngineConfig::default());
//! let source = "!$a = 10\n!$b = $a + 5\nAlice -> Bob : $b\n";
//!
//! let items = engine
//!     .suggestions_at(DocumentRef::unsaved(source), Range::default(), None)
//!     .await?;
//! let names: Vec<&str> = items.iter().map(|item| item.insert_text.as_str()).collect();
//! assert_eq!(names, ["$a", "$b"]);
//! # Ok(())
//! # }
//! ```

pub mod completion;
pub mod config;
mod context;
pub mod error;
pub mod fetch;
pub mod protocol;
mod registry;
mod resolver;
pub mod service;
mod stdlib;
pub mod symbols;

use std::sync::Arc;

use log::{debug, info};

pub use completion::{CompletionItem, CompletionKind, Position, Range, SuggestionFilter};
pub use config::EngineConfig;
pub use context::{FileContext, SourceDocument};
pub use error::UmlppError;
pub use fetch::DocumentSource;
pub use registry::ContextRegistry;
pub use resolver::IncludeResolver;
pub use stdlib::StdlibIndex;
pub use symbols::{Callable, CallableMatch};

use fetch::StdlibEntry;
use umlpp_parser::Root;

/// Which document a query is about.
///
/// A `key` names a persisted document in the registry. `content`, when
/// given, is the document's current text. Without a key the content is an
/// unsaved buffer, queried once and then dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentRef<'a> {
    pub key: Option<&'a str>,
    pub content: Option<&'a str>,
}

impl<'a> DocumentRef<'a> {
    pub fn new(key: Option<&'a str>, content: Option<&'a str>) -> Self {
        Self { key, content }
    }

    /// An unsaved buffer.
    pub fn unsaved(content: &'a str) -> Self {
        Self::new(None, Some(content))
    }

    /// A persisted document, as already stored.
    pub fn stored(key: &'a str) -> Self {
        Self::new(Some(key), None)
    }

    /// A persisted document with new content.
    pub fn updated(key: &'a str, content: &'a str) -> Self {
        Self::new(Some(key), Some(content))
    }
}

/// Entry point for completion queries.
pub struct CompletionEngine {
    resolver: IncludeResolver,
    config: EngineConfig,
}

impl CompletionEngine {
    /// An engine with its own empty registry.
    pub fn new(source: Arc<dyn DocumentSource>, config: EngineConfig) -> Self {
        Self::with_registry(source, config, Arc::new(ContextRegistry::new()))
    }

    /// An engine sharing `registry` with other engines.
    pub fn with_registry(
        source: Arc<dyn DocumentSource>,
        config: EngineConfig,
        registry: Arc<ContextRegistry>,
    ) -> Self {
        let stdlib = Arc::new(StdlibIndex::new(
            Arc::clone(&source),
            config.stdlib().extension(),
            config.fetch().timeout(),
        ));
        let resolver = IncludeResolver::new(registry, stdlib, source, config.fetch());
        info!(timeout_ms = config.fetch().timeout_ms(); "Completion engine ready");
        Self { resolver, config }
    }

    pub fn registry(&self) -> &Arc<ContextRegistry> {
        self.resolver.registry()
    }

    pub fn resolver(&self) -> &IncludeResolver {
        &self.resolver
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse `text` without touching the registry.
    ///
    /// # Errors
    ///
    /// Returns [`UmlppError::Parse`] carrying `text` as its source.
    pub fn parse(&self, text: &str) -> Result<Root, UmlppError> {
        umlpp_parser::parse(text).map_err(|err| UmlppError::new_parse_error(err, text))
    }

    /// The context `document` refers to.
    ///
    /// Content for a key replaces the stored tree, or is parsed and
    /// registered when the key is new. A load of that key still in flight is
    /// awaited so the given content is what ends up stored. A failed parse
    /// registers nothing.
    ///
    /// # Errors
    ///
    /// Returns [`UmlppError::Parse`] for unparsable content,
    /// [`UmlppError::DocumentNotFound`] for an unknown key without content,
    /// and [`UmlppError::MissingContent`] when neither is given.
    pub async fn context_for(
        &self,
        document: DocumentRef<'_>,
    ) -> Result<Arc<FileContext>, UmlppError> {
        match (document.key, document.content) {
            (Some(key), Some(content)) => {
                let root = self.parse(content)?;
                debug!(key; "Storing document content");
                Ok(self.registry().upsert(key, root).await)
            }
            (Some(key), None) => self
                .registry()
                .get(key)
                .ok_or_else(|| UmlppError::DocumentNotFound(key.to_string())),
            (None, Some(content)) => {
                let root = self.parse(content)?;
                Ok(Arc::new(FileContext::new(None, root)))
            }
            (None, None) => Err(UmlppError::MissingContent),
        }
    }

    /// Completion suggestions for `document`, each replacing `range`.
    ///
    /// # Errors
    ///
    /// See [`CompletionEngine::context_for`].
    pub async fn suggestions_at(
        &self,
        document: DocumentRef<'_>,
        range: Range,
        filter: Option<&SuggestionFilter>,
    ) -> Result<Vec<CompletionItem>, UmlppError> {
        let context = self.context_for(document).await?;
        let items = context.suggestions(&self.resolver, range, filter).await;
        debug!(key:? = document.key, items = items.len(); "Suggestions");
        Ok(items)
    }

    /// Named-argument completions for a call to `name`.
    ///
    /// # Errors
    ///
    /// See [`CompletionEngine::context_for`].
    pub async fn arguments_for(
        &self,
        document: DocumentRef<'_>,
        name: &str,
        range: Range,
    ) -> Result<Vec<CompletionItem>, UmlppError> {
        let context = self.context_for(document).await?;
        Ok(context.arguments(&self.resolver, name, range).await)
    }

    /// The callable `name` as visible from `document`.
    ///
    /// # Errors
    ///
    /// See [`CompletionEngine::context_for`].
    pub async fn callable_named(
        &self,
        document: DocumentRef<'_>,
        name: &str,
    ) -> Result<Option<CallableMatch>, UmlppError> {
        let context = self.context_for(document).await?;
        Ok(context.query_callable(&self.resolver, name).await)
    }

    /// Standard library entries whose path starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`UmlppError::Fetch`] when the index cannot be fetched.
    pub async fn stdlib_paths_matching(
        &self,
        prefix: &str,
    ) -> Result<Vec<StdlibEntry>, UmlppError> {
        Ok(self.resolver.stdlib().paths_matching(prefix).await?)
    }

    /// Standard library paths as `module` completions, written the way an
    /// angle-bracket include spells them.
    ///
    /// # Errors
    ///
    /// Returns [`UmlppError::Fetch`] when the index cannot be fetched.
    pub async fn stdlib_completions(
        &self,
        prefix: &str,
        range: Range,
    ) -> Result<Vec<CompletionItem>, UmlppError> {
        let extension = self.config.stdlib().extension();
        let entries = self.stdlib_paths_matching(prefix).await?;
        Ok(entries
            .into_iter()
            .map(|entry| {
                let insert = entry.path.strip_suffix(extension).unwrap_or(&entry.path);
                CompletionItem::new(CompletionKind::Module, &entry.path, insert, range)
            })
            .collect())
    }
}
