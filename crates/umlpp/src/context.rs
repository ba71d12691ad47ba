//! Parsed documents and the completion queries they answer.
//!
//! A [`SourceDocument`] is raw text plus an optional key and is always
//! constructible; [`SourceDocument::parse`] is the fallible step producing a
//! [`FileContext`]. Queries on a context reach into its includes, which are
//! resolved on first use and then kept.

use std::{
    collections::HashSet,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use log::{debug, trace};
use tokio::sync::OnceCell;

use umlpp_parser::{ParseError, Root};

use crate::{
    completion::{CompletionItem, CompletionKind, Range, SuggestionFilter},
    resolver::IncludeResolver,
    symbols::{CallableMatch, SymbolTable},
};

/// Document text waiting to be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    key: Option<String>,
    text: String,
}

impl SourceDocument {
    /// `key` is the resolved URL of a persisted document, or `None` for an
    /// unsaved buffer.
    pub fn new(key: Option<String>, text: impl Into<String>) -> Self {
        Self {
            key,
            text: text.into(),
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parse the text into a [`FileContext`].
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] of the first malformed directive.
    pub fn parse(&self) -> Result<FileContext, ParseError> {
        let root = umlpp_parser::parse(&self.text)?;
        Ok(FileContext::new(self.key.clone(), root))
    }
}

/// One parsed document: its tree, its symbols and its resolved includes.
pub struct FileContext {
    key: Option<String>,
    root: RwLock<Arc<Root>>,
    symbols: OnceLock<Arc<SymbolTable>>,
    includes: OnceCell<Vec<Arc<FileContext>>>,
}

impl FileContext {
    pub fn new(key: Option<String>, root: Root) -> Self {
        Self {
            key,
            root: RwLock::new(Arc::new(root)),
            symbols: OnceLock::new(),
            includes: OnceCell::new(),
        }
    }

    /// The resolved URL this document was loaded from; `None` when ephemeral.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn is_ephemeral(&self) -> bool {
        self.key.is_none()
    }

    pub fn root(&self) -> Arc<Root> {
        Arc::clone(&self.root.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Swap in a newly parsed tree.
    ///
    /// Symbols and includes already derived from the previous tree are kept.
    pub fn replace_content(&self, root: Root) {
        self.swap_root(Arc::new(root));
    }

    pub(crate) fn swap_root(&self, root: Arc<Root>) {
        debug!(key:? = self.key; "Replacing document content");
        *self.root.write().unwrap_or_else(PoisonError::into_inner) = root;
    }

    /// The symbol table, extracted from the tree on first use.
    pub fn symbols(&self) -> Arc<SymbolTable> {
        let symbols = self.symbols.get_or_init(|| {
            let table = SymbolTable::extract(&self.root());
            debug!(
                key:? = self.key,
                declarations = table.declarations().len(),
                callables = table.callables().len(),
                includes = table.includes().len();
                "Extracted symbols"
            );
            Arc::new(table)
        });
        Arc::clone(symbols)
    }

    /// The documents this one includes, in declaration order.
    ///
    /// Resolved once; later calls return the same list.
    pub async fn includes(&self, resolver: &IncludeResolver) -> &[Arc<FileContext>] {
        self.includes
            .get_or_init(|| resolver.resolve_includes(self))
            .await
    }

    /// Look up a callable by exact name, here first and then through the
    /// includes depth-first.
    ///
    /// Each document is searched at most once per query.
    pub async fn query_callable(
        &self,
        resolver: &IncludeResolver,
        name: &str,
    ) -> Option<CallableMatch> {
        let mut seen = HashSet::new();
        self.find_callable(resolver, name, &mut seen).await
    }

    fn find_callable<'a>(
        &'a self,
        resolver: &'a IncludeResolver,
        name: &'a str,
        seen: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, Option<CallableMatch>> {
        async move {
            if !self.first_visit(seen) {
                return None;
            }

            if let Some(callable) = self.symbols().callable(name) {
                return Some(CallableMatch {
                    callable: callable.clone(),
                    origin: self.key.clone(),
                });
            }
            for include in self.includes(resolver).await {
                let found = include.find_callable(resolver, name, seen).await;
                if found.is_some() {
                    return found;
                }
            }
            None
        }
        .boxed()
    }

    /// Named-argument completions for a call to `name`.
    ///
    /// Defines substitute text rather than bind arguments, so they offer
    /// none.
    pub async fn arguments(
        &self,
        resolver: &IncludeResolver,
        name: &str,
        range: Range,
    ) -> Vec<CompletionItem> {
        let Some(found) = self.query_callable(resolver, name).await else {
            return Vec::new();
        };
        if found.callable.is_define() {
            return Vec::new();
        }
        found
            .callable
            .parameters
            .iter()
            .map(|parameter| {
                let name = parameter.name.inner();
                CompletionItem::new(CompletionKind::Variable, name, format!("{name}="), range)
            })
            .collect()
    }

    /// Everything visible from this document, deduplicated by insert text.
    ///
    /// `filter` only restricts this document's own entries. Included
    /// documents contribute their global variables and their callables.
    pub async fn suggestions(
        &self,
        resolver: &IncludeResolver,
        range: Range,
        filter: Option<&SuggestionFilter>,
    ) -> Vec<CompletionItem> {
        let default_filter = SuggestionFilter::default();
        let filter = filter.unwrap_or(&default_filter);
        let mut seen = HashSet::new();
        let mut items = IndexMap::new();
        self.collect_suggestions(resolver, range, filter, &mut seen, &mut items)
            .await;
        items.into_values().collect()
    }

    fn collect_suggestions<'a>(
        &'a self,
        resolver: &'a IncludeResolver,
        range: Range,
        filter: &'a SuggestionFilter,
        seen: &'a mut HashSet<String>,
        items: &'a mut IndexMap<String, CompletionItem>,
    ) -> BoxFuture<'a, ()> {
        async move {
            if !self.first_visit(seen) {
                return;
            }

            for item in self.local_suggestions(range, filter) {
                items.entry(item.insert_text.clone()).or_insert(item);
            }

            let include_filter = SuggestionFilter::for_includes();
            for include in self.includes(resolver).await {
                include
                    .collect_suggestions(resolver, range, &include_filter, seen, items)
                    .await;
            }
        }
        .boxed()
    }

    fn local_suggestions(&self, range: Range, filter: &SuggestionFilter) -> Vec<CompletionItem> {
        let symbols = self.symbols();
        let mut items = Vec::new();

        for declaration in symbols.declarations() {
            if filter.global_variables_only && declaration.is_variable() && !declaration.is_global()
            {
                continue;
            }
            items.push(CompletionItem::new(
                CompletionKind::Variable,
                &declaration.name,
                &declaration.name,
                range,
            ));
        }

        for callable in symbols.callables() {
            items.push(CompletionItem::new(
                CompletionKind::Function,
                callable.signature(),
                callable.name(),
                range,
            ));
        }

        if !filter.exclude_identifiers {
            let named: HashSet<&str> = symbols
                .declarations()
                .iter()
                .map(|declaration| declaration.name.as_str())
                .chain(symbols.callables().iter().map(|callable| callable.name()))
                .collect();
            for identifier in symbols.identifiers() {
                if named.contains(identifier.name.as_str()) {
                    continue;
                }
                items.push(CompletionItem::new(
                    CompletionKind::Field,
                    &identifier.name,
                    &identifier.name,
                    range,
                ));
            }
        }

        items.retain(|item| filter.accepts(item));
        trace!(key:? = self.key, items = items.len(); "Local suggestions");
        items
    }

    /// Record this document in `seen`. Returns `false` when the query has
    /// already walked it, through a cycle or another include path.
    ///
    /// Every document below the queried one is walked with the same include
    /// filter, so a second walk could only add duplicates.
    fn first_visit(&self, seen: &mut HashSet<String>) -> bool {
        let Some(key) = &self.key else {
            return true;
        };
        let fresh = seen.insert(key.clone());
        if !fresh {
            trace!(key; "Already walked, skipping");
        }
        fresh
    }
}

impl std::fmt::Debug for FileContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileContext")
            .field("key", &self.key)
            .field("symbols_extracted", &self.symbols.get().is_some())
            .field("includes_resolved", &self.includes.initialized())
            .finish_non_exhaustive()
    }
}
