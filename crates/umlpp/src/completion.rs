//! Completion items returned to the editor.

use serde::{Deserialize, Serialize};

/// What a completion item refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    /// A variable, a zero-argument define, or a call argument name
    Variable,
    /// A function, procedure, inline function or parameterized define
    Function,
    /// A referenced but undeclared identifier
    Field,
    /// A standard library include path
    Module,
}

/// A 0-based editor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl From<umlpp_parser::Position> for Position {
    fn from(position: umlpp_parser::Position) -> Self {
        Self::new(position.line, position.character)
    }
}

impl From<Position> for umlpp_parser::Position {
    fn from(position: Position) -> Self {
        Self::new(position.line, position.character)
    }
}

/// The editor range a completion item replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// An empty range at `position`.
    pub fn point(position: Position) -> Self {
        Self::new(position, position)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItem {
    pub kind: CompletionKind,
    pub insert_text: String,
    pub label: String,
    pub range: Range,
}

impl CompletionItem {
    pub fn new(
        kind: CompletionKind,
        label: impl Into<String>,
        insert_text: impl Into<String>,
        range: Range,
    ) -> Self {
        Self {
            kind,
            insert_text: insert_text.into(),
            label: label.into(),
            range,
        }
    }
}

/// Restricts which of a document's own entries are suggested.
///
/// Plain data so it can cross the service boundary. Included documents are
/// always queried with [`SuggestionFilter::for_includes`], whatever filter
/// the caller passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuggestionFilter {
    /// Keep only items whose insert text starts with this prefix.
    pub prefix: Option<String>,
    /// Keep only items of these kinds.
    pub kinds: Option<Vec<CompletionKind>>,
    /// Drop free identifier entries.
    pub exclude_identifiers: bool,
    /// Drop variables not declared `!global`.
    pub global_variables_only: bool,
}

impl SuggestionFilter {
    /// The filter applied to every included document: its global variables
    /// and callables are visible to the includer, nothing else.
    pub fn for_includes() -> Self {
        Self {
            exclude_identifiers: true,
            global_variables_only: true,
            ..Self::default()
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// Check the prefix and kind restrictions.
    pub fn accepts(&self, item: &CompletionItem) -> bool {
        let prefix_ok = self
            .prefix
            .as_deref()
            .is_none_or(|prefix| item.insert_text.starts_with(prefix));
        let kind_ok = self
            .kinds
            .as_ref()
            .is_none_or(|kinds| kinds.contains(&item.kind));
        prefix_ok && kind_ok
    }
}
