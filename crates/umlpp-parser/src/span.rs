//! Source positions for parsed nodes.
//!
//! A [`Span`] is a half-open byte range into the document text. Every node of
//! the syntax tree carries one so that editor ranges can be computed later
//! through a [`LineIndex`](crate::LineIndex).

use std::{fmt, ops::Range};

/// A half-open byte range `start..end`, with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// A reversed range is flipped.
    pub fn new(range: Range<usize>) -> Self {
        let (start, end) = if range.start <= range.end {
            (range.start, range.end)
        } else {
            (range.end, range.start)
        };
        Self { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Width in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The smallest span covering both `self` and `other`, gap included.
    pub fn cover(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start)..self.end.max(other.end))
    }

    /// The covered text of `source`, or `None` when the span runs past its
    /// end or splits a character.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::new(range)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A name or token together with where it was written.
///
/// Equality looks at the value only, so trees parsed from differently
/// formatted text compare equal.
#[derive(Debug, Clone, Default)]
pub struct Spanned<T> {
    value: T,
    span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn inner(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> std::ops::Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}

impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_name_span() {
        // `$a` in `!$a = 10`
        let name = Span::new(1..3);
        assert_eq!((name.start(), name.end(), name.len()), (1, 3, 2));
        assert!(!name.is_empty());
        assert_eq!(name.to_string(), "1..3");
    }

    #[test]
    fn test_cursor_span_is_empty() {
        let cursor = Span::new(8..8);
        assert!(cursor.is_empty());
        assert_eq!(Span::new(10..5), Span::new(5..10));
    }

    #[test]
    fn test_cover_spans_binary_operands() {
        // `$a + $b`
        let left = Span::new(0..2);
        let right = Span::new(5..7);
        assert_eq!(left.cover(right), Span::new(0..7));
        assert_eq!(right.cover(left), Span::new(0..7));
    }

    #[test]
    fn test_slice() {
        let source = "!$a = 10";
        assert_eq!(Span::new(1..3).slice(source), Some("$a"));
        assert_eq!(Span::new(4..40).slice(source), None);
    }

    #[test]
    fn test_spanned_ignores_span_in_eq() {
        let a = Spanned::new("$x".to_string(), Span::new(0..2));
        let b = Spanned::new("$x".to_string(), Span::new(7..9));
        assert_eq!(a, b);
        assert_eq!(a.inner(), "$x");
        assert_eq!(b.span().start(), 7);
        assert_eq!(b.into_inner(), "$x");
    }
}
