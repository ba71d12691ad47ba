//! Conversion between byte offsets and editor line/character positions.
//!
//! Characters are counted in UTF-16 code units, which is what browser-hosted
//! editors report for cursor columns.

use std::fmt;

use crate::span::Span;

/// A 0-based line and character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// Line start table over a source text.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(index, _)| index + 1))
            .collect();
        Self { text, line_starts }
    }

    /// Number of lines, counting a trailing empty line after a final newline.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// The text of `line` without its terminator.
    pub fn line(&self, line: u32) -> Option<&'a str> {
        let start = *self.line_starts.get(line as usize)?;
        let end = self
            .line_starts
            .get(line as usize + 1)
            .map_or(self.text.len(), |next| next - 1);
        let text = &self.text[start..end];
        Some(text.strip_suffix('\r').unwrap_or(text))
    }

    /// Position of a byte offset. Offsets past the end clamp to the end of
    /// the text.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = self
            .line_starts
            .partition_point(|start| *start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line];
        let character = self
            .text
            .get(line_start..offset)
            .map_or(0, |prefix| prefix.encode_utf16().count());
        Position {
            line: line as u32,
            character: character as u32,
        }
    }

    /// Byte offset of a position, or `None` when the line does not exist.
    ///
    /// A character past the end of the line clamps to the line end.
    pub fn offset(&self, position: Position) -> Option<usize> {
        let line_start = *self.line_starts.get(position.line as usize)?;
        let line = self.line(position.line)?;
        let mut units = 0u32;
        for (index, c) in line.char_indices() {
            if units >= position.character {
                return Some(line_start + index);
            }
            units += c.len_utf16() as u32;
        }
        Some(line_start + line.len())
    }

    /// Start and end positions of a span.
    pub fn span_positions(&self, span: Span) -> (Position, Position) {
        (self.position(span.start()), self.position(span.end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_across_lines() {
        let index = LineIndex::new("ab\ncde\n\nf");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.position(0), Position::new(0, 0));
        assert_eq!(index.position(2), Position::new(0, 2));
        assert_eq!(index.position(3), Position::new(1, 0));
        assert_eq!(index.position(7), Position::new(2, 0));
        assert_eq!(index.position(8), Position::new(3, 0));
        assert_eq!(index.position(100), Position::new(3, 1));
    }

    #[test]
    fn test_offset_round_trips_and_clamps() {
        let index = LineIndex::new("ab\ncde\n");
        assert_eq!(index.offset(Position::new(1, 2)), Some(5));
        assert_eq!(index.offset(Position::new(1, 50)), Some(6));
        assert_eq!(index.offset(Position::new(2, 0)), Some(7));
        assert_eq!(index.offset(Position::new(3, 0)), None);
    }

    #[test]
    fn test_utf16_columns() {
        let text = "é😀x";
        let index = LineIndex::new(text);
        let x = text.find('x').unwrap();
        assert_eq!(index.position(x), Position::new(0, 3));
        assert_eq!(index.offset(Position::new(0, 3)), Some(x));
    }

    #[test]
    fn test_line_text_strips_carriage_return() {
        let index = LineIndex::new("one\r\ntwo");
        assert_eq!(index.line(0), Some("one"));
        assert_eq!(index.line(1), Some("two"));
        assert_eq!(index.line(2), None);
    }

    #[test]
    fn test_span_positions() {
        let index = LineIndex::new("!$a = 1\n!$b = 2\n");
        let (start, end) = index.span_positions(Span::new(9..11));
        assert_eq!(start, Position::new(1, 1));
        assert_eq!(end, Position::new(1, 3));
    }
}
