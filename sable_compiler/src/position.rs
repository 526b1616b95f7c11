//! Source positions and spans.
use std::fmt;

use smol_str::SmolStr;

/// Width a tab character adds to the column.
pub const TAB_WIDTH: u32 = 4;

/// Location of a byte inside the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    /// Byte index, 0-based.
    pub index: usize,
    /// 1-based.
    pub line: u32,
    /// 1-based. Tabs count as [`TAB_WIDTH`] columns.
    pub column: u32,
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::start()
    }
}

impl SourcePosition {
    #[inline]
    pub const fn start() -> Self {
        Self {
            index: 0,
            line: 1,
            column: 1,
        }
    }

    /// Move the position past the consumed text.
    pub fn advance(&mut self, consumed: &str) {
        for byte in consumed.bytes() {
            match byte {
                b'\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                b'\t' => self.column += TAB_WIDTH,
                b'\r' => {}
                // UTF-8 continuation bytes belong to the previous character.
                0x80..=0xBF => {}
                _ => self.column += 1,
            }
        }
        self.index += consumed.len();
    }

    /// Copy of the position moved past the consumed text.
    #[inline]
    pub fn advanced(mut self, consumed: &str) -> Self {
        self.advance(consumed);
        self
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A position qualified with the name of the source it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: SmolStr,
    pub position: SourcePosition,
}

impl SourceLocation {
    pub fn new(file: &str, position: SourcePosition) -> Self {
        Self {
            file: SmolStr::new(file),
            position,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.position)
    }
}

/// Chunk of source code, encoded as a byte index and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub index: usize,
    pub size: usize,
}

impl Span {
    pub fn new(index: usize, size: usize) -> Self {
        Self { index, size }
    }

    #[inline]
    pub fn fragment<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.index..self.end()).unwrap_or("")
    }

    /// Ending index of the span, exclusive.
    #[inline]
    pub fn end(&self) -> usize {
        self.index + self.size
    }

    /// Span of the line containing the start of this span, without
    /// its line terminator.
    pub fn surrounding_line<'a>(&self, text: &'a str) -> (&'a str, Span) {
        let index = self.index.min(text.len());
        let bytes = text.as_bytes();

        let start = bytes[..index]
            .iter()
            .rposition(|b| *b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let mut end = bytes[index..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|i| index + i)
            .unwrap_or(text.len());

        if end > start && bytes[end - 1] == b'\r' {
            end -= 1;
        }

        let line_span = Span::new(start, end - start);
        (line_span.fragment(text), line_span)
    }
}
