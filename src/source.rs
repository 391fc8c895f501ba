use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// 1-based line, 0-based column, byte index. `line == 0` is the unset
/// sentinel used by error-recovery bookkeeping.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub index: usize,
}

impl Position {
    pub const UNSET: Position = Position {
        line: 0,
        column: 0,
        index: 0,
    };

    pub fn is_set(&self) -> bool {
        self.line != 0
    }
}

/// Shared, immutable source text. Cloning is a refcount bump.
#[derive(Clone)]
pub struct Source {
    bytes: Rc<Vec<u8>>,
}

impl Source {
    pub fn new(bytes: Vec<u8>) -> Source {
        Source {
            bytes: Rc::new(bytes),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Line/column resolution is an error-path concern, so a linear scan over
    /// the prefix is fine.
    pub fn position_of(&self, index: usize) -> Position {
        let upto = index.min(self.bytes.len());
        let before = &self.bytes[..upto];
        let line = 1 + before.iter().filter(|&&b| b == b'\n').count();
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|p| p + 1)
            .unwrap_or(0);
        Position {
            line,
            column: upto - line_start,
            index,
        }
    }
}

/// A slice of some source. Spans compare and hash by their text, not their
/// location, so a synthetic span equals a lexed one with the same spelling.
#[derive(Clone)]
pub struct Span {
    pub source: Source,
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// A span over detached text, for nodes invented after parsing (renamed
    /// identifiers, bundler-injected variables, runtime calls).
    pub fn synthetic<T: Into<Vec<u8>>>(text: T) -> Span {
        let bytes = text.into();
        let end = bytes.len();
        Span {
            source: Source::new(bytes),
            start: 0,
            end,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.source.bytes()[self.start..self.end]
    }

    pub fn text(&self) -> &str {
        // The lexer only ever cuts spans on byte boundaries of the UTF-8 input.
        unsafe { std::str::from_utf8_unchecked(self.bytes()) }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// The smallest span covering both.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            source: self.source.clone(),
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn grow(&mut self, other: &Span) {
        self.start = self.start.min(other.start);
        self.end = self.end.max(other.end);
    }

    pub fn start_position(&self) -> Position {
        self.source.position_of(self.start)
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("``")
        } else {
            write!(f, "`{}`@{}..{}", self.text(), self.start, self.end)
        }
    }
}

impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        self.bytes() == other.bytes()
    }
}

impl Eq for Span {}

impl PartialEq<str> for Span {
    fn eq(&self, other: &str) -> bool {
        self.bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Span {
    fn eq(&self, other: &&str) -> bool {
        self.bytes() == other.as_bytes()
    }
}

impl Hash for Span {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_of() {
        let source = Source::new(b"let a = 1;\nlet b = 2;\n".to_vec());
        assert_eq!(source.position_of(0), Position {
            line: 1,
            column: 0,
            index: 0
        });
        assert_eq!(source.position_of(15), Position {
            line: 2,
            column: 4,
            index: 15
        });
        assert!(!Position::UNSET.is_set());
    }

    #[test]
    fn test_spans_compare_by_text() {
        let direct = Span::synthetic("foo");
        let embedded = Span {
            source: Source::new(b"xxfooxx".to_vec()),
            start: 2,
            end: 5,
        };
        assert_eq!(direct, embedded);
        assert_eq!(direct.to(&direct).text(), "foo");
    }
}
