use std::fmt;
use std::fmt::{Debug, Display, Formatter};

/// Location holds the start position of the given element in the data source
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Line number, starting with 1
    pub line: usize,
    /// Column number, starting with 1
    pub column: usize,
    /// Byte offset, starting with 0
    pub offset: usize,
}

impl Default for Location {
    /// Default to line 1, column 1
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl Location {
    /// Create a new Location
    #[must_use]
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    /// Calculates the location of the given byte offset inside `source`
    #[must_use]
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let mut line = 1;
        let mut column = 1;

        for (idx, ch) in source.char_indices() {
            if idx >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        Self { line, column, offset }
    }
}

impl Debug for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{})", self.line, self.column)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_to_line_and_column() {
        let src = "ab\ncde\nf";
        assert_eq!(Location::from_offset(src, 0), Location::new(1, 1, 0));
        assert_eq!(Location::from_offset(src, 4), Location::new(2, 2, 4));
        assert_eq!(Location::from_offset(src, 7), Location::new(3, 1, 7));
    }

    #[test]
    fn offset_past_end_is_clamped() {
        let loc = Location::from_offset("abc", 99);
        assert_eq!(loc.offset, 3);
        assert_eq!(loc.column, 4);
    }
}
