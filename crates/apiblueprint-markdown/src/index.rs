use crate::range::ByteRange;

/// Maps byte offsets of a document to character offsets and line/column
/// positions.
///
/// Source ranges are byte based; diagnostics shown to people should count
/// characters so multi-byte text lines up.
#[derive(Debug, Clone)]
pub struct CharacterIndex {
    char_starts: Vec<usize>,
    line_starts: Vec<usize>,
    len: usize,
}

/// A 1-based line and column (columns count characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

impl CharacterIndex {
    pub fn new(source: &str) -> Self {
        let char_starts = source.char_indices().map(|(i, _)| i).collect();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            char_starts,
            line_starts,
            len: source.len(),
        }
    }

    /// Number of characters that start before `byte`.
    pub fn char_offset(&self, byte: usize) -> usize {
        self.char_starts.partition_point(|start| *start < byte.min(self.len))
    }

    /// Converts a byte range into a character range.
    pub fn characters(&self, range: ByteRange) -> ByteRange {
        ByteRange::new(self.char_offset(range.start), self.char_offset(range.end))
    }

    pub fn line_column(&self, byte: usize) -> LineColumn {
        let byte = byte.min(self.len);
        let line = self.line_starts.partition_point(|start| *start <= byte);
        let line_start = self.line_starts[line.saturating_sub(1)];
        LineColumn {
            line,
            column: self.char_offset(byte) - self.char_offset(line_start) + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(3, 2)]
    #[case(4, 3)]
    fn char_offsets_skip_continuation_bytes(#[case] byte: usize, #[case] expected: usize) {
        // 'é' is two bytes wide
        let index = CharacterIndex::new("aéb\n");
        assert_eq!(index.char_offset(byte), expected);
    }

    #[test]
    fn line_column_is_one_based() {
        let index = CharacterIndex::new("# API\n\nré sumé\n");
        assert_eq!(index.line_column(0), LineColumn { line: 1, column: 1 });
        assert_eq!(index.line_column(7), LineColumn { line: 3, column: 1 });
        // byte 10 is the space after "ré"
        assert_eq!(index.line_column(10), LineColumn { line: 3, column: 3 });
    }

    #[test]
    fn characters_converts_both_ends() {
        let index = CharacterIndex::new("éé ab");
        assert_eq!(
            index.characters(ByteRange::new(5, 7)),
            ByteRange::new(3, 5)
        );
    }
}
