use serde::Serialize;

/// A half-open byte range `[start, end)` into the original document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered, non-overlapping byte ranges a value was read from.
///
/// Markdown markers (list bullets, indentation, quote prefixes) are stripped
/// from node text, so the bytes backing a value are frequently
/// discontinuous. Appending a range that starts exactly where the previous
/// one ends coalesces the two.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SourceRanges(Vec<ByteRange>);

impl SourceRanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(start: usize, end: usize) -> Self {
        let mut ranges = Self::new();
        ranges.push(ByteRange::new(start, end));
        ranges
    }

    /// Appends a range, merging it with the last one when they touch.
    /// Empty ranges and ranges already covered by the tail are ignored.
    pub fn push(&mut self, range: ByteRange) {
        if range.is_empty() {
            return;
        }
        if let Some(last) = self.0.last_mut() {
            if range.start <= last.end && range.start >= last.start {
                last.end = last.end.max(range.end);
                return;
            }
        }
        self.0.push(range);
    }

    pub fn extend(&mut self, other: &SourceRanges) {
        for range in &other.0 {
            self.push(*range);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ByteRange> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&ByteRange> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&ByteRange> {
        self.0.last()
    }

    pub fn as_slice(&self) -> &[ByteRange] {
        &self.0
    }

    /// Concatenates the source text covered by these ranges.
    pub fn text(&self, source: &str) -> String {
        let mut out = String::new();
        for range in &self.0 {
            if let Some(slice) = source.get(range.start..range.end) {
                out.push_str(slice);
            }
        }
        out
    }

    /// Ranges covering everything after the first newline of the covered text.
    pub fn after_first_line(&self, source: &str) -> SourceRanges {
        let mut rest = SourceRanges::new();
        let mut seen_newline = false;
        for range in &self.0 {
            if seen_newline {
                rest.push(*range);
                continue;
            }
            let Some(slice) = source.get(range.start..range.end) else {
                continue;
            };
            if let Some(pos) = slice.find('\n') {
                seen_newline = true;
                rest.push(ByteRange::new(range.start + pos + 1, range.end));
            }
        }
        rest
    }
}

impl From<ByteRange> for SourceRanges {
    fn from(range: ByteRange) -> Self {
        let mut ranges = SourceRanges::new();
        ranges.push(range);
        ranges
    }
}

impl FromIterator<ByteRange> for SourceRanges {
    fn from_iter<I: IntoIterator<Item = ByteRange>>(iter: I) -> Self {
        let mut ranges = SourceRanges::new();
        for range in iter {
            ranges.push(range);
        }
        ranges
    }
}
