//! Builds the block [`Node`] tree from `pulldown-cmark` offset events.
//!
//! The builder keeps a stack of open frames. Block starts push a frame, block
//! ends pop it and attach the finished node to the parent. Inline events only
//! contribute byte ranges: paragraph and header text is sliced from the source
//! so inline markup such as backticks survives untouched.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use std::ops::Range;

use crate::node::{Node, NodeKind};
use crate::range::{ByteRange, SourceRanges};

/// Tokenizes `source` into a tree rooted at a [`NodeKind::Root`] node.
pub fn tokenize(source: &str) -> Node {
    let mut builder = TreeBuilder::new(source);
    for (event, range) in Parser::new_ext(source, Options::empty()).into_offset_iter() {
        builder.push(event, range);
    }
    builder.finish()
}

#[derive(Debug)]
struct Frame {
    kind: NodeKind,
    level: u8,
    start: usize,
    children: Vec<Node>,
    /// Inline ranges at nesting depth zero (paragraphs and headers).
    inline: Vec<ByteRange>,
    inline_depth: usize,
    /// Code or HTML content pieces with their rendered text.
    pieces: Vec<(ByteRange, String)>,
    indented: bool,
    synthetic: bool,
}

impl Frame {
    fn new(kind: NodeKind, start: usize) -> Self {
        Self {
            kind,
            level: 0,
            start,
            children: Vec::new(),
            inline: Vec::new(),
            inline_depth: 0,
            pieces: Vec::new(),
            indented: false,
            synthetic: false,
        }
    }

    fn collects_inline(&self) -> bool {
        matches!(self.kind, NodeKind::Paragraph | NodeKind::Header)
    }
}

struct TreeBuilder<'s> {
    source: &'s str,
    stack: Vec<Frame>,
    list_depth: u8,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            stack: vec![Frame::new(NodeKind::Root, 0)],
            list_depth: 0,
        }
    }

    fn push(&mut self, event: Event<'_>, range: Range<usize>) {
        let span = ByteRange::new(range.start, range.end);
        match event {
            Event::Start(tag) => self.open(tag, span),
            Event::End(tag) => self.close(tag, span),
            Event::Text(text) if self.top_kind() == NodeKind::Code => {
                self.top().pieces.push((span, text.to_string()));
            }
            Event::Html(text) => {
                if self.top_kind() == NodeKind::Html {
                    self.top().pieces.push((span, text.to_string()));
                }
            }
            Event::Rule => {
                self.close_synthetic();
                let end = line_end(self.source, span.end);
                self.attach(Node::new(
                    NodeKind::HRule,
                    "",
                    SourceRanges::single(span.start, end),
                ));
            }
            _ => self.inline(span),
        }
    }

    fn open(&mut self, tag: Tag<'_>, span: ByteRange) {
        match tag {
            Tag::Paragraph => {
                self.close_synthetic();
                self.stack.push(Frame::new(NodeKind::Paragraph, span.start));
            }
            Tag::Heading { level, .. } => {
                self.close_synthetic();
                let mut frame = Frame::new(NodeKind::Header, span.start);
                frame.level = level as u8;
                self.stack.push(frame);
            }
            Tag::BlockQuote(_) => {
                self.close_synthetic();
                self.stack.push(Frame::new(NodeKind::Quote, span.start));
            }
            Tag::CodeBlock(kind) => {
                self.close_synthetic();
                let mut frame = Frame::new(NodeKind::Code, span.start);
                frame.indented = matches!(kind, CodeBlockKind::Indented);
                self.stack.push(frame);
            }
            Tag::HtmlBlock => {
                self.close_synthetic();
                self.stack.push(Frame::new(NodeKind::Html, span.start));
            }
            // Lists are flattened into their items.
            Tag::List(_) => self.close_synthetic(),
            Tag::Item => {
                self.close_synthetic();
                self.list_depth = self.list_depth.saturating_add(1);
                let mut frame = Frame::new(NodeKind::ListItem, span.start);
                frame.level = self.list_depth;
                self.stack.push(frame);
            }
            _ => {
                self.inline(span);
                if let Some(frame) = self.stack.last_mut().filter(|f| f.collects_inline()) {
                    frame.inline_depth += 1;
                }
            }
        }
    }

    fn close(&mut self, tag: TagEnd, span: ByteRange) {
        match tag {
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote(_)
            | TagEnd::CodeBlock
            | TagEnd::HtmlBlock => {
                self.close_synthetic();
                self.pop(span.end);
            }
            TagEnd::Item => {
                self.close_synthetic();
                self.pop(span.end);
                self.list_depth = self.list_depth.saturating_sub(1);
            }
            TagEnd::List(_) => self.close_synthetic(),
            _ => {
                if let Some(frame) = self.stack.last_mut().filter(|f| f.collects_inline()) {
                    frame.inline_depth = frame.inline_depth.saturating_sub(1);
                }
            }
        }
    }

    /// Records an inline range, opening a paragraph for tight list items.
    fn inline(&mut self, span: ByteRange) {
        match self.top_kind() {
            NodeKind::Paragraph | NodeKind::Header => {}
            NodeKind::ListItem | NodeKind::Quote | NodeKind::Root => {
                let mut frame = Frame::new(NodeKind::Paragraph, span.start);
                frame.synthetic = true;
                self.stack.push(frame);
            }
            _ => return,
        }
        let frame = self.top();
        if frame.inline_depth == 0 {
            frame.inline.push(span);
        }
    }

    fn close_synthetic(&mut self) {
        if self.stack.last().is_some_and(|f| f.synthetic) {
            let end = self
                .stack
                .last()
                .and_then(|f| f.inline.last())
                .map(|r| r.end)
                .unwrap_or(0);
            self.pop(end);
        }
    }

    fn pop(&mut self, end: usize) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(frame) = self.stack.pop() {
            let node = build_node(self.source, frame, end);
            self.attach(node);
        }
    }

    fn attach(&mut self, node: Node) {
        self.top().children.push(node);
    }

    fn top(&mut self) -> &mut Frame {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn top_kind(&self) -> NodeKind {
        self.stack.last().map(|f| f.kind).unwrap_or(NodeKind::Root)
    }

    fn finish(mut self) -> Node {
        self.close_synthetic();
        while self.stack.len() > 1 {
            self.pop(self.source.len());
        }
        let children = self
            .stack
            .pop()
            .map(|root| root.children)
            .unwrap_or_default();
        let mut root = Node::new(
            NodeKind::Root,
            "",
            SourceRanges::single(0, self.source.len()),
        );
        root.children = children;
        root
    }
}

fn build_node(source: &str, frame: Frame, end: usize) -> Node {
    let block_ranges = SourceRanges::single(frame.start, line_end(source, end));
    let mut node = match frame.kind {
        NodeKind::Paragraph => {
            let mut ranges: SourceRanges = frame.inline.iter().copied().collect();
            let text = ranges.text(source).trim_end().to_string();
            if let Some(last) = ranges.last().copied() {
                let mut extended: SourceRanges = ranges
                    .iter()
                    .take(ranges.len() - 1)
                    .copied()
                    .collect();
                extended.push(ByteRange::new(last.start, line_end(source, last.end)));
                ranges = extended;
            } else {
                ranges = block_ranges;
            }
            Node::new(NodeKind::Paragraph, text, ranges)
        }
        NodeKind::Header => {
            let inline: SourceRanges = frame.inline.iter().copied().collect();
            let text = inline.text(source).trim().to_string();
            Node::new(NodeKind::Header, text, block_ranges)
        }
        NodeKind::Code => {
            let (text, ranges) = code_content(source, &frame.pieces, frame.indented);
            let ranges = if ranges.is_empty() { block_ranges } else { ranges };
            Node::new(NodeKind::Code, text, ranges)
        }
        NodeKind::Html => {
            let text: String = frame.pieces.iter().map(|(_, t)| t.as_str()).collect();
            Node::new(NodeKind::Html, text, block_ranges)
        }
        kind => {
            let text = block_ranges.text(source);
            let text = if kind == NodeKind::Quote { text } else { String::new() };
            Node::new(kind, text, block_ranges)
        }
    };
    node.level = frame.level;
    node.children = frame.children;
    node
}

/// A code line assembled from one or more text events.
#[derive(Default)]
struct CodeLine {
    text: String,
    ranges: Vec<ByteRange>,
}

/// Width of the leading whitespace of `text` in columns, tabs stopping at
/// multiples of four.
fn indent_columns(text: &str) -> usize {
    let mut columns = 0;
    for c in text.chars() {
        match c {
            ' ' => columns += 1,
            '\t' => columns += 4 - columns % 4,
            _ => break,
        }
    }
    columns
}

impl CodeLine {
    fn leading_columns(&self) -> usize {
        indent_columns(&self.text)
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Removes `columns` of indentation from the text, then moves the source
    /// ranges forward so they start at the first byte the text still shows.
    ///
    /// The rendered text and the source disagree in the indentation when tabs
    /// were split by a container, so ranges are re-anchored on the content
    /// after the indentation, which both share.
    fn strip_front(&mut self, columns: usize, source: &str) {
        let mut stripped = 0;
        let mut cut = 0;
        let mut pad = 0;
        for c in self.text.chars() {
            if stripped >= columns {
                break;
            }
            let width = match c {
                ' ' => 1,
                '\t' => 4 - stripped % 4,
                _ => break,
            };
            stripped += width;
            cut += c.len_utf8();
            pad = stripped.saturating_sub(columns);
        }
        self.text = format!("{}{}", " ".repeat(pad), &self.text[cut..]);

        let content = self.text.trim_start_matches([' ', '\t']);
        let kept = &self.text[..self.text.len() - content.len()];
        let line: String = self
            .ranges
            .iter()
            .filter_map(|range| source.get(range.start..range.end))
            .collect();
        if !line.ends_with(content) {
            return;
        }
        let indentation = &line[..line.len() - content.len()];
        let keep = if indentation.ends_with(kept) {
            kept.len()
        } else {
            trailing_bytes_for_columns(indentation, indent_columns(kept))
        };
        self.drop_front(indentation.len() - keep);
    }

    fn drop_front(&mut self, count: usize) {
        let mut remaining = count;
        for range in &mut self.ranges {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(range.len());
            range.start += take;
            remaining -= take;
        }
    }
}

/// Bytes at the end of `indentation` needed to cover `columns` columns.
fn trailing_bytes_for_columns(indentation: &str, columns: usize) -> usize {
    let mut covered = 0;
    let mut bytes = 0;
    for c in indentation.chars().rev() {
        if covered >= columns {
            break;
        }
        covered += if c == '\t' { 4 } else { 1 };
        bytes += c.len_utf8();
    }
    bytes
}

/// Joins code pieces into lines, removes common indentation of indented blocks
/// and guarantees a trailing newline.
fn code_content(
    source: &str,
    pieces: &[(ByteRange, String)],
    indented: bool,
) -> (String, SourceRanges) {
    let mut lines: Vec<CodeLine> = Vec::new();
    let mut current = CodeLine::default();

    for (range, text) in pieces {
        let mut offset = 0;
        for part in text.split_inclusive('\n') {
            let start = (range.start + offset).min(range.end);
            let stop = (start + part.len()).min(range.end);
            current.text.push_str(part);
            current.ranges.push(ByteRange::new(start, stop));
            offset += part.len();
            if part.ends_with('\n') {
                lines.push(std::mem::take(&mut current));
            }
        }
    }
    if !current.text.is_empty() {
        lines.push(current);
    }

    if indented {
        let indent = lines
            .iter()
            .filter(|line| !line.is_blank())
            .map(CodeLine::leading_columns)
            .min()
            .unwrap_or(0);
        for line in lines.iter_mut().filter(|line| !line.is_blank()) {
            line.strip_front(indent, source);
        }
    }

    let mut text = String::new();
    let mut ranges = SourceRanges::new();
    for line in &lines {
        text.push_str(&line.text);
        for range in &line.ranges {
            ranges.push(*range);
        }
    }
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    (text, ranges)
}

/// Extends `pos` to just past the end of the line it sits on.
fn line_end(source: &str, pos: usize) -> usize {
    let pos = pos.min(source.len());
    if pos == 0 || source.as_bytes()[pos - 1] == b'\n' {
        return pos;
    }
    source[pos..]
        .find('\n')
        .map(|i| pos + i + 1)
        .unwrap_or(source.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn line_end_moves_past_newline() {
        let source = "abc\ndef";
        assert_eq!(line_end(source, 1), 4);
        assert_eq!(line_end(source, 4), 4);
        assert_eq!(line_end(source, 5), 7);
        assert_eq!(line_end(source, 0), 0);
    }

    #[test]
    fn indented_code_is_dedented() {
        let source = "xxxxxxxxxx  {}\nxxxxxxxxxx    x\n";
        let pieces = vec![
            (ByteRange::new(10, 15), "  {}\n".to_string()),
            (ByteRange::new(25, 31), "    x\n".to_string()),
        ];
        let (text, ranges) = code_content(source, &pieces, true);
        assert_eq!(text, "{}\n  x\n");
        assert_eq!(
            ranges.as_slice(),
            &[ByteRange::new(12, 15), ByteRange::new(27, 31)]
        );
    }

    #[test]
    fn fenced_code_keeps_indentation_and_gains_newline() {
        let source = "```\n  ab";
        let pieces = vec![(ByteRange::new(4, 8), "  ab".to_string())];
        let (text, _) = code_content(source, &pieces, false);
        assert_eq!(text, "  ab\n");
    }

    #[test]
    fn blank_code_lines_do_not_limit_dedent() {
        let source = "  a\n\n  b\n";
        let pieces = vec![
            (ByteRange::new(0, 5), "  a\n\n".to_string()),
            (ByteRange::new(5, 9), "  b\n".to_string()),
        ];
        let (text, _) = code_content(source, &pieces, true);
        assert_eq!(text, "a\n\nb\n");
    }

    #[test]
    fn expanded_tab_indentation_maps_back_to_source() {
        // The container consumed half of the tab, the text shows the rest as spaces.
        let source = "\tHello\n\tWorld\n";
        let pieces = vec![
            (ByteRange::new(0, 7), "  Hello\n".to_string()),
            (ByteRange::new(7, 14), "  World\n".to_string()),
        ];
        let (text, ranges) = code_content(source, &pieces, true);
        assert_eq!(text, "Hello\nWorld\n");
        assert_eq!(
            ranges.as_slice(),
            &[ByteRange::new(1, 7), ByteRange::new(8, 14)]
        );
        assert_eq!(ranges.text(source), text);
    }

    #[rstest]
    #[case("+ Response 200\n\n\t\tHello\n\t\tWorld\n")]
    #[case("+ Response 200\n\n        Hello\n        World\n")]
    #[case("+ Response 200\n\n\t    Hello\n    \tWorld\n")]
    fn code_ranges_cover_code_text(#[case] source: &str) {
        let root = tokenize(source);
        let item = &root.children[0];
        let code = item
            .children
            .iter()
            .find(|node| node.kind == NodeKind::Code)
            .unwrap();

        assert_eq!(code.text, "Hello\nWorld\n");
        assert_eq!(code.ranges.text(source), code.text);
    }
}
