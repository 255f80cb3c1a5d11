use serde::Serialize;

use crate::range::SourceRanges;

/// Block-level node kinds.
///
/// List containers are not represented: their items are hoisted into the
/// enclosing node's children, which is how the section parser walks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Root,
    Header,
    Paragraph,
    Code,
    ListItem,
    Quote,
    HRule,
    Html,
}

/// One node of the block tree.
///
/// `text` holds the node's own content: header text, paragraph text, code
/// content or raw HTML. Container nodes (root, list items, quotes) carry their
/// content in `children`. `ranges` always points back into the tokenized
/// source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub text: String,
    /// Header depth for headers, nesting depth for list items, zero otherwise.
    pub level: u8,
    pub children: Vec<Node>,
    pub ranges: SourceRanges,
}

impl Node {
    pub fn new(kind: NodeKind, text: impl Into<String>, ranges: SourceRanges) -> Self {
        Self {
            kind,
            text: text.into(),
            level: 0,
            children: Vec::new(),
            ranges,
        }
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind == kind
    }

    /// Text a section signature is matched against.
    ///
    /// For a list item this is the text of its leading paragraph, for every
    /// other node its own text.
    pub fn signature_text(&self) -> &str {
        match self.kind {
            NodeKind::ListItem => self
                .children
                .first()
                .filter(|child| child.is(NodeKind::Paragraph))
                .map(|child| child.text.as_str())
                .unwrap_or(""),
            _ => &self.text,
        }
    }

    /// Source ranges of the signature text (see [`Node::signature_text`]).
    pub fn signature_ranges(&self) -> &SourceRanges {
        match self.kind {
            NodeKind::ListItem => self
                .children
                .first()
                .filter(|child| child.is(NodeKind::Paragraph))
                .map(|child| &child.ranges)
                .unwrap_or(&self.ranges),
            _ => &self.ranges,
        }
    }

    /// First line of the signature text, trimmed.
    pub fn first_line(&self) -> &str {
        first_line(self.signature_text())
    }

    /// Index of the first child that is not the signature paragraph.
    pub fn content_start(&self) -> usize {
        match self.children.first() {
            Some(child) if self.is(NodeKind::ListItem) && child.is(NodeKind::Paragraph) => 1,
            _ => 0,
        }
    }
}

/// Returns the first line of `text` without surrounding whitespace.
pub fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::ByteRange;

    fn paragraph(text: &str, start: usize) -> Node {
        Node::new(
            NodeKind::Paragraph,
            text,
            ByteRange::new(start, start + text.len()).into(),
        )
    }

    #[test]
    fn list_item_signature_comes_from_leading_paragraph() {
        let mut item = Node::new(NodeKind::ListItem, "", SourceRanges::single(0, 30));
        item.children.push(paragraph("Response 200\nmore", 2));

        assert_eq!(item.signature_text(), "Response 200\nmore");
        assert_eq!(item.first_line(), "Response 200");
        assert_eq!(item.content_start(), 1);
    }

    #[test]
    fn empty_list_item_has_no_signature() {
        let item = Node::new(NodeKind::ListItem, "", SourceRanges::single(0, 2));
        assert_eq!(item.first_line(), "");
        assert_eq!(item.content_start(), 0);
        assert_eq!(item.signature_ranges(), &SourceRanges::single(0, 2));
    }

    #[test]
    fn first_line_trims() {
        assert_eq!(first_line("  GET /a  \nrest"), "GET /a");
        assert_eq!(first_line(""), "");
    }
}
