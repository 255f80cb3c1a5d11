//! `Body` and `Schema` sections, plus the code block helpers every section
//! with literal content shares.

use apiblueprint_markdown::{ByteRange, Node, NodeKind, SourceRanges};

use crate::parsing::{ParserData, SectionLayout, SectionProcessor, SectionType, Signature};
use crate::processors::Parsed;
use crate::report::WarningCode;

/// Indentation level of an asset nested in a full payload.
const ASSET_LEVEL: usize = 3;

/// Takes a node's content as literal code.
///
/// Anything but a code block is still taken, verbatim from the source, with
/// an `Indentation` warning: `what` names the content in the message and
/// `level` is the list nesting the code was expected at.
pub fn code_block_content(
    node: &Node,
    what: &str,
    level: usize,
    pd: &mut ParserData<'_>,
) -> (String, SourceRanges) {
    if node.is(NodeKind::Code) {
        return (node.text.clone(), node.ranges.clone());
    }
    pd.warn(
        WarningCode::Indentation,
        format!(
            "{what} is expected to be a pre-formatted code block, every of its line indented by exactly {} spaces or {level} tabs",
            level * 4
        ),
        &node.ranges,
    );
    let mut text = pd.text(&node.ranges);
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    (text, node.ranges.clone())
}

/// Splits the text covered by `ranges` into lines, each with its own ranges.
pub fn source_lines(ranges: &SourceRanges, source: &str) -> Vec<(String, SourceRanges)> {
    let mut lines = Vec::new();
    let mut text = String::new();
    let mut line_ranges = SourceRanges::new();
    for range in ranges.iter() {
        let Some(slice) = source.get(range.start..range.end) else {
            continue;
        };
        let mut offset = range.start;
        for part in slice.split_inclusive('\n') {
            text.push_str(part);
            line_ranges.push(ByteRange::new(offset, offset + part.len()));
            offset += part.len();
            if part.ends_with('\n') {
                lines.push((std::mem::take(&mut text), std::mem::take(&mut line_ranges)));
            }
        }
    }
    if !text.is_empty() {
        lines.push((text, line_ranges));
    }
    lines
}

/// Lines of a list item's signature paragraph after the keyword line.
pub fn signature_remainder(item: &Node, pd: &ParserData<'_>) -> Option<(String, SourceRanges)> {
    let ranges = item.signature_ranges().after_first_line(pd.source);
    let text = pd.text(&ranges);
    (!text.trim().is_empty()).then_some((text, ranges))
}

pub struct AssetProcessor;

impl AssetProcessor {
    fn what(section: SectionType) -> String {
        format!("'{}'", section.name())
    }
}

impl SectionProcessor for AssetProcessor {
    const LAYOUT: SectionLayout = SectionLayout::ListItem;
    type Builder = Parsed<String, SourceRanges>;
    type Output = Parsed<String, SourceRanges>;

    fn process_signature(
        section: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> Signature {
        let Some(item) = nodes.get(at) else {
            return Signature::Redirect(at + 1);
        };
        if let Some((text, ranges)) = signature_remainder(item, pd) {
            let message = format!(
                "{} is expected to be a pre-formatted code block, separate it by a newline and indent every of its line by {} spaces or {ASSET_LEVEL} tabs",
                Self::what(section),
                ASSET_LEVEL * 4
            );
            pd.warn(WarningCode::Indentation, message, &ranges);
            out.node.push_str(&text);
            out.source_map.extend(&ranges);
        }
        Signature::Continue(item.content_start())
    }

    fn is_description_node(_node: &Node, _section: SectionType) -> bool {
        false
    }

    fn is_content_node(node: &Node, _section: SectionType) -> bool {
        !node.is(NodeKind::ListItem)
    }

    fn process_content(
        section: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> usize {
        if let Some(node) = nodes.get(at) {
            let (text, ranges) = code_block_content(node, &Self::what(section), ASSET_LEVEL, pd);
            out.node.push_str(&text);
            out.source_map.extend(&ranges);
        }
        at + 1
    }

    fn build(out: Self::Builder) -> Self::Output {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::RawAttributes;
    use crate::options::ParseOptions;
    use crate::parsing::parse_section;
    use apiblueprint_markdown::tokenize;
    use pretty_assertions::assert_eq;

    fn parse_body(source: &str) -> (Parsed<String, SourceRanges>, Vec<WarningCode>) {
        let root = tokenize(source);
        let resolver = RawAttributes;
        let mut pd = ParserData::new(source, ParseOptions::default(), &resolver);
        let (body, _) =
            parse_section::<AssetProcessor>(SectionType::Body, &root.children, 0, &mut pd);
        (body, pd.report.warning_codes())
    }

    #[test]
    fn code_block_becomes_the_asset() {
        let (body, warnings) = parse_body("+ Body\n\n        { \"id\": 1 }\n");
        assert_eq!(body.node, "{ \"id\": 1 }\n");
        assert!(warnings.is_empty());
    }

    #[test]
    fn paragraph_is_taken_with_indentation_warning() {
        let (body, warnings) = parse_body("+ Body\n\n    { \"id\": 1 }\n");
        assert_eq!(body.node, "{ \"id\": 1 }\n");
        assert_eq!(warnings, vec![WarningCode::Indentation]);
    }

    #[test]
    fn source_lines_follow_discontinuous_ranges() {
        let source = "    a: 1\n    b: 2\n";
        let ranges: SourceRanges = [ByteRange::new(4, 9), ByteRange::new(13, 18)]
            .into_iter()
            .collect();
        let lines = source_lines(&ranges, source);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, "a: 1\n");
        assert_eq!(lines[1].1, SourceRanges::single(13, 18));
    }
}
