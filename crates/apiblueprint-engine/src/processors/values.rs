//! `Values` lists of a parameter: one `` `value` `` per nested item.

use std::sync::OnceLock;

use apiblueprint_markdown::{Node, NodeKind, SourceRanges};
use regex::Regex;

use crate::parsing::driver::warn_unexpected;
use crate::parsing::{ParserData, SectionLayout, SectionProcessor, SectionType};
use crate::processors::Parsed;
use crate::report::WarningCode;

pub type ParsedValues = Parsed<Vec<String>, Vec<SourceRanges>>;

fn value_regex() -> &'static Regex {
    static VALUE: OnceLock<Regex> = OnceLock::new();
    VALUE.get_or_init(|| Regex::new(r"^`([^`]*)`$").expect("Invalid value regex"))
}

pub struct ValuesProcessor;

impl SectionProcessor for ValuesProcessor {
    const LAYOUT: SectionLayout = SectionLayout::ListItem;
    type Builder = ParsedValues;
    type Output = ParsedValues;

    fn is_description_node(_node: &Node, _section: SectionType) -> bool {
        false
    }

    fn process_unexpected_node(
        _section: SectionType,
        nodes: &[Node],
        at: usize,
        _last: SectionType,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> usize {
        let Some(node) = nodes.get(at) else {
            return at + 1;
        };
        if !node.is(NodeKind::ListItem) {
            warn_unexpected(node, pd);
            return at + 1;
        }

        let line = node.first_line();
        match value_regex().captures(line).and_then(|caps| caps.get(1)) {
            Some(value) => {
                out.node.push(value.as_str().to_string());
                out.source_map.push(node.signature_ranges().clone());
            }
            None => pd.warn(
                WarningCode::Ignoring,
                format!("ignoring the '{line}' element, expected '`{line}`'"),
                &node.ranges,
            ),
        }
        at + 1
    }

    fn finalize(
        _section: SectionType,
        signature: &Node,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) {
        if out.node.is_empty() {
            pd.warn(
                WarningCode::Formatting,
                "no possible values specified, expected a nested list of possible parameter values, one element per list item",
                signature.signature_ranges(),
            );
        }
    }

    fn build(out: Self::Builder) -> Self::Output {
        out
    }
}
