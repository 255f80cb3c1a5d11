use apiblueprint_markdown::{Node, NodeKind, SourceRanges};

use crate::ast::ResourceGroup;
use crate::parsing::signature::{HeaderSignature, header_signature};
use crate::parsing::{
    ParserData, SectionLayout, SectionProcessor, SectionType, Signature, parse_section,
};
use crate::processors::{Parsed, ResourceProcessor};
use crate::source_map::ResourceGroupSourceMap;

pub type ParsedResourceGroup = Parsed<ResourceGroup, ResourceGroupSourceMap>;

/// `Group <name>` sections, or an anonymous group opened by a resource or by
/// content after a horizontal rule.
pub struct ResourceGroupProcessor;

impl SectionProcessor for ResourceGroupProcessor {
    const LAYOUT: SectionLayout = SectionLayout::Header;
    type Builder = ParsedResourceGroup;
    type Output = ParsedResourceGroup;

    fn process_signature(
        _section: SectionType,
        nodes: &[Node],
        at: usize,
        _pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> Signature {
        let group_name = nodes
            .get(at)
            .filter(|node| node.is(NodeKind::Header))
            .and_then(|node| match header_signature(&node.text) {
                HeaderSignature::Group { name } => Some((name, node)),
                _ => None,
            });
        match group_name {
            Some((name, node)) => {
                out.node.name = name.to_string();
                out.source_map.name = node.ranges.clone();
                Signature::Continue(at + 1)
            }
            None => Signature::Continue(at),
        }
    }

    fn description(out: &mut Self::Builder) -> Option<(&mut String, &mut SourceRanges)> {
        Some((&mut out.node.description, &mut out.source_map.description))
    }

    fn nested_section_types() -> &'static [SectionType] {
        &[SectionType::Resource]
    }

    fn process_nested_section(
        nested: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> usize {
        let (resource, next) = parse_section::<ResourceProcessor>(nested, nodes, at, pd);
        out.node.resources.push(resource.node);
        out.source_map.resources.push(resource.source_map);
        next
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
    use crate::report::WarningCode;
    use apiblueprint_markdown::tokenize;
    use pretty_assertions::assert_eq;

    fn parse_group(source: &str) -> (ParsedResourceGroup, usize, Vec<WarningCode>) {
        let root = tokenize(source);
        let resolver = RawAttributes;
        let mut pd = ParserData::new(source, ParseOptions::default(), &resolver);
        let (group, next) = parse_section::<ResourceGroupProcessor>(
            SectionType::ResourceGroup,
            &root.children,
            0,
            &mut pd,
        );
        (group, next, pd.report.warning_codes())
    }

    #[test]
    fn named_group_with_resources() {
        let source = "# Group Notes\n\nAll about notes.\n\n## /notes\n\n### GET\n\n+ Response 200\n\n## /notes/{id}\n\n### DELETE\n\n+ Response 204\n\n# Group Tasks\n";
        let (group, next, warnings) = parse_group(source);

        assert_eq!(group.node.name, "Notes");
        assert_eq!(group.node.description, "All about notes.\n");
        assert_eq!(group.node.resources.len(), 2);
        assert_eq!(next, 8);
        assert!(warnings.is_empty());
    }

    #[test]
    fn resource_opens_an_anonymous_group() {
        let (group, next, _) = parse_group("# GET /notes\n\n+ Response 200\n");
        assert_eq!(group.node.name, "");
        assert_eq!(group.node.resources.len(), 1);
        assert_eq!(next, 2);
    }

    #[test]
    fn same_uri_twice_warns() {
        let source = "# /message\n\n## GET\n\n+ Response 200\n\n# /message\n\n## PUT\n\n+ Response 204\n";
        let (group, _, warnings) = parse_group(source);
        assert_eq!(group.node.resources.len(), 2);
        assert_eq!(warnings, vec![WarningCode::Duplicate]);
    }
}
