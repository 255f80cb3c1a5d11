use apiblueprint_markdown::{Node, SourceRanges};

use crate::ast::Attributes;
use crate::parsing::signature::attributes_type_definition;
use crate::parsing::{ParserData, SectionLayout, SectionProcessor, SectionType, Signature};
use crate::processors::Parsed;

/// `Attributes (type)` sections, handed whole to the configured
/// [`AttributesResolver`](crate::attributes::AttributesResolver).
pub struct AttributesProcessor;

impl SectionProcessor for AttributesProcessor {
    const LAYOUT: SectionLayout = SectionLayout::ListItem;
    type Builder = Parsed<Attributes, SourceRanges>;
    type Output = Parsed<Attributes, SourceRanges>;

    fn process_signature(
        _section: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> Signature {
        if let Some(item) = nodes.get(at) {
            let type_definition = attributes_type_definition(item.first_line());
            let content = &item.children[item.content_start()..];
            out.node = pd.resolver.resolve(type_definition, content, pd.source);
            out.source_map = item.ranges.clone();
        }
        Signature::Redirect(at + 1)
    }

    fn build(out: Self::Builder) -> Self::Output {
        out
    }
}
