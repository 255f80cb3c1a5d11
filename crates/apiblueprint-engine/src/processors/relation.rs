use apiblueprint_markdown::{Node, SourceRanges};

use crate::ast::Relation;
use crate::parsing::signature::relation_identifier;
use crate::parsing::{ParserData, SectionLayout, SectionProcessor, SectionType, Signature};
use crate::processors::Parsed;
use crate::report::WarningCode;

/// `Relation: <identifier>` list items.
pub struct RelationProcessor;

impl SectionProcessor for RelationProcessor {
    const LAYOUT: SectionLayout = SectionLayout::ListItem;
    type Builder = Parsed<Relation, SourceRanges>;
    type Output = Parsed<Relation, SourceRanges>;

    fn process_signature(
        _section: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> Signature {
        let Some(item) = nodes.get(at) else {
            return Signature::Redirect(at + 1);
        };
        match relation_identifier(item.first_line()) {
            Some(identifier) => {
                out.node.identifier = identifier.to_string();
                if !identifier.is_empty() {
                    out.source_map = item.signature_ranges().clone();
                }
            }
            None => pd.warn(
                WarningCode::Formatting,
                "relation identifier contains illegal characters (only lower case letters, numbers, '-' and '.' allowed)",
                item.signature_ranges(),
            ),
        }
        Signature::Continue(item.content_start())
    }

    fn is_description_node(_node: &Node, _section: SectionType) -> bool {
        false
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
    use rstest::rstest;

    #[rstest]
    #[case("+ Relation: self\n", "self", 0)]
    #[case("+ Relation: task.archive-2\n", "task.archive-2", 0)]
    #[case("+ Relation: Self!\n", "", 1)]
    fn identifiers(#[case] source: &str, #[case] expected: &str, #[case] warnings: usize) {
        let root = tokenize(source);
        let resolver = RawAttributes;
        let mut pd = ParserData::new(source, ParseOptions::default(), &resolver);

        let (relation, next) =
            parse_section::<RelationProcessor>(SectionType::Relation, &root.children, 0, &mut pd);

        assert_eq!(relation.node.identifier, expected);
        assert_eq!(next, 1);
        assert_eq!(pd.report.warnings.len(), warnings);
    }
}
