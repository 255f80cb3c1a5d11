//! One parameter definition item:
//! ``name [= `default`] [(traits)] [... description]`` with optional
//! description paragraphs and a nested `Values` list.

use apiblueprint_markdown::{Node, NodeKind, SourceRanges};

use crate::ast::{Parameter, ParameterUse};
use crate::parsing::driver::append_description;
use crate::parsing::signature::parameter_signature;
use crate::parsing::{
    ParserData, SectionLayout, SectionProcessor, SectionType, Signature, parse_section,
};
use crate::processors::asset::signature_remainder;
use crate::processors::{Parsed, ValuesProcessor};
use crate::report::WarningCode;
use crate::source_map::ParameterSourceMap;

pub type ParsedParameter = Parsed<Parameter, ParameterSourceMap>;

const TRAITS_FORMAT: &str = "unable to parse additional parameter traits, expected '([required | optional], [<type>], [`<example value>`])', e.g. '(optional, string, `Hello World`)'";

/// Fields read from the parenthesised trait list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Traits {
    pub use_: ParameterUse,
    pub type_name: String,
    pub example_value: String,
}

/// Parses `required, number, `42``-style traits in any order.
///
/// The backticked example is taken out first so commas inside it do not split
/// the list. Returns `None` when a token is left over once use, type and
/// example are all taken.
pub fn parse_traits(traits: &str) -> Option<Traits> {
    let mut parsed = Traits::default();
    let mut rest = traits.to_string();

    if let Some(open) = traits.find('`') {
        let close = open + 1 + traits[open + 1..].find('`')?;
        let before = traits[..open].trim_end();
        let after = traits[close + 1..].trim_start();
        if !(before.is_empty() || before.ends_with(',')) {
            return None;
        }
        if !(after.is_empty() || after.starts_with(',')) {
            return None;
        }
        parsed.example_value = traits[open + 1..close].to_string();
        rest = format!("{before}{after}");
    }

    for token in rest.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if token.eq_ignore_ascii_case("required") {
            parsed.use_ = ParameterUse::Required;
        } else if token.eq_ignore_ascii_case("optional") {
            parsed.use_ = ParameterUse::Optional;
        } else if parsed.type_name.is_empty() && !token.contains('`') {
            parsed.type_name = token.to_string();
        } else {
            return None;
        }
    }
    Some(parsed)
}

pub struct ParameterProcessor;

impl SectionProcessor for ParameterProcessor {
    const LAYOUT: SectionLayout = SectionLayout::ListItem;
    type Builder = ParsedParameter;
    type Output = ParsedParameter;

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
        let ranges = item.signature_ranges();
        let Some(signature) = parameter_signature(item.first_line()) else {
            pd.warn(
                WarningCode::Formatting,
                "unable to parse parameter specification, expected '<parameter name> [= `<default value>`] [(<traits>)] [... <description>]'",
                ranges,
            );
            return Signature::Continue(item.content_start());
        };

        out.node.name = signature.name.to_string();
        out.source_map.name = ranges.clone();

        if let Some(default_value) = signature.default_value {
            out.node.default_value = default_value.to_string();
            out.source_map.default_value = ranges.clone();
        }

        if let Some(traits) = signature.traits {
            match parse_traits(traits) {
                Some(traits) => {
                    if traits.use_ != ParameterUse::Undefined {
                        out.node.use_ = traits.use_;
                        out.source_map.use_ = ranges.clone();
                    }
                    if !traits.type_name.is_empty() {
                        out.node.type_name = traits.type_name;
                        out.source_map.type_name = ranges.clone();
                    }
                    if !traits.example_value.is_empty() {
                        out.node.example_value = traits.example_value;
                        out.source_map.example_value = ranges.clone();
                    }
                }
                None => pd.warn(WarningCode::Formatting, TRAITS_FORMAT, ranges),
            }
        }

        if !signature.description.is_empty() {
            out.node.description = signature.description.to_string();
            out.source_map.description = ranges.clone();
        }
        if let Some((text, rest)) = signature_remainder(item, pd) {
            append_description(&mut out.node.description, &text);
            out.source_map.description.extend(&rest);
        }

        Signature::Continue(item.content_start())
    }

    fn description(out: &mut Self::Builder) -> Option<(&mut String, &mut SourceRanges)> {
        Some((&mut out.node.description, &mut out.source_map.description))
    }

    fn is_description_node(node: &Node, _section: SectionType) -> bool {
        !node.is(NodeKind::ListItem)
    }

    fn nested_section_types() -> &'static [SectionType] {
        &[SectionType::ParameterValues]
    }

    fn process_nested_section(
        nested: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> usize {
        let (values, next) = parse_section::<ValuesProcessor>(nested, nodes, at, pd);
        out.node.values.extend(values.node);
        out.source_map.values.extend(values.source_map);
        next
    }

    fn finalize(
        _section: SectionType,
        signature: &Node,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) {
        let location = signature.signature_ranges();
        let parameter = &mut out.node;

        if !parameter.default_value.is_empty() {
            match parameter.use_ {
                ParameterUse::Required => pd.warn(
                    WarningCode::LogicalError,
                    format!(
                        "specifying parameter '{}' as required supersedes its default value, declare the parameter as 'optional' to specify its default value",
                        parameter.name
                    ),
                    location,
                ),
                ParameterUse::Undefined => parameter.use_ = ParameterUse::Optional,
                ParameterUse::Optional => {}
            }
        }

        if parameter.values.is_empty() {
            return;
        }
        for (what, value) in [
            ("example", &parameter.example_value),
            ("default", &parameter.default_value),
        ] {
            if !value.is_empty() && !parameter.values.contains(value) {
                pd.warn(
                    WarningCode::LogicalError,
                    format!(
                        "the {what} value '{value}' of parameter '{}' is not in its list of expected values",
                        parameter.name
                    ),
                    location,
                );
            }
        }
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
    use apiblueprint_markdown::tokenize;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse_parameter(source: &str) -> (ParsedParameter, Vec<WarningCode>) {
        let root = tokenize(source);
        let resolver = RawAttributes;
        let mut pd = ParserData::new(source, ParseOptions::default(), &resolver);
        let (parameter, _) = parse_section::<ParameterProcessor>(
            SectionType::ParameterDefinition,
            &root.children,
            0,
            &mut pd,
        );
        (parameter, pd.report.warning_codes())
    }

    #[rstest]
    #[case("required, number, `42`", Some((ParameterUse::Required, "number", "42")))]
    #[case("`1`, optional", Some((ParameterUse::Optional, "", "1")))]
    #[case("string", Some((ParameterUse::Undefined, "string", "")))]
    #[case("string, number", None)]
    #[case("string, `a,b`", Some((ParameterUse::Undefined, "string", "a,b")))]
    #[case("`x, y`, required", Some((ParameterUse::Required, "", "x, y")))]
    #[case("string, `a` `b`", None)]
    fn trait_lists(
        #[case] traits: &str,
        #[case] expected: Option<(ParameterUse, &str, &str)>,
    ) {
        let expected = expected.map(|(use_, type_name, example_value)| Traits {
            use_,
            type_name: type_name.to_string(),
            example_value: example_value.to_string(),
        });
        assert_eq!(parse_traits(traits), expected);
    }

    #[test]
    fn full_definition() {
        let source = "+ id = `1` (optional, number, `42`) ... Resource Id\n";
        let (parameter, warnings) = parse_parameter(source);

        assert_eq!(
            parameter.node,
            Parameter {
                name: "id".to_string(),
                description: "Resource Id".to_string(),
                type_name: "number".to_string(),
                use_: ParameterUse::Optional,
                default_value: "1".to_string(),
                example_value: "42".to_string(),
                values: Vec::new(),
            }
        );
        assert!(!parameter.source_map.name.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn example_may_contain_commas() {
        let (parameter, warnings) = parse_parameter("+ tags (string, `a,b`) ... Tags\n");

        assert_eq!(parameter.node.type_name, "string");
        assert_eq!(parameter.node.example_value, "a,b");
        assert_eq!(parameter.node.description, "Tags");
        assert!(warnings.is_empty());
    }

    #[test]
    fn default_makes_undefined_use_optional() {
        let (parameter, warnings) = parse_parameter("+ limit = `10`\n");
        assert_eq!(parameter.node.use_, ParameterUse::Optional);
        assert!(warnings.is_empty());
    }

    #[test]
    fn required_with_default_is_a_logical_error() {
        let (_, warnings) = parse_parameter("+ limit = `10` (required)\n");
        assert_eq!(warnings, vec![WarningCode::LogicalError]);
    }

    #[test]
    fn extra_traits_reset_the_parameter_traits() {
        let (parameter, warnings) = parse_parameter("+ id (string, number, `1`)\n");
        assert_eq!(parameter.node.type_name, "");
        assert_eq!(parameter.node.example_value, "");
        assert_eq!(warnings, vec![WarningCode::Formatting]);
    }

    #[test]
    fn values_must_contain_example_and_default() {
        let source = "+ sort = `date` (`size`) ... Sort order\n    + Values\n        + `name`\n        + `date`\n";
        let (parameter, warnings) = parse_parameter(source);

        assert_eq!(parameter.node.values, vec!["name", "date"]);
        assert_eq!(warnings, vec![WarningCode::LogicalError]);
    }

    #[test]
    fn description_paragraphs_follow_the_signature() {
        let source = "+ id (number)\n\n    The identifier.\n";
        let (parameter, _) = parse_parameter(source);
        assert_eq!(parameter.node.description, "The identifier.\n");
    }
}
