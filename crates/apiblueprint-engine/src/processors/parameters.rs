//! `Parameters` sections and the URI checks run against their content.

use apiblueprint_markdown::{Node, NodeKind, SourceRanges};

use crate::ast::Parameter;
use crate::parsing::{
    ParserData, SectionLayout, SectionProcessor, SectionType, Signature, parse_section,
};
use crate::processors::asset::signature_remainder;
use crate::processors::{Parsed, ParameterProcessor};
use crate::report::WarningCode;
use crate::source_map::ParameterSourceMap;
use crate::uri_template;

pub type ParsedParameters = Parsed<Vec<Parameter>, Vec<ParameterSourceMap>>;

const ADDITIONAL_CONTENT: &str = "ignoring additional content after 'parameters' keyword, expected a nested list of parameters, one parameter per list item";

pub struct ParametersProcessor;

impl SectionProcessor for ParametersProcessor {
    const LAYOUT: SectionLayout = SectionLayout::ListItem;
    type Builder = ParsedParameters;
    type Output = ParsedParameters;

    fn process_signature(
        _section: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        _out: &mut Self::Builder,
    ) -> Signature {
        let Some(item) = nodes.get(at) else {
            return Signature::Redirect(at + 1);
        };
        if let Some((_, ranges)) = signature_remainder(item, pd) {
            pd.warn(WarningCode::Ignoring, ADDITIONAL_CONTENT, &ranges);
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
        _section: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        _out: &mut Self::Builder,
    ) -> usize {
        if let Some(node) = nodes.get(at) {
            pd.warn(WarningCode::Ignoring, ADDITIONAL_CONTENT, &node.ranges);
        }
        at + 1
    }

    fn nested_section_types() -> &'static [SectionType] {
        &[SectionType::ParameterDefinition]
    }

    fn process_nested_section(
        nested: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> usize {
        let (parameter, next) = parse_section::<ParameterProcessor>(nested, nodes, at, pd);
        merge_parameters(
            &mut out.node,
            &mut out.source_map,
            Parsed::new(vec![parameter.node], vec![parameter.source_map]),
            pd,
        );
        next
    }

    fn process_unexpected_node(
        _section: SectionType,
        nodes: &[Node],
        at: usize,
        _last: SectionType,
        pd: &mut ParserData<'_>,
        _out: &mut Self::Builder,
    ) -> usize {
        if let Some(node) = nodes.get(at) {
            let message = if node.is(NodeKind::ListItem) {
                format!(
                    "ignoring '{}', expected '<parameter name> [= `<default value>`] [(<traits>)] [... <description>]'",
                    node.first_line()
                )
            } else {
                ADDITIONAL_CONTENT.to_string()
            };
            pd.warn(WarningCode::Ignoring, message, &node.ranges);
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
                "no parameters specified, expected a nested list of parameters, one parameter per list item",
                signature.signature_ranges(),
            );
        }
    }

    fn build(out: Self::Builder) -> Self::Output {
        out
    }
}

/// Adds parameters to `parameters`; a later definition of a known name
/// replaces the earlier one.
pub fn merge_parameters(
    parameters: &mut Vec<Parameter>,
    source_maps: &mut Vec<ParameterSourceMap>,
    parsed: ParsedParameters,
    pd: &mut ParserData<'_>,
) {
    for (parameter, source_map) in parsed.node.into_iter().zip(parsed.source_map) {
        match parameters.iter().position(|p| p.name == parameter.name) {
            Some(index) => {
                pd.warn(
                    WarningCode::Redefinition,
                    format!("overshadowing previous parameter '{}' definition", parameter.name),
                    &source_map.name,
                );
                parameters[index] = parameter;
                if let Some(slot) = source_maps.get_mut(index) {
                    *slot = source_map;
                }
            }
            None => {
                parameters.push(parameter);
                source_maps.push(source_map);
            }
        }
    }
}

/// Warns about every parameter that names no variable of `uri`.
///
/// `owner` is the resource or action name, added to the message when set.
pub fn check_parameters_in_uri(
    parameters: &[Parameter],
    uri: &str,
    owner: &str,
    location: &SourceRanges,
    pd: &mut ParserData<'_>,
) {
    let variables = uri_template::variables(uri);
    for parameter in parameters {
        if variables.iter().any(|v| *v == parameter.name) {
            continue;
        }
        let mut message = format!(
            "parameter '{}' is not found within the URI template '{uri}'",
            parameter.name
        );
        if !owner.is_empty() {
            message.push_str(&format!(" for '{owner}'"));
        }
        pd.warn(WarningCode::LogicalError, message, location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::RawAttributes;
    use crate::options::ParseOptions;
    use apiblueprint_markdown::tokenize;
    use pretty_assertions::assert_eq;

    fn parse_parameters(source: &str) -> (ParsedParameters, Vec<WarningCode>) {
        let root = tokenize(source);
        let resolver = RawAttributes;
        let mut pd = ParserData::new(source, ParseOptions::default(), &resolver);
        let (parameters, _) = parse_section::<ParametersProcessor>(
            SectionType::Parameters,
            &root.children,
            0,
            &mut pd,
        );
        (parameters, pd.report.warning_codes())
    }

    fn names(parameters: &ParsedParameters) -> Vec<&str> {
        parameters.node.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn one_parameter_per_item() {
        let source = "+ Parameters\n    + id (number) ... Id\n    + limit = `10` ... Page size\n";
        let (parameters, warnings) = parse_parameters(source);

        assert_eq!(names(&parameters), vec!["id", "limit"]);
        assert_eq!(parameters.source_map.len(), 2);
        assert!(warnings.is_empty());
    }

    #[test]
    fn malformed_item_is_ignored() {
        let source = "+ Parameters\n    + id (number) ... Id\n    + not a parameter!\n";
        let (parameters, warnings) = parse_parameters(source);

        assert_eq!(names(&parameters), vec!["id"]);
        assert_eq!(warnings, vec![WarningCode::Ignoring]);
    }

    #[test]
    fn redefinition_replaces() {
        let source = "+ Parameters\n    + id (number)\n    + id (string)\n";
        let (parameters, warnings) = parse_parameters(source);

        assert_eq!(parameters.node.len(), 1);
        assert_eq!(parameters.node[0].type_name, "string");
        assert_eq!(warnings, vec![WarningCode::Redefinition]);
    }

    #[test]
    fn empty_section_warns() {
        let (_, warnings) = parse_parameters("+ Parameters\n");
        assert_eq!(warnings, vec![WarningCode::Formatting]);
    }

    #[test]
    fn parameters_must_appear_in_uri() {
        let resolver = RawAttributes;
        let mut pd = ParserData::new("", ParseOptions::default(), &resolver);
        let parameters = ["id", "ab", "abc"].map(|name| Parameter {
            name: name.to_string(),
            ..Parameter::default()
        });

        check_parameters_in_uri(
            &parameters,
            "/orders/{id}{?abc}",
            "List",
            &SourceRanges::new(),
            &mut pd,
        );

        assert_eq!(pd.report.warnings.len(), 1);
        assert_eq!(
            pd.report.warnings[0].message,
            "parameter 'ab' is not found within the URI template '/orders/{id}{?abc}' for 'List'"
        );
    }
}
