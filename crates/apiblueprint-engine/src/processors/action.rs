//! Actions: `METHOD`, `Name [METHOD]` or, carrying their own URI,
//! `METHOD URI` and `Name [METHOD URI]` headers.
//!
//! Requests and responses are grouped into transaction examples in document
//! order: a request opens a new example once the current one has responses.

use apiblueprint_markdown::{Node, NodeKind, SourceRanges};

use crate::ast::{Action, Payload, TransactionExample};
use crate::http::response_body_violation;
use crate::parsing::driver::warn_unexpected;
use crate::parsing::signature::{HeaderSignature, header_signature};
use crate::parsing::{
    ParserData, SectionLayout, SectionProcessor, SectionType, Signature, parse_section,
};
use crate::processors::headers::{DEPRECATED_HEADERS, ParsedHeaders, append_headers, inject_headers};
use crate::processors::parameters::{check_parameters_in_uri, merge_parameters};
use crate::processors::payload::ParsedPayload;
use crate::processors::{
    AttributesProcessor, HeadersProcessor, ParametersProcessor, Parsed, PayloadProcessor,
    RelationProcessor,
};
use crate::report::WarningCode;
use crate::source_map::{ActionSourceMap, PayloadSourceMap, TransactionExampleSourceMap};

pub type ParsedAction = Parsed<Action, ActionSourceMap>;

#[derive(Debug, Default)]
pub struct ActionBuilder {
    action: ParsedAction,
    /// Deprecated action level headers, injected into every payload.
    headers: ParsedHeaders,
}

pub struct ActionProcessor;

impl ActionProcessor {
    fn add_payload(
        nested: SectionType,
        payload: ParsedPayload,
        location: &SourceRanges,
        pd: &mut ParserData<'_>,
        out: &mut ParsedAction,
    ) {
        let examples = &mut out.node.examples;
        let maps = &mut out.source_map.examples;
        let opens_example = match examples.last() {
            None => true,
            Some(last) => nested.is_request() && !last.responses.is_empty(),
        };
        if opens_example {
            examples.push(TransactionExample::default());
            maps.push(TransactionExampleSourceMap::default());
        }
        let (Some(example), Some(example_map)) = (examples.last_mut(), maps.last_mut()) else {
            return;
        };

        let (payloads, payload_maps) = if nested.is_request() {
            (&mut example.requests, &mut example_map.requests)
        } else {
            (&mut example.responses, &mut example_map.responses)
        };
        if payloads.iter().any(|p| p.name == payload.node.name) {
            pd.warn(
                WarningCode::Duplicate,
                format!(
                    "{} payload `{}` already defined for `{}` method",
                    nested.name(),
                    payload.node.name,
                    out.node.method
                ),
                location,
            );
        }
        payloads.push(payload.node);
        payload_maps.push(payload.source_map);
    }

    /// Last request or response, whichever `last` names.
    fn last_payload<'b>(
        last: SectionType,
        out: &'b mut ParsedAction,
    ) -> Option<(&'b mut Payload, &'b mut PayloadSourceMap)> {
        let example = out.node.examples.last_mut()?;
        let example_map = out.source_map.examples.last_mut()?;
        if last.is_request() {
            Some((example.requests.last_mut()?, example_map.requests.last_mut()?))
        } else if last.is_response() {
            Some((example.responses.last_mut()?, example_map.responses.last_mut()?))
        } else {
            None
        }
    }

    fn has_content(out: &ActionBuilder) -> bool {
        let action = &out.action.node;
        !action.description.trim().is_empty()
            || !action.parameters.is_empty()
            || !action.relation.identifier.is_empty()
            || action.attributes.is_some()
            || !out.headers.node.is_empty()
    }
}

/// Warns about response bodies HTTP forbids for `method`.
pub fn check_response_bodies(
    method: &str,
    responses: &[Payload],
    maps: &[PayloadSourceMap],
    pd: &mut ParserData<'_>,
) {
    for (index, response) in responses.iter().enumerate() {
        if response.body.is_empty() {
            continue;
        }
        let Ok(status) = response.name.parse::<u16>() else {
            continue;
        };
        if let Some(message) = response_body_violation(method, status) {
            let location = maps.get(index).map(|m| m.body.clone()).unwrap_or_default();
            pd.warn(WarningCode::EmptyDefinition, message, &location);
        }
    }
}

impl SectionProcessor for ActionProcessor {
    const LAYOUT: SectionLayout = SectionLayout::Header;
    type Builder = ActionBuilder;
    type Output = ParsedAction;

    fn process_signature(
        _section: SectionType,
        nodes: &[Node],
        at: usize,
        _pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> Signature {
        let Some(node) = nodes.get(at) else {
            return Signature::Redirect(at);
        };
        let (name, method, uri) = match header_signature(&node.text) {
            HeaderSignature::Action { name, method } => (name, method, ""),
            HeaderSignature::Endpoint { name, method, uri } => (name, method, uri),
            _ => ("", "", ""),
        };

        let action = &mut out.action;
        action.node.method = method.to_string();
        action.source_map.method = node.ranges.clone();
        if !name.is_empty() {
            action.node.name = name.to_string();
            action.source_map.name = node.ranges.clone();
        }
        if !uri.is_empty() {
            action.node.uri_template = uri.to_string();
            action.source_map.uri_template = node.ranges.clone();
        }
        Signature::Continue(at + 1)
    }

    fn description(out: &mut Self::Builder) -> Option<(&mut String, &mut SourceRanges)> {
        Some((
            &mut out.action.node.description,
            &mut out.action.source_map.description,
        ))
    }

    fn nested_section_types() -> &'static [SectionType] {
        &[
            SectionType::Relation,
            SectionType::Parameters,
            SectionType::Headers,
            SectionType::Request,
            SectionType::RequestBody,
            SectionType::Response,
            SectionType::ResponseBody,
            SectionType::Attributes,
        ]
    }

    fn process_nested_section(
        nested: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> usize {
        let location = nodes
            .get(at)
            .map(|node| node.signature_ranges().clone())
            .unwrap_or_default();
        let action = &mut out.action;

        match nested {
            SectionType::Relation => {
                let (relation, next) = parse_section::<RelationProcessor>(nested, nodes, at, pd);
                if !action.node.relation.identifier.is_empty() {
                    pd.warn(
                        WarningCode::Duplicate,
                        format!(
                            "relation identifier '{}' is already defined for `{}` method",
                            action.node.relation.identifier, action.node.method
                        ),
                        &location,
                    );
                }
                action.node.relation = relation.node;
                action.source_map.relation = relation.source_map;
                next
            }
            SectionType::Parameters => {
                let (parameters, next) =
                    parse_section::<ParametersProcessor>(nested, nodes, at, pd);
                merge_parameters(
                    &mut action.node.parameters,
                    &mut action.source_map.parameters,
                    parameters,
                    pd,
                );
                next
            }
            SectionType::Headers => {
                pd.warn(WarningCode::Deprecated, DEPRECATED_HEADERS, &location);
                let (headers, next) = parse_section::<HeadersProcessor>(nested, nodes, at, pd);
                append_headers(
                    &mut out.headers.node,
                    &mut out.headers.source_map,
                    headers,
                    pd,
                );
                next
            }
            SectionType::Attributes => {
                let (attributes, next) =
                    parse_section::<AttributesProcessor>(nested, nodes, at, pd);
                action.node.attributes = Some(attributes.node);
                action.source_map.attributes = attributes.source_map;
                next
            }
            _ => {
                let (payload, next) = parse_section::<PayloadProcessor>(nested, nodes, at, pd);
                Self::add_payload(nested, payload, &location, pd, action);
                next
            }
        }
    }

    fn process_unexpected_node(
        _section: SectionType,
        nodes: &[Node],
        at: usize,
        last: SectionType,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> usize {
        let Some(node) = nodes.get(at) else {
            return at + 1;
        };
        let dangling = matches!(node.kind, NodeKind::Code | NodeKind::Paragraph);
        match Self::last_payload(last, &mut out.action) {
            Some((payload, payload_map)) if dangling => {
                pd.warn(
                    WarningCode::Indentation,
                    "dangling message-body asset, expected a pre-formatted code block, indent every of its line by 8 spaces or 2 tabs",
                    &node.ranges,
                );
                let text = if node.is(NodeKind::Code) {
                    node.text.clone()
                } else {
                    let mut text = pd.text(&node.ranges);
                    if !text.ends_with('\n') {
                        text.push('\n');
                    }
                    text
                };
                payload.body.push_str(&text);
                payload_map.body.extend(&node.ranges);
            }
            _ => warn_unexpected(node, pd),
        }
        at + 1
    }

    fn finalize(
        _section: SectionType,
        signature: &Node,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) {
        let has_content = Self::has_content(out);
        let action = &mut out.action;

        let examples = std::mem::take(&mut action.node.examples);
        let example_maps = std::mem::take(&mut action.source_map.examples);
        let (examples, example_maps) = inject_headers(&out.headers, examples, example_maps);
        action.node.examples = examples;
        action.source_map.examples = example_maps;

        for (example, example_map) in action
            .node
            .examples
            .iter()
            .zip(action.source_map.examples.iter())
        {
            check_response_bodies(
                &action.node.method,
                &example.responses,
                &example_map.responses,
                pd,
            );
        }

        match action.node.examples.last() {
            None if has_content => pd.warn(
                WarningCode::EmptyDefinition,
                "action is missing a response",
                &signature.ranges,
            ),
            Some(last) if last.responses.is_empty() && !last.requests.is_empty() => pd.warn(
                WarningCode::EmptyDefinition,
                format!(
                    "action is missing a response for the last request, expected '+ Response <HTTP status code>' after it, e.g. '+ Response 200' for `{}` method",
                    action.node.method
                ),
                &signature.ranges,
            ),
            _ => {}
        }

        if !action.node.uri_template.is_empty() {
            check_parameters_in_uri(
                &action.node.parameters,
                &action.node.uri_template,
                &action.node.name,
                &signature.ranges,
                pd,
            );
        }
    }

    fn build(out: Self::Builder) -> Self::Output {
        out.action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Header;
    use crate::attributes::RawAttributes;
    use crate::options::ParseOptions;
    use apiblueprint_markdown::tokenize;
    use pretty_assertions::assert_eq;

    fn parse_action(source: &str) -> (ParsedAction, usize, Vec<WarningCode>) {
        let root = tokenize(source);
        let resolver = RawAttributes;
        let mut pd = ParserData::new(source, ParseOptions::default(), &resolver);
        let (action, next) =
            parse_section::<ActionProcessor>(SectionType::Action, &root.children, 0, &mut pd);
        (action, next, pd.report.warning_codes())
    }

    fn shape(action: &Action) -> Vec<(usize, usize)> {
        action
            .examples
            .iter()
            .map(|e| (e.requests.len(), e.responses.len()))
            .collect()
    }

    #[test]
    fn bare_method_is_one_node() {
        let (action, next, warnings) = parse_action("# GET\n");
        assert_eq!(action.node.method, "GET");
        assert_eq!(next, 1);
        assert!(warnings.is_empty());
    }

    #[test]
    fn named_action_with_uri() {
        let (action, _, _) = parse_action("## Remove [DELETE /notes/{id}]\n\n+ Response 204\n");
        assert_eq!(action.node.name, "Remove");
        assert_eq!(action.node.method, "DELETE");
        assert_eq!(action.node.uri_template, "/notes/{id}");
        assert!(!action.source_map.uri_template.is_empty());
    }

    #[test]
    fn requests_and_responses_pair_into_examples() {
        let source = "# POST\n\n+ Request A\n\n+ Response 200\n\n+ Response 400\n\n+ Request B\n\n+ Response 201\n";
        let (action, _, warnings) = parse_action(source);
        assert_eq!(shape(&action.node), vec![(1, 2), (1, 1)]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn request_after_last_response_warns() {
        let source = "# POST\n\n+ Request A\n\n+ Response 200\n\n+ Request B\n";
        let (action, _, warnings) = parse_action(source);
        assert_eq!(shape(&action.node), vec![(1, 1), (1, 0)]);
        assert_eq!(warnings, vec![WarningCode::EmptyDefinition]);
    }

    #[test]
    fn described_action_without_response_warns() {
        let (_, _, warnings) = parse_action("# GET\n\nLists notes.\n");
        assert_eq!(warnings, vec![WarningCode::EmptyDefinition]);
    }

    #[test]
    fn duplicate_response_is_kept() {
        let source = "# GET\n\n+ Response 200\n\n+ Response 200\n";
        let (action, _, warnings) = parse_action(source);
        assert_eq!(shape(&action.node), vec![(0, 2)]);
        assert_eq!(warnings, vec![WarningCode::Duplicate]);
    }

    #[test]
    fn second_relation_replaces_the_first() {
        let source = "# GET /notes\n\n+ Relation: list\n+ Relation: all\n+ Response 200\n";
        let (action, _, warnings) = parse_action(source);
        assert_eq!(action.node.relation.identifier, "all");
        assert_eq!(shape(&action.node), vec![(0, 1)]);
        assert_eq!(warnings, vec![WarningCode::Duplicate]);
    }

    #[test]
    fn forbidden_bodies() {
        let source = "# HEAD\n\n+ Response 200\n\n        body\n\n+ Response 204\n\n        body\n";
        let (_, _, warnings) = parse_action(source);
        assert_eq!(
            warnings,
            vec![WarningCode::EmptyDefinition, WarningCode::EmptyDefinition]
        );
    }

    #[test]
    fn connect_2xx_body() {
        let source = "# CONNECT\n\n+ Response 200\n\n        body\n\n+ Response 404\n\n        body\n";
        let (_, _, warnings) = parse_action(source);
        assert_eq!(warnings, vec![WarningCode::EmptyDefinition]);
    }

    #[test]
    fn deprecated_headers_are_injected() {
        let source = "# GET\n\n+ Headers\n\n        Accept: text/plain\n\n+ Response 200 (text/plain)\n\n        Hello\n";
        let (action, _, warnings) = parse_action(source);

        let response = &action.node.examples[0].responses[0];
        assert_eq!(
            response.headers,
            vec![
                Header::new("Accept", "text/plain"),
                Header::new("Content-Type", "text/plain")
            ]
        );
        assert_eq!(warnings, vec![WarningCode::Deprecated]);
    }

    #[test]
    fn dangling_body_joins_the_last_response() {
        let source = "# GET\n\n+ Response 200\n\nHello\n";
        let (action, _, warnings) = parse_action(source);
        assert_eq!(action.node.examples[0].responses[0].body, "Hello\n");
        assert_eq!(warnings, vec![WarningCode::Indentation]);
    }

    #[test]
    fn own_uri_parameters_are_checked() {
        let source = "# GET /orders{?abc}\n\n+ Parameters\n    + ab (string)\n\n+ Response 200\n";
        let (_, _, warnings) = parse_action(source);
        assert_eq!(warnings, vec![WarningCode::LogicalError]);
    }

    #[test]
    fn next_action_ends_this_one() {
        let source = "# GET\n\n+ Response 200\n\n# POST\n\n+ Response 201\n";
        let (action, next, _) = parse_action(source);
        assert_eq!(action.node.method, "GET");
        assert_eq!(next, 2);
    }
}
