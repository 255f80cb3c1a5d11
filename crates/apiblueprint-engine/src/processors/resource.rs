//! Resources: `URI`, `Name [URI]`, or an endpoint header (`METHOD URI`,
//! `Name [METHOD URI]`) whose single action is read from the same header.

use apiblueprint_markdown::{Node, NodeKind, SourceRanges};

use crate::ast::{Action, Resource};
use crate::error::SymbolError;
use crate::models::Model;
use crate::parsing::driver::warn_unexpected;
use crate::parsing::signature::{HeaderSignature, header_signature};
use crate::parsing::{
    ParserData, SectionLayout, SectionProcessor, SectionType, Signature, parse_section,
};
use crate::processors::action::ParsedAction;
use crate::processors::headers::{DEPRECATED_HEADERS, ParsedHeaders, append_headers, inject_headers};
use crate::processors::parameters::{check_parameters_in_uri, merge_parameters};
use crate::processors::payload::ParsedPayload;
use crate::processors::{
    ActionProcessor, AttributesProcessor, HeadersProcessor, Parsed, ParametersProcessor,
    PayloadProcessor,
};
use crate::report::{ErrorCode, WarningCode};
use crate::source_map::ResourceSourceMap;
use crate::uri_template;

pub type ParsedResource = Parsed<Resource, ResourceSourceMap>;

#[derive(Debug, Default)]
pub struct ResourceBuilder {
    resource: ParsedResource,
    /// Deprecated resource level headers, injected into every action.
    headers: ParsedHeaders,
}

pub struct ResourceProcessor;

impl ResourceProcessor {
    /// Records the resource, warning when its URI (or endpoint) was seen before.
    fn register(key: String, uri: &str, location: &SourceRanges, pd: &mut ParserData<'_>) {
        if !pd.resource_uris.insert(key) {
            pd.warn(
                WarningCode::Duplicate,
                format!("the resource '{uri}' is already defined"),
                location,
            );
        }
    }

    fn add_action(
        action: ParsedAction,
        location: &SourceRanges,
        pd: &mut ParserData<'_>,
        out: &mut ParsedResource,
    ) {
        let uri = &out.node.uri_template;
        let same_endpoint = |existing: &Action| {
            existing.method == action.node.method
                && existing.uri_template == action.node.uri_template
        };
        if out.node.actions.iter().any(same_endpoint) {
            pd.warn(
                WarningCode::Duplicate,
                format!(
                    "action with method '{}' already defined for resource '{uri}'",
                    action.node.method
                ),
                location,
            );
        }

        let relation = &action.node.relation.identifier;
        if !relation.is_empty()
            && out
                .node
                .actions
                .iter()
                .any(|existing| existing.relation.identifier == *relation)
        {
            pd.warn(
                WarningCode::Duplicate,
                format!("relation identifier '{relation}' already defined for resource '{uri}'"),
                location,
            );
        }

        out.node.actions.push(action.node);
        out.source_map.actions.push(action.source_map);
    }

    fn set_model(
        mut model: ParsedPayload,
        location: &SourceRanges,
        pd: &mut ParserData<'_>,
        out: &mut ParsedResource,
    ) {
        let resource = &out.node;
        if model.node.name.is_empty() {
            if resource.name.is_empty() {
                let error = SymbolError::AnonymousModel(resource.uri_template.clone());
                pd.fail(ErrorCode::Model, error.to_string(), location);
                return;
            }
            model.node.name = resource.name.clone();
            model.source_map.name = out.source_map.name.clone();
        }

        let entry = Model {
            payload: model.node.clone(),
            source_map: model.source_map.clone(),
        };
        match &resource.model {
            Some(previous) => {
                pd.warn(
                    WarningCode::Duplicate,
                    format!(
                        "overshadowing previous model definition for '{}({})' resource, a resource can be represented by a single model only",
                        resource.name, resource.uri_template
                    ),
                    location,
                );
                if previous.name == model.node.name {
                    pd.models.update(&model.node.name, entry);
                } else if let Err(error) = pd.models.define(&model.node.name, entry) {
                    pd.fail(ErrorCode::Model, error.to_string(), location);
                }
            }
            None => {
                if let Err(error) = pd.models.define(&model.node.name, entry) {
                    pd.fail(ErrorCode::Model, error.to_string(), location);
                }
            }
        }

        out.node.model = Some(model.node);
        out.source_map.model = Some(model.source_map);
    }
}

impl SectionProcessor for ResourceProcessor {
    const LAYOUT: SectionLayout = SectionLayout::Header;
    type Builder = ResourceBuilder;
    type Output = ParsedResource;

    fn process_signature(
        _section: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> Signature {
        let Some(node) = nodes.get(at) else {
            return Signature::Redirect(at);
        };
        let resource = &mut out.resource;

        match header_signature(&node.text) {
            HeaderSignature::Resource { name, uri } => {
                if !name.is_empty() {
                    resource.node.name = name.to_string();
                    resource.source_map.name = node.ranges.clone();
                }
                resource.node.uri_template = uri.to_string();
                resource.source_map.uri_template = node.ranges.clone();
                Self::register(uri.to_string(), uri, &node.ranges, pd);
                Signature::Continue(at + 1)
            }
            HeaderSignature::Endpoint { name, method, uri } => {
                if !name.is_empty() {
                    resource.node.name = name.to_string();
                    resource.source_map.name = node.ranges.clone();
                }
                resource.node.uri_template = uri.to_string();
                resource.source_map.uri_template = node.ranges.clone();
                Self::register(format!("{method} {uri}"), uri, &node.ranges, pd);

                let (action, next) =
                    parse_section::<ActionProcessor>(SectionType::Action, nodes, at, pd);
                resource.node.actions.push(action.node);
                resource.source_map.actions.push(action.source_map);
                Signature::Redirect(next)
            }
            _ => Signature::Continue(at + 1),
        }
    }

    fn description(out: &mut Self::Builder) -> Option<(&mut String, &mut SourceRanges)> {
        Some((
            &mut out.resource.node.description,
            &mut out.resource.source_map.description,
        ))
    }

    fn nested_section_types() -> &'static [SectionType] {
        &[
            SectionType::Parameters,
            SectionType::Headers,
            SectionType::Model,
            SectionType::ModelBody,
            SectionType::Attributes,
            SectionType::Action,
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
        let resource = &mut out.resource;

        match nested {
            SectionType::Action => {
                let (action, next) = parse_section::<ActionProcessor>(nested, nodes, at, pd);
                Self::add_action(action, &location, pd, resource);
                next
            }
            SectionType::Parameters => {
                let (parameters, next) =
                    parse_section::<ParametersProcessor>(nested, nodes, at, pd);
                merge_parameters(
                    &mut resource.node.parameters,
                    &mut resource.source_map.parameters,
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
                resource.node.attributes = Some(attributes.node);
                resource.source_map.attributes = attributes.source_map;
                next
            }
            _ => {
                let (model, next) = parse_section::<PayloadProcessor>(nested, nodes, at, pd);
                Self::set_model(model, &location, pd, resource);
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
        let dangling = last.is_model() && matches!(node.kind, NodeKind::Code | NodeKind::Paragraph);
        let resource = &mut out.resource;
        match (&mut resource.node.model, &mut resource.source_map.model) {
            (Some(model), Some(model_map)) if dangling => {
                pd.warn(
                    WarningCode::Indentation,
                    "dangling model body asset, expected a pre-formatted code block, indent every of its line by 8 spaces or 2 tabs",
                    &node.ranges,
                );
                let mut text = if node.is(NodeKind::Code) {
                    node.text.clone()
                } else {
                    pd.text(&node.ranges)
                };
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                model.body.push_str(&text);
                model_map.body.extend(&node.ranges);
                pd.models.update(
                    &model.name,
                    Model {
                        payload: model.clone(),
                        source_map: model_map.clone(),
                    },
                );
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
        let resource = &mut out.resource;
        let uri = resource.node.uri_template.clone();

        for message in uri_template::validate(&uri) {
            pd.warn(WarningCode::Uri, message, &signature.ranges);
        }

        check_parameters_in_uri(
            &resource.node.parameters,
            &uri,
            &resource.node.name,
            &signature.ranges,
            pd,
        );

        let actions = resource
            .node
            .actions
            .iter_mut()
            .zip(resource.source_map.actions.iter_mut());
        for (action, action_map) in actions {
            let examples = std::mem::take(&mut action.examples);
            let example_maps = std::mem::take(&mut action_map.examples);
            let (examples, example_maps) = inject_headers(&out.headers, examples, example_maps);
            action.examples = examples;
            action_map.examples = example_maps;

            if action.uri_template.is_empty() {
                check_parameters_in_uri(
                    &action.parameters,
                    &uri,
                    &resource.node.name,
                    &action_map.method,
                    pd,
                );
                action.uri_template = uri.clone();
                action_map.uri_template = resource.source_map.uri_template.clone();
            }
        }
    }

    fn build(out: Self::Builder) -> Self::Output {
        out.resource
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

    struct Outcome {
        resource: ParsedResource,
        next: usize,
        warnings: Vec<WarningCode>,
        error: Option<ErrorCode>,
    }

    fn parse_resource(source: &str) -> Outcome {
        let root = tokenize(source);
        let resolver = RawAttributes;
        let mut pd = ParserData::new(source, ParseOptions::default(), &resolver);
        let (resource, next) =
            parse_section::<ResourceProcessor>(SectionType::Resource, &root.children, 0, &mut pd);
        Outcome {
            resource,
            next,
            warnings: pd.report.warning_codes(),
            error: pd.report.error.map(|e| e.code),
        }
    }

    #[test]
    fn actions_inherit_the_uri() {
        let source = "# Notes [/notes/{id}]\n\nA note.\n\n## GET\n\n+ Response 200\n\n## DELETE\n\n+ Response 204\n";
        let outcome = parse_resource(source);
        let resource = outcome.resource.node;

        assert_eq!(resource.name, "Notes");
        assert_eq!(resource.description, "A note.\n");
        assert_eq!(resource.actions.len(), 2);
        assert!(resource.actions.iter().all(|a| a.uri_template == "/notes/{id}"));
        assert_eq!(outcome.next, 6);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn endpoint_header_holds_one_action() {
        let outcome = parse_resource("# GET /notes\n\n+ Response 200\n\n# POST /notes\n");
        let resource = outcome.resource.node;

        assert_eq!(resource.uri_template, "/notes");
        assert_eq!(resource.actions.len(), 1);
        assert_eq!(resource.actions[0].method, "GET");
        assert_eq!(outcome.next, 2);
    }

    #[test]
    fn complete_action_ends_the_resource() {
        let outcome = parse_resource("# /notes\n\n## GET\n\n+ Response 200\n\n## POST /tasks\n");
        assert_eq!(outcome.resource.node.actions.len(), 1);
        assert_eq!(outcome.next, 3);
    }

    #[test]
    fn duplicate_method_warns() {
        let source = "# /notes\n\n## GET\n\n+ Response 200\n\n## GET\n\n+ Response 200\n";
        let outcome = parse_resource(source);
        assert_eq!(outcome.resource.node.actions.len(), 2);
        assert_eq!(outcome.warnings, vec![WarningCode::Duplicate]);
    }

    #[test]
    fn duplicate_relation_warns() {
        let source = "# /notes\n\n## GET\n\n+ Relation: list\n+ Response 200\n\n## POST\n\n+ Relation: list\n+ Response 201\n";
        let outcome = parse_resource(source);
        assert_eq!(outcome.warnings, vec![WarningCode::Duplicate]);
    }

    #[test]
    fn parameters_outside_the_uri_warn() {
        let source = "# Orders [/orders{?abc}]\n\n+ Parameters\n    + ab (string)\n\n## GET\n\n+ Response 200\n";
        let outcome = parse_resource(source);
        assert_eq!(outcome.warnings, vec![WarningCode::LogicalError]);
    }

    #[test]
    fn invalid_uri_template_warns() {
        let outcome = parse_resource("# /notes/{note-id}\n\n## GET\n\n+ Response 200\n");
        assert_eq!(outcome.warnings, vec![WarningCode::Uri]);
    }

    #[test]
    fn named_model_takes_the_resource_name() {
        let source = "# Note [/notes/{id}]\n\n+ Model (application/json)\n\n        { \"id\": 1 }\n\n## GET\n\n+ Response 200\n\n    [Note][]\n";
        let outcome = parse_resource(source);
        let model = outcome.resource.node.model.expect("model");

        assert_eq!(model.name, "Note");
        assert_eq!(
            model.headers,
            vec![Header::new("Content-Type", "application/json")]
        );
        assert_eq!(model.body, "{ \"id\": 1 }\n");
        assert!(outcome.error.is_none());
    }

    #[test]
    fn anonymous_resource_model_is_an_error() {
        let outcome = parse_resource("# /notes\n\n+ Model\n\n        {}\n");
        assert_eq!(outcome.error, Some(ErrorCode::Model));
    }

    #[test]
    fn second_model_overshadows() {
        let source = "# Note [/note]\n\n+ Model\n\n        {}\n\n+ Model\n\n        []\n";
        let outcome = parse_resource(source);
        assert_eq!(outcome.resource.node.model.map(|m| m.body), Some("[]\n".to_string()));
        assert_eq!(outcome.warnings, vec![WarningCode::Duplicate]);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn resource_headers_reach_every_action() {
        let source = "# /notes\n\n+ Headers\n\n        Accept: text/plain\n\n## GET\n\n+ Response 200\n\n## POST\n\n+ Response 201\n";
        let outcome = parse_resource(source);

        for action in &outcome.resource.node.actions {
            assert_eq!(
                action.examples[0].responses[0].headers,
                vec![Header::new("Accept", "text/plain")]
            );
        }
        assert_eq!(outcome.warnings, vec![WarningCode::Deprecated]);
    }
}
