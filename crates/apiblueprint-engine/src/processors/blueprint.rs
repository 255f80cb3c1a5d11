//! The document section: metadata, API name, overview and resource groups.
//!
//! Once every group is read, `[Name][]` model references are resolved
//! against the models collected along the way.

use apiblueprint_markdown::{Node, NodeKind, SourceRanges};

use crate::ast::{Blueprint, Header, Metadata, Payload};
use crate::parsing::driver::{append_description, check_relative_uri, warn_unexpected};
use crate::parsing::signature::metadata_line;
use crate::parsing::{
    Context, ParserData, SectionLayout, SectionProcessor, SectionType, classify, parse_section,
};
use crate::processors::action::check_response_bodies;
use crate::processors::asset::source_lines;
use crate::processors::resource_group::ParsedResourceGroup;
use crate::processors::{Parsed, ResourceGroupProcessor};
use crate::report::{ErrorCode, WarningCode};
use crate::source_map::{BlueprintSourceMap, PayloadSourceMap};

pub type ParsedBlueprint = Parsed<Blueprint, BlueprintSourceMap>;

const EXPECTED_API_NAME: &str = "expected API name, e.g. '# <API Name>'";

pub struct BlueprintProcessor;

impl BlueprintProcessor {
    /// Reads a paragraph of `key: value` lines. Returns false when no line
    /// looks like metadata.
    fn read_metadata(node: &Node, pd: &mut ParserData<'_>, out: &mut ParsedBlueprint) -> bool {
        let lines: Vec<_> = source_lines(&node.ranges, pd.source)
            .into_iter()
            .filter(|(line, _)| !line.trim().is_empty())
            .collect();
        let parsed: Vec<_> = lines
            .iter()
            .filter_map(|(line, ranges)| {
                metadata_line(line.trim_end()).map(|(key, value)| (key, value, ranges))
            })
            .collect();
        if parsed.is_empty() {
            return false;
        }

        if parsed.len() < lines.len() {
            pd.warn(
                WarningCode::Formatting,
                "ignoring possible metadata, expected '<key> : <value>', one per line",
                &node.ranges,
            );
        }
        for (key, value, ranges) in parsed {
            if out.node.metadata.iter().any(|m| m.key == key) {
                pd.warn(
                    WarningCode::Duplicate,
                    format!("duplicate definition of '{key}'"),
                    ranges,
                );
            }
            out.node.metadata.push(Metadata {
                key: key.to_string(),
                value: value.to_string(),
            });
            out.source_map.metadata.push(ranges.clone());
        }
        true
    }

    fn add_group(
        group: ParsedResourceGroup,
        location: &SourceRanges,
        pd: &mut ParserData<'_>,
        out: &mut ParsedBlueprint,
    ) {
        let name = group.node.name.clone();
        let existing = out
            .node
            .resource_groups
            .iter()
            .position(|g| g.name == name);
        let Some(index) = existing else {
            out.node.resource_groups.push(group.node);
            out.source_map.resource_groups.push(group.source_map);
            return;
        };

        if name.is_empty() {
            pd.warn(
                WarningCode::Duplicate,
                "anonymous group is already defined",
                location,
            );
            out.node.resource_groups.push(group.node);
            out.source_map.resource_groups.push(group.source_map);
            return;
        }

        pd.warn(
            WarningCode::Duplicate,
            format!("group '{name}' is already defined"),
            location,
        );
        let (Some(target), Some(target_map)) = (
            out.node.resource_groups.get_mut(index),
            out.source_map.resource_groups.get_mut(index),
        ) else {
            return;
        };
        if !group.node.description.is_empty() {
            append_description(&mut target.description, &group.node.description);
            target_map.description.extend(&group.source_map.description);
        }
        target.resources.extend(group.node.resources);
        target_map.resources.extend(group.source_map.resources);
    }

    /// Copies the referenced model into a payload. Returns false once the
    /// reference is reported as undefined.
    fn resolve_reference(
        payload: &mut Payload,
        source_map: &mut PayloadSourceMap,
        pd: &mut ParserData<'_>,
    ) -> bool {
        let Some(reference) = &payload.reference else {
            return true;
        };
        let model = match pd.models.resolve(&reference.id) {
            Ok(model) => model.clone(),
            Err(error) => {
                pd.fail(ErrorCode::Symbol, error.to_string(), &source_map.reference);
                return false;
            }
        };

        if !model.payload.description.is_empty() {
            payload.description = model.payload.description;
            source_map.description = model.source_map.description;
        }
        let own_headers: Vec<Header> = std::mem::take(&mut payload.headers);
        let own_maps = std::mem::take(&mut source_map.headers);
        payload.headers = model.payload.headers;
        source_map.headers = model.source_map.headers;
        for (header, ranges) in own_headers.into_iter().zip(own_maps) {
            if !payload
                .headers
                .iter()
                .any(|h| h.key.eq_ignore_ascii_case(&header.key))
            {
                payload.headers.push(header);
                source_map.headers.push(ranges);
            }
        }
        payload.body = model.payload.body;
        source_map.body = model.source_map.body;
        payload.schema = model.payload.schema;
        source_map.schema = model.source_map.schema;
        if model.payload.attributes.is_some() {
            payload.attributes = model.payload.attributes;
            source_map.attributes = model.source_map.attributes;
        }
        true
    }

    /// Resolves every model reference, then re-checks the response bodies the
    /// references brought in.
    fn resolve_references(pd: &mut ParserData<'_>, out: &mut ParsedBlueprint) {
        let groups = out
            .node
            .resource_groups
            .iter_mut()
            .zip(out.source_map.resource_groups.iter_mut());
        for (group, group_map) in groups {
            let resources = group.resources.iter_mut().zip(group_map.resources.iter_mut());
            for (resource, resource_map) in resources {
                let actions = resource.actions.iter_mut().zip(resource_map.actions.iter_mut());
                for (action, action_map) in actions {
                    let examples = action.examples.iter_mut().zip(action_map.examples.iter_mut());
                    for (example, example_map) in examples {
                        let requests = example.requests.iter_mut().zip(example_map.requests.iter_mut());
                        for (request, request_map) in requests {
                            if !Self::resolve_reference(request, request_map, pd) {
                                return;
                            }
                        }

                        let mut resolved = Vec::new();
                        let mut resolved_maps = Vec::new();
                        let responses = example
                            .responses
                            .iter_mut()
                            .zip(example_map.responses.iter_mut());
                        for (response, response_map) in responses {
                            if response.reference.is_none() {
                                continue;
                            }
                            if !Self::resolve_reference(response, response_map, pd) {
                                return;
                            }
                            resolved.push(response.clone());
                            resolved_maps.push(response_map.clone());
                        }
                        check_response_bodies(&action.method, &resolved, &resolved_maps, pd);
                    }
                }
            }
        }
    }
}

impl SectionProcessor for BlueprintProcessor {
    const LAYOUT: SectionLayout = SectionLayout::Document;
    type Builder = ParsedBlueprint;
    type Output = ParsedBlueprint;

    fn description(out: &mut Self::Builder) -> Option<(&mut String, &mut SourceRanges)> {
        Some((&mut out.node.description, &mut out.source_map.description))
    }

    fn is_description_node(node: &Node, section: SectionType) -> bool {
        classify(node, Context::within(section)) == SectionType::Undefined
    }

    fn process_description(
        _section: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> usize {
        let Some(node) = nodes.get(at) else {
            return at + 1;
        };
        let overview_open = out.node.name.is_empty() && out.node.description.is_empty();

        if overview_open && node.is(NodeKind::Paragraph) && Self::read_metadata(node, pd, out) {
            return at + 1;
        }
        if overview_open && node.is(NodeKind::Header) {
            out.node.name = node.text.clone();
            out.source_map.name = node.ranges.clone();
            return at + 1;
        }

        check_relative_uri(node, pd);
        let text = pd.text(&node.ranges);
        append_description(&mut out.node.description, &text);
        out.source_map.description.extend(&node.ranges);
        at + 1
    }

    fn nested_section_types() -> &'static [SectionType] {
        &[SectionType::ResourceGroup, SectionType::Resource]
    }

    fn process_nested_section(
        _nested: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> usize {
        let location = nodes.get(at).map(|n| n.ranges.clone()).unwrap_or_default();
        let (group, next) =
            parse_section::<ResourceGroupProcessor>(SectionType::ResourceGroup, nodes, at, pd);
        Self::add_group(group, &location, pd, out);
        next
    }

    fn is_unexpected_node(_node: &Node, _classified: SectionType) -> bool {
        true
    }

    fn process_unexpected_node(
        _section: SectionType,
        nodes: &[Node],
        at: usize,
        _last: SectionType,
        pd: &mut ParserData<'_>,
        _out: &mut Self::Builder,
    ) -> usize {
        if let Some(node) = nodes.get(at).filter(|node| !node.is(NodeKind::HRule)) {
            warn_unexpected(node, pd);
        }
        at + 1
    }

    fn finalize(
        _section: SectionType,
        signature: &Node,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) {
        Self::resolve_references(pd, out);
        if pd.report.has_error() || !out.node.name.is_empty() {
            return;
        }

        let location = signature
            .children
            .first()
            .map(|node| node.ranges.clone())
            .unwrap_or_default();
        if pd.options.require_blueprint_name {
            pd.fail(ErrorCode::Business, EXPECTED_API_NAME, &location);
        } else if !out.node.description.is_empty() {
            pd.warn(WarningCode::ApiName, EXPECTED_API_NAME, &location);
        }
    }

    fn build(out: Self::Builder) -> Self::Output {
        out
    }
}
