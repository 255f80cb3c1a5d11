//! Requests, responses and resource models.
//!
//! A full payload nests `Headers`, `Body`, `Schema`, `Attributes` and
//! `Parameters` sections under its signature. An abbreviated payload has
//! none of them and its content is the message body itself:
//!
//! ```text
//! + Response 200 (application/json)
//!
//!         { "id": 1 }
//! ```
//!
//! Either form may instead hold a `[Name][]` reference to a resource model,
//! resolved once the whole document has been read.

use apiblueprint_markdown::{Node, NodeKind, SourceRanges};

use crate::ast::{Header, Payload, Reference};
use crate::http::CONTENT_TYPE;
use crate::parsing::driver::{append_description, check_relative_uri};
use crate::parsing::signature::{model_reference, payload_signature};
use crate::parsing::{
    Context, ParserData, SectionLayout, SectionProcessor, SectionType, Signature, classify,
    parse_section,
};
use crate::processors::asset::{code_block_content, signature_remainder};
use crate::processors::headers::append_headers;
use crate::processors::parameters::merge_parameters;
use crate::processors::{
    AssetProcessor, AttributesProcessor, HeadersProcessor, Parsed, ParametersProcessor,
};
use crate::report::WarningCode;
use crate::source_map::PayloadSourceMap;

pub type ParsedPayload = Parsed<Payload, PayloadSourceMap>;

/// Indentation level of an abbreviated payload's message body.
const BODY_LEVEL: usize = 2;
/// Indentation level of a nested `Body` or `Schema` asset.
const ASSET_LEVEL: usize = 3;

fn expected_signature(section: SectionType) -> &'static str {
    if section.is_request() {
        "'request [<identifier>] [(<media type>)]'"
    } else if section.is_response() {
        "'response [<HTTP status code>] [(<media type>)]'"
    } else {
        "'model [(<media type>)]'"
    }
}

pub struct PayloadProcessor;

impl PayloadProcessor {
    /// Takes a `[Name][]` paragraph as the payload's model reference.
    fn take_reference(section: SectionType, node: &Node, out: &mut ParsedPayload) -> bool {
        if section.is_model() || !node.is(NodeKind::Paragraph) || out.node.reference.is_some() {
            return false;
        }
        let Some(id) = model_reference(&node.text) else {
            return false;
        };
        out.node.reference = Some(Reference { id: id.to_string() });
        out.source_map.reference = node.ranges.clone();
        true
    }

    fn append_body(text: &str, ranges: &SourceRanges, out: &mut ParsedPayload) {
        out.node.body.push_str(text);
        out.source_map.body.extend(ranges);
    }

    /// Keeps the first `Body` or `Schema` asset, warning about later ones.
    fn set_asset(
        nested: SectionType,
        asset: Parsed<String, SourceRanges>,
        node: &Node,
        pd: &mut ParserData<'_>,
        out: &mut ParsedPayload,
    ) {
        let (value, ranges) = if nested == SectionType::Schema {
            (&mut out.node.schema, &mut out.source_map.schema)
        } else {
            (&mut out.node.body, &mut out.source_map.body)
        };
        if !value.is_empty() {
            pd.warn(
                WarningCode::Redefinition,
                format!(
                    "ignoring additional '{}' content, it is already defined",
                    nested.name()
                ),
                &node.ranges,
            );
            return;
        }
        *value = asset.node;
        *ranges = asset.source_map;
    }
}

impl SectionProcessor for PayloadProcessor {
    const LAYOUT: SectionLayout = SectionLayout::ListItem;
    type Builder = ParsedPayload;
    type Output = ParsedPayload;

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
        let ranges = item.signature_ranges();
        let signature = payload_signature(section, item.first_line());

        if signature.well_formed {
            if !signature.name.is_empty() {
                out.node.name = signature.name;
                out.source_map.name = ranges.clone();
            }
            if !signature.media_type.is_empty() {
                out.node
                    .headers
                    .push(Header::new(CONTENT_TYPE, signature.media_type));
                out.source_map.headers.push(ranges.clone());
            }
        } else {
            pd.warn(
                WarningCode::Formatting,
                format!(
                    "unable to parse {} signature, expected {}",
                    section.name(),
                    expected_signature(section)
                ),
                ranges,
            );
        }

        if section.is_response() && out.node.name.is_empty() {
            pd.warn(
                WarningCode::EmptyDefinition,
                "missing response HTTP status code, assuming 'Response 200'",
                ranges,
            );
            out.node.name = "200".to_string();
        }

        if let Some((text, rest)) = signature_remainder(item, pd) {
            if section.is_abbreviated_payload() {
                pd.warn(
                    WarningCode::Indentation,
                    format!(
                        "message-body is expected to be a pre-formatted code block, separate it by a newline and indent every of its line by {} spaces or {BODY_LEVEL} tabs",
                        BODY_LEVEL * 4
                    ),
                    &rest,
                );
                Self::append_body(&text, &rest, out);
            } else {
                append_description(&mut out.node.description, &text);
                out.source_map.description.extend(&rest);
            }
        }

        Signature::Continue(item.content_start())
    }

    fn description(out: &mut Self::Builder) -> Option<(&mut String, &mut SourceRanges)> {
        Some((&mut out.node.description, &mut out.source_map.description))
    }

    fn is_description_node(node: &Node, section: SectionType) -> bool {
        !section.is_abbreviated_payload()
            && classify(node, Context::within(section)) == SectionType::Undefined
    }

    fn process_description(
        section: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> usize {
        let Some(node) = nodes.get(at) else {
            return at + 1;
        };
        if !Self::take_reference(section, node, out) {
            check_relative_uri(node, pd);
            let text = pd.text(&node.ranges);
            append_description(&mut out.node.description, &text);
            out.source_map.description.extend(&node.ranges);
        }
        at + 1
    }

    fn is_content_node(node: &Node, section: SectionType) -> bool {
        section.is_abbreviated_payload()
            && classify(node, Context::within(section)) == SectionType::Undefined
    }

    fn process_content(
        section: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> usize {
        let Some(node) = nodes.get(at) else {
            return at + 1;
        };
        if !Self::take_reference(section, node, out) {
            let (text, ranges) = code_block_content(node, "message-body", BODY_LEVEL, pd);
            Self::append_body(&text, &ranges, out);
        }
        at + 1
    }

    fn nested_section_types() -> &'static [SectionType] {
        &[
            SectionType::Headers,
            SectionType::Body,
            SectionType::Schema,
            SectionType::Attributes,
            SectionType::Parameters,
        ]
    }

    fn process_nested_section(
        nested: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> usize {
        match nested {
            SectionType::Headers => {
                let (headers, next) = parse_section::<HeadersProcessor>(nested, nodes, at, pd);
                append_headers(
                    &mut out.node.headers,
                    &mut out.source_map.headers,
                    headers,
                    pd,
                );
                next
            }
            SectionType::Body | SectionType::Schema => {
                let (asset, next) = parse_section::<AssetProcessor>(nested, nodes, at, pd);
                if let Some(node) = nodes.get(at) {
                    Self::set_asset(nested, asset, node, pd, out);
                }
                next
            }
            SectionType::Attributes => {
                let (attributes, next) =
                    parse_section::<AttributesProcessor>(nested, nodes, at, pd);
                out.node.attributes = Some(attributes.node);
                out.source_map.attributes = attributes.source_map;
                next
            }
            SectionType::Parameters => {
                let (parameters, next) =
                    parse_section::<ParametersProcessor>(nested, nodes, at, pd);
                merge_parameters(
                    &mut out.node.parameters,
                    &mut out.source_map.parameters,
                    parameters,
                    pd,
                );
                next
            }
            _ => at,
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
        let dangling = matches!(node.kind, NodeKind::Code | NodeKind::Paragraph)
            && matches!(last, SectionType::Body | SectionType::Schema);
        if !dangling {
            crate::parsing::driver::warn_unexpected(node, pd);
            return at + 1;
        }

        let what = format!("'{}'", last.name());
        pd.warn(
            WarningCode::Indentation,
            format!(
                "dangling {what} asset, expected a pre-formatted code block, indent every of its line by {} spaces or {ASSET_LEVEL} tabs",
                ASSET_LEVEL * 4
            ),
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
        if last == SectionType::Schema {
            out.node.schema.push_str(&text);
            out.source_map.schema.extend(&node.ranges);
        } else {
            Self::append_body(&text, &node.ranges, out);
        }
        at + 1
    }

    fn build(out: Self::Builder) -> Self::Output {
        out
    }
}
