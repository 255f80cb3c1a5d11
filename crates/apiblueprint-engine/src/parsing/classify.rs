//! The section classifier.
//!
//! [`classify`] is a pure function of a node and the enclosing [`Context`]:
//! it never looks at anything but the node itself (and, for list items, the
//! first line of the item and the keywords of its nested items).

use apiblueprint_markdown::{Node, NodeKind};

use crate::parsing::SectionType;
use crate::parsing::signature::{header_signature, list_keyword, parameter_signature};

/// Where a node is being classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    /// Section currently being assembled.
    pub parent: SectionType,
    /// Most recent nested section opened inside `parent`.
    pub last: SectionType,
}

impl Context {
    pub fn new(parent: SectionType, last: SectionType) -> Self {
        Self { parent, last }
    }

    pub fn within(parent: SectionType) -> Self {
        Self::new(parent, SectionType::Undefined)
    }
}

/// Nested sections that turn a payload into its full (non-abbreviated) form.
const PAYLOAD_NESTED: [SectionType; 5] = [
    SectionType::Headers,
    SectionType::Body,
    SectionType::Schema,
    SectionType::Attributes,
    SectionType::Parameters,
];

/// List item sections a parent section accepts.
pub fn accepted_list_sections(parent: SectionType) -> &'static [SectionType] {
    match parent {
        SectionType::Resource => &[
            SectionType::Parameters,
            SectionType::Headers,
            SectionType::Model,
            SectionType::ModelBody,
            SectionType::Attributes,
        ],
        SectionType::Action => &[
            SectionType::Relation,
            SectionType::Parameters,
            SectionType::Headers,
            SectionType::Request,
            SectionType::RequestBody,
            SectionType::Response,
            SectionType::ResponseBody,
            SectionType::Attributes,
        ],
        SectionType::Request | SectionType::Response | SectionType::Model => &PAYLOAD_NESTED,
        SectionType::ParameterDefinition => &[SectionType::ParameterValues],
        _ => &[],
    }
}

/// Decides which section `node` begins when met inside `context`.
pub fn classify(node: &Node, context: Context) -> SectionType {
    let section = match node.kind {
        NodeKind::HRule => SectionType::Terminator,
        NodeKind::Header => header_signature(&node.text).section_type(),
        NodeKind::ListItem => classify_list_item(node, context.parent),
        _ => SectionType::Undefined,
    };

    // Content following a terminator at the top level opens an anonymous group.
    if section == SectionType::Undefined
        && context.parent == SectionType::Blueprint
        && context.last == SectionType::Terminator
        && !node.is(NodeKind::ListItem)
    {
        return SectionType::ResourceGroup;
    }

    log::trace!("classified {:?} node as {section} in {}", node.kind, context.parent);
    section
}

fn classify_list_item(node: &Node, parent: SectionType) -> SectionType {
    if parent == SectionType::Parameters {
        return match parameter_signature(node.first_line()) {
            Some(_) => SectionType::ParameterDefinition,
            None => SectionType::Undefined,
        };
    }

    let Some(keyword) = list_keyword(node.first_line()) else {
        return SectionType::Undefined;
    };
    let section = if keyword.is_payload() && is_abbreviated(node) {
        keyword.abbreviated()
    } else {
        keyword
    };

    if accepted_list_sections(parent).contains(&section) {
        section
    } else {
        SectionType::Foreign
    }
}

/// A payload item is abbreviated when none of its nested items opens one of
/// the payload's own sections.
fn is_abbreviated(node: &Node) -> bool {
    !node.children[node.content_start()..].iter().any(|child| {
        child.is(NodeKind::ListItem)
            && list_keyword(child.first_line()).is_some_and(|k| PAYLOAD_NESTED.contains(&k))
    })
}
