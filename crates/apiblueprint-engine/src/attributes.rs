//! The Attributes collaborator seam.
//!
//! Attribute descriptions are a data-structure language of their own. The
//! section parser only locates an Attributes section and hands its signature
//! and nested nodes to an [`AttributesResolver`].

use apiblueprint_markdown::Node;

use crate::ast::Attributes;

pub trait AttributesResolver {
    /// Builds the attributes value for one section.
    ///
    /// `type_definition` is the text between the parentheses of the
    /// signature, `content` the nodes nested under it.
    fn resolve(&self, type_definition: &str, content: &[Node], source: &str) -> Attributes;
}

/// Keeps the type definition and the raw source of the nested nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawAttributes;

impl AttributesResolver for RawAttributes {
    fn resolve(&self, type_definition: &str, content: &[Node], source: &str) -> Attributes {
        let mut raw = String::new();
        for node in content {
            raw.push_str(&node.ranges.text(source));
        }
        Attributes {
            type_definition: type_definition.to_string(),
            source: raw,
        }
    }
}
