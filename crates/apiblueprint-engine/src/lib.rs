//! # apiblueprint-engine
//!
//! Parses API Blueprint documents into a typed [`Blueprint`] tree, a
//! structurally parallel [`BlueprintSourceMap`] and a [`Report`] of
//! diagnostics.
//!
//! The document is first tokenized into a block tree by
//! [`apiblueprint_markdown`]. Every entity is then read by the same
//! recursive-descent loop ([`parsing::parse_section`]) specialised by one of
//! the [`processors`]: a signature, description blocks, leading content,
//! nested sections, and a finalize step for cross-field checks. Which section
//! a node opens is decided by [`parsing::classify`] from the node and its
//! enclosing section alone.
//!
//! ```
//! use apiblueprint_engine::{parse, ParseOptions};
//!
//! let result = parse("# GET /message\n+ Response 200 (text/plain)\n\n        Hello\n", ParseOptions::default());
//! let action = &result.blueprint.resource_groups[0].resources[0].actions[0];
//! assert_eq!(action.method, "GET");
//! assert_eq!(action.examples[0].responses[0].body, "Hello\n");
//! assert!(result.report.is_clean());
//! ```

pub mod ast;
pub mod attributes;
pub mod error;
pub mod http;
pub mod models;
pub mod options;
pub mod parsing;
pub mod processors;
pub mod render;
pub mod report;
pub mod source_map;
pub mod uri_template;

use apiblueprint_markdown::{Node, tokenize};
use serde::Serialize;

pub use ast::*;
pub use attributes::{AttributesResolver, RawAttributes};
pub use options::ParseOptions;
pub use report::{Annotation, ErrorCode, Report, Warning, WarningCode};
pub use source_map::*;

use parsing::{ParserData, SectionLayout, SectionProcessor, SectionType, parse_section};
use processors::{BlueprintProcessor, Parsed};

/// Everything a parse produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub blueprint: Blueprint,
    /// Empty unless [`ParseOptions::export_source_map`] is set.
    pub source_map: BlueprintSourceMap,
    pub report: Report,
}

/// A single section parsed on its own, see [`parse_fragment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment<T> {
    pub output: T,
    /// Top-level nodes of the fragment consumed by the section.
    pub consumed: usize,
    pub report: Report,
}

/// Parses a whole document with the default attributes resolver.
pub fn parse(source: &str, options: ParseOptions) -> ParseResult {
    parse_with_resolver(source, options, &RawAttributes)
}

/// Parses a whole document, handing `Attributes` sections to `resolver`.
pub fn parse_with_resolver(
    source: &str,
    options: ParseOptions,
    resolver: &dyn AttributesResolver,
) -> ParseResult {
    let root = tokenize(source);
    let mut pd = ParserData::new(source, options, resolver);
    let (parsed, _) = parse_section::<BlueprintProcessor>(
        SectionType::Blueprint,
        std::slice::from_ref(&root),
        0,
        &mut pd,
    );
    let Parsed {
        node: mut blueprint,
        source_map,
    } = parsed;

    if options.render_descriptions {
        render::render_descriptions(&mut blueprint);
    }
    log::debug!(
        "parsed blueprint '{}': {} group(s), {} warning(s), error: {}",
        blueprint.name,
        blueprint.resource_groups.len(),
        pd.report.warnings.len(),
        pd.report.has_error()
    );

    ParseResult {
        blueprint,
        source_map: if options.export_source_map {
            source_map
        } else {
            BlueprintSourceMap::default()
        },
        report: pd.report,
    }
}

/// Parses `source` as one section of type `section` using processor `P`.
///
/// Fragment outputs always carry their source maps.
pub fn parse_fragment<P: SectionProcessor>(
    source: &str,
    section: SectionType,
    options: ParseOptions,
) -> Fragment<P::Output> {
    let root = tokenize(source);
    let mut pd = ParserData::new(source, options, &RawAttributes);
    let nodes: &[Node] = match P::LAYOUT {
        SectionLayout::Document => std::slice::from_ref(&root),
        SectionLayout::Header | SectionLayout::ListItem => &root.children,
    };
    let (output, next) = parse_section::<P>(section, nodes, 0, &mut pd);
    let consumed = match P::LAYOUT {
        SectionLayout::Document => root.children.len(),
        SectionLayout::Header | SectionLayout::ListItem => next.min(root.children.len()),
    };
    Fragment {
        output,
        consumed,
        report: pd.report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::ActionProcessor;
    use pretty_assertions::assert_eq;

    #[test]
    fn source_map_is_dropped_unless_requested() {
        let source = "# API\n\n# GET /a\n\n+ Response 200\n";

        let plain = parse(source, ParseOptions::default());
        assert_eq!(plain.source_map, BlueprintSourceMap::default());

        let mapped = parse(source, ParseOptions::default().with_source_map());
        assert_eq!(mapped.source_map.name.text(source), "# API\n");
        assert_eq!(mapped.blueprint, plain.blueprint);
    }

    #[test]
    fn descriptions_are_rendered_on_request() {
        let source = "# API\n\nSome *emphasis*.\n";
        let result = parse(source, ParseOptions::default().rendering_descriptions());
        assert_eq!(
            result.blueprint.description,
            "<p>Some <em>emphasis</em>.</p>\n"
        );
    }

    #[test]
    fn bare_action_fragment() {
        let fragment = parse_fragment::<ActionProcessor>("# GET\n", SectionType::Action, ParseOptions::default());
        assert_eq!(fragment.output.node.method, "GET");
        assert_eq!(fragment.consumed, 1);
        assert!(fragment.report.is_clean());
    }
}
