//! The section parsing driver.
//!
//! Every entity is parsed by the same loop, [`parse_section`], specialised by
//! a [`SectionProcessor`]:
//!
//! 1. **Signature.** The processor reads the opening node and returns the
//!    cursor of the first node after it.
//! 2. **Description.** Nodes that classify as nothing in this context are
//!    folded into the entity's description.
//! 3. **Content.** Processor-specific leading content (payload bodies,
//!    header lines, parameter values).
//! 4. **Nested sections.** Each remaining sibling is classified; accepted
//!    types recurse into another `parse_section`, unexpected nodes are handed
//!    to the processor, anything else ends the section.
//! 5. **Finalize.** Cross-field checks, skipped once an error is recorded.
//!
//! Cursors are plain indices into an immutable sibling slice. A header
//! section's nodes are its signature's siblings; a list item section's nodes
//! are the item's children and the caller resumes after the item. The
//! document section walks the children of the root node.

use std::collections::HashSet;

use apiblueprint_markdown::{Node, NodeKind, SourceRanges};

use crate::attributes::AttributesResolver;
use crate::error::EngineError;
use crate::models::ModelTable;
use crate::options::ParseOptions;
use crate::parsing::signature::relative_uri_warning;
use crate::parsing::{Context, SectionType, classify};
use crate::report::{ErrorCode, Report, WarningCode};

const UNEXPECTED_HEADER: &str = "unexpected header block, expected a group, resource or an action definition, e.g. '# Group <name>', '# <resource name> [<URI>]' or '# <HTTP method> <URI>'";

/// Where a section's nodes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionLayout {
    /// Signature is a header; the section continues over its siblings.
    Header,
    /// Signature is a list item; the section is the item's children.
    ListItem,
    /// The section is the whole document: the children of the root node.
    Document,
}

/// Outcome of signature processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// Continue with description, content and nested sections at the cursor.
    Continue(usize),
    /// The signature already parsed the whole section; resume at the cursor.
    Redirect(usize),
}

/// State shared by every processor during one traversal.
pub struct ParserData<'a> {
    pub source: &'a str,
    pub options: ParseOptions,
    pub report: Report,
    pub models: ModelTable,
    pub resolver: &'a dyn AttributesResolver,
    /// URI templates of every resource parsed so far.
    pub resource_uris: HashSet<String>,
    sections: Vec<SectionType>,
}

impl<'a> ParserData<'a> {
    pub fn new(source: &'a str, options: ParseOptions, resolver: &'a dyn AttributesResolver) -> Self {
        Self {
            source,
            options,
            report: Report::default(),
            models: ModelTable::default(),
            resolver,
            resource_uris: HashSet::new(),
            sections: Vec::new(),
        }
    }

    /// Source text covered by `ranges`.
    pub fn text(&self, ranges: &SourceRanges) -> String {
        ranges.text(self.source)
    }

    pub fn warn(&mut self, code: WarningCode, message: impl Into<String>, location: &SourceRanges) {
        self.report.warn(code, message, location);
    }

    pub fn fail(&mut self, code: ErrorCode, message: impl Into<String>, location: &SourceRanges) {
        self.report.fail(code, message, location);
    }

    /// Section enclosing the one currently being parsed.
    pub fn parent_section(&self) -> SectionType {
        self.sections
            .len()
            .checked_sub(2)
            .and_then(|i| self.sections.get(i))
            .copied()
            .unwrap_or(SectionType::Undefined)
    }

    fn enter(&mut self, section: SectionType) {
        self.sections.push(section);
    }

    fn leave(&mut self) {
        self.sections.pop();
    }
}

/// Per-entity hooks plugged into [`parse_section`].
///
/// Every hook has a default that matches a plain descriptive section, so a
/// processor only overrides what makes its entity special.
pub trait SectionProcessor {
    const LAYOUT: SectionLayout;

    /// Accumulator threaded through the hooks.
    type Builder: Default;
    /// Finished entity.
    type Output;

    fn process_signature(
        _section: SectionType,
        nodes: &[Node],
        at: usize,
        _pd: &mut ParserData<'_>,
        _out: &mut Self::Builder,
    ) -> Signature {
        match Self::LAYOUT {
            SectionLayout::Header => Signature::Continue(at + 1),
            SectionLayout::ListItem => {
                Signature::Continue(nodes.get(at).map_or(0, Node::content_start))
            }
            SectionLayout::Document => Signature::Continue(0),
        }
    }

    /// Description text and source map of the entity, if it has one.
    fn description(_out: &mut Self::Builder) -> Option<(&mut String, &mut SourceRanges)> {
        None
    }

    fn is_description_node(node: &Node, section: SectionType) -> bool {
        !Self::is_content_node(node, section)
            && classify(node, Context::within(section)) == SectionType::Undefined
    }

    fn process_description(
        _section: SectionType,
        nodes: &[Node],
        at: usize,
        pd: &mut ParserData<'_>,
        out: &mut Self::Builder,
    ) -> usize {
        if let Some(node) = nodes.get(at) {
            check_relative_uri(node, pd);
            let text = pd.text(&node.ranges);
            if let Some((description, ranges)) = Self::description(out) {
                append_description(description, &text);
                ranges.extend(&node.ranges);
            }
        }
        at + 1
    }

    fn is_content_node(_node: &Node, _section: SectionType) -> bool {
        false
    }

    fn process_content(
        _section: SectionType,
        _nodes: &[Node],
        at: usize,
        _pd: &mut ParserData<'_>,
        _out: &mut Self::Builder,
    ) -> usize {
        at + 1
    }

    /// Section types dispatched to [`SectionProcessor::process_nested_section`].
    fn nested_section_types() -> &'static [SectionType] {
        &[]
    }

    fn process_nested_section(
        _nested: SectionType,
        _nodes: &[Node],
        at: usize,
        _pd: &mut ParserData<'_>,
        _out: &mut Self::Builder,
    ) -> usize {
        at
    }

    /// Whether a node that is not a nested section is absorbed by this
    /// section rather than ending it.
    fn is_unexpected_node(_node: &Node, classified: SectionType) -> bool {
        matches!(classified, SectionType::Undefined | SectionType::Foreign)
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
            warn_unexpected(node, pd);
        }
        at + 1
    }

    fn finalize(
        _section: SectionType,
        _signature: &Node,
        _pd: &mut ParserData<'_>,
        _out: &mut Self::Builder,
    ) {
    }

    fn build(out: Self::Builder) -> Self::Output;
}

/// Parses the section of type `section` starting at `nodes[at]`.
///
/// Returns the entity together with the cursor of the first sibling that was
/// not consumed. The returned cursor is never before `at`. Machinery failures
/// are recorded as an application error; the partially built entity is still
/// returned.
pub fn parse_section<P: SectionProcessor>(
    section: SectionType,
    nodes: &[Node],
    at: usize,
    pd: &mut ParserData<'_>,
) -> (P::Output, usize) {
    let mut out = P::Builder::default();
    let next = match run::<P>(section, nodes, at, pd, &mut out) {
        Ok(next) => next.max(at),
        Err(err) => {
            let location = nodes
                .get(at)
                .map(|node| node.ranges.clone())
                .unwrap_or_default();
            pd.fail(ErrorCode::Application, err.to_string(), &location);
            nodes.len().max(at)
        }
    };
    (P::build(out), next)
}

fn run<P: SectionProcessor>(
    section: SectionType,
    nodes: &[Node],
    at: usize,
    pd: &mut ParserData<'_>,
    out: &mut P::Builder,
) -> Result<usize, EngineError> {
    let seed = nodes.get(at).ok_or(EngineError::CursorOutOfBounds {
        at,
        len: nodes.len(),
    })?;

    let inner: &[Node] = match P::LAYOUT {
        SectionLayout::Header => nodes,
        SectionLayout::ListItem if seed.is(NodeKind::ListItem) => &seed.children,
        SectionLayout::ListItem => {
            return Err(EngineError::ExpectedListItem {
                section,
                found: seed.kind,
            });
        }
        SectionLayout::Document if seed.is(NodeKind::Root) => &seed.children,
        SectionLayout::Document => {
            return Err(EngineError::ExpectedRoot {
                section,
                found: seed.kind,
            });
        }
    };

    log::debug!(
        "parsing {section} section at byte {}",
        seed.ranges.first().map_or(0, |r| r.start)
    );

    pd.enter(section);
    let cursor = walk::<P>(section, nodes, at, inner, seed, pd, out);
    pd.leave();

    Ok(match P::LAYOUT {
        SectionLayout::Header => cursor,
        SectionLayout::ListItem | SectionLayout::Document => at + 1,
    })
}

fn walk<P: SectionProcessor>(
    section: SectionType,
    nodes: &[Node],
    at: usize,
    inner: &[Node],
    seed: &Node,
    pd: &mut ParserData<'_>,
    out: &mut P::Builder,
) -> usize {
    let mut cur = match P::process_signature(section, nodes, at, pd, out) {
        Signature::Continue(cur) => cur,
        Signature::Redirect(next) => {
            if !pd.report.has_error() {
                P::finalize(section, seed, pd, out);
            }
            return next;
        }
    };

    while let Some(node) = inner.get(cur) {
        if pd.report.has_error() || !P::is_description_node(node, section) {
            break;
        }
        let next = P::process_description(section, inner, cur, pd, out);
        if next <= cur {
            break;
        }
        cur = next;
    }

    while let Some(node) = inner.get(cur) {
        if pd.report.has_error() || !P::is_content_node(node, section) {
            break;
        }
        let next = P::process_content(section, inner, cur, pd, out);
        if next <= cur {
            break;
        }
        cur = next;
    }

    let mut last = SectionType::Undefined;
    while let Some(node) = inner.get(cur) {
        if pd.report.has_error() {
            break;
        }
        let classified = classify(node, Context::new(section, last));
        let next = if P::nested_section_types().contains(&classified) {
            P::process_nested_section(classified, inner, cur, pd, out)
        } else if P::is_unexpected_node(node, classified) {
            P::process_unexpected_node(section, inner, cur, last, pd, out)
        } else {
            break;
        };
        if next <= cur {
            break;
        }
        if classified != SectionType::Undefined {
            last = classified;
        }
        cur = next;
    }

    if !pd.report.has_error() {
        P::finalize(section, seed, pd, out);
    }
    cur
}

/// Appends a block's source text, keeping blocks separated by a blank line.
pub fn append_description(description: &mut String, text: &str) {
    if !description.is_empty() && !description.ends_with("\n\n") {
        description.push('\n');
        if !description.ends_with("\n\n") {
            description.push('\n');
        }
    }
    description.push_str(text);
}

/// Warns about a `Name [METHOD path]` header missing its leading slash.
pub fn check_relative_uri(node: &Node, pd: &mut ParserData<'_>) {
    if node.is(NodeKind::Header) {
        if let Some(message) = relative_uri_warning(&node.text) {
            pd.warn(WarningCode::Uri, message, &node.ranges);
        }
    }
}

/// Reports a node the current section does not know what to do with.
pub fn warn_unexpected(node: &Node, pd: &mut ParserData<'_>) {
    let message = match node.kind {
        NodeKind::Header => {
            check_relative_uri(node, pd);
            UNEXPECTED_HEADER
        }
        NodeKind::ListItem => "ignoring unrecognized list item",
        _ => "ignoring unrecognized block",
    };
    pd.warn(WarningCode::Ignoring, message, &node.ranges);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::RawAttributes;
    use apiblueprint_markdown::tokenize;
    use pretty_assertions::assert_eq;

    /// Collects its description and counts nested list items.
    struct Outline;

    #[derive(Default)]
    struct OutlineBuilder {
        description: String,
        ranges: SourceRanges,
        nested: usize,
        finalized: bool,
    }

    impl SectionProcessor for Outline {
        const LAYOUT: SectionLayout = SectionLayout::Header;
        type Builder = OutlineBuilder;
        type Output = OutlineBuilder;

        fn description(out: &mut OutlineBuilder) -> Option<(&mut String, &mut SourceRanges)> {
            Some((&mut out.description, &mut out.ranges))
        }

        fn nested_section_types() -> &'static [SectionType] {
            &[SectionType::ResponseBody]
        }

        fn process_nested_section(
            _nested: SectionType,
            _nodes: &[Node],
            at: usize,
            _pd: &mut ParserData<'_>,
            out: &mut OutlineBuilder,
        ) -> usize {
            out.nested += 1;
            at + 1
        }

        fn finalize(
            _section: SectionType,
            _signature: &Node,
            _pd: &mut ParserData<'_>,
            out: &mut OutlineBuilder,
        ) {
            out.finalized = true;
        }

        fn build(out: OutlineBuilder) -> OutlineBuilder {
            out
        }
    }

    #[test]
    fn description_then_nested_then_stop() {
        let source = "# GET\n\nFirst.\n\nSecond.\n\n+ Response 200\n+ Response 201\n\n# GET\n";
        let root = tokenize(source);
        let resolver = RawAttributes;
        let mut pd = ParserData::new(source, ParseOptions::default(), &resolver);

        let (out, next) = parse_section::<Outline>(SectionType::Action, &root.children, 0, &mut pd);

        assert_eq!(out.description, "First.\n\nSecond.\n");
        assert_eq!(out.nested, 2);
        assert!(out.finalized);
        assert_eq!(next, 5);
        assert!(pd.report.is_clean());
    }

    #[test]
    fn out_of_bounds_cursor_is_an_application_error() {
        let resolver = RawAttributes;
        let mut pd = ParserData::new("", ParseOptions::default(), &resolver);

        let (out, next) = parse_section::<Outline>(SectionType::Action, &[], 3, &mut pd);

        assert!(!out.finalized);
        assert_eq!(next, 3);
        assert_eq!(pd.report.error.map(|e| e.code), Some(ErrorCode::Application));
    }

    #[test]
    fn unexpected_nodes_are_reported_and_skipped() {
        let source = "# GET\n\n+ Response 200\n\nstray\n\n+ Response 201\n";
        let root = tokenize(source);
        let resolver = RawAttributes;
        let mut pd = ParserData::new(source, ParseOptions::default(), &resolver);

        let (out, next) = parse_section::<Outline>(SectionType::Action, &root.children, 0, &mut pd);

        assert_eq!(out.nested, 2);
        assert_eq!(next, root.children.len());
        assert_eq!(pd.report.warning_codes(), vec![WarningCode::Ignoring]);
    }

    #[test]
    fn description_blocks_are_separated() {
        let mut description = String::new();
        append_description(&mut description, "one\n");
        append_description(&mut description, "two");
        append_description(&mut description, "three\n");
        assert_eq!(description, "one\n\ntwo\n\nthree\n");
    }
}
