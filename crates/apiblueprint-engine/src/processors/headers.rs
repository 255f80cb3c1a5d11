//! `Headers` sections: `Name: value` lines in a code block.

use apiblueprint_markdown::{Node, NodeKind, SourceRanges};

use crate::ast::{Header, TransactionExample};
use crate::http::is_repeatable_header;
use crate::parsing::signature::header_line;
use crate::parsing::{ParserData, SectionLayout, SectionProcessor, SectionType, Signature};
use crate::processors::Parsed;
use crate::processors::asset::{code_block_content, signature_remainder, source_lines};
use crate::report::WarningCode;
use crate::source_map::TransactionExampleSourceMap;

pub type ParsedHeaders = Parsed<Vec<Header>, Vec<SourceRanges>>;

/// Warning for `headers` sections directly under an action or resource.
pub const DEPRECATED_HEADERS: &str = "the 'headers' section at this level is deprecated and will be removed in a future, use respective payload header section(s) instead";

pub struct HeadersProcessor;

impl HeadersProcessor {
    fn read_lines(ranges: &SourceRanges, pd: &mut ParserData<'_>, out: &mut ParsedHeaders) {
        for (line, line_ranges) in source_lines(ranges, pd.source) {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            match header_line(line) {
                Some((key, value)) => {
                    out.node.push(Header::new(key, value));
                    out.source_map.push(line_ranges);
                }
                None => pd.warn(
                    WarningCode::Formatting,
                    "unable to parse HTTP header, expected '<header name> : <header value>', one header per line",
                    &line_ranges,
                ),
            }
        }
    }
}

impl SectionProcessor for HeadersProcessor {
    const LAYOUT: SectionLayout = SectionLayout::ListItem;
    type Builder = ParsedHeaders;
    type Output = ParsedHeaders;

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
        if let Some((_, ranges)) = signature_remainder(item, pd) {
            pd.warn(
                WarningCode::Indentation,
                "headers are expected to be a pre-formatted code block, separate it by a newline and indent every of its line by 12 spaces or 3 tabs",
                &ranges,
            );
            Self::read_lines(&ranges, pd, out);
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
        out: &mut Self::Builder,
    ) -> usize {
        if let Some(node) = nodes.get(at) {
            let (_, ranges) = code_block_content(node, "'headers'", 3, pd);
            Self::read_lines(&ranges, pd, out);
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
                "no headers specified",
                signature.signature_ranges(),
            );
        }
    }

    fn build(out: Self::Builder) -> Self::Output {
        out
    }
}

/// Appends parsed headers, warning about names already present.
///
/// Names compare case-insensitively; `Set-Cookie` and `Link` may repeat.
pub fn append_headers(
    headers: &mut Vec<Header>,
    source_map: &mut Vec<SourceRanges>,
    parsed: ParsedHeaders,
    pd: &mut ParserData<'_>,
) {
    for (header, ranges) in parsed.node.into_iter().zip(parsed.source_map) {
        let duplicate = headers
            .iter()
            .any(|existing| existing.key.eq_ignore_ascii_case(&header.key));
        if duplicate && !is_repeatable_header(&header.key) {
            pd.warn(
                WarningCode::Duplicate,
                format!("duplicate definition of '{}' header", header.key),
                &ranges,
            );
        }
        headers.push(header);
        source_map.push(ranges);
    }
}

/// Prepends action or resource level headers to every request and response.
pub fn inject_headers(
    headers: &ParsedHeaders,
    mut examples: Vec<TransactionExample>,
    mut source_maps: Vec<TransactionExampleSourceMap>,
) -> (Vec<TransactionExample>, Vec<TransactionExampleSourceMap>) {
    if headers.node.is_empty() {
        return (examples, source_maps);
    }
    for (example, source_map) in examples.iter_mut().zip(source_maps.iter_mut()) {
        let payloads = example.requests.iter_mut().chain(example.responses.iter_mut());
        let payload_maps = source_map
            .requests
            .iter_mut()
            .chain(source_map.responses.iter_mut());
        for (payload, payload_map) in payloads.zip(payload_maps) {
            payload.headers.splice(0..0, headers.node.iter().cloned());
            payload_map
                .headers
                .splice(0..0, headers.source_map.iter().cloned());
        }
    }
    (examples, source_maps)
}
