//! Signature grammar: recognizers and field extractors for section openers.
//!
//! Header signatures are tried in a fixed order because the forms overlap:
//! resource shapes first (`URI`, `METHOD URI`, `Name [URI]`,
//! `Name [METHOD URI]`), then `Group <name>`, then the action-only shapes
//! (`METHOD`, `Name [METHOD]`). List item keywords are matched against the
//! first line of the item only.

use std::sync::OnceLock;

use regex::Regex;

use crate::parsing::SectionType;

/// Request methods recognized in resource and action signatures.
pub const HTTP_METHODS: [&str; 17] = [
    "GET",
    "POST",
    "PUT",
    "DELETE",
    "OPTIONS",
    "PATCH",
    "PROPPATCH",
    "LOCK",
    "UNLOCK",
    "COPY",
    "MOVE",
    "MKCOL",
    "HEAD",
    "LINK",
    "UNLINK",
    "CONNECT",
    "TRACE",
];

const METHODS: &str =
    "GET|POST|PUT|DELETE|OPTIONS|PATCH|PROPPATCH|LOCK|UNLOCK|COPY|MOVE|MKCOL|HEAD|LINK|UNLINK|CONNECT|TRACE";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid signature regex")
}

fn resource_regex() -> &'static Regex {
    static RESOURCE: OnceLock<Regex> = OnceLock::new();
    RESOURCE.get_or_init(|| compile(&format!(r"^(?:({METHODS})[ \t]+)?(/[^\]]*)$")))
}

fn named_resource_regex() -> &'static Regex {
    static NAMED_RESOURCE: OnceLock<Regex> = OnceLock::new();
    NAMED_RESOURCE.get_or_init(|| compile(r"^([^\[\]()]+)[ \t]+\[(/[^\]]*)\]$"))
}

fn named_endpoint_regex() -> &'static Regex {
    static NAMED_ENDPOINT: OnceLock<Regex> = OnceLock::new();
    NAMED_ENDPOINT.get_or_init(|| {
        compile(&format!(
            r"^([^\[\]()]+)[ \t]+\[({METHODS})[ \t]+(/[^\]]*)\]$"
        ))
    })
}

fn group_regex() -> &'static Regex {
    static GROUP: OnceLock<Regex> = OnceLock::new();
    GROUP.get_or_init(|| compile(r"^[Gg]roup[ \t]+([^\[\]()]+)$"))
}

fn action_regex() -> &'static Regex {
    static ACTION: OnceLock<Regex> = OnceLock::new();
    ACTION.get_or_init(|| compile(&format!(r"^({METHODS})$")))
}

fn named_action_regex() -> &'static Regex {
    static NAMED_ACTION: OnceLock<Regex> = OnceLock::new();
    NAMED_ACTION.get_or_init(|| compile(&format!(r"^([^\[]*)\[({METHODS})\]$")))
}

fn relative_uri_regex() -> &'static Regex {
    static RELATIVE_URI: OnceLock<Regex> = OnceLock::new();
    RELATIVE_URI.get_or_init(|| {
        compile(&format!(
            r"^[^\[\]()]+[ \t]*\[({METHODS})[ \t]+([^/\]][^\]]*)\]$"
        ))
    })
}

/// What a header's text declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSignature<'a> {
    /// `Group <name>`
    Group { name: &'a str },
    /// `URI` or `Name [URI]`
    Resource { name: &'a str, uri: &'a str },
    /// `METHOD URI` or `Name [METHOD URI]`: a resource with exactly one action
    /// read from the same header.
    Endpoint {
        name: &'a str,
        method: &'a str,
        uri: &'a str,
    },
    /// `METHOD` or `Name [METHOD]`
    Action { name: &'a str, method: &'a str },
    Undefined,
}

impl HeaderSignature<'_> {
    pub fn section_type(&self) -> SectionType {
        match self {
            HeaderSignature::Group { .. } => SectionType::ResourceGroup,
            HeaderSignature::Resource { .. } | HeaderSignature::Endpoint { .. } => {
                SectionType::Resource
            }
            HeaderSignature::Action { .. } => SectionType::Action,
            HeaderSignature::Undefined => SectionType::Undefined,
        }
    }
}

/// Matches header text against every header signature in priority order.
pub fn header_signature(text: &str) -> HeaderSignature<'_> {
    let text = text.trim();
    if text.is_empty() {
        return HeaderSignature::Undefined;
    }

    if let Some(caps) = resource_regex().captures(text) {
        let uri = caps.get(2).map_or("", |m| m.as_str().trim_end());
        return match caps.get(1) {
            Some(method) => HeaderSignature::Endpoint {
                name: "",
                method: method.as_str(),
                uri,
            },
            None => HeaderSignature::Resource { name: "", uri },
        };
    }
    if let Some(caps) = named_endpoint_regex().captures(text) {
        return HeaderSignature::Endpoint {
            name: caps.get(1).map_or("", |m| m.as_str().trim()),
            method: caps.get(2).map_or("", |m| m.as_str()),
            uri: caps.get(3).map_or("", |m| m.as_str().trim_end()),
        };
    }
    if let Some(caps) = named_resource_regex().captures(text) {
        return HeaderSignature::Resource {
            name: caps.get(1).map_or("", |m| m.as_str().trim()),
            uri: caps.get(2).map_or("", |m| m.as_str().trim_end()),
        };
    }
    if let Some(caps) = group_regex().captures(text) {
        return HeaderSignature::Group {
            name: caps.get(1).map_or("", |m| m.as_str().trim()),
        };
    }
    if let Some(caps) = action_regex().captures(text) {
        return HeaderSignature::Action {
            name: "",
            method: caps.get(1).map_or("", |m| m.as_str()),
        };
    }
    if let Some(caps) = named_action_regex().captures(text) {
        return HeaderSignature::Action {
            name: caps.get(1).map_or("", |m| m.as_str().trim()),
            method: caps.get(2).map_or("", |m| m.as_str()),
        };
    }
    HeaderSignature::Undefined
}

/// Detects `Name [METHOD path]` where the path lacks its leading slash.
pub fn relative_uri_warning(text: &str) -> Option<String> {
    let text = text.trim();
    relative_uri_regex().is_match(text).then(|| {
        format!("URI path in '{text}' is not absolute, it should have a leading forward slash")
    })
}

struct Keyword {
    section: SectionType,
    pattern: &'static str,
}

const KEYWORDS: [Keyword; 10] = [
    Keyword {
        section: SectionType::Parameters,
        pattern: r"^[ \t]*[Pp]arameters?[ \t]*$",
    },
    Keyword {
        section: SectionType::Headers,
        pattern: r"^[ \t]*[Hh]eaders?[ \t]*$",
    },
    Keyword {
        section: SectionType::Body,
        pattern: r"^[ \t]*[Bb]ody[ \t]*$",
    },
    Keyword {
        section: SectionType::Schema,
        pattern: r"^[ \t]*[Ss]chema[ \t]*$",
    },
    Keyword {
        section: SectionType::Relation,
        pattern: r"^[ \t]*[Rr]elation[ \t]*:",
    },
    Keyword {
        section: SectionType::Attributes,
        pattern: r"^[ \t]*[Aa]ttributes?[ \t]*(?:\([^)]*\))?[ \t]*$",
    },
    Keyword {
        section: SectionType::ParameterValues,
        pattern: r"^[ \t]*[Vv]alues[ \t]*$",
    },
    Keyword {
        section: SectionType::Request,
        pattern: r"^[ \t]*[Rr]equest\b",
    },
    Keyword {
        section: SectionType::Response,
        pattern: r"^[ \t]*[Rr]esponse\b",
    },
    Keyword {
        section: SectionType::Model,
        pattern: r"^[ \t]*(?:[^\[\]()]+?[ \t]+)?[Mm]odel(?:[ \t]*\([^)]*\))?[ \t]*$",
    },
];

fn keyword_regexes() -> &'static [(SectionType, Regex)] {
    static KEYWORD_SET: OnceLock<Vec<(SectionType, Regex)>> = OnceLock::new();
    KEYWORD_SET.get_or_init(|| {
        KEYWORDS
            .iter()
            .map(|keyword| (keyword.section, compile(keyword.pattern)))
            .collect()
    })
}

/// Section keyword a list item's first line starts with.
///
/// Payload keywords come back in their full form (`Request`, `Response`,
/// `Model`); whether the item is abbreviated is decided by the classifier.
pub fn list_keyword(line: &str) -> Option<SectionType> {
    keyword_regexes()
        .iter()
        .find(|(_, regex)| regex.is_match(line))
        .map(|(section, _)| *section)
}

/// Leading fields of a payload signature line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadSignature {
    pub name: String,
    pub media_type: String,
    /// False when text follows the recognized signature.
    pub well_formed: bool,
}

fn request_regex() -> &'static Regex {
    static REQUEST: OnceLock<Regex> = OnceLock::new();
    REQUEST.get_or_init(|| {
        compile(r"^[ \t]*[Rr]equest(?:[ \t]+([^\[\]()]+))?(?:[ \t]*\(([^)]*)\))?[ \t]*")
    })
}

fn response_regex() -> &'static Regex {
    static RESPONSE: OnceLock<Regex> = OnceLock::new();
    RESPONSE.get_or_init(|| {
        compile(r"^[ \t]*[Rr]esponse(?:[ \t]+([0-9]+))?(?:[ \t]*\(([^)]*)\))?[ \t]*")
    })
}

fn model_regex() -> &'static Regex {
    static MODEL: OnceLock<Regex> = OnceLock::new();
    MODEL.get_or_init(|| {
        compile(r"^[ \t]*(?:([^\[\]()]+?)[ \t]+)?[Mm]odel(?:[ \t]*\(([^)]*)\))?[ \t]*")
    })
}

/// Extracts name and media type from a request, response or model line.
pub fn payload_signature(section: SectionType, line: &str) -> PayloadSignature {
    let regex = if section.is_request() {
        request_regex()
    } else if section.is_response() {
        response_regex()
    } else {
        model_regex()
    };

    let Some(caps) = regex.captures(line) else {
        return PayloadSignature::default();
    };
    let rest = caps.get(0).map_or(line, |m| &line[m.end()..]);

    PayloadSignature {
        name: caps.get(1).map_or("", |m| m.as_str()).trim().to_string(),
        media_type: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
        well_formed: rest.trim().is_empty(),
    }
}

fn parameter_regex() -> &'static Regex {
    static PARAMETER: OnceLock<Regex> = OnceLock::new();
    PARAMETER.get_or_init(|| {
        compile(
            r"^[ \t]*([A-Za-z0-9_.%-]+)(?:[ \t]*=[ \t]*`([^`]*)`[ \t]*)?(?:[ \t]*\(([^)]*)\)[ \t]*)?(?:[ \t]*\.\.\.[ \t]*(.*))?$",
        )
    })
}

/// Fields of an abbreviated parameter definition line:
/// ``name [= `default`] [(traits)] [... description]``.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSignature<'a> {
    pub name: &'a str,
    pub default_value: Option<&'a str>,
    pub traits: Option<&'a str>,
    pub description: &'a str,
}

pub fn parameter_signature(line: &str) -> Option<ParameterSignature<'_>> {
    let caps = parameter_regex().captures(line.trim())?;
    Some(ParameterSignature {
        name: caps.get(1)?.as_str(),
        default_value: caps.get(2).map(|m| m.as_str()),
        traits: caps.get(3).map(|m| m.as_str()),
        description: caps.get(4).map_or("", |m| m.as_str().trim()),
    })
}

fn relation_regex() -> &'static Regex {
    static RELATION: OnceLock<Regex> = OnceLock::new();
    RELATION.get_or_init(|| compile(r"^[ \t]*[Rr]elation[ \t]*:[ \t]*([a-z][a-z0-9.-]*)?[ \t]*$"))
}

/// Identifier of a `Relation: id` line.
///
/// `Some("")` when the keyword is present but the identifier is missing,
/// `None` when the identifier holds illegal characters.
pub fn relation_identifier(line: &str) -> Option<&str> {
    relation_regex()
        .captures(line)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
}

fn attributes_regex() -> &'static Regex {
    static ATTRIBUTES: OnceLock<Regex> = OnceLock::new();
    ATTRIBUTES.get_or_init(|| compile(r"^[ \t]*[Aa]ttributes?[ \t]*(?:\(([^)]*)\))?[ \t]*$"))
}

/// Type definition text between the parentheses of an Attributes line.
pub fn attributes_type_definition(line: &str) -> &str {
    attributes_regex()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str().trim())
}

fn model_reference_regex() -> &'static Regex {
    static REFERENCE: OnceLock<Regex> = OnceLock::new();
    REFERENCE.get_or_init(|| compile(r"^[ \t]*\[([^\[\]]+)\]\[\][ \t]*$"))
}

/// Symbol named by a `[Name][]` model reference.
pub fn model_reference(text: &str) -> Option<&str> {
    model_reference_regex()
        .captures(text.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn metadata_regex() -> &'static Regex {
    static METADATA: OnceLock<Regex> = OnceLock::new();
    METADATA.get_or_init(|| compile(r"^[ \t]*([^:\s][^:]*?)[ \t]*:[ \t]*(.*?)[ \t]*$"))
}

/// Splits a `key: value` metadata line.
pub fn metadata_line(line: &str) -> Option<(&str, &str)> {
    let caps = metadata_regex().captures(line)?;
    Some((caps.get(1)?.as_str(), caps.get(2).map_or("", |m| m.as_str())))
}

fn header_line_regex() -> &'static Regex {
    static HEADER_LINE: OnceLock<Regex> = OnceLock::new();
    HEADER_LINE.get_or_init(|| {
        compile(r"^[ \t]*([!#$%&'*+.^_`|~0-9A-Za-z-]+)[ \t]*:[ \t]*(.*?)[ \t]*$")
    })
}

/// Splits an HTTP `Name: value` header line.
pub fn header_line(line: &str) -> Option<(&str, &str)> {
    let caps = header_line_regex().captures(line)?;
    Some((caps.get(1)?.as_str(), caps.get(2).map_or("", |m| m.as_str())))
}
