//! URI template checks (RFC 6570 subset).
//!
//! Only level one variables plus query (`?`), fragment (`#`) and reserved
//! (`+`) expansions are supported; other operators are reported.

use std::sync::OnceLock;

use regex::Regex;

const ALLOWED: &str = "Allowed characters for expressions are A-Z a-z 0-9 _ and percent encoded characters";

fn uri_regex() -> &'static Regex {
    static URI: OnceLock<Regex> = OnceLock::new();
    URI.get_or_init(|| {
        Regex::new(r"^(http|https|ftp|file)?(://)?([^/]*)?(.*)$").expect("Invalid URI regex")
    })
}

fn expression_regex() -> &'static Regex {
    static EXPRESSION: OnceLock<Regex> = OnceLock::new();
    EXPRESSION.get_or_init(|| {
        Regex::new(r"^[?#+]?(?:[A-Za-z0-9_,]|%[A-Fa-f0-9]{2})*\*?$")
            .expect("Invalid URI template expression regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expansion {
    Variable,
    Query,
    Fragment,
    Reserved,
    Label,
    PathSegment,
    PathStyle,
    FormContinuation,
    Unknown,
}

impl Expansion {
    fn of(expression: &str) -> Self {
        match expression.chars().next() {
            Some('?') => Expansion::Query,
            Some('#') => Expansion::Fragment,
            Some('+') => Expansion::Reserved,
            Some('.') => Expansion::Label,
            Some('/') => Expansion::PathSegment,
            Some(';') => Expansion::PathStyle,
            Some('&') => Expansion::FormContinuation,
            Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '%' => Expansion::Variable,
            _ => Expansion::Unknown,
        }
    }

    fn unsupported(self) -> Option<&'static str> {
        match self {
            Expansion::Variable | Expansion::Query | Expansion::Fragment | Expansion::Reserved => None,
            Expansion::Label => Some("URI template label expansion is not supported."),
            Expansion::PathSegment => Some("URI template path segment expansion is not supported."),
            Expansion::PathStyle => {
                Some("URI template path style parameter expansion is not supported.")
            }
            Expansion::FormContinuation => {
                Some("URI template form style query continuation expansion is not supported.")
            }
            Expansion::Unknown => Some("Could not identify the URI template expression."),
        }
    }
}

/// Path part of a URI template, without scheme and host.
fn path(uri: &str) -> &str {
    uri_regex()
        .captures(uri)
        .and_then(|caps| caps.get(4))
        .map_or(uri, |m| m.as_str())
}

fn mismatched_braces(path: &str) -> bool {
    path.matches('{').count() != path.matches('}').count()
}

fn nested_braces(path: &str) -> bool {
    let mut last = None;
    for c in path.chars().filter(|c| matches!(c, '{' | '}')) {
        if last == Some(c) {
            return true;
        }
        last = Some(c);
    }
    false
}

/// Contents of every `{...}` expression, in order.
fn expressions(path: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = path;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        found.push(&after[..close]);
        rest = &after[close + 1..];
    }
    found
}

/// Checks a URI template, returning one message per problem found.
pub fn validate(uri: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    if uri.is_empty() {
        return warnings;
    }
    let path = path(uri);

    if mismatched_braces(path) {
        warnings.push("The URI template contains mismatched expression brackets".to_string());
        return warnings;
    }
    if nested_braces(path) {
        warnings.push("The URI template contains nested expression brackets".to_string());
        return warnings;
    }
    if path.contains(['[', ']']) {
        warnings.push(
            "The URI template contains square brackets, please percent encode square brackets as %5B and %5D"
                .to_string(),
        );
    }

    for expression in expressions(path) {
        if let Some(message) = Expansion::of(expression).unsupported() {
            warnings.push(message.to_string());
            continue;
        }

        let mut illegal = false;
        for (needle, what) in [(' ', "spaces"), ('-', "hyphens"), ('=', "assignment")] {
            if expression.contains(needle) {
                warnings.push(format!(
                    "URI template expression \"{expression}\" contains {what}. {ALLOWED}"
                ));
                illegal = true;
            }
        }
        if !illegal && !expression_regex().is_match(expression) {
            warnings.push(format!(
                "URI template expression \"{expression}\" contains invalid characters. {ALLOWED}"
            ));
        }
    }
    warnings
}

/// Variable names referenced by the template's expressions.
pub fn variables(uri: &str) -> Vec<String> {
    expressions(path(uri))
        .into_iter()
        .flat_map(|expression| {
            expression
                .trim_start_matches(['?', '#', '+', '.', '/', ';', '&'])
                .split(',')
        })
        .map(|name| {
            let name = name.trim().trim_end_matches('*');
            name.split(':').next().unwrap_or(name).to_string()
        })
        .filter(|name| !name.is_empty())
        .collect()
}
