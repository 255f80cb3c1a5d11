//! HTTP rules the payload checks rely on.

pub const CONTENT_TYPE: &str = "Content-Type";

/// Headers that may legitimately appear more than once.
const REPEATABLE_HEADERS: [&str; 2] = ["Set-Cookie", "Link"];

pub fn is_repeatable_header(name: &str) -> bool {
    REPEATABLE_HEADERS
        .iter()
        .any(|repeatable| repeatable.eq_ignore_ascii_case(name))
}

/// Status codes whose responses never carry a message body (RFC 7230 3.3).
pub fn status_forbids_body(status: u16) -> bool {
    (100..200).contains(&status) || status == 204 || status == 304
}

/// Why a response to `method` with `status` must not have a body, if it must not.
pub fn response_body_violation(method: &str, status: u16) -> Option<String> {
    if status_forbids_body(status) {
        return Some(format!(
            "the {status} response MUST NOT include a message-body"
        ));
    }
    if method.eq_ignore_ascii_case("HEAD") {
        return Some("the response for HEAD request MUST NOT include a message-body".to_string());
    }
    if method.eq_ignore_ascii_case("CONNECT") && (200..300).contains(&status) {
        return Some(
            "the response for CONNECT request with 2xx status MUST NOT include a message-body"
                .to_string(),
        );
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("GET", 100, true)]
    #[case("GET", 204, true)]
    #[case("GET", 304, true)]
    #[case("GET", 200, false)]
    #[case("HEAD", 200, true)]
    #[case("CONNECT", 201, true)]
    #[case("CONNECT", 404, false)]
    fn body_rules(#[case] method: &str, #[case] status: u16, #[case] forbidden: bool) {
        assert_eq!(response_body_violation(method, status).is_some(), forbidden);
    }

    #[test]
    fn repeatable_headers_ignore_case() {
        assert!(is_repeatable_header("set-cookie"));
        assert!(!is_repeatable_header("Accept"));
    }
}
