//! `x-request-id` correlation.
//!
//! An id supplied by an upstream proxy is reused only if it is short and made
//! of token characters. Anything else is replaced by a fresh UUID v4 before it
//! reaches the span, the Sentry scope or the response.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest inbound id we are willing to echo.
const MAX_REQUEST_ID_LEN: usize = 128;

fn is_acceptable(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'))
}

/// The inbound id if it is acceptable, otherwise a new UUID v4.
fn resolve_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| is_acceptable(id))
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Tag the request span and Sentry scope with the request id, and echo it on
/// the response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(request.headers());

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(id).unwrap());
        headers
    }

    fn is_generated(id: &str) -> bool {
        Uuid::parse_str(id).is_ok()
    }

    #[test]
    fn test_keeps_well_formed_id() {
        assert_eq!(resolve_request_id(&headers("req-42")), "req-42");
        assert_eq!(
            resolve_request_id(&headers("lb.edge_01:7f3a")),
            "lb.edge_01:7f3a"
        );
    }

    #[test]
    fn test_generates_when_missing_or_empty() {
        assert!(is_generated(&resolve_request_id(&HeaderMap::new())));
        assert!(is_generated(&resolve_request_id(&headers(""))));
    }

    #[test]
    fn test_replaces_oversized_id() {
        let long = "a".repeat(MAX_REQUEST_ID_LEN + 1);
        assert!(is_generated(&resolve_request_id(&headers(&long))));

        let limit = "a".repeat(MAX_REQUEST_ID_LEN);
        assert_eq!(resolve_request_id(&headers(&limit)), limit);
    }

    #[test]
    fn test_replaces_id_with_unexpected_characters() {
        for id in ["two words", "line\tbreak", "<script>", "id=1;drop", "caf\u{e9}"] {
            let mut map = HeaderMap::new();
            map.insert(REQUEST_ID_HEADER, HeaderValue::from_bytes(id.as_bytes()).unwrap());
            assert!(is_generated(&resolve_request_id(&map)), "id: {id:?}");
        }
    }
}
