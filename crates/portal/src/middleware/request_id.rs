//! Request correlation IDs.
//!
//! A well-formed upstream `x-request-id` (from Fly's proxy or a load
//! balancer) is kept; anything else is replaced by a fresh UUID v4. The ID is
//! recorded on the `http_request` span and the Sentry scope, and echoed back.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LENGTH: usize = 128;

/// An upstream ID is only trusted if it is short, printable ASCII.
fn upstream_request_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LENGTH
                && id.bytes().all(|b| b.is_ascii_graphic())
        })
}

/// Ensure every request carries a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = upstream_request_id(request.headers())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(value) {
            map.insert(REQUEST_ID_HEADER, value);
        }
        map
    }

    #[test]
    fn test_keeps_upstream_id() {
        let map = headers("fly-01HZX3");
        assert_eq!(upstream_request_id(&map), Some("fly-01HZX3"));
    }

    #[test]
    fn test_rejects_unusable_ids() {
        assert_eq!(upstream_request_id(&HeaderMap::new()), None);
        assert_eq!(upstream_request_id(&headers("")), None);
        assert_eq!(upstream_request_id(&headers("two words")), None);
        assert_eq!(upstream_request_id(&headers(&"a".repeat(129))), None);
    }
}
