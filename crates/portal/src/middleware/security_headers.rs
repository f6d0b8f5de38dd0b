//! Security headers applied to every portal response.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

/// Pages only load first-party styles and submit forms to the portal itself.
const CONTENT_SECURITY_POLICY_VALUE: &str = "default-src 'none'; \
     style-src 'self'; \
     img-src 'self' data:; \
     base-uri 'self'; \
     form-action 'self'; \
     frame-ancestors 'none'";

const PERMISSIONS_POLICY_VALUE: &str = "camera=(), geolocation=(), microphone=(), payment=()";

/// Headers sent with every response, whatever the route.
fn fixed_headers() -> [(HeaderName, HeaderValue); 7] {
    [
        (X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (
            REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ),
        (
            CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY_VALUE),
        ),
        (
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static(PERMISSIONS_POLICY_VALUE),
        ),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("same-origin"),
        ),
    ]
}

/// Stylesheets may be cached for a day. Everything else can show addresses
/// or visit notes and is never stored.
fn cache_policy(path: &str) -> HeaderValue {
    if path.starts_with("/static/") {
        HeaderValue::from_static("public, max-age=86400")
    } else {
        HeaderValue::from_static("no-store, max-age=0")
    }
}

/// Add security headers to all responses.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let cache_control = cache_policy(request.uri().path());

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in fixed_headers() {
        headers.insert(name, value);
    }
    headers.insert(CACHE_CONTROL, cache_control);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_are_not_stored() {
        assert_eq!(cache_policy("/dashboard"), "no-store, max-age=0");
        assert_eq!(cache_policy("/schedule/4/complete"), "no-store, max-age=0");
        assert_eq!(cache_policy("/static"), "no-store, max-age=0");
    }

    #[test]
    fn test_static_assets_are_cacheable() {
        assert_eq!(cache_policy("/static/css/main.css"), "public, max-age=86400");
    }
}
