use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue};

use super::Interceptor;

pub const DEFAULT_CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net https://code.jquery.com; \
    style-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net; \
    font-src 'self' https://cdn.jsdelivr.net; \
    img-src 'self' data: https:; \
    connect-src 'self'; \
    frame-ancestors 'none';";

/// Hardening headers attached to every response
#[derive(Debug, Default, Clone, Copy)]
pub struct SecurityHeaders;

#[async_trait]
impl Interceptor for SecurityHeaders {
    fn name(&self) -> &'static str {
        "security_headers"
    }

    fn decorate(&self, headers: &mut HeaderMap) {
        // Prevent MIME sniffing
        headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        // Prevent clickjacking
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        // Legacy browsers only
        headers.insert(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        );
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
        headers.insert(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        );
        headers.insert(
            "permissions-policy",
            HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
        );
    }
}

#[derive(Debug, Clone)]
pub struct ContentSecurityPolicy {
    policy: HeaderValue,
}

impl ContentSecurityPolicy {
    pub fn new(policy: HeaderValue) -> Self {
        Self { policy }
    }
}

impl Default for ContentSecurityPolicy {
    fn default() -> Self {
        Self::new(HeaderValue::from_static(DEFAULT_CONTENT_SECURITY_POLICY))
    }
}

#[async_trait]
impl Interceptor for ContentSecurityPolicy {
    fn name(&self) -> &'static str {
        "content_security_policy"
    }

    fn decorate(&self, headers: &mut HeaderMap) {
        headers.insert(header::CONTENT_SECURITY_POLICY, self.policy.clone());
    }
}
