use async_trait::async_trait;
use axum::http::{header, Method};
use turnate_error::AppError;

use super::{Interceptor, RequestFacts, Verdict};

const ACCEPTED_CONTENT_TYPES: [&str; 2] = ["application/json", "multipart/form-data"];

/// Body-bearing methods must declare JSON or multipart content
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentTypeGate;

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

#[async_trait]
impl Interceptor for ContentTypeGate {
    fn name(&self) -> &'static str {
        "content_type"
    }

    async fn inspect(&self, facts: &mut RequestFacts) -> Verdict {
        if !carries_body(&facts.method) {
            return Verdict::Continue;
        }

        let content_type = facts
            .header_str(header::CONTENT_TYPE)
            .unwrap_or_default()
            .to_ascii_lowercase();
        if ACCEPTED_CONTENT_TYPES
            .iter()
            .any(|accepted| content_type.contains(accepted))
        {
            return Verdict::Continue;
        }

        tracing::debug!(
            method = %facts.method,
            path = %facts.path,
            content_type = %content_type,
            "Unsupported content type"
        );
        Verdict::Terminate(AppError::UnsupportedMediaType)
    }
}
