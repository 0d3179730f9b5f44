// ============================================================================
// Interceptor Chain
// ============================================================================
//
// Request gates evaluated in order by a single runner. Each gate inspects the
// captured request facts and either lets the request continue or terminates
// it with an `AppError`. Gates may also decorate every response (including
// rejections) with headers.
//
// Declared order for the edge chain:
// 1. security headers
// 2. content security policy
// 3. rate limit tier
// 4. input screening
// 5. content-type validation
// 6. deadline (bounds everything after it, handler included)
//
// ============================================================================

mod chain;
mod content_type;
mod deadline;
mod facts;
mod headers;
mod rate_limit;
mod role;
mod screening;
mod session;

pub use chain::{run_chain, InterceptorChain};
pub use content_type::ContentTypeGate;
pub use deadline::Deadline;
pub use facts::RequestFacts;
pub use headers::{ContentSecurityPolicy, SecurityHeaders, DEFAULT_CONTENT_SECURITY_POLICY};
pub use rate_limit::RateLimitGate;
pub use role::RequireRole;
pub use screening::{screen_value, InputScreen, Threat};
pub use session::SessionGate;

use async_trait::async_trait;
use axum::http::HeaderMap;
use turnate_error::AppError;

/// Outcome of a single gate
#[derive(Debug)]
pub enum Verdict {
    Continue,
    Terminate(AppError),
}

impl Verdict {
    pub fn is_continue(&self) -> bool {
        matches!(self, Verdict::Continue)
    }
}

#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Label used in logs and metrics
    fn name(&self) -> &'static str;

    async fn inspect(&self, _facts: &mut RequestFacts) -> Verdict {
        Verdict::Continue
    }

    /// Headers added to every response that passes through the chain
    fn decorate(&self, _headers: &mut HeaderMap) {}

    /// Whether this gate needs url-encoded form fields buffered from the body
    fn reads_form(&self) -> bool {
        false
    }
}
