use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header;

use super::{Interceptor, RequestFacts, Verdict};
use crate::auth::SessionAuthenticator;

/// Requires a valid session and publishes the caller's context
pub struct SessionGate {
    authenticator: Arc<SessionAuthenticator>,
}

impl SessionGate {
    pub fn new(authenticator: Arc<SessionAuthenticator>) -> Self {
        Self { authenticator }
    }
}

#[async_trait]
impl Interceptor for SessionGate {
    fn name(&self) -> &'static str {
        "session_auth"
    }

    async fn inspect(&self, facts: &mut RequestFacts) -> Verdict {
        let header = facts.header_str(header::AUTHORIZATION);
        match self.authenticator.authenticate(header).await {
            Ok(ctx) => {
                facts.auth = Some(ctx);
                Verdict::Continue
            }
            Err(err) => Verdict::Terminate(err),
        }
    }
}
