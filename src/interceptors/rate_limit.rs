use std::sync::Arc;

use async_trait::async_trait;
use turnate_metrics::RATE_LIMIT_REJECTIONS;

use super::{Interceptor, RequestFacts, Verdict};
use crate::rate_limit::{BucketStore, RateTier};

/// Checks one rate tier for the request's client key
pub struct RateLimitGate {
    tier: RateTier,
    store: Arc<BucketStore>,
}

impl RateLimitGate {
    pub fn new(tier: RateTier, store: Arc<BucketStore>) -> Self {
        Self { tier, store }
    }
}

#[async_trait]
impl Interceptor for RateLimitGate {
    fn name(&self) -> &'static str {
        match self.tier {
            RateTier::Global => "rate_limit_global",
            RateTier::Auth => "rate_limit_auth",
            RateTier::Api => "rate_limit_api",
        }
    }

    async fn inspect(&self, facts: &mut RequestFacts) -> Verdict {
        if self.store.allow(&facts.client_key).await {
            return Verdict::Continue;
        }

        RATE_LIMIT_REJECTIONS
            .with_label_values(&[self.tier.as_str()])
            .inc();
        tracing::warn!(
            tier = %self.tier,
            client = %facts.client_key,
            path = %facts.path,
            "Rate limit exceeded"
        );
        Verdict::Terminate(self.tier.rejection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::ManualClock;
    use axum::http::Method;
    use turnate_config::RateTierConfig;

    #[tokio::test]
    async fn test_gate_denies_after_burst() {
        let store = Arc::new(BucketStore::new(
            "auth",
            RateTierConfig::per_minute(5.0, 2),
            Arc::new(ManualClock::new()),
        ));
        let gate = RateLimitGate::new(RateTier::Auth, store);
        let mut facts = RequestFacts::new(Method::POST, "/auth/login").with_client_key("1.2.3.4");

        assert!(gate.inspect(&mut facts).await.is_continue());
        assert!(gate.inspect(&mut facts).await.is_continue());
        match gate.inspect(&mut facts).await {
            Verdict::Terminate(err) => {
                assert_eq!(err.status_code().as_u16(), 429);
                assert_eq!(err.user_message(), "Authentication rate limit exceeded");
            }
            Verdict::Continue => panic!("third request should be limited"),
        }

        let mut other = RequestFacts::new(Method::POST, "/auth/login").with_client_key("5.6.7.8");
        assert!(gate.inspect(&mut other).await.is_continue());
    }
}
