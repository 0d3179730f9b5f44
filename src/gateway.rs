// ============================================================================
// Gateway Assembly
// ============================================================================
//
// Builds the standard interceptor chains from configuration and installs
// them on axum routers. Layers nest: the edge chain wraps everything, the
// auth and API chains wrap their own route groups, and the admin chain sits
// inside the API chain.
//
//   edge:  security headers -> CSP -> global tier -> input screen
//          -> content type -> deadline
//   auth:  auth tier
//   api:   api tier -> session authentication
//   admin: admin role
//
// ============================================================================

use std::sync::Arc;

use anyhow::Result;
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use turnate_config::Config;
use turnate_error::AppResult;
use turnate_types::Principal;

use crate::auth::{IssuedToken, SessionAuthenticator, SessionManager};
use crate::interceptors::{
    run_chain, ContentSecurityPolicy, ContentTypeGate, Deadline, InputScreen, InterceptorChain,
    RateLimitGate, RequireRole, SecurityHeaders, SessionGate,
};
use crate::logging::request_logging;
use crate::rate_limit::{Clock, RateLimiterTiers, RateTier, SystemClock, TierSweepers};
use crate::registry::UserRegistry;

/// Owns the admission components shared by every chain
#[derive(Clone)]
pub struct Gateway {
    config: Arc<Config>,
    tiers: RateLimiterTiers,
    sessions: Arc<SessionManager>,
    authenticator: Arc<SessionAuthenticator>,
}

impl Gateway {
    pub fn new(config: Config, registry: Arc<dyn UserRegistry>) -> Result<Self> {
        Self::with_clock(config, registry, Arc::new(SystemClock))
    }

    /// Same as `new` with an explicit time source for the rate limiter
    pub fn with_clock(
        config: Config,
        registry: Arc<dyn UserRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let sessions = Arc::new(SessionManager::new(&config)?);
        let authenticator = Arc::new(SessionAuthenticator::new(
            sessions.clone(),
            registry,
            config.logging.clone(),
        ));
        let tiers = RateLimiterTiers::from_config(&config.rate_limits, clock);

        tracing::info!(
            global_burst = config.rate_limits.global.burst,
            auth_burst = config.rate_limits.auth.burst,
            api_burst = config.rate_limits.api.burst,
            timeout_secs = config.request_timeout_secs,
            "Gateway initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            tiers,
            sessions,
            authenticator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tiers(&self) -> &RateLimiterTiers {
        &self.tiers
    }

    pub fn authenticator(&self) -> &Arc<SessionAuthenticator> {
        &self.authenticator
    }

    /// Sign a session token, to be called after credentials were verified
    pub fn issue_session(&self, principal: &Principal) -> AppResult<IssuedToken> {
        self.sessions.issue(principal)
    }

    pub fn edge_chain(&self) -> InterceptorChain {
        self.chain()
            .with(SecurityHeaders)
            .with(ContentSecurityPolicy::default())
            .with(self.rate_gate(RateTier::Global))
            .with(InputScreen)
            .with(ContentTypeGate)
            .with_deadline(Deadline::new(self.config.request_timeout()))
    }

    pub fn auth_chain(&self) -> InterceptorChain {
        self.chain().with(self.rate_gate(RateTier::Auth))
    }

    pub fn api_chain(&self) -> InterceptorChain {
        self.chain()
            .with(self.rate_gate(RateTier::Api))
            .with(SessionGate::new(self.authenticator.clone()))
    }

    pub fn admin_chain(&self) -> InterceptorChain {
        self.chain().with(RequireRole::admin())
    }

    /// Outermost protection: edge chain plus request logging and tracing
    pub fn protect_edge<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        install(router, self.edge_chain()).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging)),
        )
    }

    /// Login and registration routes
    pub fn protect_auth_endpoints<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        install(router, self.auth_chain())
    }

    /// Routes that need a valid session
    pub fn protect_api<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        install(router, self.api_chain())
    }

    /// Admin-only routes; apply before `protect_api` so the session gate runs first
    pub fn protect_admin<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        install(router, self.admin_chain())
    }

    /// Start idle-bucket sweepers for all tiers
    pub fn spawn_sweepers(&self) -> TierSweepers {
        self.tiers.spawn_sweepers()
    }

    fn chain(&self) -> InterceptorChain {
        InterceptorChain::new(self.config.max_request_body_size)
    }

    fn rate_gate(&self, tier: RateTier) -> RateLimitGate {
        RateLimitGate::new(tier, self.tiers.store(tier).clone())
    }
}

fn install<S>(router: Router<S>, chain: InterceptorChain) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(Arc::new(chain), run_chain))
}
