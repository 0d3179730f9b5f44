// ============================================================================
// Turnate Config - Centralized configuration management
// ============================================================================
//
// Configuration for the admission and authorization gateway, loaded from
// environment variables with sensible defaults. Config is plain data handed to
// the components that need it; nothing reads the environment after startup.
//
// ============================================================================

mod constants;
mod logging;
mod security;

pub use constants::{MAX_REQUEST_BODY_SIZE, SECONDS_PER_MINUTE};
pub use logging::LoggingConfig;
pub use security::{RateLimitConfig, RateTierConfig};

use anyhow::Result;
use constants::*;
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug)]
pub struct Config {
    /// HS256 shared secret used to sign and verify session tokens
    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// Session token expiry horizon
    pub session_ttl_hours: i64,

    pub rate_limits: RateLimitConfig,

    /// Deadline for the remainder of the chain plus the handler
    pub request_timeout_secs: u64,
    /// Upper bound for buffering form bodies during input screening
    pub max_request_body_size: usize,

    /// Distinguished channel nobody may leave
    pub default_channel: String,

    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = match var("JWT_SECRET") {
            Some(s) if s.len() >= MIN_JWT_SECRET_LEN => s,
            Some(s) => anyhow::bail!(
                "JWT_SECRET must be at least {} characters long (got {}). \
                Generate with: openssl rand -hex 32",
                MIN_JWT_SECRET_LEN,
                s.len()
            ),
            None => anyhow::bail!("JWT_SECRET must be set"),
        };

        Ok(Self {
            jwt_secret,
            jwt_issuer: var("JWT_ISSUER")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_JWT_ISSUER.to_string()),
            session_ttl_hours: var("SESSION_TTL_HOURS")
                .and_then(|v| v.parse().ok())
                .filter(|v: &i64| *v > 0)
                .unwrap_or(DEFAULT_SESSION_TTL_HOURS),
            rate_limits: RateLimitConfig::from_lookup(&var),
            request_timeout_secs: var("REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|v: &u64| *v > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_request_body_size: var("MAX_REQUEST_BODY_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_REQUEST_BODY_SIZE),
            default_channel: var("DEFAULT_CHANNEL")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_CHANNEL_NAME.to_string()),
            logging: LoggingConfig::from_lookup(&var),
        })
    }

    /// Defaults with an explicit secret, for tests and local tooling
    pub fn for_tests(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            jwt_issuer: DEFAULT_JWT_ISSUER.to_string(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            rate_limits: RateLimitConfig::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_request_body_size: MAX_REQUEST_BODY_SIZE,
            default_channel: DEFAULT_CHANNEL_NAME.to_string(),
            logging: LoggingConfig {
                enable_user_identifiers: true,
                hash_salt: "test-salt".to_string(),
                filter: "debug".to_string(),
            },
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limits.sweep_interval_secs)
    }
}
