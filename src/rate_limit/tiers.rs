use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use turnate_config::RateLimitConfig;
use turnate_error::AppError;

use super::clock::Clock;
use super::store::{BucketStore, SweeperHandle};

/// The three independently parameterized admission tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateTier {
    /// All traffic
    Global,
    /// Login and registration endpoints
    Auth,
    /// Authenticated API traffic
    Api,
}

impl RateTier {
    pub const ALL: [RateTier; 3] = [RateTier::Global, RateTier::Auth, RateTier::Api];

    pub fn as_str(&self) -> &'static str {
        match self {
            RateTier::Global => "global",
            RateTier::Auth => "auth",
            RateTier::Api => "api",
        }
    }

    /// Rejection returned when this tier denies a request
    pub fn rejection(&self) -> AppError {
        let (error, message) = match self {
            RateTier::Global => ("Rate limit exceeded", "Too many requests. Please slow down."),
            RateTier::Auth => (
                "Authentication rate limit exceeded",
                "Too many authentication attempts. Please wait before trying again.",
            ),
            RateTier::Api => ("API rate limit exceeded", "Too many API requests. Please slow down."),
        };
        AppError::RateLimited { error, message }
    }
}

impl fmt::Display for RateTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bucket store per tier
#[derive(Clone)]
pub struct RateLimiterTiers {
    global: Arc<BucketStore>,
    auth: Arc<BucketStore>,
    api: Arc<BucketStore>,
    sweep_interval: Duration,
}

impl RateLimiterTiers {
    pub fn from_config(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let store = |tier: RateTier, tier_config| {
            Arc::new(BucketStore::new(tier.as_str(), tier_config, clock.clone()))
        };

        Self {
            global: store(RateTier::Global, config.global),
            auth: store(RateTier::Auth, config.auth),
            api: store(RateTier::Api, config.api),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
        }
    }

    pub fn store(&self, tier: RateTier) -> &Arc<BucketStore> {
        match tier {
            RateTier::Global => &self.global,
            RateTier::Auth => &self.auth,
            RateTier::Api => &self.api,
        }
    }

    /// Start one sweeper per tier
    pub fn spawn_sweepers(&self) -> TierSweepers {
        TierSweepers {
            handles: RateTier::ALL
                .iter()
                .map(|tier| self.store(*tier).spawn_sweeper(self.sweep_interval))
                .collect(),
        }
    }
}

/// Sweeper tasks for all tiers, stopped together
#[derive(Debug)]
pub struct TierSweepers {
    handles: Vec<SweeperHandle>,
}

impl TierSweepers {
    pub async fn shutdown(self) {
        for handle in self.handles {
            handle.shutdown().await;
        }
        tracing::info!("Rate limit sweepers stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::clock::ManualClock;
    use turnate_config::RateTierConfig;

    #[tokio::test]
    async fn test_tiers_are_independent() {
        let config = RateLimitConfig {
            global: RateTierConfig::per_second(1.0, 2),
            auth: RateTierConfig::per_minute(1.0, 1),
            api: RateTierConfig::per_second(1.0, 3),
            sweep_interval_secs: 60,
        };
        let tiers = RateLimiterTiers::from_config(&config, Arc::new(ManualClock::new()));

        assert!(tiers.store(RateTier::Auth).allow("ip").await);
        assert!(!tiers.store(RateTier::Auth).allow("ip").await);

        // Exhausting the auth tier leaves the others untouched
        assert!(tiers.store(RateTier::Global).allow("ip").await);
        assert!(tiers.store(RateTier::Api).allow("ip").await);
    }

    #[test]
    fn test_rejection_messages_per_tier() {
        match RateTier::Auth.rejection() {
            AppError::RateLimited { error, .. } => {
                assert_eq!(error, "Authentication rate limit exceeded")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            RateTier::Api.rejection().user_message(),
            "API rate limit exceeded"
        );
        assert_eq!(RateTier::Global.rejection().status_code().as_u16(), 429);
    }
}
