// ============================================================================
// Rate Limiting Configuration
// ============================================================================

use crate::constants::*;

/// Refill rate and burst capacity of one rate tier
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateTierConfig {
    /// Tokens added per second
    pub refill_per_sec: f64,
    /// Bucket capacity (also the initial token count)
    pub burst: u32,
}

impl RateTierConfig {
    pub fn per_second(rate: f64, burst: u32) -> Self {
        Self {
            refill_per_sec: rate,
            burst,
        }
    }

    pub fn per_minute(rate: f64, burst: u32) -> Self {
        Self {
            refill_per_sec: rate / SECONDS_PER_MINUTE as f64,
            burst,
        }
    }
}

/// The three independently parameterized tiers plus the sweep period
#[derive(Clone, Debug, PartialEq)]
pub struct RateLimitConfig {
    /// Coarse limit applied to all traffic
    pub global: RateTierConfig,
    /// Strict limit for login/registration endpoints
    pub auth: RateTierConfig,
    /// Limit for authenticated API traffic
    pub api: RateTierConfig,
    /// How often idle (full) buckets are evicted
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global: RateTierConfig::per_second(DEFAULT_GLOBAL_PER_SEC, DEFAULT_GLOBAL_BURST),
            auth: RateTierConfig::per_minute(DEFAULT_AUTH_PER_MIN, DEFAULT_AUTH_BURST),
            api: RateTierConfig::per_second(DEFAULT_API_PER_SEC, DEFAULT_API_BURST),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl RateLimitConfig {
    pub(crate) fn from_lookup(var: &impl Fn(&str) -> Option<String>) -> Self {
        let num = |key: &str| var(key).and_then(|v| v.parse::<f64>().ok()).filter(|v| *v > 0.0);
        let burst = |key: &str| var(key).and_then(|v| v.parse::<u32>().ok()).filter(|v| *v > 0);

        Self {
            global: RateTierConfig::per_second(
                num("RATE_GLOBAL_PER_SEC").unwrap_or(DEFAULT_GLOBAL_PER_SEC),
                burst("RATE_GLOBAL_BURST").unwrap_or(DEFAULT_GLOBAL_BURST),
            ),
            auth: RateTierConfig::per_minute(
                num("RATE_AUTH_PER_MIN").unwrap_or(DEFAULT_AUTH_PER_MIN),
                burst("RATE_AUTH_BURST").unwrap_or(DEFAULT_AUTH_BURST),
            ),
            api: RateTierConfig::per_second(
                num("RATE_API_PER_SEC").unwrap_or(DEFAULT_API_PER_SEC),
                burst("RATE_API_BURST").unwrap_or(DEFAULT_API_BURST),
            ),
            sweep_interval_secs: var("RATE_SWEEP_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}
