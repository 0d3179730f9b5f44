// ============================================================================
// Configuration Constants
// ============================================================================

pub(crate) const DEFAULT_JWT_ISSUER: &str = "turnate";
pub(crate) const MIN_JWT_SECRET_LEN: usize = 32;

// Session tokens expire 24 hours after issuance
pub(crate) const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

// Rate tiers: (tokens per second, burst)
pub(crate) const DEFAULT_GLOBAL_PER_SEC: f64 = 10.0;
pub(crate) const DEFAULT_GLOBAL_BURST: u32 = 20;
pub(crate) const DEFAULT_AUTH_PER_MIN: f64 = 5.0;
pub(crate) const DEFAULT_AUTH_BURST: u32 = 5;
pub(crate) const DEFAULT_API_PER_SEC: f64 = 5.0;
pub(crate) const DEFAULT_API_BURST: u32 = 10;

// Idle bucket sweep runs every 5 minutes
pub(crate) const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

pub(crate) const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub(crate) const DEFAULT_CHANNEL_NAME: &str = "general";

// Time conversion
pub const SECONDS_PER_MINUTE: i64 = 60;

pub const MAX_REQUEST_BODY_SIZE: usize = 2 * 1024 * 1024; // 2 MB - buffered form bodies
