// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Log raw user ids instead of salted hashes
    pub enable_user_identifiers: bool,
    pub hash_salt: String,
    /// `RUST_LOG`-style filter directive
    pub filter: String,
}

impl LoggingConfig {
    pub(crate) fn from_lookup(var: &impl Fn(&str) -> Option<String>) -> Self {
        let hash_salt = match var("LOG_HASH_SALT").filter(|s| !s.is_empty()) {
            Some(salt) => salt,
            None => {
                tracing::warn!(
                    "LOG_HASH_SALT not set - using a random salt. \
                    Hashed identifiers will not correlate across restarts."
                );
                uuid::Uuid::new_v4().simple().to_string()
            }
        };

        Self {
            enable_user_identifiers: var("LOG_USER_IDENTIFIERS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            hash_salt,
            filter: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        }
    }
}
