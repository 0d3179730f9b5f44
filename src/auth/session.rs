use std::sync::Arc;

use chrono::Utc;
use turnate_config::LoggingConfig;
use turnate_error::{AppError, AppResult};
use turnate_metrics::{AUTH_FAILURES, LAST_SEEN_UPDATE_FAILURES};
use turnate_types::AuthContext;
use uuid::Uuid;

use super::tokens::SessionManager;
use crate::registry::UserRegistry;
use crate::utils::log_safe_id;

/// Resolves a bearer header into an authenticated request context
///
/// The token proves who the caller was when it was issued. The registry is
/// asked again on every request so a deactivated or deleted user loses access
/// before the token expires.
pub struct SessionAuthenticator {
    sessions: Arc<SessionManager>,
    registry: Arc<dyn UserRegistry>,
    logging: LoggingConfig,
}

impl SessionAuthenticator {
    pub fn new(
        sessions: Arc<SessionManager>,
        registry: Arc<dyn UserRegistry>,
        logging: LoggingConfig,
    ) -> Self {
        Self {
            sessions,
            registry,
            logging,
        }
    }

    pub async fn authenticate(&self, authorization: Option<&str>) -> AppResult<AuthContext> {
        let header = authorization
            .ok_or_else(|| reject("missing_header", "Authorization header required"))?;
        let token = bearer_token(header)
            .ok_or_else(|| reject("malformed_header", "Invalid authorization header format"))?;

        let claims = self.sessions.verify(token).map_err(|err| {
            tracing::debug!(error = %err, "Session token rejected");
            reject("invalid_token", "Invalid token")
        })?;
        let user_id = Uuid::parse_str(&claims.user_id)
            .map_err(|_| reject("invalid_claims", "Invalid token claims"))?;

        let principal = match self.registry.find_user(user_id).await? {
            Some(principal) if principal.is_active => principal,
            _ => {
                tracing::info!(
                    user = %self.loggable(&user_id),
                    "Valid token for missing or inactive user"
                );
                return Err(reject("inactive_user", "User not found or inactive"));
            }
        };

        if let Err(err) = self.registry.touch_last_seen(user_id, Utc::now()).await {
            LAST_SEEN_UPDATE_FAILURES.inc();
            tracing::warn!(
                user = %self.loggable(&user_id),
                error = %err,
                "Failed to refresh last-seen timestamp"
            );
        }

        Ok(AuthContext {
            user_id,
            username: principal.username,
            role: principal.role,
        })
    }

    fn loggable(&self, user_id: &Uuid) -> String {
        if self.logging.enable_user_identifiers {
            user_id.to_string()
        } else {
            log_safe_id(&user_id.to_string(), &self.logging.hash_salt)
        }
    }
}

/// Exactly two space-separated parts, the first being `Bearer`
fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

fn reject(reason: &'static str, message: &'static str) -> AppError {
    AUTH_FAILURES.with_label_values(&[reason]).inc();
    AppError::unauthenticated(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryUserRegistry;
    use turnate_config::Config;
    use turnate_types::{Principal, UserRole};

    const SECRET: &str = "session-authenticator-test-secret-0123";

    struct Fixture {
        sessions: Arc<SessionManager>,
        registry: Arc<InMemoryUserRegistry>,
        authenticator: SessionAuthenticator,
    }

    fn fixture() -> Fixture {
        let config = Config::for_tests(SECRET);
        let sessions = Arc::new(SessionManager::new(&config).unwrap());
        let registry = Arc::new(InMemoryUserRegistry::new());
        let authenticator =
            SessionAuthenticator::new(sessions.clone(), registry.clone(), config.logging);
        Fixture {
            sessions,
            registry,
            authenticator,
        }
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }

    #[tokio::test]
    async fn test_valid_session_publishes_context() {
        let f = fixture();
        let alice = Principal::new("alice", UserRole::Normal);
        f.registry.insert(alice.clone()).await;
        let token = f.sessions.issue(&alice).unwrap().token;

        let ctx = f.authenticator.authenticate(Some(&bearer(&token))).await.unwrap();

        assert_eq!(ctx.user_id, alice.id);
        assert_eq!(ctx.username, "alice");
        assert_eq!(ctx.role, UserRole::Normal);
        let seen = f.registry.find_user(alice.id).await.unwrap().unwrap();
        assert!(seen.last_seen_at.is_some());
    }

    #[tokio::test]
    async fn test_header_shape_errors() {
        let f = fixture();

        let missing = f.authenticator.authenticate(None).await.unwrap_err();
        assert_eq!(missing.user_message(), "Authorization header required");

        for header in ["Token abc", "Bearer", "Bearer a b", "bearer abc", "Bearer "] {
            let err = f.authenticator.authenticate(Some(header)).await.unwrap_err();
            assert_eq!(err.user_message(), "Invalid authorization header format");
        }

        let bad = f.authenticator.authenticate(Some("Bearer abc")).await.unwrap_err();
        assert_eq!(bad.user_message(), "Invalid token");
        assert_eq!(bad.status_code().as_u16(), 401);
    }

    #[tokio::test]
    async fn test_deactivated_user_is_rejected_despite_valid_token() {
        let f = fixture();
        let bob = Principal::new("bob", UserRole::Normal);
        f.registry.insert(bob.clone()).await;
        let token = f.sessions.issue(&bob).unwrap().token;

        f.registry.set_active(bob.id, false).await;
        let err = f
            .authenticator
            .authenticate(Some(&bearer(&token)))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "User not found or inactive");

        f.registry.remove(bob.id).await;
        let err = f
            .authenticator
            .authenticate(Some(&bearer(&token)))
            .await
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 401);
    }

    #[tokio::test]
    async fn test_last_seen_failure_does_not_fail_request() {
        let f = fixture();
        let carol = Principal::new("carol", UserRole::Admin);
        f.registry.insert(carol.clone()).await;
        f.registry.fail_last_seen_updates(true);
        let token = f.sessions.issue(&carol).unwrap().token;

        let ctx = f.authenticator.authenticate(Some(&bearer(&token))).await.unwrap();
        assert!(ctx.is_admin());
    }

    #[tokio::test]
    async fn test_role_follows_registry() {
        let f = fixture();
        let dave = Principal::new("dave", UserRole::Admin);
        f.registry.insert(dave.clone()).await;
        let token = f.sessions.issue(&dave).unwrap().token;

        f.registry.set_role(dave.id, UserRole::Normal).await;
        let ctx = f.authenticator.authenticate(Some(&bearer(&token))).await.unwrap();
        assert_eq!(ctx.role, UserRole::Normal);
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer  abc"), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }
}
