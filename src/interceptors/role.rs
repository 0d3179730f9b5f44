use async_trait::async_trait;
use turnate_error::AppError;
use turnate_types::UserRole;

use super::{Interceptor, RequestFacts, Verdict};

/// Requires an authenticated caller with a specific role
///
/// Must sit behind session authentication; an anonymous request is
/// rejected as unauthenticated.
#[derive(Debug, Clone, Copy)]
pub struct RequireRole {
    role: UserRole,
}

impl RequireRole {
    pub fn new(role: UserRole) -> Self {
        Self { role }
    }

    pub fn admin() -> Self {
        Self::new(UserRole::Admin)
    }

    fn denial(&self) -> AppError {
        match self.role {
            UserRole::Admin => AppError::forbidden("Admin access required"),
            UserRole::Normal => AppError::forbidden("Insufficient role"),
        }
    }
}

#[async_trait]
impl Interceptor for RequireRole {
    fn name(&self) -> &'static str {
        "require_role"
    }

    async fn inspect(&self, facts: &mut RequestFacts) -> Verdict {
        match &facts.auth {
            Some(ctx) if ctx.role == self.role => Verdict::Continue,
            Some(ctx) => {
                tracing::info!(
                    required = %self.role,
                    actual = %ctx.role,
                    path = %facts.path,
                    "Role check failed"
                );
                Verdict::Terminate(self.denial())
            }
            None => Verdict::Terminate(AppError::unauthenticated("Authentication required")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use turnate_types::AuthContext;
    use uuid::Uuid;

    fn facts(role: Option<UserRole>) -> RequestFacts {
        let facts = RequestFacts::new(Method::GET, "/admin/stats");
        match role {
            Some(role) => facts.with_auth(AuthContext {
                user_id: Uuid::new_v4(),
                username: "someone".into(),
                role,
            }),
            None => facts,
        }
    }

    #[tokio::test]
    async fn test_admin_gate() {
        let gate = RequireRole::admin();

        assert!(gate
            .inspect(&mut facts(Some(UserRole::Admin)))
            .await
            .is_continue());

        match gate.inspect(&mut facts(Some(UserRole::Normal))).await {
            Verdict::Terminate(err) => {
                assert_eq!(err.status_code().as_u16(), 403);
                assert_eq!(err.user_message(), "Admin access required");
            }
            Verdict::Continue => panic!("normal user passed admin gate"),
        }

        match gate.inspect(&mut facts(None)).await {
            Verdict::Terminate(err) => assert_eq!(err.status_code().as_u16(), 401),
            Verdict::Continue => panic!("anonymous request passed admin gate"),
        }
    }
}
