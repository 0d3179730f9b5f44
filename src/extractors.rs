// ============================================================================
// Axum Extractors
// ============================================================================
//
// - Authenticated: the caller context published by the session gate
//
// ============================================================================

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use turnate_error::AppError;
use turnate_types::AuthContext;

/// Extractor for the authenticated caller
///
/// Only available on routes behind the API chain; anywhere else it rejects
/// with 401.
///
/// ```rust,ignore
/// async fn handler(Authenticated(caller): Authenticated) -> impl IntoResponse {
///     caller.username
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Authenticated)
            .ok_or_else(|| AppError::unauthenticated("Authentication required"))
    }
}
