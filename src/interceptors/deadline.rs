use std::future::Future;
use std::time::Duration;

use axum::response::{IntoResponse, Response};
use turnate_error::AppError;
use turnate_metrics::REQUEST_TIMEOUTS;

/// Upper bound on the remainder of a chain plus its handler
///
/// When the limit passes, the in-flight work is dropped and a timeout
/// rejection is returned in its place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    limit: Duration,
}

impl Deadline {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub async fn enforce<F>(&self, work: F) -> Response
    where
        F: Future<Output = Response>,
    {
        match tokio::time::timeout(self.limit, work).await {
            Ok(response) => response,
            Err(_) => {
                REQUEST_TIMEOUTS.inc();
                tracing::warn!(
                    limit_ms = self.limit.as_millis() as u64,
                    "Request exceeded deadline"
                );
                AppError::Timeout.into_response()
            }
        }
    }
}
