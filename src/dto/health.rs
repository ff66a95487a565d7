use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Clients currently attached to the public SSE stream.
    pub sse_subscribers: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(sse_subscribers: usize) -> Self {
        Self {
            status: "ok".to_string(),
            sse_subscribers,
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded(sse_subscribers: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            sse_subscribers,
        }
    }
}
