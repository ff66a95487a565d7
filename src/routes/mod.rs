use axum::Router;

use crate::state::SharedState;

/// Organizer routes behind the admin token.
pub mod admin;
/// OpenAPI document and Swagger UI.
pub mod docs;
/// Liveness and storage health.
pub mod health;
/// Participant identity routes.
pub mod participants;
/// Public session reads and registration submission.
pub mod public;
/// Server-sent event streams.
pub mod sse;
/// Team management routes.
pub mod teams;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(public::router())
        .merge(participants::router())
        .merge(teams::router())
        .merge(admin::router(state.clone()));

    api_router.merge(docs::router()).with_state(state)
}
