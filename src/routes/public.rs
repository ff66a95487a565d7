use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        registration::{RegistrationSummary, SubmitRegistrationRequest},
        session::SessionSummary,
        standings::{RosterView, StandingsView, TopPlayersView},
    },
    error::AppError,
    services::{registration_service, roster_service, session_service, standings_service},
    state::SharedState,
};

/// Session reads, standings, and registration submission.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/standings", get(get_standings))
        .route("/sessions/{id}/top-players", get(get_top_players))
        .route("/sessions/{id}/rosters", get(get_rosters))
        .route(
            "/sessions/{id}/registrations",
            get(list_registrations).post(submit_registration),
        )
}

/// List every session.
#[utoipa::path(
    get,
    path = "/sessions",
    tag = "sessions",
    responses((status = 200, description = "Known sessions", body = [SessionSummary]))
)]
pub async fn list_sessions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    Ok(Json(session_service::list_sessions(&state).await?))
}

/// Fetch a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session", body = SessionSummary),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(session_service::get_session(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/standings",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    responses((status = 200, description = "Session table", body = StandingsView))
)]
/// Return the table of a session, recomputing it when no snapshot is cached.
pub async fn get_standings(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StandingsView>, AppError> {
    Ok(Json(standings_service::get_standings(&state, id).await?))
}

/// Top scorers and assisters of a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}/top-players",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    responses((status = 200, description = "Top scorers and assist providers", body = TopPlayersView))
)]
pub async fn get_top_players(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TopPlayersView>, AppError> {
    Ok(Json(standings_service::get_top_players(&state, id).await?))
}

/// Locked rosters of a session in lock order.
#[utoipa::path(
    get,
    path = "/sessions/{id}/rosters",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier")),
    responses((status = 200, description = "Locked rosters in lock order", body = [RosterView]))
)]
pub async fn get_rosters(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RosterView>>, AppError> {
    Ok(Json(roster_service::rosters(&state, id).await?))
}

/// Registrations of a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}/registrations",
    tag = "registrations",
    params(("id" = String, Path, description = "Session identifier")),
    responses((status = 200, description = "Registrations in submission order", body = [RegistrationSummary]))
)]
pub async fn list_registrations(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RegistrationSummary>>, AppError> {
    Ok(Json(
        registration_service::list_registrations(&state, id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/registrations",
    tag = "registrations",
    params(("id" = String, Path, description = "Session identifier")),
    request_body = SubmitRegistrationRequest,
    responses(
        (status = 201, description = "Registration pending approval", body = RegistrationSummary),
        (status = 409, description = "Session full, wrong team size, or duplicate")
    )
)]
/// Register a team (captain only) or an individual for a session.
pub async fn submit_registration(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<SubmitRegistrationRequest>>,
) -> Result<(StatusCode, Json<RegistrationSummary>), AppError> {
    let summary = registration_service::submit_registration(&state, id, payload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}
