use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        maintenance::{CleanupReport, EnforceMaxTeamsReport},
        matches::{
            CreateMatchRequest, MatchResultRequest, MatchStatRequest, MatchStatSummary,
            MatchSummary,
        },
        registration::{ApprovalResponse, RegistrationSummary, RejectRegistrationRequest},
        session::{
            CreateSessionRequest, SessionSummary, StartSessionResponse, StopSessionResponse,
        },
    },
    error::AppError,
    services::{
        maintenance_service, match_service, registration_service, session_service,
    },
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Organizer endpoints: scheduling, lifecycle, registration decisions, and match records.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}/start", post(start_session))
        .route("/sessions/{id}/stop", post(stop_session))
        .route("/sessions/{id}/matches", post(create_match))
        .route("/registrations/{id}/approve", post(approve_registration))
        .route("/registrations/{id}/reject", post(reject_registration))
        .route("/matches/{id}/result", put(set_match_result))
        .route("/matches/{id}/stats", post(record_match_stat))
        .route(
            "/admin/maintenance/enforce-max-teams",
            post(enforce_max_teams),
        )
        .route(
            "/admin/maintenance/cleanup-pool-teams",
            post(cleanup_pool_teams),
        )
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Schedule a new session.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Organizer token")),
    request_body = CreateSessionRequest,
    responses((status = 201, description = "Session created", body = SessionSummary))
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionSummary>), AppError> {
    let summary = session_service::create_session(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Start a planned session and form its rosters.
#[utoipa::path(
    post,
    path = "/sessions/{id}/start",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Organizer token"),
    ("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session started", body = StartSessionResponse),
        (status = 409, description = "Session is not planned")
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StartSessionResponse>, AppError> {
    Ok(Json(session_service::start_session(&state, id).await?))
}

/// Finish a running session and freeze its final standings.
#[utoipa::path(
    post,
    path = "/sessions/{id}/stop",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Organizer token"),
    ("id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Session finished", body = StopSessionResponse),
        (status = 409, description = "Session is not running")
    )
)]
pub async fn stop_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StopSessionResponse>, AppError> {
    Ok(Json(session_service::stop_session(&state, id).await?))
}

/// Approve a pending registration and place its subject.
#[utoipa::path(
    post,
    path = "/registrations/{id}/approve",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Organizer token"),
    ("id" = String, Path, description = "Registration identifier")),
    responses(
        (status = 200, description = "Registration approved and placed", body = ApprovalResponse),
        (status = 409, description = "Capacity exhausted or registration already decided")
    )
)]
pub async fn approve_registration(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApprovalResponse>, AppError> {
    Ok(Json(
        registration_service::approve_registration(&state, id).await?,
    ))
}

/// Reject a pending registration with an optional reason.
#[utoipa::path(
    post,
    path = "/registrations/{id}/reject",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Organizer token"),
    ("id" = String, Path, description = "Registration identifier")),
    request_body = RejectRegistrationRequest,
    responses((status = 200, description = "Registration rejected", body = RegistrationSummary))
)]
pub async fn reject_registration(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<RejectRegistrationRequest>>,
) -> Result<Json<RegistrationSummary>, AppError> {
    Ok(Json(
        registration_service::reject_registration(&state, id, payload).await?,
    ))
}

/// Schedule a match between two locked rosters.
#[utoipa::path(
    post,
    path = "/sessions/{id}/matches",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Organizer token"),
    ("id" = String, Path, description = "Session identifier")),
    request_body = CreateMatchRequest,
    responses((status = 201, description = "Match created", body = MatchSummary))
)]
pub async fn create_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<CreateMatchRequest>>,
) -> Result<(StatusCode, Json<MatchSummary>), AppError> {
    let summary = match_service::create_match(&state, id, payload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Record the score or result tag of a match.
#[utoipa::path(
    put,
    path = "/matches/{id}/result",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Organizer token"),
    ("id" = String, Path, description = "Match identifier")),
    request_body = MatchResultRequest,
    responses((status = 200, description = "Result recorded", body = MatchSummary))
)]
pub async fn set_match_result(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<MatchResultRequest>>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(match_service::set_match_result(&state, id, payload).await?))
}

/// Add goals or assists for one participant of a match.
#[utoipa::path(
    post,
    path = "/matches/{id}/stats",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Organizer token"),
    ("id" = String, Path, description = "Match identifier")),
    request_body = MatchStatRequest,
    responses((status = 200, description = "Stat row after the update", body = MatchStatSummary))
)]
pub async fn record_match_stat(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<MatchStatRequest>>,
) -> Result<Json<MatchStatSummary>, AppError> {
    Ok(Json(
        match_service::record_match_stat(&state, id, payload).await?,
    ))
}

/// Unlock rosters beyond each session's `max_teams`.
#[utoipa::path(
    post,
    path = "/admin/maintenance/enforce-max-teams",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Organizer token")),
    responses((status = 200, description = "Sessions trimmed to their roster limit", body = EnforceMaxTeamsReport))
)]
pub async fn enforce_max_teams(
    State(state): State<SharedState>,
) -> Result<Json<EnforceMaxTeamsReport>, AppError> {
    Ok(Json(maintenance_service::enforce_max_teams(&state).await?))
}

/// Delete pool teams that no longer hold a slot.
#[utoipa::path(
    post,
    path = "/admin/maintenance/cleanup-pool-teams",
    tag = "organizer",
    params(("X-Admin-Token" = String, Header, description = "Organizer token")),
    responses((status = 200, description = "Orphan pool teams deleted", body = CleanupReport))
)]
pub async fn cleanup_pool_teams(
    State(state): State<SharedState>,
) -> Result<Json<CleanupReport>, AppError> {
    Ok(Json(maintenance_service::cleanup_pool_teams(&state).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config().admin_token.as_deref() else {
        return Err(AppError::Unauthorized(
            "organizer routes are disabled (no token configured)".into(),
        ));
    };

    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    if provided == expected {
        Ok(next.run(req).await)
    } else {
        Err(AppError::Unauthorized("invalid admin token".into()))
    }
}
