use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::team::{
        ActorQuery, AddMemberRequest, CreateTeamRequest, InviteRequest, InviteResponse,
        JoinTeamRequest, TeamSummary,
    },
    error::AppError,
    services::team_service,
    state::SharedState,
};

/// Captain-facing team management.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/teams", post(create_team))
        .route("/teams/join", post(join_team))
        .route("/teams/{id}", get(get_team))
        .route("/teams/{id}/members", post(add_member))
        .route(
            "/teams/{id}/members/{participant_id}",
            delete(remove_member),
        )
        .route("/teams/{id}/invite", post(generate_invite))
}

/// Create a team led by the calling captain.
#[utoipa::path(
    post,
    path = "/teams",
    tag = "teams",
    request_body = CreateTeamRequest,
    responses((status = 201, description = "Team created with its captain", body = TeamSummary))
)]
pub async fn create_team(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateTeamRequest>>,
) -> Result<(StatusCode, Json<TeamSummary>), AppError> {
    let summary = team_service::create_team(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Fetch a team with its members.
#[utoipa::path(
    get,
    path = "/teams/{id}",
    tag = "teams",
    params(("id" = String, Path, description = "Team identifier")),
    responses((status = 200, description = "Team with members", body = TeamSummary))
)]
pub async fn get_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamSummary>, AppError> {
    Ok(Json(team_service::get_team(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/teams/{id}/members",
    tag = "teams",
    params(("id" = String, Path, description = "Team identifier")),
    request_body = AddMemberRequest,
    responses(
        (status = 200, description = "Member added", body = TeamSummary),
        (status = 401, description = "Actor is not the captain")
    )
)]
/// Add a teammate by name and optional phone, creating a placeholder when needed.
pub async fn add_member(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<AddMemberRequest>>,
) -> Result<Json<TeamSummary>, AppError> {
    Ok(Json(team_service::add_member(&state, id, payload).await?))
}

/// Remove a member from a team (captain only).
#[utoipa::path(
    delete,
    path = "/teams/{id}/members/{participant_id}",
    tag = "teams",
    params(
        ("id" = String, Path, description = "Team identifier"),
        ("participant_id" = String, Path, description = "Member to remove"),
        ActorQuery
    ),
    responses((status = 200, description = "Member removed", body = TeamSummary))
)]
pub async fn remove_member(
    State(state): State<SharedState>,
    Path((id, participant_id)): Path<(Uuid, Uuid)>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<TeamSummary>, AppError> {
    Ok(Json(
        team_service::remove_member(&state, id, participant_id, actor.actor_id).await?,
    ))
}

/// Issue a fresh invite token (captain only).
#[utoipa::path(
    post,
    path = "/teams/{id}/invite",
    tag = "teams",
    params(("id" = String, Path, description = "Team identifier")),
    request_body = InviteRequest,
    responses((status = 200, description = "Fresh invite token", body = InviteResponse))
)]
pub async fn generate_invite(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InviteRequest>,
) -> Result<Json<InviteResponse>, AppError> {
    Ok(Json(
        team_service::generate_invite(&state, id, payload.actor_id).await?,
    ))
}

/// Join a team with an invite token.
#[utoipa::path(
    post,
    path = "/teams/join",
    tag = "teams",
    request_body = JoinTeamRequest,
    responses(
        (status = 200, description = "Joined the team", body = TeamSummary),
        (status = 404, description = "Unknown invite")
    )
)]
pub async fn join_team(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<JoinTeamRequest>>,
) -> Result<Json<TeamSummary>, AppError> {
    Ok(Json(team_service::join_by_invite(&state, payload).await?))
}
