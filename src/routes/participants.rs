use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::participant::{
        ChannelRequest, CredentialsRequest, LoginRequest, ParticipantSummary, PhoneRequest,
        PlayerStatsResponse,
    },
    error::AppError,
    services::{identity_service, standings_service},
    state::SharedState,
};

/// Identity endpoints called by the chat front-end on behalf of participants.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/participants/channel", post(ensure_participant))
        .route("/participants/login", post(login))
        .route("/participants/{id}", get(get_participant))
        .route("/participants/{id}/phone", post(register_phone))
        .route("/participants/{id}/credentials", post(set_credentials))
        .route("/participants/{id}/stats", get(player_stats))
}

#[utoipa::path(
    post,
    path = "/participants/channel",
    tag = "participants",
    request_body = ChannelRequest,
    responses((status = 200, description = "Participant linked to the channel", body = ParticipantSummary))
)]
/// Return the participant behind a chat channel, creating it on first contact.
pub async fn ensure_participant(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ChannelRequest>>,
) -> Result<Json<ParticipantSummary>, AppError> {
    Ok(Json(
        identity_service::ensure_participant(&state, payload).await?,
    ))
}

/// Fetch a participant.
#[utoipa::path(
    get,
    path = "/participants/{id}",
    tag = "participants",
    params(("id" = String, Path, description = "Participant identifier")),
    responses((status = 200, description = "Participant", body = ParticipantSummary))
)]
pub async fn get_participant(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ParticipantSummary>, AppError> {
    Ok(Json(identity_service::get_participant(&state, id).await?))
}

/// Attach a phone number, merging a placeholder that already holds it.
#[utoipa::path(
    post,
    path = "/participants/{id}/phone",
    tag = "participants",
    params(("id" = String, Path, description = "Participant identifier")),
    request_body = PhoneRequest,
    responses(
        (status = 200, description = "Phone registered, placeholders merged", body = ParticipantSummary),
        (status = 409, description = "Phone already registered")
    )
)]
pub async fn register_phone(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<PhoneRequest>>,
) -> Result<Json<ParticipantSummary>, AppError> {
    Ok(Json(
        identity_service::register_phone(&state, id, payload).await?,
    ))
}

/// Set the login handle and password.
#[utoipa::path(
    post,
    path = "/participants/{id}/credentials",
    tag = "participants",
    params(("id" = String, Path, description = "Participant identifier")),
    request_body = CredentialsRequest,
    responses((status = 200, description = "Credentials stored", body = ParticipantSummary))
)]
pub async fn set_credentials(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<CredentialsRequest>>,
) -> Result<Json<ParticipantSummary>, AppError> {
    Ok(Json(
        identity_service::set_credentials(&state, id, payload).await?,
    ))
}

/// Check a handle and password.
#[utoipa::path(
    post,
    path = "/participants/login",
    tag = "participants",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Channel linked to the participant", body = ParticipantSummary),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<LoginRequest>>,
) -> Result<Json<ParticipantSummary>, AppError> {
    Ok(Json(identity_service::login(&state, payload).await?))
}

/// Career totals of a participant.
#[utoipa::path(
    get,
    path = "/participants/{id}/stats",
    tag = "participants",
    params(("id" = String, Path, description = "Participant identifier")),
    responses((status = 200, description = "Career totals", body = PlayerStatsResponse))
)]
pub async fn player_stats(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerStatsResponse>, AppError> {
    Ok(Json(standings_service::player_stats(&state, id).await?))
}
