//! Match records and per-player events of a running session.

use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{MatchEntity, MatchStatDelta, SessionEntity, SessionStatus},
        roster_store::RosterStore,
    },
    dto::matches::{
        CreateMatchRequest, MatchResultRequest, MatchStatRequest, MatchStatSummary, MatchSummary,
    },
    error::ServiceError,
    services::standings_service,
    state::SharedState,
};

async fn running_session(
    store: &dyn RosterStore,
    session_id: Uuid,
) -> Result<SessionEntity, ServiceError> {
    let session = store
        .find_session(session_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?;
    match session.status {
        SessionStatus::Started => Ok(session),
        SessionStatus::Planned => Err(ServiceError::InvalidState(format!(
            "session `{session_id}` has not started"
        ))),
        SessionStatus::Finished => Err(ServiceError::InvalidState(format!(
            "session `{session_id}` is finished"
        ))),
    }
}

async fn find_match(store: &dyn RosterStore, match_id: Uuid) -> Result<MatchEntity, ServiceError> {
    store
        .find_match(match_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match `{match_id}` not found")))
}

/// Schedule a match between two rosters locked in a running session.
pub async fn create_match(
    state: &SharedState,
    session_id: Uuid,
    request: CreateMatchRequest,
) -> Result<MatchSummary, ServiceError> {
    if request.home_team_id == request.away_team_id {
        return Err(ServiceError::InvalidInput(
            "a team cannot play against itself".into(),
        ));
    }

    let store = state.require_store().await?;
    running_session(store.as_ref(), session_id).await?;

    let locks = store.list_session_teams(session_id).await?;
    for team_id in [request.home_team_id, request.away_team_id] {
        if !locks.iter().any(|lock| lock.team_id == team_id) {
            return Err(ServiceError::InvalidInput(format!(
                "team `{team_id}` is not locked in session `{session_id}`"
            )));
        }
    }

    let now = SystemTime::now();
    let record = MatchEntity {
        id: Uuid::new_v4(),
        session_id,
        home_team_id: request.home_team_id,
        away_team_id: request.away_team_id,
        home_score: None,
        away_score: None,
        result: None,
        created_at: now,
        updated_at: now,
    };
    store.save_match(record.clone()).await?;
    info!(%session_id, match_id = %record.id, "match created");

    standings_service::recompute(state, session_id).await?;
    Ok(record.into())
}

/// Record scores and the result tag of a match. Both are stored as given.
pub async fn set_match_result(
    state: &SharedState,
    match_id: Uuid,
    request: MatchResultRequest,
) -> Result<MatchSummary, ServiceError> {
    let store = state.require_store().await?;
    let mut record = find_match(store.as_ref(), match_id).await?;
    running_session(store.as_ref(), record.session_id).await?;

    record.home_score = request.home_score;
    record.away_score = request.away_score;
    record.result = request.result;
    record.updated_at = SystemTime::now();
    store.save_match(record.clone()).await?;
    info!(
        %match_id,
        home = ?record.home_score,
        away = ?record.away_score,
        result = ?record.result,
        "match result recorded"
    );

    standings_service::recompute(state, record.session_id).await?;
    Ok(record.into())
}

/// Add goals and assists for a participant of a match, creating the row on first use.
pub async fn record_match_stat(
    state: &SharedState,
    match_id: Uuid,
    request: MatchStatRequest,
) -> Result<MatchStatSummary, ServiceError> {
    let store = state.require_store().await?;
    let record = find_match(store.as_ref(), match_id).await?;
    running_session(store.as_ref(), record.session_id).await?;

    if store.find_participant(request.participant_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "participant `{}` not found",
            request.participant_id
        )));
    }

    let stat = store
        .apply_match_stat(MatchStatDelta {
            match_id,
            session_id: record.session_id,
            participant_id: request.participant_id,
            goals: request.goals,
            assists: request.assists,
            won: request.won,
        })
        .await?;
    info!(
        %match_id,
        participant_id = %stat.participant_id,
        goals = stat.goals,
        assists = stat.assists,
        "match stat recorded"
    );

    standings_service::recompute(state, record.session_id).await?;
    Ok(stat.into())
}
