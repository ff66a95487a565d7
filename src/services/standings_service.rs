//! Standings and leaderboards. Snapshots are recomputed from the stored match records and
//! replace the cached one wholesale; nothing is ever patched incrementally.

use std::{sync::Arc, time::SystemTime};

use tracing::debug;
use uuid::Uuid;

use crate::{
    dto::{
        participant::PlayerStatsResponse,
        standings::{StandingsView, TopPlayersView},
    },
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        cache::StandingsSnapshot,
        standings::{compute_table, player_aggregate, top_players},
    },
};

/// Invalidate, recompute, write the totals back onto the locked rows, cache, and broadcast.
pub async fn recompute(
    state: &SharedState,
    session_id: Uuid,
) -> Result<Arc<StandingsSnapshot>, ServiceError> {
    let store = state.require_store().await?;
    state.cache().invalidate(session_id);

    let locks = store.list_session_teams(session_id).await?;
    let matches = store.list_matches(session_id).await?;
    let stats = store.list_match_stats(session_id).await?;

    let table = compute_table(&locks, &matches);
    for row in &table {
        let Some(lock) = locks.iter().find(|lock| lock.team_id == row.team_id) else {
            continue;
        };
        if lock.points == row.points
            && lock.goals_for == row.goals_for
            && lock.goals_against == row.goals_against
        {
            continue;
        }
        let mut updated = lock.clone();
        updated.points = row.points;
        updated.goals_for = row.goals_for;
        updated.goals_against = row.goals_against;
        store.update_session_team_totals(updated).await?;
    }

    let snapshot = state.cache().put(StandingsSnapshot {
        session_id,
        table,
        top_players: top_players(&stats, state.config().leaderboard_size),
        computed_at: SystemTime::now(),
    });
    debug!(%session_id, teams = snapshot.table.len(), "standings recomputed");
    sse_events::broadcast_standings(state, &snapshot);
    Ok(snapshot)
}

/// Cached snapshot, recomputed on a miss.
async fn snapshot(
    state: &SharedState,
    session_id: Uuid,
) -> Result<Arc<StandingsSnapshot>, ServiceError> {
    let store = state.require_store().await?;
    if store.find_session(session_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "session `{session_id}` not found"
        )));
    }
    match state.cache().get(session_id) {
        Some(snapshot) => Ok(snapshot),
        None => recompute(state, session_id).await,
    }
}

/// Standings of a session, served from cache when fresh.
pub async fn get_standings(
    state: &SharedState,
    session_id: Uuid,
) -> Result<StandingsView, ServiceError> {
    let snapshot = snapshot(state, session_id).await?;
    Ok(StandingsView::from(snapshot.as_ref()))
}

/// Top scorers and assisters of a session.
pub async fn get_top_players(
    state: &SharedState,
    session_id: Uuid,
) -> Result<TopPlayersView, ServiceError> {
    let snapshot = snapshot(state, session_id).await?;
    Ok(TopPlayersView::from(snapshot.as_ref()))
}

/// Career aggregate of one participant across all sessions.
pub async fn player_stats(
    state: &SharedState,
    participant_id: Uuid,
) -> Result<PlayerStatsResponse, ServiceError> {
    let store = state.require_store().await?;
    if store.find_participant(participant_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "participant `{participant_id}` not found"
        )));
    }
    let stats = store.list_participant_stats(participant_id).await?;
    Ok(PlayerStatsResponse::new(
        participant_id,
        player_aggregate(&stats),
    ))
}
