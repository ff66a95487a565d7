use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::SessionEntity,
    dto::{
        sse::{
            RostersLockedEvent, ServerEvent, SessionStatusEvent, StandingsUpdatedEvent,
            SystemStatus,
        },
        standings::{StandingsView, TopPlayersView},
    },
    state::{SharedState, cache::StandingsSnapshot},
};

const EVENT_SESSION_STATUS: &str = "session.status";
const EVENT_ROSTERS_LOCKED: &str = "rosters.locked";
const EVENT_STANDINGS_UPDATED: &str = "standings.updated";
const EVENT_SYSTEM_STATUS: &str = "system_status";

/// Broadcast the current lifecycle status of a session.
pub fn broadcast_session_status(state: &SharedState, session: &SessionEntity) {
    let payload = SessionStatusEvent {
        session_id: session.id,
        status: session.status,
    };
    send_public_event(state, EVENT_SESSION_STATUS, &payload);
}

/// Broadcast rosters that were just locked. Nothing is sent for an empty list.
pub fn broadcast_rosters_locked(state: &SharedState, session_id: Uuid, team_ids: &[Uuid]) {
    if team_ids.is_empty() {
        return;
    }
    let payload = RostersLockedEvent {
        session_id,
        team_ids: team_ids.to_vec(),
    };
    send_public_event(state, EVENT_ROSTERS_LOCKED, &payload);
}

/// Broadcast a freshly computed standings snapshot.
pub fn broadcast_standings(state: &SharedState, snapshot: &StandingsSnapshot) {
    let payload = StandingsUpdatedEvent {
        standings: StandingsView::from(snapshot),
        top_players: TopPlayersView::from(snapshot),
    };
    send_public_event(state, EVENT_STANDINGS_UPDATED, &payload);
}

/// Broadcast a change of the degraded flag.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_public_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
