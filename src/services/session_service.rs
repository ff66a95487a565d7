//! Session scheduling and the lifecycle transitions `Planned → Started → Finished`.

use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{SessionEntity, SessionStatus},
    dto::{
        parse_system_time,
        session::{
            CreateSessionRequest, FormationReportView, SessionSummary, StartSessionResponse,
            StopSessionResponse,
        },
        standings::StandingsView,
    },
    error::ServiceError,
    services::{
        notifier::{Notification, NotificationKind, notify_participants},
        roster_service, sse_events, standings_service,
    },
    state::{SharedState, lifecycle::SessionEvent},
};

/// Schedule a planned session. `max_teams` defaults from configuration.
pub async fn create_session(
    state: &SharedState,
    request: CreateSessionRequest,
) -> Result<SessionSummary, ServiceError> {
    let starts_at = parse_system_time(&request.starts_at)
        .map_err(|err| ServiceError::InvalidInput(format!("invalid starts_at: {err}")))?;
    let ends_at = parse_system_time(&request.ends_at)
        .map_err(|err| ServiceError::InvalidInput(format!("invalid ends_at: {err}")))?;
    if ends_at <= starts_at {
        return Err(ServiceError::InvalidInput(
            "session must end after it starts".into(),
        ));
    }

    let store = state.require_store().await?;
    let config = state.config();
    let now = SystemTime::now();
    let session = SessionEntity {
        id: Uuid::new_v4(),
        kind: request.kind,
        starts_at,
        ends_at,
        max_teams: request.max_teams.unwrap_or(config.default_max_teams),
        squad_size: config.squad_size(request.kind),
        status: SessionStatus::Planned,
        reminders: Default::default(),
        created_at: now,
        updated_at: now,
    };
    store.save_session(session.clone()).await?;
    info!(
        session_id = %session.id,
        kind = ?session.kind,
        max_teams = session.max_teams,
        squad_size = session.squad_size,
        "session created"
    );

    sse_events::broadcast_session_status(state, &session);
    Ok(SessionSummary::new(&session, 0))
}

/// All sessions with their locked roster count.
pub async fn list_sessions(state: &SharedState) -> Result<Vec<SessionSummary>, ServiceError> {
    let store = state.require_store().await?;
    let sessions = store.list_sessions().await?;

    let mut summaries = Vec::with_capacity(sessions.len());
    for session in sessions {
        let locked = store.list_session_teams(session.id).await?.len();
        summaries.push(SessionSummary::new(&session, locked));
    }
    Ok(summaries)
}

/// One session with its locked roster count.
pub async fn get_session(state: &SharedState, id: Uuid) -> Result<SessionSummary, ServiceError> {
    let store = state.require_store().await?;
    let Some(session) = store.find_session(id).await? else {
        return Err(ServiceError::NotFound(format!("session `{id}` not found")));
    };
    let locked = store.list_session_teams(id).await?.len();
    Ok(SessionSummary::new(&session, locked))
}

/// Start a planned session. Roster formation runs as the work of the transition, so a
/// failed formation leaves the session `Planned`.
pub async fn start_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<StartSessionResponse, ServiceError> {
    let store = state.require_store().await?;
    let (report, session) = state
        .run_transition(session_id, SessionEvent::Start, |session| {
            let store = store.clone();
            async move { roster_service::form_rosters(store.as_ref(), &session).await }
        })
        .await?;

    sse_events::broadcast_session_status(state, &session);
    sse_events::broadcast_rosters_locked(state, session_id, &report.newly_locked);

    let rosters = roster_service::load_rosters(store.as_ref(), session_id).await?;
    let placed: Vec<Uuid> = rosters
        .iter()
        .filter(|roster| report.newly_locked.contains(&roster.team.id))
        .flat_map(|roster| roster.members.iter().map(|member| member.participant_id))
        .collect();
    notify_participants(
        state,
        &placed,
        Notification::new(
            NotificationKind::RosterLocked,
            Some(session_id),
            "Your roster is locked. See you on the pitch!",
        ),
    )
    .await;
    notify_participants(
        state,
        &report.unplaced_participants,
        Notification::new(
            NotificationKind::NotPlaced,
            Some(session_id),
            "The session is full and you could not be placed on a roster.",
        ),
    )
    .await;

    if let Err(err) = standings_service::recompute(state, session_id).await {
        warn!(%session_id, error = %err, "failed to compute initial standings");
    }

    let locked = roster_service::slots_used(store.as_ref(), session_id).await?;
    Ok(StartSessionResponse {
        session: SessionSummary::new(&session, locked),
        formation: FormationReportView::from(&report),
    })
}

/// Finish a running session. Final standings are computed before the status is
/// persisted; afterwards the session accepts no more match updates.
pub async fn stop_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<StopSessionResponse, ServiceError> {
    let (snapshot, session) = state
        .run_transition(session_id, SessionEvent::Stop, |session| async move {
            standings_service::recompute(state, session.id).await
        })
        .await?;

    sse_events::broadcast_session_status(state, &session);

    let store = state.require_store().await?;
    let rosters = roster_service::load_rosters(store.as_ref(), session_id).await?;
    let players: Vec<Uuid> = rosters
        .iter()
        .flat_map(|roster| roster.members.iter().map(|member| member.participant_id))
        .collect();
    notify_participants(
        state,
        &players,
        Notification::new(
            NotificationKind::SessionFinished,
            Some(session_id),
            "The session is over. Final standings are available.",
        ),
    )
    .await;

    let locked = roster_service::slots_used(store.as_ref(), session_id).await?;
    Ok(StopSessionResponse {
        session: SessionSummary::new(&session, locked),
        standings: StandingsView::from(snapshot.as_ref()),
    })
}
