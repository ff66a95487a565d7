//! Organizer maintenance jobs repairing roster data written outside the normal flow.

use std::time::SystemTime;

use tracing::{info, warn};

use crate::{
    dao::{
        models::{TeamEntity, TeamOrigin},
        roster_store::RosterStore,
    },
    dto::maintenance::{CleanupReport, EnforceMaxTeamsReport, UnlockedTeam},
    error::ServiceError,
    services::roster_service::{self, LockedRoster},
    state::SharedState,
};

async fn delete_team_with_members(
    store: &dyn RosterStore,
    team: &TeamEntity,
) -> Result<(), ServiceError> {
    for member in store.list_members(team.id).await? {
        store.remove_member(team.id, member.participant_id).await?;
    }
    store.delete_team(team.id).await?;
    Ok(())
}

/// Unlock rosters beyond `max_teams` in every session. Locks whose team no longer exists
/// are released first. Captain-created teams are kept ahead of pool teams, each group in
/// lock order; dropped pool teams are deleted.
pub async fn enforce_max_teams(state: &SharedState) -> Result<EnforceMaxTeamsReport, ServiceError> {
    let store = state.require_store().await?;
    let mut report = EnforceMaxTeamsReport::default();

    for session in store.list_sessions().await? {
        let gate = state.session_gate(session.id);
        let _guard = gate.lock().await;

        let rosters = roster_service::load_rosters(store.as_ref(), session.id).await?;
        let max_teams = session.max_teams as usize;
        let mut trimmed = false;

        for lock in store.list_session_teams(session.id).await? {
            if rosters.iter().all(|roster| roster.team.id != lock.team_id) {
                store.unlock_team(session.id, lock.team_id).await?;
                warn!(session_id = %session.id, team_id = %lock.team_id, "released dangling lock");
                report.unlocked.push(UnlockedTeam {
                    session_id: session.id,
                    team_id: lock.team_id,
                });
                trimmed = true;
            }
        }

        if rosters.len() > max_teams {
            let (mut ordered, pools): (Vec<LockedRoster>, Vec<LockedRoster>) =
                rosters.into_iter().partition(|roster| !roster.is_pool());
            ordered.extend(pools);

            for roster in ordered.iter().skip(max_teams) {
                store.unlock_team(session.id, roster.team.id).await?;
                report.unlocked.push(UnlockedTeam {
                    session_id: session.id,
                    team_id: roster.team.id,
                });
                if roster.is_pool() {
                    delete_team_with_members(store.as_ref(), &roster.team).await?;
                    report.deleted_pool_teams.push(roster.team.id);
                }
            }

            warn!(
                session_id = %session.id,
                max_teams,
                removed = ordered.len() - max_teams,
                "session held too many rosters; trimmed"
            );
            trimmed = true;
        }

        if !trimmed {
            continue;
        }
        state.cache().invalidate(session.id);
        report.sessions_trimmed += 1;
    }

    info!(
        sessions = report.sessions_trimmed,
        unlocked = report.unlocked.len(),
        "max teams enforced"
    );
    Ok(report)
}

/// Delete pool teams that no longer hold a slot in any session. Teams younger than the
/// configured grace period are left alone while their creation may still be in flight.
pub async fn cleanup_pool_teams(state: &SharedState) -> Result<CleanupReport, ServiceError> {
    let store = state.require_store().await?;
    let grace = state.config().pool_cleanup_grace;
    let now = SystemTime::now();
    let mut report = CleanupReport::default();

    for team in store.list_teams().await? {
        if team.origin != TeamOrigin::PoolGenerated {
            continue;
        }
        let settled = now
            .duration_since(team.created_at)
            .is_ok_and(|age| age >= grace);
        if !settled {
            continue;
        }
        if !store.list_locks_for_team(team.id).await?.is_empty() {
            continue;
        }
        delete_team_with_members(store.as_ref(), &team).await?;
        report.deleted_team_ids.push(team.id);
    }

    info!(deleted = report.deleted_team_ids.len(), "orphan pool teams cleaned up");
    Ok(report)
}
