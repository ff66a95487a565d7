//! Captain-managed teams: membership, placeholders, and invite tokens.

use std::time::SystemTime;

use rand::{Rng, distr::Alphanumeric, rng};
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{
            MemberRole, SessionStatus, TeamEntity, TeamInvite, TeamMemberEntity, TeamOrigin,
        },
        roster_store::RosterStore,
    },
    dto::{
        format_system_time,
        team::{AddMemberRequest, CreateTeamRequest, InviteResponse, JoinTeamRequest, TeamSummary},
    },
    error::ServiceError,
    services::identity_service::{normalize_phone, placeholder},
    state::SharedState,
};

const INVITE_TOKEN_LEN: usize = 12;

fn invite_token() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(INVITE_TOKEN_LEN)
        .map(char::from)
        .collect()
}

async fn find_team(store: &dyn RosterStore, team_id: Uuid) -> Result<TeamEntity, ServiceError> {
    store
        .find_team(team_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))
}

fn ensure_captain(team: &TeamEntity, actor_id: Uuid) -> Result<(), ServiceError> {
    if team.captain_id != actor_id {
        return Err(ServiceError::Unauthorized(
            "only the captain can manage the team".into(),
        ));
    }
    Ok(())
}

/// Membership is frozen while the team holds a slot in a session that has not finished.
async fn ensure_not_frozen(store: &dyn RosterStore, team_id: Uuid) -> Result<(), ServiceError> {
    for lock in store.list_locks_for_team(team_id).await? {
        let Some(session) = store.find_session(lock.session_id).await? else {
            continue;
        };
        if session.status != SessionStatus::Finished {
            return Err(ServiceError::InvalidState(format!(
                "team is locked into session `{}`",
                session.id
            )));
        }
    }
    Ok(())
}

async fn summary(store: &dyn RosterStore, team: TeamEntity) -> Result<TeamSummary, ServiceError> {
    let members = store.list_members(team.id).await?;
    Ok(TeamSummary::new(team, members))
}

/// Create a captain-led team with the captain as its first member.
pub async fn create_team(
    state: &SharedState,
    request: CreateTeamRequest,
) -> Result<TeamSummary, ServiceError> {
    let store = state.require_store().await?;
    if store.find_participant(request.captain_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "participant `{}` not found",
            request.captain_id
        )));
    }

    let now = SystemTime::now();
    let team = TeamEntity {
        id: Uuid::new_v4(),
        name: request.name.trim().to_string(),
        captain_id: request.captain_id,
        origin: TeamOrigin::CaptainCreated,
        invite: None,
        created_at: now,
    };
    store.save_team(team.clone()).await?;
    store
        .add_member(TeamMemberEntity {
            team_id: team.id,
            participant_id: team.captain_id,
            role: MemberRole::Captain,
            joined_at: now,
        })
        .await?;
    info!(team_id = %team.id, captain_id = %team.captain_id, "team created");

    summary(store.as_ref(), team).await
}

/// Team with its members.
pub async fn get_team(state: &SharedState, team_id: Uuid) -> Result<TeamSummary, ServiceError> {
    let store = state.require_store().await?;
    let team = find_team(store.as_ref(), team_id).await?;
    summary(store.as_ref(), team).await
}

/// Add a teammate. A known phone reuses its participant; anything else becomes a placeholder
/// that merges once the real person registers that phone.
pub async fn add_member(
    state: &SharedState,
    team_id: Uuid,
    request: AddMemberRequest,
) -> Result<TeamSummary, ServiceError> {
    let store = state.require_store().await?;
    let team = find_team(store.as_ref(), team_id).await?;
    ensure_captain(&team, request.actor_id)?;
    if team.origin == TeamOrigin::PoolGenerated {
        return Err(ServiceError::InvalidState(
            "pool teams are managed by the organizer".into(),
        ));
    }
    ensure_not_frozen(store.as_ref(), team_id).await?;

    let phone = request.phone.as_deref().map(normalize_phone).transpose()?;
    let existing = match &phone {
        Some(phone) => store
            .find_participants_by_phone(phone.clone())
            .await?
            .into_iter()
            .next(),
        None => None,
    };
    let participant_id = match existing {
        Some(participant) => participant.id,
        None => {
            let created = placeholder(&request.display_name, phone);
            store.save_participant(created.clone()).await?;
            info!(participant_id = %created.id, %team_id, "placeholder created");
            created.id
        }
    };

    let added = store
        .add_member(TeamMemberEntity {
            team_id,
            participant_id,
            role: MemberRole::Player,
            joined_at: SystemTime::now(),
        })
        .await?;
    if !added {
        return Err(ServiceError::Conflict(
            "participant is already a member of the team".into(),
        ));
    }
    info!(%team_id, %participant_id, "member added");

    summary(store.as_ref(), team).await
}

/// Captain removes a member. The captain cannot be removed.
pub async fn remove_member(
    state: &SharedState,
    team_id: Uuid,
    participant_id: Uuid,
    actor_id: Uuid,
) -> Result<TeamSummary, ServiceError> {
    let store = state.require_store().await?;
    let team = find_team(store.as_ref(), team_id).await?;
    ensure_captain(&team, actor_id)?;
    if participant_id == team.captain_id {
        return Err(ServiceError::InvalidInput(
            "the captain cannot be removed".into(),
        ));
    }
    ensure_not_frozen(store.as_ref(), team_id).await?;

    if !store.remove_member(team_id, participant_id).await? {
        return Err(ServiceError::NotFound(format!(
            "participant `{participant_id}` is not a member of team `{team_id}`"
        )));
    }
    info!(%team_id, %participant_id, "member removed");

    summary(store.as_ref(), team).await
}

/// Issue a fresh invite token, replacing any previous one.
pub async fn generate_invite(
    state: &SharedState,
    team_id: Uuid,
    actor_id: Uuid,
) -> Result<InviteResponse, ServiceError> {
    let store = state.require_store().await?;
    let mut team = find_team(store.as_ref(), team_id).await?;
    ensure_captain(&team, actor_id)?;

    let invite = TeamInvite {
        token: invite_token(),
        expires_at: SystemTime::now() + state.config().invite_ttl,
    };
    team.invite = Some(invite.clone());
    store.save_team(team).await?;
    info!(%team_id, "invite generated");

    Ok(InviteResponse {
        team_id,
        token: invite.token,
        expires_at: format_system_time(invite.expires_at),
    })
}

/// Join a team through an unexpired invite. Joining twice is a no-op.
pub async fn join_by_invite(
    state: &SharedState,
    request: JoinTeamRequest,
) -> Result<TeamSummary, ServiceError> {
    let store = state.require_store().await?;
    let Some(team) = store
        .find_team_by_invite(request.token.trim().to_string())
        .await?
    else {
        return Err(ServiceError::NotFound("invite not found".into()));
    };
    let expired = team
        .invite
        .as_ref()
        .is_none_or(|invite| invite.expires_at <= SystemTime::now());
    if expired {
        return Err(ServiceError::InvalidState("invite has expired".into()));
    }
    if store.find_participant(request.participant_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "participant `{}` not found",
            request.participant_id
        )));
    }
    ensure_not_frozen(store.as_ref(), team.id).await?;

    let added = store
        .add_member(TeamMemberEntity {
            team_id: team.id,
            participant_id: request.participant_id,
            role: MemberRole::Player,
            joined_at: SystemTime::now(),
        })
        .await?;
    if added {
        info!(team_id = %team.id, participant_id = %request.participant_id, "joined team by invite");
    }

    summary(store.as_ref(), team).await
}
