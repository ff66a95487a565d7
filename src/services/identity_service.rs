//! Participant identity: channel bootstrap, phone registration with placeholder merge,
//! password credentials, and channel hand-over on login.

use std::time::SystemTime;

use tokio::task;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{ChannelLink, ParticipantEntity, ParticipantStatus, TeamMemberEntity},
        roster_store::RosterStore,
    },
    dto::participant::{
        ChannelRequest, CredentialsRequest, LoginRequest, ParticipantSummary, PhoneRequest,
    },
    error::ServiceError,
    state::SharedState,
};

const INVALID_CREDENTIALS: &str = "invalid handle or password";

/// Keep digits and a leading `+`.
pub fn normalize_phone(raw: &str) -> Result<String, ServiceError> {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(ServiceError::InvalidInput(
            "phone number has no digits".into(),
        ));
    }
    if trimmed.starts_with('+') {
        Ok(format!("+{digits}"))
    } else {
        Ok(digits)
    }
}

/// Build a placeholder participant created on someone else's behalf.
pub fn placeholder(display_name: &str, phone: Option<String>) -> ParticipantEntity {
    ParticipantEntity {
        id: Uuid::new_v4(),
        display_name: display_name.trim().to_string(),
        phone,
        handle: None,
        password_hash: None,
        channel: ChannelLink::Unlinked,
        status: ParticipantStatus::Placeholder,
        activated: false,
        created_at: SystemTime::now(),
    }
}

async fn find_participant(
    store: &dyn RosterStore,
    participant_id: Uuid,
) -> Result<ParticipantEntity, ServiceError> {
    store
        .find_participant(participant_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("participant `{participant_id}` not found")))
}

/// Participant linked to a chat channel, created on first contact.
pub async fn ensure_participant(
    state: &SharedState,
    request: ChannelRequest,
) -> Result<ParticipantSummary, ServiceError> {
    let store = state.require_store().await?;
    let channel_id = request.channel_id.trim().to_string();
    if let Some(existing) = store.find_participant_by_channel(channel_id.clone()).await? {
        return Ok(existing.into());
    }

    let participant = ParticipantEntity {
        id: Uuid::new_v4(),
        display_name: request.display_name.trim().to_string(),
        phone: None,
        handle: None,
        password_hash: None,
        channel: ChannelLink::Linked { channel_id },
        status: ParticipantStatus::Active,
        activated: false,
        created_at: SystemTime::now(),
    };
    store.save_participant(participant.clone()).await?;
    info!(participant_id = %participant.id, "participant created from channel");
    Ok(participant.into())
}

/// Attach `phone` to the participant. Placeholders holding the same phone are merged into
/// it; any other participant holding it is an identity conflict. Persists the participant.
pub async fn link_and_merge(
    store: &dyn RosterStore,
    participant: &mut ParticipantEntity,
    phone: String,
) -> Result<(), ServiceError> {
    let holders: Vec<ParticipantEntity> = store
        .find_participants_by_phone(phone.clone())
        .await?
        .into_iter()
        .filter(|holder| holder.id != participant.id)
        .collect();

    if holders
        .iter()
        .any(|holder| holder.status != ParticipantStatus::Placeholder)
    {
        return Err(ServiceError::Conflict("phone already registered".into()));
    }

    for holder in &holders {
        merge_placeholder(store, holder, participant.id).await?;
    }

    participant.phone = Some(phone);
    store.save_participant(participant.clone()).await?;
    Ok(())
}

/// Move every membership (and captaincy) of `placeholder` onto `into`, then delete it.
async fn merge_placeholder(
    store: &dyn RosterStore,
    placeholder: &ParticipantEntity,
    into: Uuid,
) -> Result<(), ServiceError> {
    let memberships = store.list_memberships(placeholder.id).await?;
    for membership in &memberships {
        store
            .add_member(TeamMemberEntity {
                participant_id: into,
                ..membership.clone()
            })
            .await?;
        store
            .remove_member(membership.team_id, placeholder.id)
            .await?;

        if let Some(mut team) = store.find_team(membership.team_id).await? {
            if team.captain_id == placeholder.id {
                team.captain_id = into;
                store.save_team(team).await?;
            }
        }
    }

    store.delete_participant(placeholder.id).await?;
    info!(
        placeholder_id = %placeholder.id,
        participant_id = %into,
        memberships = memberships.len(),
        "placeholder merged"
    );
    Ok(())
}

/// Link `channel_id` to the participant, severing whoever held it before. The caller
/// persists the participant.
pub async fn attach_channel(
    store: &dyn RosterStore,
    participant: &mut ParticipantEntity,
    channel_id: String,
) -> Result<(), ServiceError> {
    if let Some(mut holder) = store.find_participant_by_channel(channel_id.clone()).await? {
        if holder.id != participant.id {
            holder.channel = ChannelLink::Severed {
                previous_channel_id: channel_id.clone(),
                severed_at: SystemTime::now(),
            };
            store.save_participant(holder.clone()).await?;
            info!(
                from = %holder.id,
                to = %participant.id,
                "channel moved to another participant"
            );
        }
    }
    participant.channel = ChannelLink::Linked { channel_id };
    Ok(())
}

/// Register a phone number and activate the participant.
pub async fn register_phone(
    state: &SharedState,
    participant_id: Uuid,
    request: PhoneRequest,
) -> Result<ParticipantSummary, ServiceError> {
    let store = state.require_store().await?;
    let mut participant = find_participant(store.as_ref(), participant_id).await?;
    let phone = normalize_phone(&request.phone)?;

    participant.status = ParticipantStatus::Active;
    participant.activated = true;
    link_and_merge(store.as_ref(), &mut participant, phone).await?;
    info!(%participant_id, "phone registered");
    Ok(participant.into())
}

/// Store a login handle and bcrypt password hash.
pub async fn set_credentials(
    state: &SharedState,
    participant_id: Uuid,
    request: CredentialsRequest,
) -> Result<ParticipantSummary, ServiceError> {
    let store = state.require_store().await?;
    let mut participant = find_participant(store.as_ref(), participant_id).await?;

    let handle = request.handle.trim().to_lowercase();
    if let Some(owner) = store.find_participant_by_handle(handle.clone()).await? {
        if owner.id != participant_id {
            return Err(ServiceError::Conflict("handle already taken".into()));
        }
    }

    let cost = state.config().bcrypt_cost;
    let password = request.password;
    let hash = task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|err| ServiceError::Internal(format!("password hashing task failed: {err}")))?
        .map_err(|err| ServiceError::Internal(format!("password hashing failed: {err}")))?;

    participant.handle = Some(handle);
    participant.password_hash = Some(hash);
    store.save_participant(participant.clone()).await?;
    info!(%participant_id, "credentials updated");
    Ok(participant.into())
}

/// Verify credentials and move the calling channel onto the matching participant.
pub async fn login(
    state: &SharedState,
    request: LoginRequest,
) -> Result<ParticipantSummary, ServiceError> {
    let store = state.require_store().await?;
    let handle = request.handle.trim().to_lowercase();

    let Some(mut participant) = store.find_participant_by_handle(handle).await? else {
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
    };
    let Some(hash) = participant.password_hash.clone() else {
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    let password = request.password;
    let verified = task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| ServiceError::Internal(format!("password check task failed: {err}")))?
        .unwrap_or_else(|err| {
            warn!(error = %err, "stored password hash is unreadable");
            false
        });
    if !verified {
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    attach_channel(
        store.as_ref(),
        &mut participant,
        request.channel_id.trim().to_string(),
    )
    .await?;
    participant.status = ParticipantStatus::Active;
    participant.activated = true;

    match participant.phone.clone() {
        Some(phone) => link_and_merge(store.as_ref(), &mut participant, phone).await?,
        None => store.save_participant(participant.clone()).await?,
    }
    info!(participant_id = %participant.id, "participant logged in");
    Ok(participant.into())
}

/// Participant by id.
pub async fn get_participant(
    state: &SharedState,
    participant_id: Uuid,
) -> Result<ParticipantSummary, ServiceError> {
    let store = state.require_store().await?;
    Ok(find_participant(store.as_ref(), participant_id).await?.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phones_keep_digits_and_leading_plus() {
        assert_eq!(normalize_phone(" +33 6-12.34 ").unwrap(), "+3361234");
        assert_eq!(normalize_phone("(06) 12 34").unwrap(), "061234");
        assert!(normalize_phone("+ -").is_err());
    }
}
