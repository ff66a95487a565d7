//! DTOs for participant identity: channel bootstrap, phone, credentials, and stats.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{ParticipantEntity, ParticipantStatus},
    dto::validation::{validate_handle, validate_phone},
    state::standings::PlayerAggregate,
};

/// First contact from a chat channel.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ChannelRequest {
    /// Chat channel the request comes from.
    #[validate(length(min = 1, max = 128))]
    pub channel_id: String,
    /// Name to use when the participant is new.
    #[validate(length(min = 1, max = 64))]
    pub display_name: String,
}

/// Attach a phone number.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PhoneRequest {
    /// Phone in any common format; stored normalised.
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
}

/// Set login credentials.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CredentialsRequest {
    /// Login handle, matched case-insensitively.
    #[validate(custom(function = "validate_handle"))]
    pub handle: String,
    /// Bcrypt only considers the first 72 bytes.
    #[validate(length(min = 8, max = 72))]
    pub password: String,
}

/// Log in from a chat channel, moving the channel onto the matching participant.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    /// Channel to move onto the participant.
    #[validate(length(min = 1, max = 128))]
    pub channel_id: String,
    /// Login handle.
    #[validate(length(min = 1, max = 32))]
    pub handle: String,
    /// Plain password.
    #[validate(length(min = 1, max = 72))]
    pub password: String,
}

/// Participant as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantSummary {
    /// Participant id.
    pub id: Uuid,
    /// Name shown on rosters.
    pub display_name: String,
    /// Normalised phone.
    pub phone: Option<String>,
    /// Login handle.
    pub handle: Option<String>,
    /// Chat channel currently linked.
    pub linked_channel: Option<String>,
    /// Placeholder or active.
    pub status: ParticipantStatus,
    /// Whether the participant completed registration or logged in.
    pub activated: bool,
}

impl From<ParticipantEntity> for ParticipantSummary {
    fn from(participant: ParticipantEntity) -> Self {
        Self {
            linked_channel: participant.channel.linked_id().map(str::to_owned),
            id: participant.id,
            display_name: participant.display_name,
            phone: participant.phone,
            handle: participant.handle,
            status: participant.status,
            activated: participant.activated,
        }
    }
}

/// Career totals of a participant across every session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerStatsResponse {
    /// The participant.
    pub participant_id: Uuid,
    /// Matches with recorded events.
    pub matches: u32,
    /// Goals scored.
    pub goals: u32,
    /// Assists given.
    pub assists: u32,
    /// Matches won.
    pub wins: u32,
    /// `wins * 3 + goals + assists * 0.5`
    pub rating: f64,
}

impl PlayerStatsResponse {
    /// Wrap the aggregate of `participant_id`.
    pub fn new(participant_id: Uuid, aggregate: PlayerAggregate) -> Self {
        Self {
            participant_id,
            matches: aggregate.matches,
            goals: aggregate.goals,
            assists: aggregate.assists,
            wins: aggregate.wins,
            rating: aggregate.rating,
        }
    }
}
