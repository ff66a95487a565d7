//! DTOs for captain-managed teams and invites.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{MemberRole, TeamEntity, TeamMemberEntity, TeamOrigin},
    dto::{format_system_time, validation::validate_phone},
};

/// New captain-led team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTeamRequest {
    /// Participant who becomes captain.
    pub captain_id: Uuid,
    /// Display name.
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

/// Captain adding a teammate. Without a phone the teammate is always a new placeholder.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddMemberRequest {
    /// Participant performing the change; must be the captain.
    pub actor_id: Uuid,
    /// Name of the teammate.
    #[validate(length(min = 1, max = 64))]
    pub display_name: String,
    /// Phone used to match an existing participant.
    #[validate(custom(function = "validate_phone"))]
    #[serde(default)]
    pub phone: Option<String>,
}

/// Identifies who performs a captain-only action.
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActorQuery {
    /// Participant performing the action.
    pub actor_id: Uuid,
}

/// Captain asking for a new invite.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InviteRequest {
    /// Must be the captain.
    pub actor_id: Uuid,
}

/// Fresh invite of a team.
#[derive(Debug, Serialize, ToSchema)]
pub struct InviteResponse {
    /// The team.
    pub team_id: Uuid,
    /// Token to share.
    pub token: String,
    /// RFC 3339 expiry.
    pub expires_at: String,
}

/// Redeem an invite.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinTeamRequest {
    /// Invite token.
    #[validate(length(min = 1, max = 64))]
    pub token: String,
    /// Participant joining.
    pub participant_id: Uuid,
}

/// Member as shown on a team.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamMemberView {
    /// The member.
    pub participant_id: Uuid,
    /// Captain or player.
    pub role: MemberRole,
    /// RFC 3339 join time.
    pub joined_at: String,
}

impl From<TeamMemberEntity> for TeamMemberView {
    fn from(member: TeamMemberEntity) -> Self {
        Self {
            participant_id: member.participant_id,
            role: member.role,
            joined_at: format_system_time(member.joined_at),
        }
    }
}

/// Team with its members.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamSummary {
    /// Team id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Captain id.
    pub captain_id: Uuid,
    /// Captain-created or pool-generated.
    pub origin: TeamOrigin,
    /// Members in join order.
    pub members: Vec<TeamMemberView>,
}

impl TeamSummary {
    /// Join a team with its member rows.
    pub fn new(team: TeamEntity, members: Vec<TeamMemberEntity>) -> Self {
        Self {
            id: team.id,
            name: team.name,
            captain_id: team.captain_id,
            origin: team.origin,
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}
