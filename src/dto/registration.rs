//! DTOs for session registrations and organizer decisions.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{RegistrationEntity, RegistrationStatus, RegistrationSubject},
    dto::format_system_time,
    services::roster_service::Placement,
};

/// Signup request. A `team_id` registers the whole team and must come from its captain.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitRegistrationRequest {
    /// Participant submitting the request.
    pub participant_id: Uuid,
    /// Team to register; omit to register the participant alone.
    #[serde(default)]
    pub team_id: Option<Uuid>,
}

/// Organizer declining a registration.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RejectRegistrationRequest {
    /// Reason passed on to the submitter.
    #[validate(length(max = 280))]
    #[serde(default)]
    pub reason: Option<String>,
}

/// Decision state of a registration.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    /// Waiting for an organizer.
    Pending,
    /// Accepted and placed.
    Approved,
    /// Declined.
    Rejected,
}

/// Registration as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegistrationSummary {
    /// Registration id.
    pub id: Uuid,
    /// Session asked for.
    pub session_id: Uuid,
    /// Set for team registrations.
    pub team_id: Option<Uuid>,
    /// Set for individual registrations.
    pub participant_id: Option<Uuid>,
    /// Participant who submitted it.
    pub submitted_by: Uuid,
    /// Decision state.
    pub status: RegistrationState,
    /// Rejection reason, if one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// RFC 3339 submission time.
    pub created_at: String,
    /// RFC 3339 decision time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<String>,
}

impl From<RegistrationEntity> for RegistrationSummary {
    fn from(registration: RegistrationEntity) -> Self {
        let (team_id, participant_id) = match registration.subject {
            RegistrationSubject::Team { team_id } => (Some(team_id), None),
            RegistrationSubject::Individual { participant_id } => (None, Some(participant_id)),
        };
        let (status, reason) = match registration.status {
            RegistrationStatus::Pending => (RegistrationState::Pending, None),
            RegistrationStatus::Approved => (RegistrationState::Approved, None),
            RegistrationStatus::Rejected { reason } => (RegistrationState::Rejected, reason),
        };
        Self {
            id: registration.id,
            session_id: registration.session_id,
            team_id,
            participant_id,
            submitted_by: registration.submitted_by,
            status,
            reason,
            created_at: format_system_time(registration.created_at),
            decided_at: registration.decided_at.map(format_system_time),
        }
    }
}

/// How an approval placed its subject.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlacementKind {
    /// The registered team itself was locked.
    LockedTeam,
    /// The individual joined a pool team with room.
    JoinedPool,
    /// The individual opened a new pool team.
    CreatedPool,
    /// The subject already held a place.
    AlreadyPlaced,
}

/// Roster the approved subject ended up on.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct PlacementView {
    /// How the subject was placed.
    pub kind: PlacementKind,
    /// Team holding the place.
    pub team_id: Uuid,
}

impl From<Placement> for PlacementView {
    fn from(placement: Placement) -> Self {
        let kind = match placement {
            Placement::LockedTeam { .. } => PlacementKind::LockedTeam,
            Placement::JoinedPool { .. } => PlacementKind::JoinedPool,
            Placement::CreatedPool { .. } => PlacementKind::CreatedPool,
            Placement::AlreadyPlaced { .. } => PlacementKind::AlreadyPlaced,
        };
        Self {
            kind,
            team_id: placement.team_id(),
        }
    }
}

/// Approved registration and where it landed.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalResponse {
    /// The registration after approval.
    pub registration: RegistrationSummary,
    /// Placement of its subject.
    pub placement: PlacementView,
}
