//! DTOs for session scheduling and lifecycle transitions.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{SessionEntity, SessionKind, SessionStatus},
    dto::{format_system_time, standings::StandingsView},
    services::roster_service::FormationReport,
    state::formation::{SkipReason, SkippedTeam},
};

/// Payload used by organizers to schedule a session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    /// Pitch format.
    pub kind: SessionKind,
    /// RFC 3339 start of the session window.
    #[validate(length(min = 1))]
    pub starts_at: String,
    /// RFC 3339 end of the session window.
    #[validate(length(min = 1))]
    pub ends_at: String,
    /// Roster slots; the configured default applies when omitted.
    #[validate(range(min = 1, max = 32))]
    pub max_teams: Option<u32>,
}

/// Session as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSummary {
    /// Session id.
    pub id: Uuid,
    /// Pitch format.
    pub kind: SessionKind,
    /// RFC 3339 start.
    pub starts_at: String,
    /// RFC 3339 end.
    pub ends_at: String,
    /// Roster slots.
    pub max_teams: u32,
    /// Required roster headcount.
    pub squad_size: u32,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Number of rosters currently locked.
    pub locked_teams: usize,
}

impl SessionSummary {
    /// Summarise `session` with its current lock count.
    pub fn new(session: &SessionEntity, locked_teams: usize) -> Self {
        Self {
            id: session.id,
            kind: session.kind,
            starts_at: format_system_time(session.starts_at),
            ends_at: format_system_time(session.ends_at),
            max_teams: session.max_teams,
            squad_size: session.squad_size,
            status: session.status,
            locked_teams,
        }
    }
}

/// Why formation left an approved team out.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReasonView {
    /// Fewer members than the squad size.
    Undersized,
    /// Every slot was taken.
    NoSlot,
}

/// Approved team left out of formation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SkippedTeamView {
    /// The team.
    pub team_id: Uuid,
    /// Why it was left out.
    pub reason: SkipReasonView,
    /// Member count observed at formation time for undersized teams.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<usize>,
}

impl From<&SkippedTeam> for SkippedTeamView {
    fn from(skipped: &SkippedTeam) -> Self {
        let (reason, member_count) = match skipped.reason {
            SkipReason::Undersized { member_count } => {
                (SkipReasonView::Undersized, Some(member_count))
            }
            SkipReason::NoSlot => (SkipReasonView::NoSlot, None),
        };
        Self {
            team_id: skipped.team_id,
            reason,
            member_count,
        }
    }
}

/// Outcome of roster formation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FormationReportView {
    /// Every roster locked in the session after formation, in lock order.
    pub locked_team_ids: Vec<Uuid>,
    /// Rosters locked by this formation run.
    pub newly_locked: Vec<Uuid>,
    /// Approved teams that were not locked.
    pub skipped_teams: Vec<SkippedTeamView>,
    /// Approved individuals that did not fit into any roster.
    pub unplaced_participants: Vec<Uuid>,
}

impl From<&FormationReport> for FormationReportView {
    fn from(report: &FormationReport) -> Self {
        Self {
            locked_team_ids: report.locked_team_ids.clone(),
            newly_locked: report.newly_locked.clone(),
            skipped_teams: report.skipped_teams.iter().map(Into::into).collect(),
            unplaced_participants: report.unplaced_participants.clone(),
        }
    }
}

/// Started session with its formation outcome.
#[derive(Debug, Serialize, ToSchema)]
pub struct StartSessionResponse {
    /// Session after the transition.
    pub session: SessionSummary,
    /// What formation locked and skipped.
    pub formation: FormationReportView,
}

/// Session frozen with its final standings.
#[derive(Debug, Serialize, ToSchema)]
pub struct StopSessionResponse {
    /// Session after the transition.
    pub session: SessionSummary,
    /// Final table and leaderboards.
    pub standings: StandingsView,
}
