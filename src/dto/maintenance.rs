use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// A roster lock released by maintenance.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub struct UnlockedTeam {
    /// Session the lock belonged to.
    pub session_id: Uuid,
    /// Team that lost its slot.
    pub team_id: Uuid,
}

/// Result of trimming sessions that hold more rosters than allowed.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct EnforceMaxTeamsReport {
    /// Sessions where at least one lock was released.
    pub sessions_trimmed: usize,
    /// Every released lock.
    pub unlocked: Vec<UnlockedTeam>,
    /// Pool teams deleted together with their memberships.
    pub deleted_pool_teams: Vec<Uuid>,
}

/// Result of the orphan pool team sweep.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct CleanupReport {
    /// Pool teams deleted.
    pub deleted_team_ids: Vec<Uuid>,
}
