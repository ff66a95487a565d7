//! Read models for standings, leaderboards, and locked rosters.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::TeamOrigin,
    dto::format_system_time,
    services::roster_service::LockedRoster,
    state::{
        cache::StandingsSnapshot,
        standings::{PlayerTotal, StandingRow},
    },
};

/// One team line of a session table.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StandingRowView {
    /// The team.
    pub team_id: Uuid,
    /// Matches with a result.
    pub played: u32,
    /// Wins.
    pub wins: u32,
    /// Draws.
    pub draws: u32,
    /// Losses.
    pub losses: u32,
    /// Table points.
    pub points: u32,
    /// Goals scored.
    pub goals_for: u32,
    /// Goals conceded.
    pub goals_against: u32,
    /// Goals scored minus goals conceded.
    pub goal_difference: i64,
}

impl From<&StandingRow> for StandingRowView {
    fn from(row: &StandingRow) -> Self {
        Self {
            team_id: row.team_id,
            played: row.played,
            wins: row.wins,
            draws: row.draws,
            losses: row.losses,
            points: row.points,
            goals_for: row.goals_for,
            goals_against: row.goals_against,
            goal_difference: row.goal_difference(),
        }
    }
}

/// Session table ordered by points, then goals scored.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StandingsView {
    /// The session.
    pub session_id: Uuid,
    /// Rows in table order.
    pub table: Vec<StandingRowView>,
    /// RFC 3339 computation time.
    pub computed_at: String,
}

impl From<&StandingsSnapshot> for StandingsView {
    fn from(snapshot: &StandingsSnapshot) -> Self {
        Self {
            session_id: snapshot.session_id,
            table: snapshot.table.iter().map(Into::into).collect(),
            computed_at: format_system_time(snapshot.computed_at),
        }
    }
}

/// Leaderboard entry.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct PlayerTotalView {
    /// The player.
    pub participant_id: Uuid,
    /// Goals or assists, depending on the board.
    pub value: u32,
}

impl From<&PlayerTotal> for PlayerTotalView {
    fn from(total: &PlayerTotal) -> Self {
        Self {
            participant_id: total.participant_id,
            value: total.value,
        }
    }
}

/// Top scorers and assisters of a session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TopPlayersView {
    /// The session.
    pub session_id: Uuid,
    /// Most goals first.
    pub top_scorers: Vec<PlayerTotalView>,
    /// Most assists first.
    pub top_assists: Vec<PlayerTotalView>,
}

impl From<&StandingsSnapshot> for TopPlayersView {
    fn from(snapshot: &StandingsSnapshot) -> Self {
        Self {
            session_id: snapshot.session_id,
            top_scorers: snapshot
                .top_players
                .top_scorers
                .iter()
                .map(Into::into)
                .collect(),
            top_assists: snapshot
                .top_players
                .top_assists
                .iter()
                .map(Into::into)
                .collect(),
        }
    }
}

/// A locked roster of a session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RosterView {
    /// The team.
    pub team_id: Uuid,
    /// Team name.
    pub name: String,
    /// Captain-created or pool-generated.
    pub origin: TeamOrigin,
    /// RFC 3339 lock time.
    pub locked_at: String,
    /// Member ids in join order.
    pub members: Vec<Uuid>,
}

impl From<&LockedRoster> for RosterView {
    fn from(roster: &LockedRoster) -> Self {
        Self {
            team_id: roster.team.id,
            name: roster.team.name.clone(),
            origin: roster.team.origin,
            locked_at: format_system_time(roster.lock.locked_at),
            members: roster
                .members
                .iter()
                .map(|member| member.participant_id)
                .collect(),
        }
    }
}
