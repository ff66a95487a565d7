//! DTOs for matches and per-player match events.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::{MatchEntity, MatchResult, MatchStatEntity};

/// Schedule a match between two locked rosters.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateMatchRequest {
    /// Home roster.
    pub home_team_id: Uuid,
    /// Away roster.
    pub away_team_id: Uuid,
}

/// Scores and result tag are recorded independently; omitted fields are cleared.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct MatchResultRequest {
    /// Home goals.
    #[validate(range(max = 99))]
    #[serde(default)]
    pub home_score: Option<u32>,
    /// Away goals.
    #[validate(range(max = 99))]
    #[serde(default)]
    pub away_score: Option<u32>,
    /// Result tag driving the table points.
    #[serde(default)]
    pub result: Option<MatchResult>,
}

/// Additive event for one participant of a match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct MatchStatRequest {
    /// Player the event belongs to.
    pub participant_id: Uuid,
    /// Goals to add.
    #[validate(range(max = 20))]
    #[serde(default)]
    pub goals: u32,
    /// Assists to add.
    #[validate(range(max = 20))]
    #[serde(default)]
    pub assists: u32,
    /// Left unchanged when omitted.
    #[serde(default)]
    pub won: Option<bool>,
}

/// Match as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchSummary {
    /// Match id.
    pub id: Uuid,
    /// Session of the match.
    pub session_id: Uuid,
    /// Home roster.
    pub home_team_id: Uuid,
    /// Away roster.
    pub away_team_id: Uuid,
    /// Home goals, once reported.
    pub home_score: Option<u32>,
    /// Away goals, once reported.
    pub away_score: Option<u32>,
    /// Result tag, once reported.
    pub result: Option<MatchResult>,
}

impl From<MatchEntity> for MatchSummary {
    fn from(record: MatchEntity) -> Self {
        Self {
            id: record.id,
            session_id: record.session_id,
            home_team_id: record.home_team_id,
            away_team_id: record.away_team_id,
            home_score: record.home_score,
            away_score: record.away_score,
            result: record.result,
        }
    }
}

/// Accumulated events of one player in one match.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchStatSummary {
    /// The match.
    pub match_id: Uuid,
    /// The player.
    pub participant_id: Uuid,
    /// Goals so far.
    pub goals: u32,
    /// Assists so far.
    pub assists: u32,
    /// Whether the player was on the winning side.
    pub won: bool,
}

impl From<MatchStatEntity> for MatchStatSummary {
    fn from(stat: MatchStatEntity) -> Self {
        Self {
            match_id: stat.match_id,
            participant_id: stat.participant_id,
            goals: stat.goals,
            assists: stat.assists,
            won: stat.won,
        }
    }
}
