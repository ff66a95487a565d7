//! Standings table and player leaderboards, recomputed from scratch from match records.

use std::cmp::Reverse;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::models::{MatchEntity, MatchResult, MatchStatEntity, SessionTeamEntity};

/// Points for a win.
pub const WIN_POINTS: u32 = 3;
/// Points for a draw.
pub const DRAW_POINTS: u32 = 1;

/// One line of a session table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingRow {
    /// Team of the row.
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
}

impl StandingRow {
    fn empty(team_id: Uuid) -> Self {
        Self {
            team_id,
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            points: 0,
            goals_for: 0,
            goals_against: 0,
        }
    }

    /// Signed goal difference.
    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }
}

/// Leaderboard entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerTotal {
    /// The player.
    pub participant_id: Uuid,
    /// Goals or assists, depending on the board.
    pub value: u32,
}

/// Leaderboards of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopPlayers {
    /// Most goals first.
    pub top_scorers: Vec<PlayerTotal>,
    /// Most assists first.
    pub top_assists: Vec<PlayerTotal>,
}

/// Career totals of a single participant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerAggregate {
    /// Matches with recorded events.
    pub matches: u32,
    /// Goals scored.
    pub goals: u32,
    /// Assists given.
    pub assists: u32,
    /// Matches won.
    pub wins: u32,
    /// Weighted score: three per win, one per goal, half per assist.
    pub rating: f64,
}

/// Points awarded to (home, away) for a result tag.
pub fn match_points(result: MatchResult) -> (u32, u32) {
    match result {
        MatchResult::Home => (WIN_POINTS, 0),
        MatchResult::Away => (0, WIN_POINTS),
        MatchResult::Draw => (DRAW_POINTS, DRAW_POINTS),
    }
}

/// Build the table for the locked teams of a session.
///
/// Points come from the result tag and goals from the recorded scores, independently,
/// so a match with only one of them still counts for what it has. Matches involving a
/// team without a lock are ignored. Rows are ordered by points, then goals scored; ties
/// keep lock order.
pub fn compute_table(locked: &[SessionTeamEntity], matches: &[MatchEntity]) -> Vec<StandingRow> {
    let mut rows: IndexMap<Uuid, StandingRow> = locked
        .iter()
        .map(|lock| (lock.team_id, StandingRow::empty(lock.team_id)))
        .collect();

    for record in matches {
        if record.home_team_id == record.away_team_id
            || !rows.contains_key(&record.home_team_id)
            || !rows.contains_key(&record.away_team_id)
        {
            continue;
        }
        let decided = record.result.is_some();
        let scored = record.home_score.is_some() || record.away_score.is_some();
        if !decided && !scored {
            continue;
        }

        let home_goals = record.home_score.unwrap_or(0);
        let away_goals = record.away_score.unwrap_or(0);
        let (home_points, away_points) = record.result.map(match_points).unwrap_or((0, 0));

        for (team_id, goals_for, goals_against, points) in [
            (record.home_team_id, home_goals, away_goals, home_points),
            (record.away_team_id, away_goals, home_goals, away_points),
        ] {
            let Some(row) = rows.get_mut(&team_id) else {
                continue;
            };
            row.played += 1;
            row.goals_for += goals_for;
            row.goals_against += goals_against;
            row.points += points;
            match (record.result, points) {
                (Some(MatchResult::Draw), _) => row.draws += 1,
                (Some(_), WIN_POINTS) => row.wins += 1,
                (Some(_), _) => row.losses += 1,
                (None, _) => {}
            }
        }
    }

    let mut table: Vec<StandingRow> = rows.into_values().collect();
    table.sort_by_key(|row| (Reverse(row.points), Reverse(row.goals_for)));
    table
}

/// Rank participants by goals and by assists across the given stat rows.
///
/// Zero totals are dropped and each list is cut to `limit`. Ties keep first appearance.
pub fn top_players(stats: &[MatchStatEntity], limit: usize) -> TopPlayers {
    let mut totals: IndexMap<Uuid, (u32, u32)> = IndexMap::new();
    for stat in stats {
        let entry = totals.entry(stat.participant_id).or_default();
        entry.0 += stat.goals;
        entry.1 += stat.assists;
    }

    let rank = |pick: fn(&(u32, u32)) -> u32| {
        let mut ranked: Vec<PlayerTotal> = totals
            .iter()
            .map(|(participant_id, sums)| PlayerTotal {
                participant_id: *participant_id,
                value: pick(sums),
            })
            .filter(|total| total.value > 0)
            .collect();
        ranked.sort_by_key(|total| Reverse(total.value));
        ranked.truncate(limit);
        ranked
    };

    TopPlayers {
        top_scorers: rank(|sums| sums.0),
        top_assists: rank(|sums| sums.1),
    }
}

/// Career aggregate of one participant. Rating is `wins * 3 + goals + assists * 0.5`.
pub fn player_aggregate(stats: &[MatchStatEntity]) -> PlayerAggregate {
    let mut aggregate = stats
        .iter()
        .fold(PlayerAggregate::default(), |mut acc, stat| {
            acc.matches += 1;
            acc.goals += stat.goals;
            acc.assists += stat.assists;
            acc.wins += u32::from(stat.won);
            acc
        });
    aggregate.rating = f64::from(aggregate.wins) * f64::from(WIN_POINTS)
        + f64::from(aggregate.goals)
        + f64::from(aggregate.assists) * 0.5;
    aggregate
}
