//! Pure planning step of roster formation. The roster service gathers the inputs from
//! storage under the session gate, asks [`plan_formation`] what to do, then executes it.

use std::collections::HashSet;

use uuid::Uuid;

use crate::{dao::models::SessionEntity, state::capacity};

/// An approved team registration, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamCandidate {
    /// The team.
    pub team_id: Uuid,
    /// Current members.
    pub members: Vec<Uuid>,
}

/// Why an approved team was not locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer members than the squad size at formation time.
    Undersized {
        /// Headcount when formation ran.
        member_count: usize,
    },
    /// Every roster slot was already taken.
    NoSlot,
}

/// An approved team left out by formation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedTeam {
    /// The team.
    pub team_id: Uuid,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// What formation has to write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormationPlan {
    /// Existing teams to lock, in order.
    pub lock_teams: Vec<Uuid>,
    /// Approved teams left out.
    pub skipped_teams: Vec<SkippedTeam>,
    /// Groups of individuals that each become a new pool team.
    pub pool_chunks: Vec<Vec<Uuid>>,
    /// Individuals that did not fit into any slot.
    pub unplaced: Vec<Uuid>,
}

/// Decide which teams to lock and how to group leftover individuals.
///
/// `locked` are the teams already holding a slot; `individuals` are approved individual
/// participants that are not on any locked roster yet, in registration order. Individuals
/// who end up on a team locked by this plan are not pooled again.
pub fn plan_formation(
    session: &SessionEntity,
    locked: &[Uuid],
    candidates: &[TeamCandidate],
    individuals: &[Uuid],
) -> FormationPlan {
    let mut plan = FormationPlan::default();
    let mut free_slots = (session.max_teams as usize).saturating_sub(locked.len());
    let mut seen: HashSet<Uuid> = locked.iter().copied().collect();

    for candidate in candidates {
        if !seen.insert(candidate.team_id) {
            continue;
        }
        if !capacity::meets_squad(session, candidate.members.len()) {
            plan.skipped_teams.push(SkippedTeam {
                team_id: candidate.team_id,
                reason: SkipReason::Undersized {
                    member_count: candidate.members.len(),
                },
            });
        } else if free_slots == 0 {
            plan.skipped_teams.push(SkippedTeam {
                team_id: candidate.team_id,
                reason: SkipReason::NoSlot,
            });
        } else {
            plan.lock_teams.push(candidate.team_id);
            free_slots -= 1;
        }
    }

    let mut placed: HashSet<Uuid> = candidates
        .iter()
        .filter(|candidate| plan.lock_teams.contains(&candidate.team_id))
        .flat_map(|candidate| candidate.members.iter().copied())
        .collect();
    let individuals: Vec<Uuid> = individuals
        .iter()
        .copied()
        .filter(|id| placed.insert(*id))
        .collect();

    let squad = (session.squad_size as usize).max(1);
    for chunk in individuals.chunks(squad) {
        if free_slots == 0 {
            plan.unplaced.extend_from_slice(chunk);
        } else {
            plan.pool_chunks.push(chunk.to_vec());
            free_slots -= 1;
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::{SessionKind, SessionStatus};

    fn session() -> SessionEntity {
        let now = SystemTime::now();
        SessionEntity {
            id: Uuid::new_v4(),
            kind: SessionKind::FiveASide,
            starts_at: now,
            ends_at: now,
            max_teams: 4,
            squad_size: 7,
            status: SessionStatus::Planned,
            reminders: Default::default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn people(count: usize) -> Vec<Uuid> {
        (0..count).map(|_| Uuid::new_v4()).collect()
    }

    fn team_of(count: usize) -> TeamCandidate {
        TeamCandidate {
            team_id: Uuid::new_v4(),
            members: people(count),
        }
    }

    fn full_team() -> TeamCandidate {
        team_of(7)
    }

    #[test]
    fn three_teams_and_eight_individuals() {
        let teams = [full_team(), full_team(), full_team()];
        let individuals = people(8);

        let plan = plan_formation(&session(), &[], &teams, &individuals);

        assert_eq!(plan.lock_teams.len(), 3);
        assert_eq!(plan.pool_chunks.len(), 1);
        assert_eq!(plan.pool_chunks[0], individuals[..7].to_vec());
        assert_eq!(plan.unplaced, vec![individuals[7]]);
    }

    #[test]
    fn undersized_teams_are_skipped() {
        let short = team_of(5);
        let plan = plan_formation(&session(), &[], &[short.clone(), full_team()], &[]);

        assert_eq!(plan.lock_teams.len(), 1);
        assert_eq!(
            plan.skipped_teams,
            vec![SkippedTeam {
                team_id: short.team_id,
                reason: SkipReason::Undersized { member_count: 5 },
            }]
        );
    }

    #[test]
    fn existing_locks_consume_slots_and_are_not_relocked() {
        let teams = [full_team(), full_team(), full_team(), full_team()];
        let locked = [teams[0].team_id, teams[1].team_id, teams[2].team_id];

        let plan = plan_formation(&session(), &locked, &teams, &people(3));

        assert_eq!(plan.lock_teams, vec![teams[3].team_id]);
        assert!(plan.pool_chunks.is_empty());
        assert_eq!(plan.unplaced.len(), 3);
    }

    #[test]
    fn full_session_plans_nothing() {
        let teams = [full_team(), full_team(), full_team(), full_team()];
        let locked: Vec<Uuid> = teams.iter().map(|t| t.team_id).collect();

        let plan = plan_formation(&session(), &locked, &teams, &[]);

        assert!(plan.lock_teams.is_empty());
        assert!(plan.skipped_teams.is_empty());
        assert!(plan.pool_chunks.is_empty());
    }

    #[test]
    fn overflow_team_is_reported() {
        let teams = [
            full_team(),
            full_team(),
            full_team(),
            full_team(),
            full_team(),
        ];
        let plan = plan_formation(&session(), &[], &teams, &[]);

        assert_eq!(plan.lock_teams.len(), 4);
        assert_eq!(plan.skipped_teams[0].reason, SkipReason::NoSlot);
    }

    #[test]
    fn members_of_locked_teams_are_not_pooled() {
        let team = full_team();
        let mut individuals = vec![team.members[0]];
        individuals.extend(people(2));

        let plan = plan_formation(&session(), &[], &[team.clone()], &individuals);

        assert_eq!(plan.pool_chunks, vec![individuals[1..].to_vec()]);
    }

    #[test]
    fn partial_last_chunk_still_gets_a_slot() {
        let individuals = people(9);
        let plan = plan_formation(&session(), &[], &[], &individuals);

        assert_eq!(plan.pool_chunks.len(), 2);
        assert_eq!(plan.pool_chunks[1].len(), 2);
        assert!(plan.unplaced.is_empty());
    }
}
