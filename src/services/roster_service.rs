//! Roster placement: locking approved teams, first-fit pool allocation of individuals,
//! and the one-shot formation run when a session starts.
//!
//! Every function that writes here expects to run under the session gate.

use std::{collections::HashSet, time::SystemTime};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{
            MemberRole, RegistrationStatus, RegistrationSubject, SessionEntity,
            SessionTeamEntity, TeamEntity, TeamMemberEntity, TeamOrigin,
        },
        roster_store::RosterStore,
    },
    dto::standings::RosterView,
    error::ServiceError,
    state::{
        SharedState,
        capacity::Denial,
        formation::{SkippedTeam, TeamCandidate, plan_formation},
        pool::{PoolChoice, PoolSlot, choose_pool, pool_team_name},
    },
};

/// A locked roster slot joined with its team and members.
#[derive(Debug, Clone)]
pub struct LockedRoster {
    /// The lock row.
    pub lock: SessionTeamEntity,
    /// Locked team.
    pub team: TeamEntity,
    /// Current members of the team.
    pub members: Vec<TeamMemberEntity>,
}

impl LockedRoster {
    /// Whether `participant_id` plays on this roster.
    pub fn contains(&self, participant_id: Uuid) -> bool {
        self.members
            .iter()
            .any(|member| member.participant_id == participant_id)
    }

    /// Whether the team was assembled from individuals.
    pub fn is_pool(&self) -> bool {
        self.team.origin == TeamOrigin::PoolGenerated
    }
}

/// Where an approved registration landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// A captain-created team took a free slot.
    LockedTeam {
        /// The locked team.
        team_id: Uuid,
    },
    /// An individual joined a pool team with room.
    JoinedPool {
        /// The pool team joined.
        team_id: Uuid,
    },
    /// An individual opened a new pool team.
    CreatedPool {
        /// The new pool team.
        team_id: Uuid,
    },
    /// The subject already held a place; nothing was written.
    AlreadyPlaced {
        /// Team holding the existing place.
        team_id: Uuid,
    },
}

impl Placement {
    /// Team the subject ended up on.
    pub fn team_id(&self) -> Uuid {
        match *self {
            Placement::LockedTeam { team_id }
            | Placement::JoinedPool { team_id }
            | Placement::CreatedPool { team_id }
            | Placement::AlreadyPlaced { team_id } => team_id,
        }
    }
}

/// Outcome of a formation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormationReport {
    /// Every locked team after the run, in lock order.
    pub locked_team_ids: Vec<Uuid>,
    /// Teams locked by this run.
    pub newly_locked: Vec<Uuid>,
    /// Approved teams left out.
    pub skipped_teams: Vec<SkippedTeam>,
    /// Approved individuals left without a seat.
    pub unplaced_participants: Vec<Uuid>,
}

/// Load the locked rosters of a session in lock order.
pub async fn load_rosters(
    store: &dyn RosterStore,
    session_id: Uuid,
) -> Result<Vec<LockedRoster>, ServiceError> {
    let locks = store.list_session_teams(session_id).await?;
    let mut rosters = Vec::with_capacity(locks.len());
    for lock in locks {
        let Some(team) = store.find_team(lock.team_id).await? else {
            warn!(%session_id, team_id = %lock.team_id, "locked team no longer exists; ignoring");
            continue;
        };
        let members = store.list_members(team.id).await?;
        rosters.push(LockedRoster {
            lock,
            team,
            members,
        });
    }
    Ok(rosters)
}

/// Roster slots taken in a session. Every lock counts, including one whose team is gone,
/// until maintenance releases it.
pub async fn slots_used(store: &dyn RosterStore, session_id: Uuid) -> Result<usize, ServiceError> {
    Ok(store.list_session_teams(session_id).await?.len())
}

/// Participants a registration speaks for: the individual, or every member of the team.
pub async fn subject_participants(
    store: &dyn RosterStore,
    subject: RegistrationSubject,
) -> Result<Vec<Uuid>, ServiceError> {
    match subject {
        RegistrationSubject::Individual { participant_id } => Ok(vec![participant_id]),
        RegistrationSubject::Team { team_id } => Ok(store
            .list_members(team_id)
            .await?
            .into_iter()
            .map(|member| member.participant_id)
            .collect()),
    }
}

fn pool_slots(rosters: &[LockedRoster]) -> Vec<PoolSlot> {
    rosters
        .iter()
        .filter(|roster| roster.is_pool())
        .map(|roster| PoolSlot {
            team_id: roster.team.id,
            size: roster.members.len(),
        })
        .collect()
}

/// Headcounts of the locked pool teams, for admission checks.
pub fn pool_sizes(rosters: &[LockedRoster]) -> Vec<usize> {
    pool_slots(rosters).iter().map(|slot| slot.size).collect()
}

/// Lock an approved team into the session.
pub async fn lock_team(
    store: &dyn RosterStore,
    session: &SessionEntity,
    team_id: Uuid,
) -> Result<Placement, ServiceError> {
    if store
        .lock_team(SessionTeamEntity::new(session.id, team_id))
        .await?
    {
        info!(session_id = %session.id, %team_id, "team locked");
        Ok(Placement::LockedTeam { team_id })
    } else {
        Ok(Placement::AlreadyPlaced { team_id })
    }
}

/// Place an approved individual: first pool team with room, else a new pool team while a
/// slot is free. A participant already on a locked roster of the session stays there.
pub async fn allocate_individual(
    store: &dyn RosterStore,
    session: &SessionEntity,
    participant_id: Uuid,
) -> Result<Placement, ServiceError> {
    let rosters = load_rosters(store, session.id).await?;
    if let Some(roster) = rosters.iter().find(|roster| roster.contains(participant_id)) {
        return Ok(Placement::AlreadyPlaced {
            team_id: roster.team.id,
        });
    }

    let used = slots_used(store, session.id).await?;
    match choose_pool(session, &pool_slots(&rosters), used) {
        PoolChoice::Join(team_id) => {
            store
                .add_member(TeamMemberEntity {
                    team_id,
                    participant_id,
                    role: MemberRole::Player,
                    joined_at: SystemTime::now(),
                })
                .await?;
            info!(session_id = %session.id, %team_id, %participant_id, "joined pool team");
            Ok(Placement::JoinedPool { team_id })
        }
        PoolChoice::Create => {
            let ordinal = rosters.iter().filter(|roster| roster.is_pool()).count() + 1;
            let team_id = create_pool_team(store, session, ordinal, &[participant_id]).await?;
            Ok(Placement::CreatedPool { team_id })
        }
        PoolChoice::Exhausted => Err(Denial::SessionFull.into()),
    }
}

/// Create a pool team from `members`. The lock is written before the memberships so
/// cleanup never sees the new team as an orphan.
async fn create_pool_team(
    store: &dyn RosterStore,
    session: &SessionEntity,
    ordinal: usize,
    members: &[Uuid],
) -> Result<Uuid, ServiceError> {
    let Some(&captain_id) = members.first() else {
        return Err(ServiceError::Internal(
            "pool team needs at least one member".into(),
        ));
    };

    let now = SystemTime::now();
    let team = TeamEntity {
        id: Uuid::new_v4(),
        name: pool_team_name(ordinal),
        captain_id,
        origin: TeamOrigin::PoolGenerated,
        invite: None,
        created_at: now,
    };
    store.save_team(team.clone()).await?;
    store
        .lock_team(SessionTeamEntity::new(session.id, team.id))
        .await?;

    for (index, participant_id) in members.iter().enumerate() {
        let role = if index == 0 {
            MemberRole::Captain
        } else {
            MemberRole::Player
        };
        store
            .add_member(TeamMemberEntity {
                team_id: team.id,
                participant_id: *participant_id,
                role,
                joined_at: now,
            })
            .await?;
    }

    info!(
        session_id = %session.id,
        team_id = %team.id,
        name = %team.name,
        members = members.len(),
        "pool team created"
    );
    Ok(team.id)
}

/// Lock approved teams and group approved individuals into pool teams until every slot
/// is used. Existing locks are kept and never duplicated.
pub async fn form_rosters(
    store: &dyn RosterStore,
    session: &SessionEntity,
) -> Result<FormationReport, ServiceError> {
    let rosters = load_rosters(store, session.id).await?;
    let locked: Vec<Uuid> = store
        .list_session_teams(session.id)
        .await?
        .into_iter()
        .map(|lock| lock.team_id)
        .collect();
    let placed: HashSet<Uuid> = rosters
        .iter()
        .flat_map(|roster| roster.members.iter().map(|member| member.participant_id))
        .collect();

    let mut candidates = Vec::new();
    let mut individuals = Vec::new();
    for registration in store.list_registrations(session.id).await? {
        if registration.status != RegistrationStatus::Approved {
            continue;
        }
        match registration.subject {
            RegistrationSubject::Team { team_id } => {
                let members = store
                    .list_members(team_id)
                    .await?
                    .into_iter()
                    .map(|member| member.participant_id)
                    .collect();
                candidates.push(TeamCandidate { team_id, members });
            }
            RegistrationSubject::Individual { participant_id } => {
                if !placed.contains(&participant_id) {
                    individuals.push(participant_id);
                }
            }
        }
    }

    let plan = plan_formation(session, &locked, &candidates, &individuals);
    let mut report = FormationReport {
        locked_team_ids: locked,
        ..FormationReport::default()
    };

    for team_id in plan.lock_teams {
        if let Placement::LockedTeam { team_id } = lock_team(store, session, team_id).await? {
            report.newly_locked.push(team_id);
            report.locked_team_ids.push(team_id);
        }
    }

    let mut ordinal = rosters.iter().filter(|roster| roster.is_pool()).count();
    for chunk in plan.pool_chunks {
        ordinal += 1;
        let team_id = create_pool_team(store, session, ordinal, &chunk).await?;
        report.newly_locked.push(team_id);
        report.locked_team_ids.push(team_id);
    }

    for skipped in &plan.skipped_teams {
        warn!(
            session_id = %session.id,
            team_id = %skipped.team_id,
            reason = ?skipped.reason,
            "approved team left out of formation"
        );
    }
    if !plan.unplaced.is_empty() {
        warn!(
            session_id = %session.id,
            count = plan.unplaced.len(),
            "approved individuals could not be placed"
        );
    }

    report.skipped_teams = plan.skipped_teams;
    report.unplaced_participants = plan.unplaced;
    info!(
        session_id = %session.id,
        locked = report.locked_team_ids.len(),
        newly_locked = report.newly_locked.len(),
        "roster formation finished"
    );
    Ok(report)
}

/// Locked rosters of a session.
pub async fn rosters(state: &SharedState, session_id: Uuid) -> Result<Vec<RosterView>, ServiceError> {
    let store = state.require_store().await?;
    if store.find_session(session_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "session `{session_id}` not found"
        )));
    }
    let rosters = load_rosters(store.as_ref(), session_id).await?;
    Ok(rosters.iter().map(RosterView::from).collect())
}
