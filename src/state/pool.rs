use uuid::Uuid;

use crate::{dao::models::SessionEntity, state::capacity};

/// Headcount of a locked pool team, listed in lock order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSlot {
    /// Pool team.
    pub team_id: Uuid,
    /// Members so far.
    pub size: usize,
}

/// Where the next individual goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolChoice {
    /// Join an existing pool team.
    Join(Uuid),
    /// Open a new pool team in a free roster slot.
    Create,
    /// No pool team has room and every slot is taken.
    Exhausted,
}

/// First-fit over headcount: the first pool team with room wins, otherwise a new one
/// is opened while slots remain.
pub fn choose_pool(session: &SessionEntity, pools: &[PoolSlot], locked_count: usize) -> PoolChoice {
    if let Some(slot) = pools
        .iter()
        .find(|slot| capacity::has_room(session, slot.size))
    {
        return PoolChoice::Join(slot.team_id);
    }
    if capacity::is_full(session, locked_count) {
        PoolChoice::Exhausted
    } else {
        PoolChoice::Create
    }
}

/// Display name of the `ordinal`-th pool team of a session (1-based).
pub fn pool_team_name(ordinal: usize) -> String {
    format!("Pool {ordinal}")
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::{SessionKind, SessionStatus};

    fn session(max_teams: u32) -> SessionEntity {
        let now = SystemTime::now();
        SessionEntity {
            id: Uuid::new_v4(),
            kind: SessionKind::FiveASide,
            starts_at: now,
            ends_at: now,
            max_teams,
            squad_size: 7,
            status: SessionStatus::Planned,
            reminders: Default::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn fills_first_team_with_room() {
        let full = PoolSlot {
            team_id: Uuid::new_v4(),
            size: 7,
        };
        let partial = PoolSlot {
            team_id: Uuid::new_v4(),
            size: 6,
        };
        let later = PoolSlot {
            team_id: Uuid::new_v4(),
            size: 1,
        };

        assert_eq!(
            choose_pool(&session(4), &[full, partial, later], 3),
            PoolChoice::Join(partial.team_id)
        );
    }

    #[test]
    fn creates_only_while_slots_remain() {
        let full = PoolSlot {
            team_id: Uuid::new_v4(),
            size: 7,
        };
        assert_eq!(choose_pool(&session(4), &[full], 3), PoolChoice::Create);
        assert_eq!(choose_pool(&session(4), &[full], 4), PoolChoice::Exhausted);
    }

    #[test]
    fn names_are_one_based() {
        assert_eq!(pool_team_name(1), "Pool 1");
    }
}
