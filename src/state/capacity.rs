//! Pure admission predicates over a session's capacity. Nothing here touches storage;
//! callers pass in the counts they observed under the session gate.

use thiserror::Error;

use crate::dao::models::SessionEntity;

/// Why a registration cannot be admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
    /// The team headcount differs from the squad size.
    #[error("team must have exactly {required} players (has {actual})")]
    TeamSize {
        /// Squad size of the session.
        required: u32,
        /// Current headcount of the team.
        actual: usize,
    },
    /// No roster slot or pool seat is left.
    #[error("session full")]
    SessionFull,
}

/// Whether every roster slot of the session is taken.
pub fn is_full(session: &SessionEntity, locked_count: usize) -> bool {
    locked_count >= session.max_teams as usize
}

/// Whether a team with `member_count` players still has room.
pub fn has_room(session: &SessionEntity, member_count: usize) -> bool {
    member_count < session.squad_size as usize
}

/// Whether a team is big enough to be locked during formation.
pub fn meets_squad(session: &SessionEntity, member_count: usize) -> bool {
    member_count >= session.squad_size as usize
}

/// A team registration needs exactly `squad_size` members and a free slot.
pub fn team_admission(
    session: &SessionEntity,
    member_count: usize,
    locked_count: usize,
) -> Result<(), Denial> {
    if member_count != session.squad_size as usize {
        return Err(Denial::TeamSize {
            required: session.squad_size,
            actual: member_count,
        });
    }
    if is_full(session, locked_count) {
        return Err(Denial::SessionFull);
    }
    Ok(())
}

/// An individual fits when a pool team has room or a new pool team can still be locked.
pub fn individual_admission(
    session: &SessionEntity,
    pool_sizes: &[usize],
    locked_count: usize,
) -> Result<(), Denial> {
    if pool_sizes.iter().any(|size| has_room(session, *size)) || !is_full(session, locked_count) {
        Ok(())
    } else {
        Err(Denial::SessionFull)
    }
}
