use std::time::{Instant, SystemTime};

use dashmap::{DashMap, mapref::entry::Entry};
use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::{SessionEntity, SessionStatus};

/// Organizer actions that move a session through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Freeze registrations and form the final rosters.
    Start,
    /// Close the session and publish the final standings.
    Stop,
}

/// Error returned when an event cannot be applied from the current status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while session is {from:?}")]
pub struct InvalidTransition {
    /// Status the session was in when the event was received.
    pub from: SessionStatus,
    /// The rejected event.
    pub event: SessionEvent,
}

/// Errors that can occur when planning a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// Another transition of the same session is still pending.
    AlreadyPending,
    /// The requested transition is not valid from the current status.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is pending for the session.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// The stored status moved while the plan was pending.
    StatusMismatch {
        /// Status when the plan was created.
        expected: SessionStatus,
        /// Status found when applying.
        actual: SessionStatus,
    },
}

/// Errors that can occur when aborting a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is pending for the session.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned transition.
pub type PlanId = Uuid;

/// A validated transition that has not been applied yet.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Session the plan belongs to.
    pub session_id: Uuid,
    /// Status the session is currently in.
    pub from: SessionStatus,
    /// Status the session will move to.
    pub to: SessionStatus,
    /// Event that triggered the plan.
    pub event: SessionEvent,
    /// When the plan was created.
    pub pending_since: Instant,
}

/// Tracks pending transitions per session. Statuses themselves live in storage.
#[derive(Debug, Default)]
pub struct SessionLifecycle {
    pending: DashMap<Uuid, Plan>,
}

impl SessionLifecycle {
    /// No transition pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `event` against the session's stored status and reserve the transition.
    pub fn plan(&self, session: &SessionEntity, event: SessionEvent) -> Result<Plan, PlanError> {
        let to = compute_transition(session.status, event).map_err(PlanError::InvalidTransition)?;

        match self.pending.entry(session.id) {
            Entry::Occupied(_) => Err(PlanError::AlreadyPending),
            Entry::Vacant(slot) => {
                let plan = Plan {
                    id: Uuid::new_v4(),
                    session_id: session.id,
                    from: session.status,
                    to,
                    event,
                    pending_since: Instant::now(),
                };
                slot.insert(plan.clone());
                Ok(plan)
            }
        }
    }

    /// Apply a pending plan onto `session`, returning the new status.
    pub fn apply(
        &self,
        session: &mut SessionEntity,
        plan_id: PlanId,
    ) -> Result<SessionStatus, ApplyError> {
        let (_, plan) = self
            .pending
            .remove_if(&session.id, |_, plan| plan.id == plan_id)
            .ok_or_else(|| match self.pending.get(&session.id) {
                Some(plan) => ApplyError::IdMismatch {
                    expected: plan.id,
                    got: plan_id,
                },
                None => ApplyError::NoPending,
            })?;

        if session.status != plan.from {
            return Err(ApplyError::StatusMismatch {
                expected: plan.from,
                actual: session.status,
            });
        }

        session.status = plan.to;
        session.updated_at = SystemTime::now();
        Ok(plan.to)
    }

    /// Drop a pending plan without touching the session.
    pub fn abort(&self, session_id: Uuid, plan_id: PlanId) -> Result<(), AbortError> {
        match self
            .pending
            .remove_if(&session_id, |_, plan| plan.id == plan_id)
        {
            Some(_) => Ok(()),
            None => match self.pending.get(&session_id) {
                Some(plan) => Err(AbortError::IdMismatch {
                    expected: plan.id,
                    got: plan_id,
                }),
                None => Err(AbortError::NoPending),
            },
        }
    }

    /// Target status of the pending transition, if any.
    pub fn pending(&self, session_id: Uuid) -> Option<SessionStatus> {
        self.pending.get(&session_id).map(|plan| plan.to)
    }
}

/// Statuses only move forward: planned, started, finished.
pub fn compute_transition(
    from: SessionStatus,
    event: SessionEvent,
) -> Result<SessionStatus, InvalidTransition> {
    match (from, event) {
        (SessionStatus::Planned, SessionEvent::Start) => Ok(SessionStatus::Started),
        (SessionStatus::Started, SessionEvent::Stop) => Ok(SessionStatus::Finished),
        (from, event) => Err(InvalidTransition { from, event }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::SessionKind;

    fn session(status: SessionStatus) -> SessionEntity {
        let now = SystemTime::now();
        SessionEntity {
            id: Uuid::new_v4(),
            kind: SessionKind::FiveASide,
            starts_at: now,
            ends_at: now,
            max_teams: 4,
            squad_size: 7,
            status,
            reminders: Default::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn start_then_stop() {
        let lifecycle = SessionLifecycle::new();
        let mut session = session(SessionStatus::Planned);

        let plan = lifecycle.plan(&session, SessionEvent::Start).unwrap();
        assert_eq!(lifecycle.pending(session.id), Some(SessionStatus::Started));
        assert_eq!(
            lifecycle.apply(&mut session, plan.id).unwrap(),
            SessionStatus::Started
        );

        let plan = lifecycle.plan(&session, SessionEvent::Stop).unwrap();
        lifecycle.apply(&mut session, plan.id).unwrap();
        assert_eq!(session.status, SessionStatus::Finished);
        assert_eq!(lifecycle.pending(session.id), None);
    }

    #[test]
    fn status_never_moves_backwards() {
        assert!(compute_transition(SessionStatus::Started, SessionEvent::Start).is_err());
        assert!(compute_transition(SessionStatus::Planned, SessionEvent::Stop).is_err());
        assert!(compute_transition(SessionStatus::Finished, SessionEvent::Start).is_err());
        assert!(compute_transition(SessionStatus::Finished, SessionEvent::Stop).is_err());
    }

    #[test]
    fn second_plan_is_rejected_while_pending() {
        let lifecycle = SessionLifecycle::new();
        let session = session(SessionStatus::Planned);

        lifecycle.plan(&session, SessionEvent::Start).unwrap();
        assert_eq!(
            lifecycle.plan(&session, SessionEvent::Start).unwrap_err(),
            PlanError::AlreadyPending
        );
    }

    #[test]
    fn abort_leaves_status_untouched() {
        let lifecycle = SessionLifecycle::new();
        let mut session = session(SessionStatus::Planned);

        let plan = lifecycle.plan(&session, SessionEvent::Start).unwrap();
        lifecycle.abort(session.id, plan.id).unwrap();

        assert_eq!(session.status, SessionStatus::Planned);
        assert_eq!(
            lifecycle.apply(&mut session, plan.id).unwrap_err(),
            ApplyError::NoPending
        );
    }

    #[test]
    fn apply_with_foreign_plan_id_keeps_pending() {
        let lifecycle = SessionLifecycle::new();
        let mut session = session(SessionStatus::Planned);

        let plan = lifecycle.plan(&session, SessionEvent::Start).unwrap();
        let other = Uuid::new_v4();
        assert_eq!(
            lifecycle.apply(&mut session, other).unwrap_err(),
            ApplyError::IdMismatch {
                expected: plan.id,
                got: other,
            }
        );
        assert_eq!(lifecycle.pending(session.id), Some(SessionStatus::Started));
    }
}
