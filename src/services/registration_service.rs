//! Registration workflow: submission with an early capacity check, then organizer
//! approval (which places the subject immediately) or rejection.

use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{
            RegistrationEntity, RegistrationStatus, RegistrationSubject, SessionEntity,
            SessionStatus,
        },
        roster_store::RosterStore,
    },
    dto::registration::{
        ApprovalResponse, RegistrationSummary, RejectRegistrationRequest,
        SubmitRegistrationRequest,
    },
    error::ServiceError,
    services::{
        notifier::{Notification, NotificationKind, notify_participants},
        roster_service::{self, Placement},
        sse_events,
    },
    state::{SharedState, capacity},
};

async fn open_session(
    store: &dyn RosterStore,
    session_id: Uuid,
) -> Result<SessionEntity, ServiceError> {
    let session = store
        .find_session(session_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?;
    match session.status {
        SessionStatus::Planned => Ok(session),
        SessionStatus::Started => Err(ServiceError::InvalidState(format!(
            "session `{session_id}` has already started"
        ))),
        SessionStatus::Finished => Err(ServiceError::InvalidState(format!(
            "session `{session_id}` is finished"
        ))),
    }
}

async fn find_registration(
    store: &dyn RosterStore,
    registration_id: Uuid,
) -> Result<RegistrationEntity, ServiceError> {
    store
        .find_registration(registration_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("registration `{registration_id}` not found"))
        })
}

fn ensure_pending(registration: &RegistrationEntity) -> Result<(), ServiceError> {
    match registration.status {
        RegistrationStatus::Pending => Ok(()),
        RegistrationStatus::Approved => Err(ServiceError::InvalidState(format!(
            "registration `{}` is already approved",
            registration.id
        ))),
        RegistrationStatus::Rejected { .. } => Err(ServiceError::InvalidState(format!(
            "registration `{}` is already rejected",
            registration.id
        ))),
    }
}

/// Submit a registration for a session. Capacity is checked now and again at approval.
pub async fn submit_registration(
    state: &SharedState,
    session_id: Uuid,
    request: SubmitRegistrationRequest,
) -> Result<RegistrationSummary, ServiceError> {
    let store = state.require_store().await?;
    let gate = state.session_gate(session_id);
    let _guard = gate.lock().await;

    let session = open_session(store.as_ref(), session_id).await?;
    let participant_id = request.participant_id;
    if store.find_participant(participant_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "participant `{participant_id}` not found"
        )));
    }

    let rosters = roster_service::load_rosters(store.as_ref(), session_id).await?;
    let used = roster_service::slots_used(store.as_ref(), session_id).await?;
    let subject = match request.team_id {
        Some(team_id) => RegistrationSubject::Team { team_id },
        None => RegistrationSubject::Individual { participant_id },
    };

    let existing = store.list_registrations(session_id).await?;
    if existing.iter().any(|registration| {
        registration.subject == subject
            && matches!(
                registration.status,
                RegistrationStatus::Pending | RegistrationStatus::Approved
            )
    }) {
        return Err(ServiceError::Conflict(
            "registration already submitted for this session".into(),
        ));
    }

    match subject {
        RegistrationSubject::Team { team_id } => {
            let Some(team) = store.find_team(team_id).await? else {
                return Err(ServiceError::NotFound(format!("team `{team_id}` not found")));
            };
            if team.captain_id != participant_id {
                return Err(ServiceError::Unauthorized(
                    "only the captain can register a team".into(),
                ));
            }
            if rosters.iter().any(|roster| roster.team.id == team_id) {
                return Err(ServiceError::Conflict(
                    "team is already locked in this session".into(),
                ));
            }
            let member_count = store.list_members(team_id).await?.len();
            capacity::team_admission(&session, member_count, used)?;
        }
        RegistrationSubject::Individual { participant_id } => {
            if rosters.iter().any(|roster| roster.contains(participant_id)) {
                return Err(ServiceError::Conflict(
                    "participant already plays on a roster of this session".into(),
                ));
            }
            capacity::individual_admission(
                &session,
                &roster_service::pool_sizes(&rosters),
                used,
            )?;
        }
    }

    let registration = RegistrationEntity {
        id: Uuid::new_v4(),
        session_id,
        subject,
        submitted_by: participant_id,
        status: RegistrationStatus::Pending,
        created_at: SystemTime::now(),
        decided_at: None,
    };
    store.save_registration(registration.clone()).await?;
    info!(
        %session_id,
        registration_id = %registration.id,
        subject = ?registration.subject,
        "registration submitted"
    );
    Ok(registration.into())
}

/// Approve a pending registration and place its subject: a team is locked, an individual
/// goes through the pool allocator. Capacity is re-checked under the session gate.
pub async fn approve_registration(
    state: &SharedState,
    registration_id: Uuid,
) -> Result<ApprovalResponse, ServiceError> {
    let store = state.require_store().await?;
    let session_id = find_registration(store.as_ref(), registration_id)
        .await?
        .session_id;

    let gate = state.session_gate(session_id);
    let guard = gate.lock().await;

    let mut registration = find_registration(store.as_ref(), registration_id).await?;
    ensure_pending(&registration)?;
    let session = open_session(store.as_ref(), session_id).await?;

    let placement = match registration.subject {
        RegistrationSubject::Team { team_id } => {
            let rosters = roster_service::load_rosters(store.as_ref(), session_id).await?;
            if rosters.iter().any(|roster| roster.team.id == team_id) {
                Placement::AlreadyPlaced { team_id }
            } else {
                let member_count = store.list_members(team_id).await?.len();
                let used = roster_service::slots_used(store.as_ref(), session_id).await?;
                capacity::team_admission(&session, member_count, used)?;
                roster_service::lock_team(store.as_ref(), &session, team_id).await?
            }
        }
        RegistrationSubject::Individual { participant_id } => {
            roster_service::allocate_individual(store.as_ref(), &session, participant_id).await?
        }
    };

    registration.status = RegistrationStatus::Approved;
    registration.decided_at = Some(SystemTime::now());
    store.save_registration(registration.clone()).await?;
    drop(guard);

    info!(
        %session_id,
        %registration_id,
        placement = ?placement,
        "registration approved"
    );

    if matches!(
        placement,
        Placement::LockedTeam { .. } | Placement::CreatedPool { .. }
    ) {
        sse_events::broadcast_rosters_locked(state, session_id, &[placement.team_id()]);
    }
    notify_participants(
        state,
        &[registration.submitted_by],
        Notification::new(
            NotificationKind::RegistrationApproved,
            Some(session_id),
            "Your registration was approved.",
        ),
    )
    .await;

    Ok(ApprovalResponse {
        registration: registration.into(),
        placement: placement.into(),
    })
}

/// Reject a pending registration. No roster or counter is touched.
pub async fn reject_registration(
    state: &SharedState,
    registration_id: Uuid,
    request: RejectRegistrationRequest,
) -> Result<RegistrationSummary, ServiceError> {
    let store = state.require_store().await?;
    let session_id = find_registration(store.as_ref(), registration_id)
        .await?
        .session_id;

    let gate = state.session_gate(session_id);
    let guard = gate.lock().await;

    let mut registration = find_registration(store.as_ref(), registration_id).await?;
    ensure_pending(&registration)?;

    let reason = request
        .reason
        .map(|reason| reason.trim().to_string())
        .filter(|reason| !reason.is_empty());
    registration.status = RegistrationStatus::Rejected {
        reason: reason.clone(),
    };
    registration.decided_at = Some(SystemTime::now());
    store.save_registration(registration.clone()).await?;
    drop(guard);

    info!(%session_id, %registration_id, reason = ?reason, "registration rejected");

    let text = match &reason {
        Some(reason) => format!("Your registration was rejected: {reason}"),
        None => "Your registration was rejected.".to_string(),
    };
    let mut recipients = vec![registration.submitted_by];
    match roster_service::subject_participants(store.as_ref(), registration.subject).await {
        Ok(participants) => recipients.extend(participants),
        Err(err) => warn!(%registration_id, error = %err, "could not resolve rejected team members"),
    }
    notify_participants(
        state,
        &recipients,
        Notification::new(NotificationKind::RegistrationRejected, Some(session_id), text),
    )
    .await;

    Ok(registration.into())
}

/// Registrations of a session.
pub async fn list_registrations(
    state: &SharedState,
    session_id: Uuid,
) -> Result<Vec<RegistrationSummary>, ServiceError> {
    let store = state.require_store().await?;
    if store.find_session(session_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "session `{session_id}` not found"
        )));
    }
    let registrations = store.list_registrations(session_id).await?;
    Ok(registrations.into_iter().map(Into::into).collect())
}
