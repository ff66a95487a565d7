//! Background loop reminding approved participants of upcoming sessions.

use std::time::{Duration, SystemTime};

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{RegistrationStatus, ReminderMarks, SessionStatus},
        roster_store::RosterStore,
    },
    dto::format_system_time,
    error::ServiceError,
    services::{
        notifier::{Notification, NotificationKind, notify_participants},
        roster_service,
    },
    state::SharedState,
};

/// Which reminder of a session is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderKind {
    /// About a day ahead.
    Early,
    /// A few hours ahead.
    Final,
}

impl ReminderKind {
    fn already_sent(self, marks: ReminderMarks) -> bool {
        match self {
            ReminderKind::Early => marks.early || marks.last,
            ReminderKind::Final => marks.last,
        }
    }

    /// A final reminder supersedes the early one.
    fn mark(self, marks: &mut ReminderMarks) {
        match self {
            ReminderKind::Early => marks.early = true,
            ReminderKind::Final => {
                marks.early = true;
                marks.last = true;
            }
        }
    }
}

/// Poll forever at the configured interval.
pub async fn run(state: SharedState) {
    let mut ticker = interval(state.config().reminder_poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if state.is_degraded() {
            continue;
        }
        match send_due_reminders(&state, SystemTime::now()).await {
            Ok(0) => {}
            Ok(count) => debug!(count, "session reminders sent"),
            Err(err) => warn!(error = %err, "reminder pass failed"),
        }
    }
}

fn due_reminder(
    until_start: Duration,
    early: Duration,
    final_lead: Duration,
) -> Option<ReminderKind> {
    if until_start <= final_lead {
        Some(ReminderKind::Final)
    } else if until_start <= early {
        Some(ReminderKind::Early)
    } else {
        None
    }
}

/// Send every reminder of a planned session that is due at `now` and not yet marked on the
/// session. Marks are persisted before delivery, so a restart never repeats a reminder.
/// Returns how many sessions were reminded.
pub async fn send_due_reminders(state: &SharedState, now: SystemTime) -> Result<usize, ServiceError> {
    let store = state.require_store().await?;
    let config = state.config();
    let mut reminded = 0;

    for session in store.list_sessions().await? {
        if session.status != SessionStatus::Planned {
            continue;
        }
        let Ok(until_start) = session.starts_at.duration_since(now) else {
            continue;
        };
        let Some(kind) = due_reminder(until_start, config.early_reminder, config.final_reminder)
        else {
            continue;
        };
        if kind.already_sent(session.reminders) {
            continue;
        }
        if !claim_reminder(state, store.as_ref(), session.id, kind).await? {
            continue;
        }

        let recipients = approved_participants(store.as_ref(), session.id).await?;
        let text = format!(
            "Reminder: your session starts at {}.",
            format_system_time(session.starts_at)
        );
        notify_participants(
            state,
            &recipients,
            Notification::new(NotificationKind::SessionReminder, Some(session.id), text),
        )
        .await;
        reminded += 1;
    }

    Ok(reminded)
}

/// Mark `kind` as sent under the session gate. `false` when the session moved on or the
/// reminder was already marked.
async fn claim_reminder(
    state: &SharedState,
    store: &dyn RosterStore,
    session_id: Uuid,
    kind: ReminderKind,
) -> Result<bool, ServiceError> {
    let gate = state.session_gate(session_id);
    let _guard = gate.lock().await;

    let Some(mut session) = store.find_session(session_id).await? else {
        return Ok(false);
    };
    if session.status != SessionStatus::Planned || kind.already_sent(session.reminders) {
        return Ok(false);
    }
    kind.mark(&mut session.reminders);
    session.updated_at = SystemTime::now();
    store.save_session(session).await?;
    info!(%session_id, kind = ?kind, "session reminder claimed");
    Ok(true)
}

/// Approved individuals plus every member of approved teams.
async fn approved_participants(
    store: &dyn RosterStore,
    session_id: Uuid,
) -> Result<Vec<Uuid>, ServiceError> {
    let mut participants = Vec::new();
    for registration in store.list_registrations(session_id).await? {
        if registration.status == RegistrationStatus::Approved {
            participants
                .extend(roster_service::subject_participants(store, registration.subject).await?);
        }
    }
    Ok(participants)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    #[test]
    fn final_reminder_supersedes_early() {
        let mut marks = ReminderMarks::default();
        ReminderKind::Final.mark(&mut marks);
        assert!(ReminderKind::Early.already_sent(marks));

        let mut marks = ReminderMarks::default();
        ReminderKind::Early.mark(&mut marks);
        assert!(!ReminderKind::Final.already_sent(marks));
    }

    #[test]
    fn final_window_wins_over_early_window() {
        assert_eq!(due_reminder(HOUR * 3, HOUR * 24, HOUR * 5), Some(ReminderKind::Final));
        assert_eq!(due_reminder(HOUR * 20, HOUR * 24, HOUR * 5), Some(ReminderKind::Early));
        assert_eq!(due_reminder(HOUR * 30, HOUR * 24, HOUR * 5), None);
    }
}
