use std::time::{Duration, SystemTime};

use kickoff_back::{
    dao::roster_store::RosterStore,
    services::{notifier::NotificationKind, reminder_service, session_service},
};
use uuid::Uuid;

mod common;
use common::{TestApp, approved_individual, create_session, spawn_state};

const HOUR: Duration = Duration::from_secs(60 * 60);

/// Move a session so that it starts `lead` after now.
async fn starting_in(app: &TestApp, session_id: Uuid, lead: Duration) {
    let mut session = app.store.find_session(session_id).await.unwrap().unwrap();
    session.starts_at = SystemTime::now() + lead;
    session.ends_at = session.starts_at + 2 * HOUR;
    app.store.save_session(session).await.unwrap();
}

#[tokio::test]
async fn final_reminder_goes_out_once() {
    // Arrange
    let app = spawn_state().await;
    let session_id = create_session(&app, 4).await;
    let player = approved_individual(&app, session_id, "solo").await;
    starting_in(&app, session_id, 2 * HOUR).await;

    // Act
    let first = reminder_service::send_due_reminders(&app.state, SystemTime::now())
        .await
        .unwrap();
    let second = reminder_service::send_due_reminders(&app.state, SystemTime::now())
        .await
        .unwrap();

    // Assert
    assert_eq!((first, second), (1, 0));
    assert_eq!(app.notifier.count(NotificationKind::SessionReminder), 1);
    assert!(app
        .notifier
        .received(player)
        .contains(&NotificationKind::SessionReminder));

    let stored = app.store.find_session(session_id).await.unwrap().unwrap();
    assert!(stored.reminders.early);
    assert!(stored.reminders.last);
}

#[tokio::test]
async fn early_then_final_reminder() {
    let app = spawn_state().await;
    let session_id = create_session(&app, 4).await;
    approved_individual(&app, session_id, "solo").await;
    starting_in(&app, session_id, 20 * HOUR).await;
    let now = SystemTime::now();

    let early = reminder_service::send_due_reminders(&app.state, now)
        .await
        .unwrap();
    let stored = app.store.find_session(session_id).await.unwrap().unwrap();
    assert_eq!(early, 1);
    assert!(stored.reminders.early);
    assert!(!stored.reminders.last);

    let repeat = reminder_service::send_due_reminders(&app.state, now + HOUR)
        .await
        .unwrap();
    let last = reminder_service::send_due_reminders(&app.state, now + 16 * HOUR)
        .await
        .unwrap();

    assert_eq!((repeat, last), (0, 1));
    assert_eq!(app.notifier.count(NotificationKind::SessionReminder), 2);
}

#[tokio::test]
async fn started_session_gets_no_reminder() {
    let app = spawn_state().await;
    let session_id = create_session(&app, 4).await;
    approved_individual(&app, session_id, "solo").await;
    session_service::start_session(&app.state, session_id)
        .await
        .unwrap();
    starting_in(&app, session_id, 2 * HOUR).await;

    let sent = reminder_service::send_due_reminders(&app.state, SystemTime::now())
        .await
        .unwrap();

    assert_eq!(sent, 0);
    assert_eq!(app.notifier.count(NotificationKind::SessionReminder), 0);
}
