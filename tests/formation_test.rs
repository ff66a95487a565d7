use kickoff_back::{
    dao::{
        models::{RegistrationSubject, SessionStatus, TeamOrigin},
        roster_store::RosterStore,
    },
    dto::session::SkipReasonView,
    services::{notifier::NotificationKind, roster_service, session_service},
};

mod common;
use common::{
    SQUAD, create_session, locked_count, participant, seed_approved, spawn_state, team_of,
};

#[tokio::test]
async fn three_teams_and_eight_individuals_fill_every_slot() {
    // Arrange
    let app = spawn_state().await;
    let session_id = create_session(&app, 4).await;

    for name in ["Reds", "Blues", "Greens"] {
        let (team_id, _) = team_of(&app, name, SQUAD).await;
        seed_approved(&app, session_id, RegistrationSubject::Team { team_id }).await;
    }
    let mut individuals = Vec::new();
    for index in 0..8 {
        let player = participant(&app, &format!("solo {index}")).await;
        seed_approved(
            &app,
            session_id,
            RegistrationSubject::Individual {
                participant_id: player,
            },
        )
        .await;
        individuals.push(player);
    }

    // Act
    let response = session_service::start_session(&app.state, session_id)
        .await
        .unwrap();

    // Assert
    assert_eq!(response.session.status, SessionStatus::Started);
    assert_eq!(response.formation.locked_team_ids.len(), 4);
    assert_eq!(response.formation.unplaced_participants, vec![individuals[7]]);
    assert_eq!(locked_count(&app, session_id).await, 4);

    let rosters = roster_service::load_rosters(&app.store, session_id)
        .await
        .unwrap();
    let pool = rosters.last().unwrap();
    assert_eq!(pool.team.origin, TeamOrigin::PoolGenerated);
    assert_eq!(pool.members.len(), SQUAD);
    assert_eq!(pool.team.name, "Pool 1");

    assert_eq!(
        app.notifier.received(individuals[7]),
        vec![NotificationKind::NotPlaced]
    );
    assert_eq!(
        app.notifier.received(individuals[0]),
        vec![NotificationKind::RosterLocked]
    );
}

#[tokio::test]
async fn formation_twice_adds_no_rows() {
    let app = spawn_state().await;
    let session_id = create_session(&app, 4).await;
    let (team_id, _) = team_of(&app, "Reds", SQUAD).await;
    seed_approved(&app, session_id, RegistrationSubject::Team { team_id }).await;
    for index in 0..3 {
        let player = participant(&app, &format!("solo {index}")).await;
        seed_approved(
            &app,
            session_id,
            RegistrationSubject::Individual {
                participant_id: player,
            },
        )
        .await;
    }
    session_service::start_session(&app.state, session_id)
        .await
        .unwrap();
    let before = locked_count(&app, session_id).await;

    let session = app.store.find_session(session_id).await.unwrap().unwrap();
    let report = roster_service::form_rosters(&app.store, &session)
        .await
        .unwrap();

    assert_eq!(before, 2);
    assert!(report.newly_locked.is_empty());
    assert_eq!(report.locked_team_ids.len(), 2);
    assert_eq!(locked_count(&app, session_id).await, 2);
    assert_eq!(app.store.list_teams().await.unwrap().len(), 2);
}

#[tokio::test]
async fn undersized_approved_team_is_skipped_at_formation() {
    let app = spawn_state().await;
    let session_id = create_session(&app, 4).await;
    let (short_team, _) = team_of(&app, "Shorthanded", 5).await;
    let (full_team, _) = team_of(&app, "Complete", SQUAD).await;
    seed_approved(&app, session_id, RegistrationSubject::Team { team_id: short_team }).await;
    seed_approved(&app, session_id, RegistrationSubject::Team { team_id: full_team }).await;

    let response = session_service::start_session(&app.state, session_id)
        .await
        .unwrap();

    assert_eq!(response.formation.newly_locked, vec![full_team]);
    let skipped = &response.formation.skipped_teams[0];
    assert_eq!(skipped.team_id, short_team);
    assert!(matches!(skipped.reason, SkipReasonView::Undersized));
    assert_eq!(skipped.member_count, Some(5));
}

#[tokio::test]
async fn session_with_no_registrations_still_starts() {
    let app = spawn_state().await;
    let session_id = create_session(&app, 4).await;

    let response = session_service::start_session(&app.state, session_id)
        .await
        .unwrap();

    assert!(response.formation.locked_team_ids.is_empty());
    assert_eq!(response.session.status, SessionStatus::Started);
}
