use kickoff_back::{
    dao::{models::RegistrationStatus, roster_store::RosterStore},
    dto::registration::{
        PlacementKind, RegistrationState, RejectRegistrationRequest, SubmitRegistrationRequest,
    },
    error::ServiceError,
    services::{notifier::NotificationKind, registration_service, roster_service, session_service},
};

mod common;
use common::{
    SQUAD, approved_individual, create_session, locked_count, participant, register_individual,
    register_team, spawn_state, team_of,
};

#[tokio::test]
async fn last_individual_fills_partial_pool_without_new_team() {
    // Arrange: two pool teams at 7/7 and 6/7 in a two-slot session.
    let app = spawn_state().await;
    let session_id = create_session(&app, 2).await;
    for index in 0..(2 * SQUAD - 1) {
        approved_individual(&app, session_id, &format!("solo {index}")).await;
    }
    let rosters = roster_service::load_rosters(&app.store, session_id)
        .await
        .unwrap();
    assert_eq!(roster_service::pool_sizes(&rosters), vec![SQUAD, SQUAD - 1]);

    // Act
    let player = participant(&app, "latecomer").await;
    let registration = register_individual(&app, session_id, player).await;
    let approval = registration_service::approve_registration(&app.state, registration)
        .await
        .unwrap();

    // Assert
    assert_eq!(approval.placement.kind, PlacementKind::JoinedPool);
    assert_eq!(approval.placement.team_id, rosters[1].team.id);
    assert_eq!(locked_count(&app, session_id).await, 2);
    assert_eq!(app.store.list_teams().await.unwrap().len(), 2);
    assert_eq!(
        app.notifier.received(player),
        vec![NotificationKind::RegistrationApproved]
    );

    let overflow = participant(&app, "one too many").await;
    let err = registration_service::submit_registration(
        &app.state,
        session_id,
        SubmitRegistrationRequest {
            participant_id: overflow,
            team_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::CapacityExhausted(ref m) if m == "session full"));
}

#[tokio::test]
async fn rejection_changes_no_roster() {
    let app = spawn_state().await;
    let session_id = create_session(&app, 4).await;
    let (team_id, captain) = team_of(&app, "Reds", SQUAD).await;
    let registration = register_team(&app, session_id, team_id, captain).await;

    let rejected = registration_service::reject_registration(
        &app.state,
        registration,
        RejectRegistrationRequest {
            reason: Some("  pitch booked  ".into()),
        },
    )
    .await
    .unwrap();

    assert_eq!(rejected.status, RegistrationState::Rejected);
    assert_eq!(rejected.reason.as_deref(), Some("pitch booked"));
    assert_eq!(locked_count(&app, session_id).await, 0);
    let members = app.store.list_members(team_id).await.unwrap();
    assert_eq!(members.len(), SQUAD);
    for member in members {
        assert_eq!(
            app.notifier.received(member.participant_id),
            vec![NotificationKind::RegistrationRejected]
        );
    }

    let stored = app
        .store
        .find_registration(registration)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(stored.status, RegistrationStatus::Rejected { .. }));
}

#[tokio::test]
async fn team_of_wrong_size_is_denied() {
    let app = spawn_state().await;
    let session_id = create_session(&app, 4).await;
    let (team_id, captain) = team_of(&app, "Shorthanded", 5).await;

    let err = registration_service::submit_registration(
        &app.state,
        session_id,
        SubmitRegistrationRequest {
            participant_id: captain,
            team_id: Some(team_id),
        },
    )
    .await
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "team must have exactly 7 players (has 5)"
    );
}

#[tokio::test]
async fn team_denied_once_every_slot_is_locked() {
    let app = spawn_state().await;
    let session_id = create_session(&app, 1).await;
    let (first, first_captain) = team_of(&app, "Reds", SQUAD).await;
    let (second, second_captain) = team_of(&app, "Blues", SQUAD).await;

    let first_registration = register_team(&app, session_id, first, first_captain).await;
    let second_registration = register_team(&app, session_id, second, second_captain).await;
    let approval = registration_service::approve_registration(&app.state, first_registration)
        .await
        .unwrap();
    assert_eq!(approval.placement.kind, PlacementKind::LockedTeam);

    let err = registration_service::approve_registration(&app.state, second_registration)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::CapacityExhausted(ref m) if m == "session full"));
    assert_eq!(locked_count(&app, session_id).await, 1);

    let stored = app
        .store
        .find_registration(second_registration)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, RegistrationStatus::Pending);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = spawn_state().await;
    let session_id = create_session(&app, 4).await;
    let player = participant(&app, "eager").await;
    register_individual(&app, session_id, player).await;

    let err = registration_service::submit_registration(
        &app.state,
        session_id,
        SubmitRegistrationRequest {
            participant_id: player,
            team_id: None,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn only_the_captain_registers_a_team() {
    let app = spawn_state().await;
    let session_id = create_session(&app, 4).await;
    let (team_id, _) = team_of(&app, "Reds", SQUAD).await;
    let outsider = participant(&app, "outsider").await;

    let err = registration_service::submit_registration(
        &app.state,
        session_id,
        SubmitRegistrationRequest {
            participant_id: outsider,
            team_id: Some(team_id),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn decided_registration_cannot_be_decided_again() {
    let app = spawn_state().await;
    let session_id = create_session(&app, 4).await;
    let player = participant(&app, "solo").await;
    let registration = register_individual(&app, session_id, player).await;

    let first = registration_service::approve_registration(&app.state, registration)
        .await
        .unwrap();
    assert_eq!(first.placement.kind, PlacementKind::CreatedPool);

    let again = registration_service::approve_registration(&app.state, registration)
        .await
        .unwrap_err();
    assert!(matches!(again, ServiceError::InvalidState(_)));

    let reject = registration_service::reject_registration(
        &app.state,
        registration,
        RejectRegistrationRequest { reason: None },
    )
    .await
    .unwrap_err();
    assert!(matches!(reject, ServiceError::InvalidState(_)));
    assert_eq!(locked_count(&app, session_id).await, 1);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = spawn_state().await;
    let player = participant(&app, "lost").await;

    let err = registration_service::submit_registration(
        &app.state,
        uuid::Uuid::new_v4(),
        SubmitRegistrationRequest {
            participant_id: player,
            team_id: None,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn started_session_refuses_submission_and_approval() {
    // Arrange: a pending registration left over when the session starts.
    let app = spawn_state().await;
    let session_id = create_session(&app, 4).await;
    let early = participant(&app, "early").await;
    let pending = register_individual(&app, session_id, early).await;
    session_service::start_session(&app.state, session_id)
        .await
        .unwrap();
    let locked_before = locked_count(&app, session_id).await;

    // Act
    let late = participant(&app, "late").await;
    let submit = registration_service::submit_registration(
        &app.state,
        session_id,
        SubmitRegistrationRequest {
            participant_id: late,
            team_id: None,
        },
    )
    .await
    .unwrap_err();
    let approve = registration_service::approve_registration(&app.state, pending)
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(submit, ServiceError::InvalidState(ref m) if m.contains("already started")));
    assert!(matches!(approve, ServiceError::InvalidState(_)));
    assert_eq!(locked_count(&app, session_id).await, locked_before);

    let stored = app.store.find_registration(pending).await.unwrap().unwrap();
    assert_eq!(stored.status, RegistrationStatus::Pending);
}
