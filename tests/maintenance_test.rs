use std::time::{Duration, SystemTime};

use kickoff_back::{
    config::AppConfig,
    dao::{
        models::{SessionTeamEntity, TeamEntity, TeamOrigin},
        roster_store::RosterStore,
    },
    dto::registration::SubmitRegistrationRequest,
    error::ServiceError,
    services::{maintenance_service, registration_service},
};
use uuid::Uuid;

mod common;
use common::{
    TestApp, approved_individual, create_session, locked_count, participant, register_individual,
    spawn_state, spawn_state_with,
};

async fn orphan_pool_team(app: &TestApp) -> Uuid {
    let captain = participant(app, "leftover").await;
    let team = TeamEntity {
        id: Uuid::new_v4(),
        name: "Pool 9".into(),
        captain_id: captain,
        origin: TeamOrigin::PoolGenerated,
        invite: None,
        created_at: SystemTime::now(),
    };
    app.store.save_team(team.clone()).await.unwrap();
    team.id
}

#[tokio::test]
async fn dangling_lock_holds_its_slot_until_released() {
    // Arrange: the only slot is held by a lock whose team is gone.
    let app = spawn_state().await;
    let session_id = create_session(&app, 1).await;
    let ghost = Uuid::new_v4();
    app.store
        .lock_team(SessionTeamEntity::new(session_id, ghost))
        .await
        .unwrap();
    let player = participant(&app, "solo").await;

    // Act
    let denied = registration_service::submit_registration(
        &app.state,
        session_id,
        SubmitRegistrationRequest {
            participant_id: player,
            team_id: None,
        },
    )
    .await
    .unwrap_err();
    let report = maintenance_service::enforce_max_teams(&app.state)
        .await
        .unwrap();

    // Assert
    assert!(matches!(denied, ServiceError::CapacityExhausted(ref m) if m == "session full"));
    assert_eq!(report.sessions_trimmed, 1);
    assert_eq!(report.unlocked.len(), 1);
    assert_eq!(report.unlocked[0].team_id, ghost);
    assert_eq!(locked_count(&app, session_id).await, 0);

    register_individual(&app, session_id, player).await;
}

#[tokio::test]
async fn dropped_pool_team_is_deleted_with_its_lock() {
    let app = spawn_state().await;
    let session_id = create_session(&app, 2).await;
    approved_individual(&app, session_id, "solo").await;
    let pool = app.store.list_session_teams(session_id).await.unwrap()[0].team_id;

    let mut session = app.store.find_session(session_id).await.unwrap().unwrap();
    session.max_teams = 0;
    app.store.save_session(session).await.unwrap();

    let report = maintenance_service::enforce_max_teams(&app.state)
        .await
        .unwrap();

    assert_eq!(report.deleted_pool_teams, vec![pool]);
    assert_eq!(locked_count(&app, session_id).await, 0);
    assert!(app.store.find_team(pool).await.unwrap().is_none());
}

#[tokio::test]
async fn fresh_pool_team_survives_cleanup() {
    let app = spawn_state().await;
    let team_id = orphan_pool_team(&app).await;

    let report = maintenance_service::cleanup_pool_teams(&app.state)
        .await
        .unwrap();

    assert!(report.deleted_team_ids.is_empty());
    assert!(app.store.find_team(team_id).await.unwrap().is_some());
}

#[tokio::test]
async fn settled_orphan_pool_team_is_deleted() {
    let app = spawn_state_with(AppConfig {
        pool_cleanup_grace: Duration::ZERO,
        ..AppConfig::default()
    })
    .await;
    let orphan = orphan_pool_team(&app).await;
    let session_id = create_session(&app, 2).await;
    approved_individual(&app, session_id, "solo").await;
    let locked = app.store.list_session_teams(session_id).await.unwrap()[0].team_id;

    let report = maintenance_service::cleanup_pool_teams(&app.state)
        .await
        .unwrap();

    assert_eq!(report.deleted_team_ids, vec![orphan]);
    assert!(app.store.find_team(orphan).await.unwrap().is_none());
    assert!(app.store.find_team(locked).await.unwrap().is_some());
}
