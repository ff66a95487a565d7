use kickoff_back::{
    dao::{
        models::{MatchResult, RegistrationSubject},
        roster_store::RosterStore,
    },
    dto::matches::{CreateMatchRequest, MatchResultRequest, MatchStatRequest},
    error::ServiceError,
    services::{match_service, session_service, standings_service},
};
use uuid::Uuid;

mod common;
use common::{SQUAD, TestApp, create_session, seed_approved, spawn_state, team_of};

/// Running session with two locked teams; returns (session, home, away, home captain).
async fn running_pair(app: &TestApp) -> (Uuid, Uuid, Uuid, Uuid) {
    let session_id = create_session(app, 4).await;
    let (home, home_captain) = team_of(app, "Home", SQUAD).await;
    let (away, _) = team_of(app, "Away", SQUAD).await;
    seed_approved(app, session_id, RegistrationSubject::Team { team_id: home }).await;
    seed_approved(app, session_id, RegistrationSubject::Team { team_id: away }).await;
    session_service::start_session(&app.state, session_id)
        .await
        .unwrap();
    (session_id, home, away, home_captain)
}

async fn new_match(app: &TestApp, session_id: Uuid, home: Uuid, away: Uuid) -> Uuid {
    match_service::create_match(
        &app.state,
        session_id,
        CreateMatchRequest {
            home_team_id: home,
            away_team_id: away,
        },
    )
    .await
    .unwrap()
    .id
}

fn goal(participant_id: Uuid, won: Option<bool>) -> MatchStatRequest {
    MatchStatRequest {
        participant_id,
        goals: 1,
        assists: 0,
        won,
    }
}

#[tokio::test]
async fn first_goal_creates_the_row_and_later_goals_keep_the_win_flag() {
    let app = spawn_state().await;
    let (session_id, home, away, scorer) = running_pair(&app).await;
    let match_id = new_match(&app, session_id, home, away).await;

    let first = match_service::record_match_stat(&app.state, match_id, goal(scorer, None))
        .await
        .unwrap();
    assert_eq!(first.goals, 1);
    assert!(!first.won);

    match_service::record_match_stat(&app.state, match_id, goal(scorer, Some(true)))
        .await
        .unwrap();
    let third = match_service::record_match_stat(&app.state, match_id, goal(scorer, None))
        .await
        .unwrap();

    assert_eq!(third.goals, 3);
    assert!(third.won);
    assert_eq!(app.store.list_match_stats(session_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn decided_match_awards_three_points_and_draw_two() {
    let app = spawn_state().await;
    let (session_id, home, away, _) = running_pair(&app).await;
    let decided = new_match(&app, session_id, home, away).await;
    let drawn = new_match(&app, session_id, away, home).await;

    match_service::set_match_result(
        &app.state,
        decided,
        MatchResultRequest {
            home_score: Some(3),
            away_score: Some(1),
            result: Some(MatchResult::Home),
        },
    )
    .await
    .unwrap();
    let standings = standings_service::get_standings(&app.state, session_id)
        .await
        .unwrap();
    let total: u32 = standings.table.iter().map(|row| row.points).sum();
    assert_eq!(total, 3);
    assert_eq!(standings.table[0].team_id, home);
    assert_eq!(standings.table[0].goal_difference, 2);

    match_service::set_match_result(
        &app.state,
        drawn,
        MatchResultRequest {
            home_score: Some(2),
            away_score: Some(2),
            result: Some(MatchResult::Draw),
        },
    )
    .await
    .unwrap();
    let standings = standings_service::get_standings(&app.state, session_id)
        .await
        .unwrap();
    let total: u32 = standings.table.iter().map(|row| row.points).sum();
    assert_eq!(total, 5);

    let locks = app.store.list_session_teams(session_id).await.unwrap();
    let home_lock = locks.iter().find(|lock| lock.team_id == home).unwrap();
    assert_eq!(home_lock.points, 4);
    assert_eq!(home_lock.goals_for, 5);
    assert_eq!(home_lock.goals_against, 3);
}

#[tokio::test]
async fn finished_session_rejects_match_updates() {
    let app = spawn_state().await;
    let (session_id, home, away, scorer) = running_pair(&app).await;
    let match_id = new_match(&app, session_id, home, away).await;

    let stopped = session_service::stop_session(&app.state, session_id)
        .await
        .unwrap();
    assert_eq!(stopped.standings.table.len(), 2);

    let err = match_service::record_match_stat(&app.state, match_id, goal(scorer, None))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    let err = match_service::set_match_result(
        &app.state,
        match_id,
        MatchResultRequest {
            home_score: Some(1),
            away_score: Some(0),
            result: Some(MatchResult::Home),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn match_needs_two_distinct_locked_teams() {
    let app = spawn_state().await;
    let (session_id, home, _, _) = running_pair(&app).await;
    let (stranger, _) = team_of(&app, "Stranger", SQUAD).await;

    let same = match_service::create_match(
        &app.state,
        session_id,
        CreateMatchRequest {
            home_team_id: home,
            away_team_id: home,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(same, ServiceError::InvalidInput(_)));

    let unlocked = match_service::create_match(
        &app.state,
        session_id,
        CreateMatchRequest {
            home_team_id: home,
            away_team_id: stranger,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(unlocked, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn top_players_rank_scorers_and_assisters() {
    let app = spawn_state().await;
    let (session_id, home, away, captain) = running_pair(&app).await;
    let match_id = new_match(&app, session_id, home, away).await;
    let away_captain = app.store.find_team(away).await.unwrap().unwrap().captain_id;

    for request in [
        MatchStatRequest {
            participant_id: captain,
            goals: 2,
            assists: 0,
            won: None,
        },
        MatchStatRequest {
            participant_id: away_captain,
            goals: 1,
            assists: 2,
            won: None,
        },
    ] {
        match_service::record_match_stat(&app.state, match_id, request)
            .await
            .unwrap();
    }

    let top = standings_service::get_top_players(&app.state, session_id)
        .await
        .unwrap();

    let scorers: Vec<(Uuid, u32)> = top
        .top_scorers
        .iter()
        .map(|total| (total.participant_id, total.value))
        .collect();
    assert_eq!(scorers, vec![(captain, 2), (away_captain, 1)]);
    assert_eq!(top.top_assists.len(), 1);
    assert_eq!(top.top_assists[0].participant_id, away_captain);

    let stats = standings_service::player_stats(&app.state, away_captain)
        .await
        .unwrap();
    assert_eq!(stats.matches, 1);
    assert_eq!(stats.rating, 2.0);
}

#[tokio::test]
async fn standings_of_unknown_session_are_not_found() {
    let app = spawn_state().await;
    let err = standings_service::get_standings(&app.state, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
