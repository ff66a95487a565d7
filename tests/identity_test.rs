use std::time::Duration;

use kickoff_back::{
    config::AppConfig,
    dao::{
        models::{ChannelLink, MemberRole, ParticipantStatus},
        roster_store::RosterStore,
    },
    dto::{
        participant::{ChannelRequest, CredentialsRequest, LoginRequest, PhoneRequest},
        team::{AddMemberRequest, CreateTeamRequest, JoinTeamRequest},
    },
    error::ServiceError,
    services::{identity_service, team_service},
};

mod common;
use common::{participant, spawn_state, spawn_state_with};

fn fast_hashing() -> AppConfig {
    AppConfig {
        bcrypt_cost: 4,
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn registering_a_phone_merges_the_placeholder() {
    // Arrange: a captain adds a teammate by phone before the teammate ever shows up.
    let app = spawn_state().await;
    let captain = participant(&app, "captain").await;
    let team = team_service::create_team(
        &app.state,
        CreateTeamRequest {
            captain_id: captain,
            name: "Reds".into(),
        },
    )
    .await
    .unwrap();
    let team = team_service::add_member(
        &app.state,
        team.id,
        AddMemberRequest {
            actor_id: captain,
            display_name: "Sam".into(),
            phone: Some("+33 6 12 34 56 78".into()),
        },
    )
    .await
    .unwrap();
    let placeholder_id = team
        .members
        .iter()
        .find(|member| member.role == MemberRole::Player)
        .unwrap()
        .participant_id;

    // Act
    let sam = participant(&app, "Sam").await;
    let registered = identity_service::register_phone(
        &app.state,
        sam,
        PhoneRequest {
            phone: "+33612345678".into(),
        },
    )
    .await
    .unwrap();

    // Assert
    assert_eq!(registered.phone.as_deref(), Some("+33612345678"));
    assert!(registered.activated);
    assert!(app.store.find_participant(placeholder_id).await.unwrap().is_none());
    let members = app.store.list_members(team.id).await.unwrap();
    assert!(members.iter().any(|member| member.participant_id == sam));
    assert!(!members.iter().any(|member| member.participant_id == placeholder_id));
}

#[tokio::test]
async fn phone_held_by_an_active_participant_conflicts() {
    let app = spawn_state().await;
    let first = participant(&app, "first").await;
    let second = participant(&app, "second").await;
    identity_service::register_phone(
        &app.state,
        first,
        PhoneRequest {
            phone: "0612345678".into(),
        },
    )
    .await
    .unwrap();

    let err = identity_service::register_phone(
        &app.state,
        second,
        PhoneRequest {
            phone: "06 12 34 56 78".into(),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(ref m) if m == "phone already registered"));
    let second = app.store.find_participant(second).await.unwrap().unwrap();
    assert_eq!(second.phone, None);
}

#[tokio::test]
async fn login_moves_the_channel_and_severs_the_old_holder() {
    let app = spawn_state_with(fast_hashing()).await;
    let owner = participant(&app, "owner").await;
    identity_service::set_credentials(
        &app.state,
        owner,
        CredentialsRequest {
            handle: "Striker_9".into(),
            password: "correct horse".into(),
        },
    )
    .await
    .unwrap();

    let newcomer = identity_service::ensure_participant(
        &app.state,
        ChannelRequest {
            channel_id: "chat-new-phone".into(),
            display_name: "owner on a new phone".into(),
        },
    )
    .await
    .unwrap();

    let logged_in = identity_service::login(
        &app.state,
        LoginRequest {
            channel_id: "chat-new-phone".into(),
            handle: "striker_9".into(),
            password: "correct horse".into(),
        },
    )
    .await
    .unwrap();

    assert_eq!(logged_in.id, owner);
    assert_eq!(logged_in.linked_channel.as_deref(), Some("chat-new-phone"));
    assert_eq!(logged_in.status, ParticipantStatus::Active);

    let previous = app.store.find_participant(newcomer.id).await.unwrap().unwrap();
    assert!(matches!(
        previous.channel,
        ChannelLink::Severed { ref previous_channel_id, .. } if previous_channel_id == "chat-new-phone"
    ));
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = spawn_state_with(fast_hashing()).await;
    let owner = participant(&app, "owner").await;
    identity_service::set_credentials(
        &app.state,
        owner,
        CredentialsRequest {
            handle: "keeper".into(),
            password: "correct horse".into(),
        },
    )
    .await
    .unwrap();

    let err = identity_service::login(
        &app.state,
        LoginRequest {
            channel_id: "chat-x".into(),
            handle: "keeper".into(),
            password: "battery staple".into(),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn handles_are_unique_case_insensitively() {
    let app = spawn_state_with(fast_hashing()).await;
    let first = participant(&app, "first").await;
    let second = participant(&app, "second").await;
    let credentials = |handle: &str| CredentialsRequest {
        handle: handle.into(),
        password: "long enough".into(),
    };
    identity_service::set_credentials(&app.state, first, credentials("Winger"))
        .await
        .unwrap();

    let err = identity_service::set_credentials(&app.state, second, credentials("winger"))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn joining_by_invite_twice_keeps_one_membership() {
    let app = spawn_state().await;
    let captain = participant(&app, "captain").await;
    let team = team_service::create_team(
        &app.state,
        CreateTeamRequest {
            captain_id: captain,
            name: "Blues".into(),
        },
    )
    .await
    .unwrap();
    let invite = team_service::generate_invite(&app.state, team.id, captain)
        .await
        .unwrap();
    assert_eq!(invite.token.len(), 12);

    let joiner = participant(&app, "joiner").await;
    let join = || JoinTeamRequest {
        token: invite.token.clone(),
        participant_id: joiner,
    };
    team_service::join_by_invite(&app.state, join()).await.unwrap();
    let summary = team_service::join_by_invite(&app.state, join()).await.unwrap();

    assert_eq!(summary.members.len(), 2);
}

#[tokio::test]
async fn expired_invite_is_refused() {
    let app = spawn_state_with(AppConfig {
        invite_ttl: Duration::ZERO,
        ..AppConfig::default()
    })
    .await;
    let captain = participant(&app, "captain").await;
    let team = team_service::create_team(
        &app.state,
        CreateTeamRequest {
            captain_id: captain,
            name: "Greens".into(),
        },
    )
    .await
    .unwrap();
    let invite = team_service::generate_invite(&app.state, team.id, captain)
        .await
        .unwrap();

    let joiner = participant(&app, "joiner").await;
    let err = team_service::join_by_invite(
        &app.state,
        JoinTeamRequest {
            token: invite.token,
            participant_id: joiner,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn only_the_captain_adds_members() {
    let app = spawn_state().await;
    let captain = participant(&app, "captain").await;
    let outsider = participant(&app, "outsider").await;
    let team = team_service::create_team(
        &app.state,
        CreateTeamRequest {
            captain_id: captain,
            name: "Whites".into(),
        },
    )
    .await
    .unwrap();

    let err = team_service::add_member(
        &app.state,
        team.id,
        AddMemberRequest {
            actor_id: outsider,
            display_name: "friend".into(),
            phone: None,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ServiceError::Unauthorized(_)));
}
