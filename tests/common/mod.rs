#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::SystemTime,
};

use futures::future::BoxFuture;
use kickoff_back::{
    config::AppConfig,
    dao::{
        models::{
            ParticipantEntity, RegistrationEntity, RegistrationStatus, RegistrationSubject,
            SessionKind,
        },
        roster_store::{RosterStore, memory::MemoryRosterStore},
    },
    dto::{
        participant::ChannelRequest,
        registration::SubmitRegistrationRequest,
        session::CreateSessionRequest,
        team::{AddMemberRequest, CreateTeamRequest},
    },
    services::{
        identity_service,
        notifier::{Notification, NotificationKind, Notifier, NotifyError},
        registration_service, session_service, team_service,
    },
    state::{AppState, SharedState, cache::InMemoryStandingsCache},
};
use uuid::Uuid;

pub const ADMIN_TOKEN: &str = "organizer-secret";
pub const SQUAD: usize = 7;

/// Captures every notification instead of delivering it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Uuid, NotificationKind)>>,
}

impl RecordingNotifier {
    pub fn received(&self, participant_id: Uuid) -> Vec<NotificationKind> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == participant_id)
            .map(|(_, kind)| *kind)
            .collect()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, sent)| *sent == kind)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        participant: &ParticipantEntity,
        notification: Notification,
    ) -> BoxFuture<'static, Result<(), NotifyError>> {
        self.sent
            .lock()
            .unwrap()
            .push((participant.id, notification.kind));
        Box::pin(async { Ok(()) })
    }
}

pub struct TestApp {
    pub state: SharedState,
    pub store: MemoryRosterStore,
    pub notifier: Arc<RecordingNotifier>,
}

pub async fn spawn_state() -> TestApp {
    spawn_state_with(AppConfig::default()).await
}

pub async fn spawn_state_with(mut config: AppConfig) -> TestApp {
    config.admin_token = Some(ADMIN_TOKEN.to_string());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::new(
        config,
        Arc::new(InMemoryStandingsCache::new()),
        notifier.clone(),
    );
    let store = MemoryRosterStore::new();
    state.install_store(Arc::new(store.clone())).await;
    TestApp {
        state,
        store,
        notifier,
    }
}

pub fn session_request(max_teams: u32) -> CreateSessionRequest {
    CreateSessionRequest {
        kind: SessionKind::FiveASide,
        starts_at: "2030-06-12T18:00:00Z".into(),
        ends_at: "2030-06-12T20:00:00Z".into(),
        max_teams: Some(max_teams),
    }
}

pub async fn create_session(app: &TestApp, max_teams: u32) -> Uuid {
    session_service::create_session(&app.state, session_request(max_teams))
        .await
        .unwrap()
        .id
}

/// Participant reached through its own chat channel.
pub async fn participant(app: &TestApp, name: &str) -> Uuid {
    identity_service::ensure_participant(
        &app.state,
        ChannelRequest {
            channel_id: format!("chat-{}", Uuid::new_v4()),
            display_name: name.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

/// Team of `size` members: a real captain plus placeholder teammates.
pub async fn team_of(app: &TestApp, name: &str, size: usize) -> (Uuid, Uuid) {
    let captain = participant(app, &format!("{name} captain")).await;
    let team = team_service::create_team(
        &app.state,
        CreateTeamRequest {
            captain_id: captain,
            name: name.to_string(),
        },
    )
    .await
    .unwrap();

    for index in 1..size {
        team_service::add_member(
            &app.state,
            team.id,
            AddMemberRequest {
                actor_id: captain,
                display_name: format!("{name} player {index}"),
                phone: None,
            },
        )
        .await
        .unwrap();
    }
    (team.id, captain)
}

pub async fn register_team(app: &TestApp, session_id: Uuid, team_id: Uuid, captain: Uuid) -> Uuid {
    registration_service::submit_registration(
        &app.state,
        session_id,
        SubmitRegistrationRequest {
            participant_id: captain,
            team_id: Some(team_id),
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn register_individual(app: &TestApp, session_id: Uuid, participant_id: Uuid) -> Uuid {
    registration_service::submit_registration(
        &app.state,
        session_id,
        SubmitRegistrationRequest {
            participant_id,
            team_id: None,
        },
    )
    .await
    .unwrap()
    .id
}

/// Register and approve an individual through the normal flow.
pub async fn approved_individual(app: &TestApp, session_id: Uuid, name: &str) -> Uuid {
    let player = participant(app, name).await;
    let registration = register_individual(app, session_id, player).await;
    registration_service::approve_registration(&app.state, registration)
        .await
        .unwrap();
    player
}

/// Write an approved registration straight into the store, bypassing placement, as
/// data carried over from before formation would look.
pub async fn seed_approved(app: &TestApp, session_id: Uuid, subject: RegistrationSubject) {
    let submitted_by = match subject {
        RegistrationSubject::Individual { participant_id } => participant_id,
        RegistrationSubject::Team { team_id } => {
            app.store.find_team(team_id).await.unwrap().unwrap().captain_id
        }
    };
    app.store
        .save_registration(RegistrationEntity {
            id: Uuid::new_v4(),
            session_id,
            subject,
            submitted_by,
            status: RegistrationStatus::Approved,
            created_at: SystemTime::now(),
            decided_at: Some(SystemTime::now()),
        })
        .await
        .unwrap();
}

pub async fn locked_count(app: &TestApp, session_id: Uuid) -> usize {
    app.store
        .list_session_teams(session_id)
        .await
        .unwrap()
        .len()
}
