//! In-process [`RosterStore`] used for local runs and the test suite.

use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    models::{
        MatchEntity, MatchStatDelta, MatchStatEntity, ParticipantEntity, RegistrationEntity,
        SessionEntity, SessionTeamEntity, TeamEntity, TeamMemberEntity,
    },
    roster_store::RosterStore,
    storage::{StorageError, StorageResult},
};

/// Tables keyed like the unique indexes of the persistent backends. `IndexMap`
/// keeps insertion order, which doubles as creation order for listings.
#[derive(Default)]
struct Tables {
    sessions: IndexMap<Uuid, SessionEntity>,
    participants: IndexMap<Uuid, ParticipantEntity>,
    teams: IndexMap<Uuid, TeamEntity>,
    members: IndexMap<(Uuid, Uuid), TeamMemberEntity>,
    registrations: IndexMap<Uuid, RegistrationEntity>,
    session_teams: IndexMap<(Uuid, Uuid), SessionTeamEntity>,
    matches: IndexMap<Uuid, MatchEntity>,
    match_stats: IndexMap<(Uuid, Uuid), MatchStatEntity>,
}

impl Tables {
    fn check_participant_unique(&self, candidate: &ParticipantEntity) -> StorageResult<()> {
        for other in self.participants.values().filter(|p| p.id != candidate.id) {
            if candidate.phone.is_some() && other.phone == candidate.phone {
                return Err(StorageError::conflict("phone already in use"));
            }
            if candidate.handle.is_some() && other.handle == candidate.handle {
                return Err(StorageError::conflict("handle already in use"));
            }
            if let Some(channel) = candidate.channel.linked_id()
                && other.channel.linked_id() == Some(channel)
            {
                return Err(StorageError::conflict("channel already linked"));
            }
        }
        Ok(())
    }
}

/// Memory-backed store. Cloning shares the same tables.
#[derive(Clone, Default)]
pub struct MemoryRosterStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryRosterStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T, F>(&self, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&Tables) -> StorageResult<T> + Send + 'static,
    {
        let tables = self.tables.clone();
        Box::pin(async move {
            let guard = tables.read().await;
            f(&guard)
        })
    }

    fn write<T, F>(&self, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut Tables) -> StorageResult<T> + Send + 'static,
    {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            f(&mut guard)
        })
    }
}

impl RosterStore for MemoryRosterStore {
    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |t| {
            t.sessions.insert(session.id, session);
            Ok(())
        })
    }

    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        self.read(move |t| Ok(t.sessions.get(&id).cloned()))
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        self.read(|t| Ok(t.sessions.values().cloned().collect()))
    }

    fn save_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |t| {
            t.check_participant_unique(&participant)?;
            t.participants.insert(participant.id, participant);
            Ok(())
        })
    }

    fn find_participant(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        self.read(move |t| Ok(t.participants.get(&id).cloned()))
    }

    fn find_participants_by_phone(
        &self,
        phone: String,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        self.read(move |t| {
            Ok(t.participants
                .values()
                .filter(|p| p.phone.as_deref() == Some(phone.as_str()))
                .cloned()
                .collect())
        })
    }

    fn find_participant_by_channel(
        &self,
        channel_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        self.read(move |t| {
            Ok(t.participants
                .values()
                .find(|p| p.channel.linked_id() == Some(channel_id.as_str()))
                .cloned())
        })
    }

    fn find_participant_by_handle(
        &self,
        handle: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        self.read(move |t| {
            Ok(t.participants
                .values()
                .find(|p| p.handle.as_deref() == Some(handle.as_str()))
                .cloned())
        })
    }

    fn delete_participant(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |t| Ok(t.participants.shift_remove(&id).is_some()))
    }

    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |t| {
            if let Some(invite) = &team.invite
                && t.teams.values().any(|other| {
                    other.id != team.id
                        && other.invite.as_ref().map(|i| &i.token) == Some(&invite.token)
                })
            {
                return Err(StorageError::conflict("invite token already in use"));
            }
            t.teams.insert(team.id, team);
            Ok(())
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        self.read(move |t| Ok(t.teams.get(&id).cloned()))
    }

    fn find_team_by_invite(
        &self,
        token: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        self.read(move |t| {
            Ok(t.teams
                .values()
                .find(|team| team.invite.as_ref().map(|i| i.token.as_str()) == Some(&token))
                .cloned())
        })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        self.read(|t| Ok(t.teams.values().cloned().collect()))
    }

    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |t| Ok(t.teams.shift_remove(&id).is_some()))
    }

    fn add_member(&self, member: TeamMemberEntity) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |t| {
            let key = (member.team_id, member.participant_id);
            if t.members.contains_key(&key) {
                return Ok(false);
            }
            t.members.insert(key, member);
            Ok(true)
        })
    }

    fn remove_member(
        &self,
        team_id: Uuid,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |t| Ok(t.members.shift_remove(&(team_id, participant_id)).is_some()))
    }

    fn list_members(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>> {
        self.read(move |t| {
            Ok(t.members
                .values()
                .filter(|m| m.team_id == team_id)
                .cloned()
                .collect())
        })
    }

    fn list_memberships(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>> {
        self.read(move |t| {
            Ok(t.members
                .values()
                .filter(|m| m.participant_id == participant_id)
                .cloned()
                .collect())
        })
    }

    fn save_registration(
        &self,
        registration: RegistrationEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |t| {
            t.registrations.insert(registration.id, registration);
            Ok(())
        })
    }

    fn find_registration(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<RegistrationEntity>>> {
        self.read(move |t| Ok(t.registrations.get(&id).cloned()))
    }

    fn list_registrations(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<RegistrationEntity>>> {
        self.read(move |t| {
            Ok(t.registrations
                .values()
                .filter(|r| r.session_id == session_id)
                .cloned()
                .collect())
        })
    }

    fn lock_team(&self, lock: SessionTeamEntity) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |t| {
            let key = (lock.session_id, lock.team_id);
            if t.session_teams.contains_key(&key) {
                return Ok(false);
            }
            t.session_teams.insert(key, lock);
            Ok(true)
        })
    }

    fn unlock_team(
        &self,
        session_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |t| Ok(t.session_teams.shift_remove(&(session_id, team_id)).is_some()))
    }

    fn list_session_teams(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionTeamEntity>>> {
        self.read(move |t| {
            Ok(t.session_teams
                .values()
                .filter(|st| st.session_id == session_id)
                .cloned()
                .collect())
        })
    }

    fn list_locks_for_team(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionTeamEntity>>> {
        self.read(move |t| {
            Ok(t.session_teams
                .values()
                .filter(|st| st.team_id == team_id)
                .cloned()
                .collect())
        })
    }

    fn update_session_team_totals(
        &self,
        lock: SessionTeamEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |t| {
            if let Some(existing) = t.session_teams.get_mut(&(lock.session_id, lock.team_id)) {
                existing.points = lock.points;
                existing.goals_for = lock.goals_for;
                existing.goals_against = lock.goals_against;
            }
            Ok(())
        })
    }

    fn save_match(&self, record: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |t| {
            t.matches.insert(record.id, record);
            Ok(())
        })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        self.read(move |t| Ok(t.matches.get(&id).cloned()))
    }

    fn list_matches(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        self.read(move |t| {
            Ok(t.matches
                .values()
                .filter(|m| m.session_id == session_id)
                .cloned()
                .collect())
        })
    }

    fn apply_match_stat(
        &self,
        delta: MatchStatDelta,
    ) -> BoxFuture<'static, StorageResult<MatchStatEntity>> {
        self.write(move |t| {
            let stat = t
                .match_stats
                .entry((delta.match_id, delta.participant_id))
                .or_insert_with(|| MatchStatEntity {
                    match_id: delta.match_id,
                    session_id: delta.session_id,
                    participant_id: delta.participant_id,
                    goals: 0,
                    assists: 0,
                    won: false,
                });
            stat.goals += delta.goals;
            stat.assists += delta.assists;
            if let Some(won) = delta.won {
                stat.won = won;
            }
            Ok(stat.clone())
        })
    }

    fn list_match_stats(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchStatEntity>>> {
        self.read(move |t| {
            Ok(t.match_stats
                .values()
                .filter(|s| s.session_id == session_id)
                .cloned()
                .collect())
        })
    }

    fn list_participant_stats(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchStatEntity>>> {
        self.read(move |t| {
            Ok(t.match_stats
                .values()
                .filter(|s| s.participant_id == participant_id)
                .cloned()
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::{ChannelLink, MemberRole, ParticipantStatus};

    fn participant(phone: Option<&str>, channel: Option<&str>) -> ParticipantEntity {
        ParticipantEntity {
            id: Uuid::new_v4(),
            display_name: "player".into(),
            phone: phone.map(Into::into),
            handle: None,
            password_hash: None,
            channel: channel
                .map(|id| ChannelLink::Linked {
                    channel_id: id.into(),
                })
                .unwrap_or(ChannelLink::Unlinked),
            status: ParticipantStatus::Active,
            activated: false,
            created_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_phone_is_a_conflict() {
        let store = MemoryRosterStore::new();
        store
            .save_participant(participant(Some("+998901112233"), None))
            .await
            .unwrap();

        let err = store
            .save_participant(participant(Some("+998901112233"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
    }

    #[tokio::test]
    async fn duplicate_linked_channel_is_a_conflict() {
        let store = MemoryRosterStore::new();
        store
            .save_participant(participant(None, Some("42")))
            .await
            .unwrap();

        let err = store
            .save_participant(participant(None, Some("42")))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
    }

    #[tokio::test]
    async fn memberships_are_deduplicated() {
        let store = MemoryRosterStore::new();
        let member = TeamMemberEntity {
            team_id: Uuid::new_v4(),
            participant_id: Uuid::new_v4(),
            role: MemberRole::Player,
            joined_at: SystemTime::now(),
        };

        assert!(store.add_member(member.clone()).await.unwrap());
        assert!(!store.add_member(member.clone()).await.unwrap());
        assert_eq!(store.list_members(member.team_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lock_is_keyed_by_session_and_team() {
        let store = MemoryRosterStore::new();
        let lock = SessionTeamEntity::new(Uuid::new_v4(), Uuid::new_v4());

        assert!(store.lock_team(lock.clone()).await.unwrap());
        assert!(!store.lock_team(lock.clone()).await.unwrap());
        assert_eq!(
            store.list_session_teams(lock.session_id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn match_stats_accumulate_and_keep_won() {
        let store = MemoryRosterStore::new();
        let delta = MatchStatDelta {
            match_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            participant_id: Uuid::new_v4(),
            goals: 1,
            assists: 0,
            won: Some(true),
        };

        store.apply_match_stat(delta.clone()).await.unwrap();
        let stat = store
            .apply_match_stat(MatchStatDelta {
                won: None,
                ..delta.clone()
            })
            .await
            .unwrap();

        assert_eq!(stat.goals, 2);
        assert!(stat.won);
    }
}
