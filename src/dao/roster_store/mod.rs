pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    MatchEntity, MatchStatDelta, MatchStatEntity, ParticipantEntity, RegistrationEntity,
    SessionEntity, SessionTeamEntity, TeamEntity, TeamMemberEntity,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for sessions, rosters, and match records.
///
/// Listing operations return rows in creation order. Uniqueness constraints
/// (phone, handle, linked channel, `(team, participant)`, `(session, team)`,
/// `(match, participant)`) are enforced by the backend and surface as
/// [`StorageError::Conflict`](crate::dao::storage::StorageError::Conflict).
pub trait RosterStore: Send + Sync {
    /// Insert or replace a session.
    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Session by id.
    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    /// Every session.
    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>>;

    /// Insert or replace a participant.
    fn save_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Participant by id.
    fn find_participant(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// Participants holding a normalised phone.
    fn find_participants_by_phone(
        &self,
        phone: String,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    /// Participant whose live channel is `channel_id`.
    fn find_participant_by_channel(
        &self,
        channel_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// Participant by lowercase handle.
    fn find_participant_by_handle(
        &self,
        handle: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// Delete a participant. Returns `false` when it did not exist.
    fn delete_participant(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert or replace a team.
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Team by id.
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Team whose current invite carries `token`.
    fn find_team_by_invite(
        &self,
        token: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Every team.
    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    /// Delete a team. Memberships and locks are left to the caller.
    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert a membership. Returns `false` when the pair already exists.
    fn add_member(&self, member: TeamMemberEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Delete a membership. Returns `false` when it did not exist.
    fn remove_member(
        &self,
        team_id: Uuid,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Members of a team in join order.
    fn list_members(&self, team_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>>;
    /// Teams a participant belongs to.
    fn list_memberships(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>>;

    /// Insert or replace a registration.
    fn save_registration(
        &self,
        registration: RegistrationEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Registration by id.
    fn find_registration(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<RegistrationEntity>>>;
    /// Registrations of a session.
    fn list_registrations(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<RegistrationEntity>>>;

    /// Create a roster lock. Returns `false` when `(session, team)` is already locked.
    fn lock_team(&self, lock: SessionTeamEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Release a roster lock. Returns `false` when there was none.
    fn unlock_team(
        &self,
        session_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Locks of a session in lock order.
    fn list_session_teams(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionTeamEntity>>>;
    /// Sessions a team is locked into.
    fn list_locks_for_team(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionTeamEntity>>>;
    /// Overwrite the cached totals of an existing lock.
    fn update_session_team_totals(
        &self,
        lock: SessionTeamEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Insert or replace a match.
    fn save_match(&self, record: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Match by id.
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    /// Matches of a session.
    fn list_matches(&self, session_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;

    /// Additively upsert a stat row and return its new value.
    fn apply_match_stat(
        &self,
        delta: MatchStatDelta,
    ) -> BoxFuture<'static, StorageResult<MatchStatEntity>>;
    /// Stat rows of a session.
    fn list_match_stats(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchStatEntity>>>;
    /// Stat rows of a participant across sessions.
    fn list_participant_stats(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchStatEntity>>>;

    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
