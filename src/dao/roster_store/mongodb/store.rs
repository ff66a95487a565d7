use std::{future::Future, sync::Arc};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::{IndexOptions, ReturnDocument},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        MongoMatchDocument, MongoMatchStatDocument, MongoMemberDocument, MongoParticipantDocument,
        MongoRegistrationDocument, MongoSessionDocument, MongoSessionTeamDocument,
        MongoTeamDocument, doc_id,
    },
};
use crate::dao::{
    models::{
        MatchEntity, MatchStatDelta, MatchStatEntity, ParticipantEntity, RegistrationEntity,
        SessionEntity, SessionTeamEntity, TeamEntity, TeamMemberEntity,
    },
    roster_store::RosterStore,
    storage::StorageResult,
};

const SESSIONS: &str = "sessions";
const PARTICIPANTS: &str = "participants";
const TEAMS: &str = "teams";
const MEMBERS: &str = "team_members";
const REGISTRATIONS: &str = "registrations";
const SESSION_TEAMS: &str = "session_teams";
const MATCHES: &str = "matches";
const MATCH_STATS: &str = "match_stats";

struct IndexSpec {
    collection: &'static str,
    name: &'static str,
    keys: Document,
    unique: bool,
    sparse: bool,
}

fn index_specs() -> Vec<IndexSpec> {
    vec![
        IndexSpec {
            collection: PARTICIPANTS,
            name: "participant_phone_idx",
            keys: doc! {"phone": 1},
            unique: true,
            sparse: true,
        },
        IndexSpec {
            collection: PARTICIPANTS,
            name: "participant_handle_idx",
            keys: doc! {"handle": 1},
            unique: true,
            sparse: true,
        },
        IndexSpec {
            collection: PARTICIPANTS,
            name: "participant_channel_idx",
            keys: doc! {"linked_channel": 1},
            unique: true,
            sparse: true,
        },
        IndexSpec {
            collection: TEAMS,
            name: "team_invite_idx",
            keys: doc! {"invite_token": 1},
            unique: true,
            sparse: true,
        },
        IndexSpec {
            collection: MEMBERS,
            name: "member_pair_idx",
            keys: doc! {"team_id": 1, "participant_id": 1},
            unique: true,
            sparse: false,
        },
        IndexSpec {
            collection: MEMBERS,
            name: "member_participant_idx",
            keys: doc! {"participant_id": 1},
            unique: false,
            sparse: false,
        },
        IndexSpec {
            collection: REGISTRATIONS,
            name: "registration_session_idx",
            keys: doc! {"session_id": 1, "created_at": 1},
            unique: false,
            sparse: false,
        },
        IndexSpec {
            collection: SESSION_TEAMS,
            name: "session_team_pair_idx",
            keys: doc! {"session_id": 1, "team_id": 1},
            unique: true,
            sparse: false,
        },
        IndexSpec {
            collection: MATCHES,
            name: "match_session_idx",
            keys: doc! {"session_id": 1, "created_at": 1},
            unique: false,
            sparse: false,
        },
        IndexSpec {
            collection: MATCH_STATS,
            name: "match_stat_pair_idx",
            keys: doc! {"match_id": 1, "participant_id": 1},
            unique: true,
            sparse: false,
        },
    ]
}

/// MongoDB-backed [`RosterStore`] with one collection per table.
#[derive(Clone)]
pub struct MongoRosterStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = self.config.open().await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoRosterStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = config.open().await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        for spec in index_specs() {
            let options = IndexOptions::builder()
                .name(Some(spec.name.to_owned()))
                .unique(spec.unique.then_some(true))
                .sparse(spec.sparse.then_some(true))
                .build();
            let model = IndexModel::builder()
                .keys(spec.keys)
                .options(options)
                .build();

            database
                .collection::<Document>(spec.collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: spec.collection,
                    index: spec.name,
                    source,
                })?;
        }
        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<D: Send + Sync>(&self, name: &str) -> Collection<D> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<D>(name)
    }

    fn run<T, F, Fut>(&self, op: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = MongoResult<T>> + Send + 'static,
    {
        let fut = op(self.clone());
        Box::pin(async move { fut.await.map_err(Into::into) })
    }

    async fn fetch_one<D, E>(&self, name: &'static str, filter: Document) -> MongoResult<Option<E>>
    where
        D: DeserializeOwned + Unpin + Send + Sync,
        E: TryFrom<D, Error = MongoDaoError>,
    {
        self.collection::<D>(name)
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: name,
                source,
            })?
            .map(E::try_from)
            .transpose()
    }

    async fn fetch_many<D, E>(
        &self,
        name: &'static str,
        filter: Document,
        sort: Document,
    ) -> MongoResult<Vec<E>>
    where
        D: DeserializeOwned + Unpin + Send + Sync,
        E: TryFrom<D, Error = MongoDaoError>,
    {
        let documents: Vec<D> = self
            .collection::<D>(name)
            .await
            .find(filter)
            .sort(sort)
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: name,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: name,
                source,
            })?;

        documents.into_iter().map(E::try_from).collect()
    }

    async fn upsert_by_id<D>(&self, name: &'static str, id: Uuid, document: D) -> MongoResult<()>
    where
        D: Serialize + Send + Sync,
    {
        self.collection::<D>(name)
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: name,
                source,
            })?;
        Ok(())
    }

    /// Insert a row guarded by a unique index. Returns `false` when it already exists.
    async fn insert_unique<D>(&self, name: &'static str, document: D) -> MongoResult<bool>
    where
        D: Serialize + Send + Sync,
    {
        match self.collection::<D>(name).await.insert_one(&document).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::Write {
                collection: name,
                source,
            }),
        }
    }

    async fn delete(&self, name: &'static str, filter: Document) -> MongoResult<bool> {
        let result = self
            .collection::<Document>(name)
            .await
            .delete_one(filter)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: name,
                source,
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn update_totals(&self, lock: SessionTeamEntity) -> MongoResult<()> {
        self.collection::<Document>(SESSION_TEAMS)
            .await
            .update_one(
                doc! {
                    "session_id": lock.session_id.to_string(),
                    "team_id": lock.team_id.to_string(),
                },
                doc! {"$set": {
                    "points": i64::from(lock.points),
                    "goals_for": i64::from(lock.goals_for),
                    "goals_against": i64::from(lock.goals_against),
                }},
            )
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: SESSION_TEAMS,
                source,
            })?;
        Ok(())
    }

    async fn apply_stat(&self, delta: MatchStatDelta) -> MongoResult<MatchStatEntity> {
        let mut update = doc! {
            "$inc": {
                "goals": i64::from(delta.goals),
                "assists": i64::from(delta.assists),
            },
        };
        match delta.won {
            Some(won) => {
                update.insert("$set", doc! {"won": won});
                update.insert(
                    "$setOnInsert",
                    doc! {"session_id": delta.session_id.to_string()},
                );
            }
            None => {
                update.insert(
                    "$setOnInsert",
                    doc! {"session_id": delta.session_id.to_string(), "won": false},
                );
            }
        }

        let document = self
            .collection::<MongoMatchStatDocument>(MATCH_STATS)
            .await
            .find_one_and_update(
                doc! {
                    "match_id": delta.match_id.to_string(),
                    "participant_id": delta.participant_id.to_string(),
                },
                update,
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: MATCH_STATS,
                source,
            })?;

        match document {
            Some(document) => MatchStatEntity::try_from(document),
            // An upsert with `ReturnDocument::After` always yields the row.
            None => Ok(MatchStatEntity {
                match_id: delta.match_id,
                session_id: delta.session_id,
                participant_id: delta.participant_id,
                goals: delta.goals,
                assists: delta.assists,
                won: delta.won.unwrap_or(false),
            }),
        }
    }
}

impl RosterStore for MongoRosterStore {
    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |store| async move {
            store
                .upsert_by_id(SESSIONS, session.id, MongoSessionDocument::from(session))
                .await
        })
    }

    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_one::<MongoSessionDocument, _>(SESSIONS, doc_id(id))
                .await
        })
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        self.run(|store| async move {
            store
                .fetch_many::<MongoSessionDocument, _>(SESSIONS, doc! {}, doc! {"starts_at": 1})
                .await
        })
    }

    fn save_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |store| async move {
            store
                .upsert_by_id(
                    PARTICIPANTS,
                    participant.id,
                    MongoParticipantDocument::from(participant),
                )
                .await
        })
    }

    fn find_participant(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_one::<MongoParticipantDocument, _>(PARTICIPANTS, doc_id(id))
                .await
        })
    }

    fn find_participants_by_phone(
        &self,
        phone: String,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_many::<MongoParticipantDocument, _>(
                    PARTICIPANTS,
                    doc! {"phone": phone},
                    doc! {"created_at": 1},
                )
                .await
        })
    }

    fn find_participant_by_channel(
        &self,
        channel_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_one::<MongoParticipantDocument, _>(
                    PARTICIPANTS,
                    doc! {"linked_channel": channel_id},
                )
                .await
        })
    }

    fn find_participant_by_handle(
        &self,
        handle: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_one::<MongoParticipantDocument, _>(PARTICIPANTS, doc! {"handle": handle})
                .await
        })
    }

    fn delete_participant(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |store| async move { store.delete(PARTICIPANTS, doc_id(id)).await })
    }

    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |store| async move {
            store
                .upsert_by_id(TEAMS, team.id, MongoTeamDocument::from(team))
                .await
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_one::<MongoTeamDocument, _>(TEAMS, doc_id(id))
                .await
        })
    }

    fn find_team_by_invite(
        &self,
        token: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_one::<MongoTeamDocument, _>(TEAMS, doc! {"invite_token": token})
                .await
        })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        self.run(|store| async move {
            store
                .fetch_many::<MongoTeamDocument, _>(TEAMS, doc! {}, doc! {"created_at": 1})
                .await
        })
    }

    fn delete_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |store| async move { store.delete(TEAMS, doc_id(id)).await })
    }

    fn add_member(&self, member: TeamMemberEntity) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |store| async move {
            store
                .insert_unique(MEMBERS, MongoMemberDocument::from(member))
                .await
        })
    }

    fn remove_member(
        &self,
        team_id: Uuid,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |store| async move {
            store
                .delete(
                    MEMBERS,
                    doc! {
                        "team_id": team_id.to_string(),
                        "participant_id": participant_id.to_string(),
                    },
                )
                .await
        })
    }

    fn list_members(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_many::<MongoMemberDocument, _>(
                    MEMBERS,
                    doc! {"team_id": team_id.to_string()},
                    doc! {"joined_at": 1},
                )
                .await
        })
    }

    fn list_memberships(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamMemberEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_many::<MongoMemberDocument, _>(
                    MEMBERS,
                    doc! {"participant_id": participant_id.to_string()},
                    doc! {"joined_at": 1},
                )
                .await
        })
    }

    fn save_registration(
        &self,
        registration: RegistrationEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |store| async move {
            store
                .upsert_by_id(
                    REGISTRATIONS,
                    registration.id,
                    MongoRegistrationDocument::from(registration),
                )
                .await
        })
    }

    fn find_registration(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<RegistrationEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_one::<MongoRegistrationDocument, _>(REGISTRATIONS, doc_id(id))
                .await
        })
    }

    fn list_registrations(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<RegistrationEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_many::<MongoRegistrationDocument, _>(
                    REGISTRATIONS,
                    doc! {"session_id": session_id.to_string()},
                    doc! {"created_at": 1},
                )
                .await
        })
    }

    fn lock_team(&self, lock: SessionTeamEntity) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |store| async move {
            store
                .insert_unique(SESSION_TEAMS, MongoSessionTeamDocument::from(lock))
                .await
        })
    }

    fn unlock_team(
        &self,
        session_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |store| async move {
            store
                .delete(
                    SESSION_TEAMS,
                    doc! {
                        "session_id": session_id.to_string(),
                        "team_id": team_id.to_string(),
                    },
                )
                .await
        })
    }

    fn list_session_teams(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionTeamEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_many::<MongoSessionTeamDocument, _>(
                    SESSION_TEAMS,
                    doc! {"session_id": session_id.to_string()},
                    doc! {"locked_at": 1},
                )
                .await
        })
    }

    fn list_locks_for_team(
        &self,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<SessionTeamEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_many::<MongoSessionTeamDocument, _>(
                    SESSION_TEAMS,
                    doc! {"team_id": team_id.to_string()},
                    doc! {"locked_at": 1},
                )
                .await
        })
    }

    fn update_session_team_totals(
        &self,
        lock: SessionTeamEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |store| async move { store.update_totals(lock).await })
    }

    fn save_match(&self, record: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |store| async move {
            store
                .upsert_by_id(MATCHES, record.id, MongoMatchDocument::from(record))
                .await
        })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_one::<MongoMatchDocument, _>(MATCHES, doc_id(id))
                .await
        })
    }

    fn list_matches(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_many::<MongoMatchDocument, _>(
                    MATCHES,
                    doc! {"session_id": session_id.to_string()},
                    doc! {"created_at": 1},
                )
                .await
        })
    }

    fn apply_match_stat(
        &self,
        delta: MatchStatDelta,
    ) -> BoxFuture<'static, StorageResult<MatchStatEntity>> {
        self.run(move |store| async move { store.apply_stat(delta).await })
    }

    fn list_match_stats(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchStatEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_many::<MongoMatchStatDocument, _>(
                    MATCH_STATS,
                    doc! {"session_id": session_id.to_string()},
                    doc! {"_id": 1},
                )
                .await
        })
    }

    fn list_participant_stats(
        &self,
        participant_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchStatEntity>>> {
        self.run(move |store| async move {
            store
                .fetch_many::<MongoMatchStatDocument, _>(
                    MATCH_STATS,
                    doc! {"participant_id": participant_id.to_string()},
                    doc! {"_id": 1},
                )
                .await
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
