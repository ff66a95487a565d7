use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::SessionStatus,
    dto::standings::{StandingsView, TopPlayersView},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    /// SSE event name; the default `message` event when `None`.
    pub event: Option<String>,
    /// Serialised JSON payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Name of the stream joined.
    pub stream: String,
    /// Greeting text.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// Whether storage is currently unavailable.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a session moves through its lifecycle.
pub struct SessionStatusEvent {
    /// The session.
    pub session_id: Uuid,
    /// New status.
    pub status: SessionStatus,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when rosters get locked, by approval or by formation.
pub struct RostersLockedEvent {
    /// The session.
    pub session_id: Uuid,
    /// Teams locked by the change.
    pub team_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after every standings recomputation.
pub struct StandingsUpdatedEvent {
    /// Fresh table.
    pub standings: StandingsView,
    /// Fresh leaderboards.
    pub top_players: TopPlayersView,
}
