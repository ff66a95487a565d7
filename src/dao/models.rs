use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Pitch format of a session. The squad size for each kind comes from configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Five players a side.
    FiveASide,
    /// Six players a side.
    SixASide,
}

/// Lifecycle of a session. Only ever advances forward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Open for registrations.
    Planned,
    /// Rosters formed, matches under way.
    Started,
    /// Over. Standings are final.
    Finished,
}

/// Reminders already delivered for a session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderMarks {
    /// The reminder about a day ahead went out.
    pub early: bool,
    /// The reminder a few hours ahead went out.
    pub last: bool,
}

/// One scheduled, time-boxed instance of the recurring activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionEntity {
    /// Primary key of the session.
    pub id: Uuid,
    /// Pitch format.
    pub kind: SessionKind,
    /// Inclusive start of the time window.
    pub starts_at: SystemTime,
    /// Exclusive end of the time window.
    pub ends_at: SystemTime,
    /// Maximum number of locked rosters.
    pub max_teams: u32,
    /// Required headcount of a roster, fixed when the session is created.
    pub squad_size: u32,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// Reminders sent so far.
    pub reminders: ReminderMarks,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the session was updated.
    pub updated_at: SystemTime,
}

/// Whether a participant is a real user or a record created on someone's behalf.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    /// Created implicitly (e.g. a teammate added by a captain) and waiting to be merged.
    Placeholder,
    /// Reached the system through its own chat channel.
    Active,
}

/// Link between a participant and an external chat channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChannelLink {
    /// Never reached through a channel.
    Unlinked,
    /// Reachable through `channel_id`.
    Linked {
        /// External chat channel id.
        channel_id: String,
    },
    /// The channel was handed over to another participant.
    Severed {
        /// Channel the participant used to have.
        previous_channel_id: String,
        /// When the link was cut.
        severed_at: SystemTime,
    },
}

impl ChannelLink {
    /// Channel id when the link is live.
    pub fn linked_id(&self) -> Option<&str> {
        match self {
            ChannelLink::Linked { channel_id } => Some(channel_id),
            _ => None,
        }
    }
}

/// Durable identity of a player, captain, or organizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Primary key of the participant.
    pub id: Uuid,
    /// Name shown on rosters.
    pub display_name: String,
    /// Normalised phone number, unique across participants.
    pub phone: Option<String>,
    /// Lowercase login handle, unique across participants.
    pub handle: Option<String>,
    /// Bcrypt hash of the password credential.
    pub password_hash: Option<String>,
    /// Chat channel link.
    pub channel: ChannelLink,
    /// Placeholder or active.
    pub status: ParticipantStatus,
    /// Set once the participant completed registration or logged in.
    pub activated: bool,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// How a team came to exist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TeamOrigin {
    /// Created and led by a captain.
    CaptainCreated,
    /// Synthetic team assembled from individual registrations.
    PoolGenerated,
}

/// Join token handed out by a captain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamInvite {
    /// Opaque token shared with invitees.
    pub token: String,
    /// The token is refused after this instant.
    pub expires_at: SystemTime,
}

/// A squad of participants, either captain-led or assembled from the pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Primary key of the team.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Captain of the team. Nominal only for pool teams.
    pub captain_id: Uuid,
    /// How the team came to exist.
    pub origin: TeamOrigin,
    /// Current invite, if any.
    pub invite: Option<TeamInvite>,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Role of a member inside a team.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Leads the team.
    Captain,
    /// Regular member.
    Player,
}

/// Membership of a participant in a team, unique per pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamMemberEntity {
    /// The team.
    pub team_id: Uuid,
    /// The member.
    pub participant_id: Uuid,
    /// Captain or player.
    pub role: MemberRole,
    /// When the participant joined.
    pub joined_at: SystemTime,
}

/// What a registration asks to admit into a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistrationSubject {
    /// A captain-created team asking for a roster slot.
    Team {
        /// Team to lock.
        team_id: Uuid,
    },
    /// A single player asking for a pool seat.
    Individual {
        /// Player to place.
        participant_id: Uuid,
    },
}

/// Decision state of a registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Waiting for an organizer.
    Pending,
    /// Accepted and placed.
    Approved,
    /// Declined by an organizer.
    Rejected {
        /// Optional explanation shown to the submitter.
        reason: Option<String>,
    },
}

/// Signup request for a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationEntity {
    /// Primary key of the registration.
    pub id: Uuid,
    /// Session asked for.
    pub session_id: Uuid,
    /// Team or individual.
    pub subject: RegistrationSubject,
    /// Participant who submitted the request (the captain for team registrations).
    pub submitted_by: Uuid,
    /// Decision state.
    pub status: RegistrationStatus,
    /// Submission timestamp.
    pub created_at: SystemTime,
    /// When an organizer approved or rejected the request.
    pub decided_at: Option<SystemTime>,
}

/// Locked roster slot: a team confirmed to play in a session, with cached totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionTeamEntity {
    /// The session.
    pub session_id: Uuid,
    /// The locked team.
    pub team_id: Uuid,
    /// Table points so far.
    pub points: u32,
    /// Goals scored so far.
    pub goals_for: u32,
    /// Goals conceded so far.
    pub goals_against: u32,
    /// When the slot was taken. Orders rosters.
    pub locked_at: SystemTime,
}

impl SessionTeamEntity {
    /// Fresh lock with zeroed totals.
    pub fn new(session_id: Uuid, team_id: Uuid) -> Self {
        Self {
            session_id,
            team_id,
            points: 0,
            goals_for: 0,
            goals_against: 0,
            locked_at: SystemTime::now(),
        }
    }
}

/// Outcome of a match from the home side's view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    /// Home team won.
    Home,
    /// Away team won.
    Away,
    /// No winner.
    Draw,
}

/// Match between two locked rosters of a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    /// Primary key of the match.
    pub id: Uuid,
    /// Session the match belongs to.
    pub session_id: Uuid,
    /// Home roster.
    pub home_team_id: Uuid,
    /// Away roster.
    pub away_team_id: Uuid,
    /// Home goals, once reported.
    pub home_score: Option<u32>,
    /// Away goals, once reported.
    pub away_score: Option<u32>,
    /// Result tag, recorded independently of the scores.
    pub result: Option<MatchResult>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the match was updated.
    pub updated_at: SystemTime,
}

/// Per (match, participant) accumulation of events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchStatEntity {
    /// The match.
    pub match_id: Uuid,
    /// Session of the match.
    pub session_id: Uuid,
    /// The player.
    pub participant_id: Uuid,
    /// Goals scored.
    pub goals: u32,
    /// Assists given.
    pub assists: u32,
    /// Whether the player was on the winning side.
    pub won: bool,
}

/// Additive update applied to a [`MatchStatEntity`]. `won` is left untouched when `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchStatDelta {
    /// The match.
    pub match_id: Uuid,
    /// Session of the match.
    pub session_id: Uuid,
    /// The player.
    pub participant_id: Uuid,
    /// Goals to add.
    pub goals: u32,
    /// Assists to add.
    pub assists: u32,
    /// New win flag, if it changes.
    pub won: Option<bool>,
}
