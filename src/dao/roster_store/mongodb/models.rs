use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::{
    ChannelLink, MatchEntity, MatchResult, MatchStatEntity, MemberRole, ParticipantEntity,
    ParticipantStatus, RegistrationEntity, RegistrationStatus, RegistrationSubject, ReminderMarks,
    SessionEntity, SessionKind, SessionStatus, SessionTeamEntity, TeamEntity, TeamInvite,
    TeamMemberEntity, TeamOrigin,
};

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

pub fn parse_id(value: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(value).map_err(|source| MongoDaoError::InvalidId {
        value: value.to_owned(),
        source,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSessionDocument {
    #[serde(rename = "_id")]
    id: String,
    kind: SessionKind,
    starts_at: DateTime,
    ends_at: DateTime,
    max_teams: u32,
    squad_size: u32,
    status: SessionStatus,
    #[serde(default)]
    reminders: ReminderMarks,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<SessionEntity> for MongoSessionDocument {
    fn from(value: SessionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            kind: value.kind,
            starts_at: DateTime::from_system_time(value.starts_at),
            ends_at: DateTime::from_system_time(value.ends_at),
            max_teams: value.max_teams,
            squad_size: value.squad_size,
            status: value.status,
            reminders: value.reminders,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoSessionDocument> for SessionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSessionDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(&value.id)?,
            kind: value.kind,
            starts_at: value.starts_at.to_system_time(),
            ends_at: value.ends_at.to_system_time(),
            max_teams: value.max_teams,
            squad_size: value.squad_size,
            status: value.status,
            reminders: value.reminders,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

/// Participant row. Unique fields are omitted when unset so sparse indexes skip them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoParticipantDocument {
    #[serde(rename = "_id")]
    id: String,
    display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    linked_channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    severed_channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    severed_at: Option<DateTime>,
    status: ParticipantStatus,
    #[serde(default)]
    activated: bool,
    created_at: DateTime,
}

impl From<ParticipantEntity> for MongoParticipantDocument {
    fn from(value: ParticipantEntity) -> Self {
        let (linked_channel, severed_channel, severed_at) = match value.channel {
            ChannelLink::Unlinked => (None, None, None),
            ChannelLink::Linked { channel_id } => (Some(channel_id), None, None),
            ChannelLink::Severed {
                previous_channel_id,
                severed_at,
            } => (
                None,
                Some(previous_channel_id),
                Some(DateTime::from_system_time(severed_at)),
            ),
        };
        Self {
            id: value.id.to_string(),
            display_name: value.display_name,
            phone: value.phone,
            handle: value.handle,
            password_hash: value.password_hash,
            linked_channel,
            severed_channel,
            severed_at,
            status: value.status,
            activated: value.activated,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoParticipantDocument> for ParticipantEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoParticipantDocument) -> MongoResult<Self> {
        let channel = match (value.linked_channel, value.severed_channel) {
            (Some(channel_id), _) => ChannelLink::Linked { channel_id },
            (None, Some(previous_channel_id)) => ChannelLink::Severed {
                previous_channel_id,
                severed_at: value
                    .severed_at
                    .unwrap_or(value.created_at)
                    .to_system_time(),
            },
            (None, None) => ChannelLink::Unlinked,
        };
        Ok(Self {
            id: parse_id(&value.id)?,
            display_name: value.display_name,
            phone: value.phone,
            handle: value.handle,
            password_hash: value.password_hash,
            channel,
            status: value.status,
            activated: value.activated,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    captain_id: String,
    origin: TeamOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invite_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invite_expires_at: Option<DateTime>,
    created_at: DateTime,
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        let (invite_token, invite_expires_at) = match value.invite {
            Some(invite) => (
                Some(invite.token),
                Some(DateTime::from_system_time(invite.expires_at)),
            ),
            None => (None, None),
        };
        Self {
            id: value.id.to_string(),
            name: value.name,
            captain_id: value.captain_id.to_string(),
            origin: value.origin,
            invite_token,
            invite_expires_at,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoTeamDocument> for TeamEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTeamDocument) -> MongoResult<Self> {
        let invite = match (value.invite_token, value.invite_expires_at) {
            (Some(token), Some(expires_at)) => Some(TeamInvite {
                token,
                expires_at: expires_at.to_system_time(),
            }),
            _ => None,
        };
        Ok(Self {
            id: parse_id(&value.id)?,
            name: value.name,
            captain_id: parse_id(&value.captain_id)?,
            origin: value.origin,
            invite,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMemberDocument {
    team_id: String,
    participant_id: String,
    role: MemberRole,
    joined_at: DateTime,
}

impl From<TeamMemberEntity> for MongoMemberDocument {
    fn from(value: TeamMemberEntity) -> Self {
        Self {
            team_id: value.team_id.to_string(),
            participant_id: value.participant_id.to_string(),
            role: value.role,
            joined_at: DateTime::from_system_time(value.joined_at),
        }
    }
}

impl TryFrom<MongoMemberDocument> for TeamMemberEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMemberDocument) -> MongoResult<Self> {
        Ok(Self {
            team_id: parse_id(&value.team_id)?,
            participant_id: parse_id(&value.participant_id)?,
            role: value.role,
            joined_at: value.joined_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SubjectKind {
    Team,
    Individual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DecisionState {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRegistrationDocument {
    #[serde(rename = "_id")]
    id: String,
    session_id: String,
    subject_kind: SubjectKind,
    subject_id: String,
    submitted_by: String,
    status: DecisionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    created_at: DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    decided_at: Option<DateTime>,
}

impl From<RegistrationEntity> for MongoRegistrationDocument {
    fn from(value: RegistrationEntity) -> Self {
        let (subject_kind, subject_id) = match value.subject {
            RegistrationSubject::Team { team_id } => (SubjectKind::Team, team_id),
            RegistrationSubject::Individual { participant_id } => {
                (SubjectKind::Individual, participant_id)
            }
        };
        let (status, reason) = match value.status {
            RegistrationStatus::Pending => (DecisionState::Pending, None),
            RegistrationStatus::Approved => (DecisionState::Approved, None),
            RegistrationStatus::Rejected { reason } => (DecisionState::Rejected, reason),
        };
        Self {
            id: value.id.to_string(),
            session_id: value.session_id.to_string(),
            subject_kind,
            subject_id: subject_id.to_string(),
            submitted_by: value.submitted_by.to_string(),
            status,
            reason,
            created_at: DateTime::from_system_time(value.created_at),
            decided_at: value.decided_at.map(DateTime::from_system_time),
        }
    }
}

impl TryFrom<MongoRegistrationDocument> for RegistrationEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoRegistrationDocument) -> MongoResult<Self> {
        let subject_id = parse_id(&value.subject_id)?;
        let subject = match value.subject_kind {
            SubjectKind::Team => RegistrationSubject::Team {
                team_id: subject_id,
            },
            SubjectKind::Individual => RegistrationSubject::Individual {
                participant_id: subject_id,
            },
        };
        let status = match value.status {
            DecisionState::Pending => RegistrationStatus::Pending,
            DecisionState::Approved => RegistrationStatus::Approved,
            DecisionState::Rejected => RegistrationStatus::Rejected {
                reason: value.reason,
            },
        };
        Ok(Self {
            id: parse_id(&value.id)?,
            session_id: parse_id(&value.session_id)?,
            subject,
            submitted_by: parse_id(&value.submitted_by)?,
            status,
            created_at: value.created_at.to_system_time(),
            decided_at: value.decided_at.map(|at| at.to_system_time()),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSessionTeamDocument {
    session_id: String,
    team_id: String,
    points: u32,
    goals_for: u32,
    goals_against: u32,
    locked_at: DateTime,
}

impl From<SessionTeamEntity> for MongoSessionTeamDocument {
    fn from(value: SessionTeamEntity) -> Self {
        Self {
            session_id: value.session_id.to_string(),
            team_id: value.team_id.to_string(),
            points: value.points,
            goals_for: value.goals_for,
            goals_against: value.goals_against,
            locked_at: DateTime::from_system_time(value.locked_at),
        }
    }
}

impl TryFrom<MongoSessionTeamDocument> for SessionTeamEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSessionTeamDocument) -> MongoResult<Self> {
        Ok(Self {
            session_id: parse_id(&value.session_id)?,
            team_id: parse_id(&value.team_id)?,
            points: value.points,
            goals_for: value.goals_for,
            goals_against: value.goals_against,
            locked_at: value.locked_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    id: String,
    session_id: String,
    home_team_id: String,
    away_team_id: String,
    home_score: Option<u32>,
    away_score: Option<u32>,
    result: Option<MatchResult>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<MatchEntity> for MongoMatchDocument {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id.to_string(),
            session_id: value.session_id.to_string(),
            home_team_id: value.home_team_id.to_string(),
            away_team_id: value.away_team_id.to_string(),
            home_score: value.home_score,
            away_score: value.away_score,
            result: value.result,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoMatchDocument> for MatchEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMatchDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(&value.id)?,
            session_id: parse_id(&value.session_id)?,
            home_team_id: parse_id(&value.home_team_id)?,
            away_team_id: parse_id(&value.away_team_id)?,
            home_score: value.home_score,
            away_score: value.away_score,
            result: value.result,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchStatDocument {
    match_id: String,
    session_id: String,
    participant_id: String,
    #[serde(default)]
    goals: u32,
    #[serde(default)]
    assists: u32,
    #[serde(default)]
    won: bool,
}

impl TryFrom<MongoMatchStatDocument> for MatchStatEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMatchStatDocument) -> MongoResult<Self> {
        Ok(Self {
            match_id: parse_id(&value.match_id)?,
            session_id: parse_id(&value.session_id)?,
            participant_id: parse_id(&value.participant_id)?,
            goals: value.goals,
            assists: value.assists,
            won: value.won,
        })
    }
}
