use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Kickoff Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::public::list_sessions,
        crate::routes::public::get_session,
        crate::routes::public::get_standings,
        crate::routes::public::get_top_players,
        crate::routes::public::get_rosters,
        crate::routes::public::list_registrations,
        crate::routes::public::submit_registration,
        crate::routes::participants::ensure_participant,
        crate::routes::participants::get_participant,
        crate::routes::participants::register_phone,
        crate::routes::participants::set_credentials,
        crate::routes::participants::login,
        crate::routes::participants::player_stats,
        crate::routes::teams::create_team,
        crate::routes::teams::get_team,
        crate::routes::teams::add_member,
        crate::routes::teams::remove_member,
        crate::routes::teams::generate_invite,
        crate::routes::teams::join_team,
        crate::routes::admin::create_session,
        crate::routes::admin::start_session,
        crate::routes::admin::stop_session,
        crate::routes::admin::approve_registration,
        crate::routes::admin::reject_registration,
        crate::routes::admin::create_match,
        crate::routes::admin::set_match_result,
        crate::routes::admin::record_match_stat,
        crate::routes::admin::enforce_max_teams,
        crate::routes::admin::cleanup_pool_teams,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::SessionStatusEvent,
            crate::dto::sse::RostersLockedEvent,
            crate::dto::sse::StandingsUpdatedEvent,
            crate::dao::models::SessionKind,
            crate::dao::models::SessionStatus,
            crate::dao::models::ParticipantStatus,
            crate::dao::models::TeamOrigin,
            crate::dao::models::MemberRole,
            crate::dao::models::MatchResult,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "sessions", description = "Sessions, standings, and rosters"),
        (name = "registrations", description = "Session signups"),
        (name = "participants", description = "Participant identity and stats"),
        (name = "teams", description = "Captain-managed teams"),
        (name = "organizer", description = "Organizer operations (require `X-Admin-Token`)"),
    )
)]
pub struct ApiDoc;
