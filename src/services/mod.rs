/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Participant identity, phone merge, and credentials.
pub mod identity_service;
/// Organizer maintenance jobs.
pub mod maintenance_service;
/// Match records and per-player stats.
pub mod match_service;
/// Outbound participant notifications.
pub mod notifier;
/// Registration submission, approval, and rejection.
pub mod registration_service;
/// Session reminder loop.
pub mod reminder_service;
/// Pool allocation and roster formation.
pub mod roster_service;
/// Session scheduling and lifecycle.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming.
pub mod sse_service;
/// Standings recomputation and leaderboards.
pub mod standings_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// Captain-managed teams and invites.
pub mod team_service;
