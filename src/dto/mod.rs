use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Health probe bodies.
pub mod health;
/// Reports of the organizer maintenance jobs.
pub mod maintenance;
pub mod matches;
pub mod participant;
pub mod registration;
pub mod session;
/// Payloads pushed over the SSE streams.
pub mod sse;
pub mod standings;
pub mod team;
pub mod validation;

pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse an RFC 3339 timestamp coming from a request body.
pub(crate) fn parse_system_time(value: &str) -> Result<SystemTime, time::error::Parse> {
    OffsetDateTime::parse(value.trim(), &Rfc3339).map(SystemTime::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_survive_formatting() {
        let parsed = parse_system_time("2026-05-01T18:30:00Z").unwrap();
        assert_eq!(format_system_time(parsed), "2026-05-01T18:30:00Z");
        assert!(parse_system_time("next friday").is_err());
    }
}
