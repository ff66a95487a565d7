//! Application-level configuration loading: squad sizes, capacity defaults, and timers.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::models::SessionKind;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "KICKOFF_BACK_CONFIG_PATH";
/// Environment variable holding the organizer token expected in `x-admin-token`.
const ADMIN_TOKEN_ENV: &str = "KICKOFF_ADMIN_TOKEN";
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Roster headcount for five-a-side sessions.
    pub five_a_side_squad: u32,
    /// Roster headcount for six-a-side sessions.
    pub six_a_side_squad: u32,
    /// Roster slots of a session when the organizer does not specify any.
    pub default_max_teams: u32,
    /// Length of the top scorer and top assist lists.
    pub leaderboard_size: usize,
    /// How long a team invite stays valid.
    pub invite_ttl: Duration,
    /// Lead time of the first reminder.
    pub early_reminder: Duration,
    /// Lead time of the final reminder.
    pub final_reminder: Duration,
    /// How often the reminder loop wakes up.
    pub reminder_poll_interval: Duration,
    /// Bcrypt work factor for participant passwords.
    pub bcrypt_cost: u32,
    /// Upper bound on a lifecycle transition, formation included.
    pub transition_timeout: Duration,
    /// Minimum age of a pool team before cleanup may delete it.
    pub pool_cleanup_grace: Duration,
    /// Buffer of the public SSE channel.
    pub sse_capacity: usize,
    /// Organizer token. Organizer routes are closed when unset.
    pub admin_token: Option<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    /// The organizer token always comes from the environment.
    pub fn load() -> Self {
        let mut config = Self::load_file();
        config.admin_token = env::var(ADMIN_TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty());
        if config.admin_token.is_none() {
            warn!("{ADMIN_TOKEN_ENV} is not set; organizer routes are disabled");
        }
        config
    }

    fn load_file() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        five_a_side = app_config.five_a_side_squad,
                        six_a_side = app_config.six_a_side_squad,
                        max_teams = app_config.default_max_teams,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Required roster headcount for a session kind.
    pub fn squad_size(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::FiveASide => self.five_a_side_squad,
            SessionKind::SixASide => self.six_a_side_squad,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    squad_size: RawSquadSizes,
    default_max_teams: u32,
    leaderboard_size: usize,
    invite_ttl_days: u64,
    early_reminder_hours: u64,
    final_reminder_hours: u64,
    reminder_poll_minutes: u64,
    bcrypt_cost: u32,
    transition_timeout_secs: u64,
    pool_cleanup_grace_minutes: u64,
    sse_capacity: usize,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            squad_size: RawSquadSizes::default(),
            default_max_teams: 4,
            leaderboard_size: 10,
            invite_ttl_days: 7,
            early_reminder_hours: 24,
            final_reminder_hours: 5,
            reminder_poll_minutes: 30,
            bcrypt_cost: 10,
            transition_timeout_secs: 10,
            pool_cleanup_grace_minutes: 10,
            sse_capacity: 64,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawSquadSizes {
    five_a_side: u32,
    six_a_side: u32,
}

impl Default for RawSquadSizes {
    fn default() -> Self {
        Self {
            five_a_side: 7,
            six_a_side: 7,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        const HOUR: u64 = 60 * 60;
        Self {
            five_a_side_squad: value.squad_size.five_a_side.max(1),
            six_a_side_squad: value.squad_size.six_a_side.max(1),
            default_max_teams: value.default_max_teams.max(1),
            leaderboard_size: value.leaderboard_size,
            invite_ttl: Duration::from_secs(value.invite_ttl_days * 24 * HOUR),
            early_reminder: Duration::from_secs(value.early_reminder_hours * HOUR),
            final_reminder: Duration::from_secs(value.final_reminder_hours * HOUR),
            reminder_poll_interval: Duration::from_secs(value.reminder_poll_minutes.max(1) * 60),
            bcrypt_cost: value.bcrypt_cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST),
            transition_timeout: Duration::from_secs(value.transition_timeout_secs.max(1)),
            pool_cleanup_grace: Duration::from_secs(value.pool_cleanup_grace_minutes * 60),
            sse_capacity: value.sse_capacity.max(1),
            admin_token: None,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"squad_size": {"six_a_side": 8}, "invite_ttl_days": 1}"#)
                .unwrap();
        let config: AppConfig = raw.into();

        assert_eq!(config.squad_size(SessionKind::FiveASide), 7);
        assert_eq!(config.squad_size(SessionKind::SixASide), 8);
        assert_eq!(config.invite_ttl, Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.default_max_teams, 4);
    }

    #[test]
    fn bcrypt_cost_is_clamped() {
        let raw: RawConfig = serde_json::from_str(r#"{"bcrypt_cost": 1}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.bcrypt_cost, 4);
    }
}
