use std::{env, time::Duration};

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::{info, warn};

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DB: &str = "kickoff";
const URI_ENV: &str = "MONGO_URI";
const DB_ENV: &str = "MONGO_DB";
const PING_ATTEMPTS: u32 = 10;

/// Doubling delays between initial pings, capped at five seconds.
#[derive(Debug, Clone, Copy)]
struct PingBackoff {
    next: Duration,
}

impl PingBackoff {
    const FIRST: Duration = Duration::from_millis(250);
    const CAP: Duration = Duration::from_secs(5);

    fn new() -> Self {
        Self { next: Self::FIRST }
    }
}

impl Iterator for PingBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        self.next = (current * 2).min(Self::CAP);
        Some(current)
    }
}

/// Where the roster collections live.
#[derive(Clone)]
pub struct MongoConfig {
    /// Driver options parsed from the connection URI.
    pub options: ClientOptions,
    /// Database holding the collections.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse `uri`. `database_name` defaults to `kickoff`.
    pub async fn from_uri(uri: &str, database_name: Option<&str>) -> MongoResult<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;
        Ok(Self {
            options,
            database_name: database_name.unwrap_or(DEFAULT_DB).to_owned(),
        })
    }

    /// Read `MONGO_URI` (required) and `MONGO_DB` (defaults to `kickoff`).
    pub async fn from_env() -> MongoResult<Self> {
        let uri = env::var(URI_ENV).map_err(|_| MongoDaoError::MissingEnvVar { var: URI_ENV })?;
        let database_name = env::var(DB_ENV).ok();
        Self::from_uri(&uri, database_name.as_deref()).await
    }

    /// Build a client and ping the database until it answers or the attempts run out.
    pub(super) async fn open(&self) -> MongoResult<(Client, Database)> {
        let client = Client::with_options(self.options.clone())
            .map_err(|source| MongoDaoError::ClientConstruction { source })?;
        let database = client.database(&self.database_name);

        let mut backoff = PingBackoff::new();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match database.run_command(doc! { "ping": 1 }).await {
                Ok(_) => {
                    info!(database = %self.database_name, attempt, "connected to MongoDB");
                    return Ok((client, database));
                }
                Err(source) if attempt >= PING_ATTEMPTS => {
                    return Err(MongoDaoError::InitialPing {
                        attempts: attempt,
                        source,
                    });
                }
                Err(err) => {
                    let wait = backoff.next().unwrap_or(PingBackoff::CAP);
                    warn!(
                        attempt,
                        wait_ms = wait.as_millis(),
                        error = %err,
                        "MongoDB ping failed; retrying"
                    );
                    sleep(wait).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_backoff_doubles_up_to_cap() {
        let delays: Vec<u128> = PingBackoff::new().take(6).map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![250, 500, 1000, 2000, 4000, 5000]);
    }
}
