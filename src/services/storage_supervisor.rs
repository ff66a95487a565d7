use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{roster_store::RosterStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Keep a roster store installed: connect with backoff, poll its health, and flip degraded
/// mode while it is unreachable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn RosterStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
                continue;
            }
        };

        state.install_store(store.clone()).await;
        info!("storage connection established");
        delay = INITIAL_DELAY;

        while supervise(&state, store.as_ref()).await {
            sleep(HEALTH_POLL_INTERVAL).await;
        }

        warn!("exhausted storage reconnect attempts; reconnecting from scratch");
        state.clear_store().await;
        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// One health poll. Returns `false` once the store is considered lost.
async fn supervise(state: &SharedState, store: &dyn RosterStore) -> bool {
    if store.health_check().await.is_ok() {
        state.update_degraded(false);
        return true;
    }

    let mut reconnect_delay = INITIAL_DELAY;
    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnected after failed health check");
                state.update_degraded(false);
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(error = %err, "storage unreachable; entering degraded mode");
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(reconnect_delay).await;
                reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
            }
        }
    }
    false
}
