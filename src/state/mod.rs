/// Standings snapshot cache.
pub mod cache;
pub mod capacity;
pub mod formation;
/// Two-phase session status transitions.
pub mod lifecycle;
/// First-fit pool allocation.
pub mod pool;
mod sse;
pub mod standings;

use std::{future::Future, sync::Arc};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{models::SessionEntity, roster_store::RosterStore},
    error::ServiceError,
    services::notifier::Notifier,
};

pub use self::sse::SseHub;
use self::{
    cache::StandingsCache,
    lifecycle::{SessionEvent, SessionLifecycle},
};

/// Handle cloned into every handler and background task.
pub type SharedState = Arc<AppState>;

/// Central application state: injected collaborators plus per-session coordination.
pub struct AppState {
    store: RwLock<Option<Arc<dyn RosterStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    cache: Arc<dyn StandingsCache>,
    notifier: Arc<dyn Notifier>,
    sse: SseHub,
    session_gates: DashMap<Uuid, Arc<Mutex<()>>>,
    lifecycle: SessionLifecycle,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(
        config: AppConfig,
        cache: Arc<dyn StandingsCache>,
        notifier: Arc<dyn Notifier>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            degraded: degraded_tx,
            sse: SseHub::new(config.sse_capacity),
            config,
            cache,
            notifier,
            session_gates: DashMap::new(),
            lifecycle: SessionLifecycle::new(),
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn RosterStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store, or [`ServiceError::Degraded`] while storage is unavailable.
    pub async fn require_store(&self) -> Result<Arc<dyn RosterStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn RosterStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers only when it changes.
    pub fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
        if changed {
            info!(degraded = value, "degraded mode changed");
        }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Standings cache.
    pub fn cache(&self) -> &dyn StandingsCache {
        self.cache.as_ref()
    }

    /// Outbound notification channel.
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Mutex serialising capacity-checked mutations of one session.
    pub fn session_gate(&self, session_id: Uuid) -> Arc<Mutex<()>> {
        self.session_gates
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `work` as part of a lifecycle transition of `session_id`.
    ///
    /// The transition is planned against the stored status under the session gate. When
    /// `work` succeeds the new status is applied and persisted; when it fails or times out
    /// the plan is aborted and the stored status is left untouched.
    pub async fn run_transition<F, Fut, T>(
        &self,
        session_id: Uuid,
        event: SessionEvent,
        work: F,
    ) -> Result<(T, SessionEntity), ServiceError>
    where
        F: FnOnce(SessionEntity) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.session_gate(session_id);
        let _guard = gate.lock().await;

        let store = self.require_store().await?;
        let mut session = store
            .find_session(session_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?;

        let plan = self.lifecycle.plan(&session, event)?;

        let outcome = match timeout(self.config.transition_timeout, work(session.clone())).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::Timeout),
        };

        match outcome {
            Ok(value) => {
                self.lifecycle.apply(&mut session, plan.id)?;
                store.save_session(session.clone()).await?;
                info!(
                    %session_id,
                    event = ?event,
                    from = ?plan.from,
                    to = ?plan.to,
                    "session transition applied"
                );
                Ok((value, session))
            }
            Err(err) => {
                if let Err(abort_err) = self.lifecycle.abort(session_id, plan.id) {
                    warn!(
                        %session_id,
                        event = ?event,
                        plan_id = %plan.id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                warn!(%session_id, event = ?event, error = %err, "session transition aborted");
                Err(err)
            }
        }
    }
}
