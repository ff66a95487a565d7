//! Kickoff Back binary entrypoint wiring REST, SSE, notifications, and the roster store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use kickoff_back::{
    config::AppConfig,
    dao::roster_store::memory::MemoryRosterStore,
    routes,
    services::{
        notifier::{LogNotifier, Notifier},
        reminder_service, sse_service,
    },
    state::{AppState, SharedState, cache::InMemoryStandingsCache},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";
const WEBHOOK_URL_ENV: &str = "NOTIFY_WEBHOOK_URL";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let notifier = build_notifier()?;
    let app_state = AppState::new(config, Arc::new(InMemoryStandingsCache::new()), notifier);

    tokio::spawn(sse_service::forward_degraded_changes(app_state.clone()));
    install_storage(&app_state).await?;
    tokio::spawn(reminder_service::run(app_state.clone()));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the roster store from `STORAGE_BACKEND` (`mongo` or `memory`).
async fn install_storage(state: &SharedState) -> anyhow::Result<()> {
    let default_backend = if cfg!(feature = "mongo-store") {
        "mongo"
    } else {
        "memory"
    };
    let backend = env::var(STORAGE_BACKEND_ENV).unwrap_or_else(|_| default_backend.into());

    match backend.trim().to_ascii_lowercase().as_str() {
        "memory" => {
            warn!("using the in-memory roster store; data is lost on restart");
            state
                .install_store(Arc::new(MemoryRosterStore::new()))
                .await;
            Ok(())
        }
        "mongo" => spawn_mongo_supervisor(state.clone()).await,
        other => anyhow::bail!("unknown {STORAGE_BACKEND_ENV} `{other}`"),
    }
}

#[cfg(feature = "mongo-store")]
async fn spawn_mongo_supervisor(state: SharedState) -> anyhow::Result<()> {
    use kickoff_back::{
        dao::{
            roster_store::{
                RosterStore,
                mongodb::{MongoConfig, MongoRosterStore},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    let config = MongoConfig::from_env()
        .await
        .context("reading MongoDB configuration")?;

    tokio::spawn(storage_supervisor::run(state, move || {
        let config = config.clone();
        async move {
            MongoRosterStore::connect(config)
                .await
                .map(|store| Arc::new(store) as Arc<dyn RosterStore>)
                .map_err(StorageError::from)
        }
    }));
    Ok(())
}

#[cfg(not(feature = "mongo-store"))]
async fn spawn_mongo_supervisor(_state: SharedState) -> anyhow::Result<()> {
    anyhow::bail!("built without the `mongo-store` feature")
}

fn build_notifier() -> anyhow::Result<Arc<dyn Notifier>> {
    let Ok(url) = env::var(WEBHOOK_URL_ENV) else {
        return Ok(Arc::new(LogNotifier));
    };
    webhook_notifier(url)
}

#[cfg(feature = "webhook-notifier")]
fn webhook_notifier(url: String) -> anyhow::Result<Arc<dyn Notifier>> {
    use kickoff_back::services::notifier::WebhookNotifier;

    let notifier = WebhookNotifier::new(url).context("building webhook notifier")?;
    info!("delivering notifications through the webhook");
    Ok(Arc::new(notifier))
}

#[cfg(not(feature = "webhook-notifier"))]
fn webhook_notifier(_url: String) -> anyhow::Result<Arc<dyn Notifier>> {
    warn!("{WEBHOOK_URL_ENV} is set but the `webhook-notifier` feature is disabled; logging only");
    Ok(Arc::new(LogNotifier))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
