use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    services::sse_events,
    state::SharedState,
};

const EVENT_HANDSHAKE: &str = "handshake";

/// Subscribe to the shared public SSE stream.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.public_sse().subscribe()
}

/// First event of a new connection, sent to that client only.
pub fn handshake_event(state: &SharedState) -> Option<Event> {
    let handshake = Handshake {
        stream: "public".into(),
        message: "subscribed to session updates".into(),
        degraded: state.is_degraded(),
    };
    match serde_json::to_string(&handshake) {
        Ok(data) => Some(Event::default().event(EVENT_HANDSHAKE).data(data)),
        Err(err) => {
            warn!(error = %err, "failed to serialize SSE handshake");
            None
        }
    }
}

/// Convert a broadcast receiver into an SSE response, forwarding events until the client
/// disconnects. `first` is delivered before any broadcast event.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    first: Option<Event>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if let Some(event) = first {
            if tx.send(Ok(event)).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "SSE subscriber lagging; events dropped");
                            continue;
                        }
                    }
                }
            }
        }

        info!("public SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Relay degraded mode changes onto the public stream until the state is dropped.
pub async fn forward_degraded_changes(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    while watcher.changed().await.is_ok() {
        let degraded = *watcher.borrow_and_update();
        sse_events::broadcast_system_status(&state, degraded);
    }
}
