//! Outbound participant notifications. Delivery is best-effort: failures are logged and
//! never abort the operation that triggered them.

use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{dao::models::ParticipantEntity, state::SharedState};

/// What happened, so the delivery side can pick a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// An organizer approved a registration.
    RegistrationApproved,
    /// An organizer rejected a registration.
    RegistrationRejected,
    /// The participant's roster is locked in.
    RosterLocked,
    /// Formation ran out of slots before placing the participant.
    NotPlaced,
    /// The session starts soon.
    SessionReminder,
    /// The session is over.
    SessionFinished,
}

/// Message handed to a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Template selector.
    pub kind: NotificationKind,
    /// Session the message is about, if any.
    pub session_id: Option<Uuid>,
    /// Human-readable text.
    pub text: String,
}

impl Notification {
    /// Build a notification.
    pub fn new(kind: NotificationKind, session_id: Option<Uuid>, text: impl Into<String>) -> Self {
        Self {
            kind,
            session_id,
            text: text.into(),
        }
    }
}

/// Delivery failure of a single notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The participant has no live channel.
    #[error("participant `{0}` has no linked channel")]
    NoChannel(Uuid),
    /// The gateway call failed.
    #[cfg(feature = "webhook-notifier")]
    #[error("webhook delivery failed")]
    Webhook {
        /// HTTP client error.
        #[source]
        source: reqwest::Error,
    },
}

/// Delivery channel towards participants.
pub trait Notifier: Send + Sync {
    /// Deliver one notification to one participant.
    fn notify(
        &self,
        participant: &ParticipantEntity,
        notification: Notification,
    ) -> BoxFuture<'static, Result<(), NotifyError>>;
}

/// Writes notifications to the log only.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(
        &self,
        participant: &ParticipantEntity,
        notification: Notification,
    ) -> BoxFuture<'static, Result<(), NotifyError>> {
        let participant_id = participant.id;
        let channel = participant.channel.linked_id().map(str::to_owned);
        Box::pin(async move {
            info!(
                %participant_id,
                channel = ?channel,
                kind = ?notification.kind,
                text = %notification.text,
                "notification"
            );
            Ok(())
        })
    }
}

#[cfg(feature = "webhook-notifier")]
pub use webhook::WebhookNotifier;

#[cfg(feature = "webhook-notifier")]
mod webhook {
    use std::sync::Arc;

    use futures::future::BoxFuture;
    use reqwest::Client;
    use serde::Serialize;
    use uuid::Uuid;

    use super::{Notification, NotificationKind, Notifier, NotifyError};
    use crate::dao::models::ParticipantEntity;

    #[derive(Serialize)]
    struct WebhookPayload {
        participant_id: Uuid,
        channel_id: String,
        kind: NotificationKind,
        session_id: Option<Uuid>,
        text: String,
    }

    /// POSTs each notification as JSON to a chat gateway.
    #[derive(Clone)]
    pub struct WebhookNotifier {
        client: Client,
        url: Arc<str>,
    }

    impl WebhookNotifier {
        /// Notifier posting to `url`.
        pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
            let client = Client::builder()
                .build()
                .map_err(|source| NotifyError::Webhook { source })?;
            Ok(Self {
                client,
                url: Arc::from(url.into()),
            })
        }
    }

    impl Notifier for WebhookNotifier {
        fn notify(
            &self,
            participant: &ParticipantEntity,
            notification: Notification,
        ) -> BoxFuture<'static, Result<(), NotifyError>> {
            let client = self.client.clone();
            let url = self.url.clone();
            let participant_id = participant.id;
            let channel_id = participant.channel.linked_id().map(str::to_owned);

            Box::pin(async move {
                let channel_id = channel_id.ok_or(NotifyError::NoChannel(participant_id))?;
                let payload = WebhookPayload {
                    participant_id,
                    channel_id,
                    kind: notification.kind,
                    session_id: notification.session_id,
                    text: notification.text,
                };
                client
                    .post(url.as_ref())
                    .json(&payload)
                    .send()
                    .await
                    .and_then(|response| response.error_for_status())
                    .map_err(|source| NotifyError::Webhook { source })?;
                Ok(())
            })
        }
    }
}

/// Notify each participant once, skipping unknown ids and logging failed deliveries.
pub async fn notify_participants(
    state: &SharedState,
    participant_ids: &[Uuid],
    notification: Notification,
) {
    let Ok(store) = state.require_store().await else {
        warn!(kind = ?notification.kind, "skipping notifications in degraded mode");
        return;
    };

    let mut seen = std::collections::HashSet::new();
    for participant_id in participant_ids.iter().filter(|id| seen.insert(**id)) {
        let participant = match store.find_participant(*participant_id).await {
            Ok(Some(participant)) => participant,
            Ok(None) => continue,
            Err(err) => {
                warn!(%participant_id, error = %err, "failed to load notification recipient");
                continue;
            }
        };
        if let Err(err) = state
            .notifier()
            .notify(&participant, notification.clone())
            .await
        {
            warn!(%participant_id, kind = ?notification.kind, error = %err, "notification failed");
        }
    }
}
