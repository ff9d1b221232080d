//! Acknowledgement of delivered notifications.
//!
//! Each subscriber receives its own [`Acknowledger`]. Consuming it sends a
//! `SendNotificationReply` call for the notification; dropping it sends
//! nothing. It can be moved into a spawned task to answer later.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;

use crate::error::SdkError;
use crate::models::{DataValue, MessageBody};

/// Content of a reply to a notification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NotificationReply {
    /// Message delivered back on the channel the notification came from.
    pub message: Option<MessageBody>,
    /// Replaces the customer's app data.
    pub app_data: Option<DataValue>,
}

impl NotificationReply {
    #[must_use]
    pub fn message(body: MessageBody) -> Self {
        Self {
            message: Some(body),
            app_data: None,
        }
    }

    #[must_use]
    pub fn with_app_data(mut self, value: impl Into<DataValue>) -> Self {
        self.app_data = Some(value.into());
        self
    }
}

/// Everything the platform needs to correlate a reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyEnvelope {
    pub notification_id: String,
    pub customer_id: Option<String>,
    pub reply: NotificationReply,
    /// Set by [`Acknowledger::fail`].
    pub error: Option<String>,
}

/// Destination of notification replies; the gRPC client is the production one.
#[async_trait]
pub trait NotificationReplySink: Send + Sync {
    async fn send_notification_reply(&self, envelope: ReplyEnvelope) -> Result<(), SdkError>;
}

/// Single-use handle answering one delivered notification.
pub struct Acknowledger {
    sink: Arc<dyn NotificationReplySink>,
    notification_id: String,
    customer_id: Option<String>,
}

impl Acknowledger {
    #[must_use]
    pub fn new(
        sink: Arc<dyn NotificationReplySink>,
        notification_id: impl Into<String>,
        customer_id: Option<String>,
    ) -> Self {
        Self {
            sink,
            notification_id: notification_id.into(),
            customer_id,
        }
    }

    #[must_use]
    pub fn notification_id(&self) -> &str {
        &self.notification_id
    }

    /// Confirm processing without a payload.
    ///
    /// # Errors
    /// Propagates the reply call's failure.
    pub async fn ack(self) -> Result<(), SdkError> {
        self.send(NotificationReply::default(), None).await
    }

    /// # Errors
    /// Propagates the reply call's failure.
    pub async fn reply(self, reply: NotificationReply) -> Result<(), SdkError> {
        self.send(reply, None).await
    }

    /// Report that the application could not process the notification.
    ///
    /// # Errors
    /// Propagates the reply call's failure.
    pub async fn fail(self, error: impl Into<String>) -> Result<(), SdkError> {
        self.send(NotificationReply::default(), Some(error.into()))
            .await
    }

    async fn send(self, reply: NotificationReply, error: Option<String>) -> Result<(), SdkError> {
        let span = tracing::debug_span!(
            "notification_reply",
            notification_id = %self.notification_id,
            failed = error.is_some()
        );
        let envelope = ReplyEnvelope {
            notification_id: self.notification_id,
            customer_id: self.customer_id,
            reply,
            error,
        };
        self.sink
            .send_notification_reply(envelope)
            .instrument(span)
            .await
    }
}

impl fmt::Debug for Acknowledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acknowledger")
            .field("notification_id", &self.notification_id)
            .field("customer_id", &self.customer_id)
            .finish_non_exhaustive()
    }
}
