//! Notification dispatch.
//!
//! Frames read from the `StreamNotifications` server stream are classified
//! into a [`Notification`], bound to a [`crate::Customer`] handle and
//! published to every subscriber of their [`NotificationKind`].
//!
//! - [`types`]: the per-kind payloads
//! - [`classify`](mod@classify): frame to [`InboundNotification`] conversion
//! - [`registry`]: subscriptions and handler traits
//! - [`ack`]: per-subscriber reply handles
//! - [`dispatcher`]: publication and accounting
//! - [`intake`]: the stream worker

pub mod ack;
pub mod classify;
pub mod dispatcher;
pub mod intake;
pub mod registry;
pub mod types;

pub use ack::{Acknowledger, NotificationReply, NotificationReplySink, ReplyEnvelope};
pub use classify::{InboundNotification, classify, frame_kind, resolve_customer};
pub use dispatcher::{DispatchOutcome, DispatchStats, DispatchStatsSnapshot, Dispatcher};
pub use intake::{FrameStream, NotificationSource};
pub use registry::{
    NotificationEvent, NotificationHandler, SubscriberRegistry, SubscriptionId, handler_fn,
};
pub use types::{
    MessageStatusNotification, MessagingConsentStatusNotification,
    MessagingSessionStatusNotification, Notification, NotificationKind,
    PaymentStatusNotification, ReceivedMessageNotification, ReceivedPaymentNotification,
    ReminderNotification, UssdSessionNotification, UssdSessionStatus, VoiceCallDialInput,
    VoiceCallNotification, VoiceCallQueueInput, WalletPaymentStatusNotification,
};
