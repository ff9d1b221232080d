#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
//! # `engage-sdk` - client SDK for the Engage messaging, payments and voice platform
//!
//! - **Service facade** ([`Service`]) - one connection, the unary operations and
//!   the notification worker lifecycle
//! - **Notification dispatch** ([`notification`]) - frames from the
//!   `StreamNotifications` server stream are classified into a typed
//!   [`Notification`] and published to the subscribers of their kind
//! - **Customer handles** ([`Customer`]) - per-customer unary calls, built
//!   without a remote lookup
//! - **Configuration** ([`EngageConfig`]) - figment layers over YAML and
//!   `ENGAGE_*` environment variables
//!
//! The SDK logs through `tracing` and never installs a subscriber.

pub mod api;
pub mod client;
pub mod config;
pub(crate) mod convert;
pub mod customer;
pub mod error;
pub mod models;
pub mod notification;
pub mod service;

/// Generated `engage.v1` wire types and client.
#[allow(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms,
    unused_qualifications
)]
pub mod proto {
    tonic::include_proto!("engage.v1");
}

pub use api::EngageApi;
pub use client::EngageGrpcClient;
pub use config::{
    ConnectionConfig, DispatchMode, EngageConfig, Environment, NotificationConfig,
    ReconnectPolicy,
};
pub use customer::Customer;
pub use error::{ConversionError, SdkError, StreamError};
pub use models::{
    AuthToken, Cash, ConsentUpdateReply, CustomerNumber, CustomerNumberProvider, CustomerRef,
    CustomerState, CustomerTag, DataValue, InitiatePaymentReply, LeasedAppData, MessageBody,
    MessagingChannel, MessagingChannelNumber, MessagingConsentUpdate, OutboundMessage,
    PaymentChannel, PaymentChannelNumber, PaymentCounterParty, Reminder, SendMessageReply, Tag,
    TagCommandReply, UpdateReply, VoiceAction, VoiceCallReply,
};
pub use notification::{
    Acknowledger, DispatchStatsSnapshot, Notification, NotificationEvent, NotificationHandler,
    NotificationKind, NotificationReply, ReplyEnvelope, SubscriptionId, handler_fn,
};
pub use service::Service;
