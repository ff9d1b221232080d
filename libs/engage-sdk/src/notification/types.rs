use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::{
    Cash, CustomerNumber, InboundMessageBody, MessageDeliveryStatus, MessagingChannelNumber,
    MessagingConsentUpdate, MessagingConsentUpdateStatus, MessagingSessionStatus,
    PaymentChannelNumber, PaymentStatus, Tag, VoiceCallDirection, VoiceCallHangupCause,
    VoiceCallStatus,
};

/// Discriminant of a notification; subscriptions are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NotificationKind {
    Reminder,
    UssdSession,
    PaymentStatus,
    ReceivedPayment,
    WalletPaymentStatus,
    MessageStatus,
    MessagingSessionStatus,
    MessagingConsentStatus,
    ReceivedMessage,
    VoiceCall,
}

impl NotificationKind {
    pub const ALL: [Self; 10] = [
        Self::Reminder,
        Self::UssdSession,
        Self::PaymentStatus,
        Self::ReceivedPayment,
        Self::WalletPaymentStatus,
        Self::MessageStatus,
        Self::MessagingSessionStatus,
        Self::MessagingConsentStatus,
        Self::ReceivedMessage,
        Self::VoiceCall,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reminder => "reminder",
            Self::UssdSession => "ussd_session",
            Self::PaymentStatus => "payment_status",
            Self::ReceivedPayment => "received_payment",
            Self::WalletPaymentStatus => "wallet_payment_status",
            Self::MessageStatus => "message_status",
            Self::MessagingSessionStatus => "messaging_session_status",
            Self::MessagingConsentStatus => "messaging_consent_status",
            Self::ReceivedMessage => "received_message",
            Self::VoiceCall => "voice_call",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reminder set on a customer (or on a tag) came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderNotification {
    pub key: String,
    pub payload: String,
    pub expiration: DateTime<Utc>,
    pub interval: Option<Duration>,
    /// Set when the reminder was added through a tag.
    pub tag: Option<Tag>,
    pub work_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UssdSessionStatus {
    Active,
    Completed,
    Error,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UssdSessionNotification {
    pub session_id: String,
    pub channel_number: MessagingChannelNumber,
    /// Text entered by the customer; unset on session start.
    pub input: Option<String>,
    pub status: UssdSessionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStatusNotification {
    pub transaction_id: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedPaymentNotification {
    pub purse_id: String,
    pub transaction_id: String,
    pub customer_number: CustomerNumber,
    pub channel_number: PaymentChannelNumber,
    pub value: Cash,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletPaymentStatusNotification {
    pub wallet_id: String,
    pub transaction_id: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageStatusNotification {
    pub message_id: String,
    pub status: MessageDeliveryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagingSessionStatusNotification {
    pub channel_number: MessagingChannelNumber,
    pub session_id: String,
    pub status: MessagingSessionStatus,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagingConsentStatusNotification {
    pub channel_number: MessagingChannelNumber,
    pub update: MessagingConsentUpdate,
    pub status: MessagingConsentUpdateStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedMessageNotification {
    pub message_id: String,
    pub channel_number: MessagingChannelNumber,
    pub parts: Vec<InboundMessageBody>,
    pub session_id: Option<String>,
    pub in_reply_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceCallDialInput {
    pub destination_number: String,
    pub started_at: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceCallQueueInput {
    pub enqueued_at: Option<DateTime<Utc>>,
    pub dequeued_at: Option<DateTime<Utc>>,
    pub dequeued_to_number: Option<String>,
    pub queue_duration: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceCallNotification {
    pub channel_number: MessagingChannelNumber,
    pub session_id: String,
    pub direction: VoiceCallDirection,
    pub status: VoiceCallStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub hangup_cause: VoiceCallHangupCause,
    pub dtmf_digits: Option<String>,
    pub recording_url: Option<String>,
    pub dial_data: Option<VoiceCallDialInput>,
    pub queue_data: Option<VoiceCallQueueInput>,
    pub cost: Option<Cash>,
}

/// A converted notification payload, one variant per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Reminder(ReminderNotification),
    UssdSession(UssdSessionNotification),
    PaymentStatus(PaymentStatusNotification),
    ReceivedPayment(ReceivedPaymentNotification),
    WalletPaymentStatus(WalletPaymentStatusNotification),
    MessageStatus(MessageStatusNotification),
    MessagingSessionStatus(MessagingSessionStatusNotification),
    MessagingConsentStatus(MessagingConsentStatusNotification),
    ReceivedMessage(ReceivedMessageNotification),
    VoiceCall(VoiceCallNotification),
}

impl Notification {
    #[must_use]
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::Reminder(_) => NotificationKind::Reminder,
            Self::UssdSession(_) => NotificationKind::UssdSession,
            Self::PaymentStatus(_) => NotificationKind::PaymentStatus,
            Self::ReceivedPayment(_) => NotificationKind::ReceivedPayment,
            Self::WalletPaymentStatus(_) => NotificationKind::WalletPaymentStatus,
            Self::MessageStatus(_) => NotificationKind::MessageStatus,
            Self::MessagingSessionStatus(_) => NotificationKind::MessagingSessionStatus,
            Self::MessagingConsentStatus(_) => NotificationKind::MessagingConsentStatus,
            Self::ReceivedMessage(_) => NotificationKind::ReceivedMessage,
            Self::VoiceCall(_) => NotificationKind::VoiceCall,
        }
    }

    #[must_use]
    pub fn as_reminder(&self) -> Option<&ReminderNotification> {
        match self {
            Self::Reminder(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_received_payment(&self) -> Option<&ReceivedPaymentNotification> {
        match self {
            Self::ReceivedPayment(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_received_message(&self) -> Option<&ReceivedMessageNotification> {
        match self {
            Self::ReceivedMessage(n) => Some(n),
            _ => None,
        }
    }
}
