use std::collections::HashMap;

use crate::models::VoiceAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessagingChannel {
    Sms,
    Voice,
    Ussd,
    FbMessenger,
    Telegram,
    Whatsapp,
    Email,
}

/// One of the application's own numbers on a messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessagingChannelNumber {
    pub channel: MessagingChannel,
    pub number: String,
}

impl MessagingChannelNumber {
    #[must_use]
    pub fn new(channel: MessagingChannel, number: impl Into<String>) -> Self {
        Self {
            channel,
            number: number.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Audio,
    Video,
    Document,
    Voice,
    Sticker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBody {
    pub url: String,
    pub media_type: MediaType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationBody {
    pub latitude: f64,
    pub longitude: f64,
    pub label: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmailBody {
    pub subject: String,
    pub plain: String,
    pub html: String,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateBody {
    pub id: String,
    pub params: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UssdMenuBody {
    pub text: String,
    pub is_terminal: bool,
}

/// Content of an outbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    Text(String),
    Media(MediaBody),
    Location(LocationBody),
    Email(EmailBody),
    Template(TemplateBody),
    Url(String),
    /// Dial plan executed on a voice channel.
    Voice(Vec<VoiceAction>),
    UssdMenu(UssdMenuBody),
}

/// Message sent to a customer together with delivery hints.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub body: MessageBody,
    pub labels: Vec<String>,
    pub provider_tag: Option<String>,
    pub reply_token: Option<String>,
}

impl OutboundMessage {
    #[must_use]
    pub fn new(body: MessageBody) -> Self {
        Self {
            body,
            labels: Vec::new(),
            provider_tag: None,
            reply_token: None,
        }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(MessageBody::Text(text.into()))
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    #[must_use]
    pub fn with_provider_tag(mut self, tag: impl Into<String>) -> Self {
        self.provider_tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn with_reply_token(mut self, token: impl Into<String>) -> Self {
        self.reply_token = Some(token.into());
        self
    }
}

/// A part of a message received from a customer.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessageBody {
    Text(String),
    Media(MediaBody),
    Location(LocationBody),
    Email(EmailBody),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageDeliveryStatus {
    Queued,
    Sent,
    Delivered,
    Read,
    Received,
    SessionInitiated,
    Failed,
    NoSession,
    NoConsent,
    InsufficientCredit,
    NotSupported,
    InvalidChannelNumber,
    DecommissionedCustomerId,
    ApplicationError,
    /// Unset or not known to this SDK version.
    Unknown,
}

impl MessageDeliveryStatus {
    /// Terminal failure reported by the platform.
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::Failed
                | Self::NoSession
                | Self::NoConsent
                | Self::InsufficientCredit
                | Self::NotSupported
                | Self::InvalidChannelNumber
                | Self::DecommissionedCustomerId
                | Self::ApplicationError
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessagingSessionStatus {
    Active,
    Expired,
    Failed,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessagingConsentUpdate {
    Allow,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessagingConsentUpdateStatus {
    Queued,
    Completed,
    InvalidChannelNumber,
    DecommissionedCustomerId,
    ApplicationError,
    Unknown,
}
