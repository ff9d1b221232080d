//! Results of unary platform calls.
//!
//! Replies whose wire form carries a boolean `status` are only returned when
//! the status is true; a false status surfaces as
//! [`SdkError::Rejected`](crate::SdkError::Rejected). Replies with an enum
//! status are returned as-is for the caller to inspect.

use std::fmt;
use std::time::Duration;

use secrecy::SecretString;

use crate::models::{DataValue, MessageDeliveryStatus, MessagingConsentUpdateStatus, PaymentStatus};

/// Session token issued by `generate_auth_token`.
#[derive(Clone)]
pub struct AuthToken {
    pub token: SecretString,
    pub lifetime: Duration,
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("token", &"[REDACTED]")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Accepted update of customer state, tags, metadata or app data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateReply {
    pub description: String,
    pub customer_id: Option<String>,
}

/// Accepted command addressed to every customer carrying a tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagCommandReply {
    pub description: String,
    /// Identifier of the background job processing the tag.
    pub work_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeasedAppData {
    pub customer_id: Option<String>,
    pub value: Option<DataValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageReply {
    pub status: MessageDeliveryStatus,
    pub description: String,
    pub customer_id: Option<String>,
    pub message_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentUpdateReply {
    pub status: MessagingConsentUpdateStatus,
    pub description: String,
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiatePaymentReply {
    pub status: PaymentStatus,
    pub description: String,
    pub transaction_id: Option<String>,
    pub debit_customer_id: Option<String>,
    pub credit_customer_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VoiceCallReply {
    pub description: String,
    pub customer_id: Option<String>,
    pub session_id: Option<String>,
}
