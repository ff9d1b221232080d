//! Domain model of the Engage platform.
//!
//! These are transport-agnostic types; conversions to and from the wire
//! schema live in [`crate::convert`].

mod customer;
mod messaging;
mod payment;
mod replies;
mod voice;

pub use customer::{
    CustomerNumber, CustomerNumberProvider, CustomerRef, CustomerState, CustomerTag, DataValue,
    Reminder, Tag,
};
pub use messaging::{
    EmailBody, InboundMessageBody, LocationBody, MediaBody, MediaType, MessageBody,
    MessageDeliveryStatus, MessagingChannel, MessagingChannelNumber, MessagingConsentUpdate,
    MessagingConsentUpdateStatus, MessagingSessionStatus, OutboundMessage, TemplateBody,
    UssdMenuBody,
};
pub use payment::{Cash, PaymentChannel, PaymentChannelNumber, PaymentCounterParty, PaymentStatus};
pub use replies::{
    AuthToken, ConsentUpdateReply, InitiatePaymentReply, LeasedAppData, SendMessageReply,
    TagCommandReply, UpdateReply, VoiceCallReply,
};
pub use voice::{
    DequeueAction, DialAction, EnqueueAction, GetDigitsAction, GetRecordingAction, SayAction,
    TextToSpeechVoice, VoiceAction, VoiceCallDirection, VoiceCallHangupCause, VoiceCallStatus,
    VoicePrompt,
};
