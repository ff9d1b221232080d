//! The unary surface of the Engage platform.
//!
//! [`EngageApi`] is implemented by [`crate::EngageGrpcClient`]; customer
//! handles and the [`crate::Service`] facade depend only on the trait, so
//! tests substitute an in-memory fake.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::SdkError;
use crate::models::{
    AuthToken, Cash, ConsentUpdateReply, CustomerNumber, CustomerRef, CustomerState, CustomerTag,
    DataValue, InitiatePaymentReply, LeasedAppData, MessagingChannelNumber,
    MessagingConsentUpdate, OutboundMessage, PaymentCounterParty, Reminder, SendMessageReply, Tag,
    TagCommandReply, UpdateReply, VoiceCallReply,
};

/// Unary calls scoped to the configured organization and application.
///
/// Every method fails with [`SdkError`]; replies carrying a false status
/// flag surface as [`SdkError::Rejected`].
#[async_trait]
pub trait EngageApi: Send + Sync {
    /// Issue a session token for the configured application.
    async fn generate_auth_token(&self) -> Result<AuthToken, SdkError>;

    async fn get_customer_state(&self, customer: &CustomerRef) -> Result<CustomerState, SdkError>;

    /// Merge the state of `other` into the customer `customer_id`.
    async fn adopt_customer_state(
        &self,
        customer_id: &str,
        other: &CustomerRef,
    ) -> Result<UpdateReply, SdkError>;

    async fn add_customer_reminder(
        &self,
        customer: &CustomerRef,
        reminder: &Reminder,
    ) -> Result<UpdateReply, SdkError>;

    async fn add_customer_reminder_by_tag(
        &self,
        tag: &Tag,
        reminder: &Reminder,
    ) -> Result<TagCommandReply, SdkError>;

    async fn cancel_customer_reminder(
        &self,
        customer: &CustomerRef,
        key: &str,
    ) -> Result<UpdateReply, SdkError>;

    async fn cancel_customer_reminder_by_tag(
        &self,
        tag: &Tag,
        key: &str,
    ) -> Result<TagCommandReply, SdkError>;

    async fn update_customer_tags(
        &self,
        customer: &CustomerRef,
        tags: &[CustomerTag],
    ) -> Result<UpdateReply, SdkError>;

    async fn delete_customer_tags(
        &self,
        customer: &CustomerRef,
        keys: &[String],
    ) -> Result<UpdateReply, SdkError>;

    async fn update_customer_metadata(
        &self,
        customer: &CustomerRef,
        metadata: &HashMap<String, DataValue>,
    ) -> Result<UpdateReply, SdkError>;

    async fn delete_customer_metadata(
        &self,
        customer: &CustomerRef,
        keys: &[String],
    ) -> Result<UpdateReply, SdkError>;

    /// Replace the app data the configured application keeps on a customer.
    async fn update_customer_app_data(
        &self,
        customer: &CustomerRef,
        value: &DataValue,
    ) -> Result<UpdateReply, SdkError>;

    /// Read the app data and lock it for this application until updated.
    async fn lease_customer_app_data(
        &self,
        customer: &CustomerRef,
    ) -> Result<LeasedAppData, SdkError>;

    async fn delete_customer_app_data(
        &self,
        customer: &CustomerRef,
    ) -> Result<UpdateReply, SdkError>;

    async fn send_message(
        &self,
        customer_number: &CustomerNumber,
        channel_number: &MessagingChannelNumber,
        message: &OutboundMessage,
    ) -> Result<SendMessageReply, SdkError>;

    async fn send_message_by_tag(
        &self,
        tag: &Tag,
        channel_number: &MessagingChannelNumber,
        message: &OutboundMessage,
    ) -> Result<TagCommandReply, SdkError>;

    async fn reply_to_message(
        &self,
        customer_id: &str,
        message_id: &str,
        message: &OutboundMessage,
    ) -> Result<SendMessageReply, SdkError>;

    async fn update_messaging_consent(
        &self,
        customer_number: &CustomerNumber,
        channel_number: &MessagingChannelNumber,
        update: MessagingConsentUpdate,
    ) -> Result<ConsentUpdateReply, SdkError>;

    async fn initiate_payment(
        &self,
        debit_party: &PaymentCounterParty,
        credit_party: &PaymentCounterParty,
        value: &Cash,
        narration: Option<&str>,
    ) -> Result<InitiatePaymentReply, SdkError>;

    async fn make_voice_call(
        &self,
        customer_number: &CustomerNumber,
        channel_number: &MessagingChannelNumber,
    ) -> Result<VoiceCallReply, SdkError>;
}
