use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::api::EngageApi;
use crate::error::SdkError;
use crate::models::{
    ConsentUpdateReply, CustomerNumber, CustomerRef, CustomerState, CustomerTag, DataValue,
    LeasedAppData, MessagingChannelNumber, MessagingConsentUpdate, OutboundMessage, Reminder,
    SendMessageReply, UpdateReply, VoiceCallReply,
};

/// Handle on one customer, bound to the service that created it.
///
/// Building a handle never calls the platform; each method is one unary
/// call addressed by the reference the handle was built from.
#[derive(Clone)]
pub struct Customer {
    reference: CustomerRef,
    api: Arc<dyn EngageApi>,
}

impl Customer {
    #[must_use]
    pub fn new(reference: CustomerRef, api: Arc<dyn EngageApi>) -> Self {
        Self { reference, api }
    }

    /// Platform identifier, when the handle was built from one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.reference.id()
    }

    #[must_use]
    pub fn number(&self) -> Option<&CustomerNumber> {
        self.reference.number()
    }

    #[must_use]
    pub fn reference(&self) -> &CustomerRef {
        &self.reference
    }

    fn require_id(&self, op: &str) -> Result<&str, SdkError> {
        self.id().ok_or_else(|| {
            SdkError::InvalidArgument(format!(
                "{op} requires a customer id, got {}",
                self.reference
            ))
        })
    }

    fn require_number(&self, op: &str) -> Result<&CustomerNumber, SdkError> {
        self.number().ok_or_else(|| {
            SdkError::InvalidArgument(format!(
                "{op} requires a customer number, got {}",
                self.reference
            ))
        })
    }

    /// # Errors
    /// See [`EngageApi::get_customer_state`].
    pub async fn get_state(&self) -> Result<CustomerState, SdkError> {
        self.api.get_customer_state(&self.reference).await
    }

    /// Merge the state of `other` into this customer.
    ///
    /// # Errors
    /// `InvalidArgument` when this handle has no customer id.
    pub async fn adopt_state(&self, other: &CustomerRef) -> Result<UpdateReply, SdkError> {
        let id = self.require_id("adopt_state")?;
        self.api.adopt_customer_state(id, other).await
    }

    /// # Errors
    /// See [`EngageApi::add_customer_reminder`].
    pub async fn add_reminder(&self, reminder: &Reminder) -> Result<UpdateReply, SdkError> {
        self.api
            .add_customer_reminder(&self.reference, reminder)
            .await
    }

    /// # Errors
    /// See [`EngageApi::cancel_customer_reminder`].
    pub async fn cancel_reminder(&self, key: &str) -> Result<UpdateReply, SdkError> {
        self.api.cancel_customer_reminder(&self.reference, key).await
    }

    /// # Errors
    /// See [`EngageApi::update_customer_tags`].
    pub async fn update_tags(&self, tags: &[CustomerTag]) -> Result<UpdateReply, SdkError> {
        self.api.update_customer_tags(&self.reference, tags).await
    }

    /// # Errors
    /// See [`EngageApi::delete_customer_tags`].
    pub async fn delete_tags(&self, keys: &[String]) -> Result<UpdateReply, SdkError> {
        self.api.delete_customer_tags(&self.reference, keys).await
    }

    /// # Errors
    /// See [`EngageApi::update_customer_metadata`].
    pub async fn update_metadata(
        &self,
        metadata: &HashMap<String, DataValue>,
    ) -> Result<UpdateReply, SdkError> {
        self.api
            .update_customer_metadata(&self.reference, metadata)
            .await
    }

    /// # Errors
    /// See [`EngageApi::delete_customer_metadata`].
    pub async fn delete_metadata(&self, keys: &[String]) -> Result<UpdateReply, SdkError> {
        self.api.delete_customer_metadata(&self.reference, keys).await
    }

    /// # Errors
    /// See [`EngageApi::update_customer_app_data`].
    pub async fn update_app_data(&self, value: &DataValue) -> Result<UpdateReply, SdkError> {
        self.api
            .update_customer_app_data(&self.reference, value)
            .await
    }

    /// # Errors
    /// See [`EngageApi::lease_customer_app_data`].
    pub async fn lease_app_data(&self) -> Result<LeasedAppData, SdkError> {
        self.api.lease_customer_app_data(&self.reference).await
    }

    /// # Errors
    /// See [`EngageApi::delete_customer_app_data`].
    pub async fn delete_app_data(&self) -> Result<UpdateReply, SdkError> {
        self.api.delete_customer_app_data(&self.reference).await
    }

    /// # Errors
    /// `InvalidArgument` when this handle has no customer number.
    pub async fn send_message(
        &self,
        channel_number: &MessagingChannelNumber,
        message: &OutboundMessage,
    ) -> Result<SendMessageReply, SdkError> {
        let number = self.require_number("send_message")?;
        self.api.send_message(number, channel_number, message).await
    }

    /// # Errors
    /// `InvalidArgument` when this handle has no customer id.
    pub async fn reply_to_message(
        &self,
        message_id: &str,
        message: &OutboundMessage,
    ) -> Result<SendMessageReply, SdkError> {
        let id = self.require_id("reply_to_message")?;
        self.api.reply_to_message(id, message_id, message).await
    }

    /// # Errors
    /// `InvalidArgument` when this handle has no customer number.
    pub async fn update_messaging_consent(
        &self,
        channel_number: &MessagingChannelNumber,
        update: MessagingConsentUpdate,
    ) -> Result<ConsentUpdateReply, SdkError> {
        let number = self.require_number("update_messaging_consent")?;
        self.api
            .update_messaging_consent(number, channel_number, update)
            .await
    }

    /// # Errors
    /// `InvalidArgument` when this handle has no customer number.
    pub async fn make_voice_call(
        &self,
        channel_number: &MessagingChannelNumber,
    ) -> Result<VoiceCallReply, SdkError> {
        let number = self.require_number("make_voice_call")?;
        self.api.make_voice_call(number, channel_number).await
    }
}

impl fmt::Debug for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Customer")
            .field("reference", &self.reference)
            .finish_non_exhaustive()
    }
}
