//! gRPC implementation of [`EngageApi`], [`NotificationSource`] and
//! [`NotificationReplySink`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use engage_transport_grpc::client::connect_with_retry;
use engage_transport_grpc::rpc_retry::{RetryPolicy, call_with_retry};
use engage_transport_grpc::{CallCredentials, authorized_request};
use tonic::Request;
use tonic::transport::Channel;
use tracing::Instrument;

use crate::api::EngageApi;
use crate::config::EngageConfig;
use crate::convert::accepted;
use crate::error::SdkError;
use crate::models::{
    AuthToken, Cash, ConsentUpdateReply, CustomerNumber, CustomerRef, CustomerState, CustomerTag,
    DataValue, InitiatePaymentReply, LeasedAppData, MessagingChannelNumber,
    MessagingConsentUpdate, OutboundMessage, PaymentCounterParty, Reminder, SendMessageReply, Tag,
    TagCommandReply, UpdateReply, VoiceCallReply,
};
use crate::notification::{FrameStream, NotificationReplySink, NotificationSource, ReplyEnvelope};
use crate::proto;
use crate::proto::engage_service_client::EngageServiceClient;

/// Deadline of customer state, reminder, tag, metadata and app data calls.
pub const STATE_TIMEOUT: Duration = Duration::from_secs(30);
pub const MESSAGING_TIMEOUT: Duration = Duration::from_secs(30);
pub const PAYMENT_TIMEOUT: Duration = Duration::from_secs(60);
pub const VOICE_TIMEOUT: Duration = Duration::from_secs(60);
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(10);
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(30);

fn call_span(op: &'static str) -> tracing::Span {
    tracing::debug_span!("engage_call", op)
}

/// Client for the `EngageService` gRPC API.
///
/// Cheap to clone; clones share the underlying channel.
#[derive(Clone)]
pub struct EngageGrpcClient {
    inner: EngageServiceClient<Channel>,
    credentials: CallCredentials,
    org_id: String,
    app_id: String,
    retry: RetryPolicy,
}

impl EngageGrpcClient {
    /// Open a channel to the configured endpoint.
    ///
    /// # Errors
    /// Returns [`SdkError::Config`] for an invalid configuration and
    /// [`SdkError::Transport`] once connect retries are exhausted.
    pub async fn connect(config: &EngageConfig) -> Result<Self, SdkError> {
        config.validate()?;
        let grpc = config.connection.to_grpc_config();
        let channel = connect_with_retry::<Channel>(config.resolved_endpoint(), &grpc)
            .await
            .map_err(|e| SdkError::Transport(format!("{e:#}")))?;
        Ok(Self::with_client(EngageServiceClient::new(channel), config))
    }

    /// Wrap an already established channel.
    #[must_use]
    pub fn from_channel(channel: Channel, config: &EngageConfig) -> Self {
        Self::with_client(EngageServiceClient::new(channel), config)
    }

    fn with_client(inner: EngageServiceClient<Channel>, config: &EngageConfig) -> Self {
        Self {
            inner,
            credentials: config.credentials(),
            org_id: config.org_id.clone(),
            app_id: config.app_id.clone(),
            retry: config.connection.retry_policy(),
        }
    }

    fn request<T>(&self, message: T, timeout: Duration) -> Result<Request<T>, SdkError> {
        authorized_request(message, &self.credentials, Some(timeout)).map_err(SdkError::from)
    }

    fn identity(customer: &CustomerRef) -> Option<proto::CustomerIdentity> {
        Some(customer.into())
    }
}

#[async_trait]
impl EngageApi for EngageGrpcClient {
    async fn generate_auth_token(&self) -> Result<AuthToken, SdkError> {
        let request = self.request(
            proto::GetAuthTokenRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
            },
            AUTH_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .get_auth_token(request)
            .instrument(call_span("get_auth_token"))
            .await?;
        reply.into_inner().try_into()
    }

    async fn get_customer_state(&self, customer: &CustomerRef) -> Result<CustomerState, SdkError> {
        let message = proto::GetCustomerStateRequest {
            org_id: self.org_id.clone(),
            customer: Self::identity(customer),
        };
        let credentials = &self.credentials;
        let mut client = self.inner.clone();
        let reply = call_with_retry(
            &mut client,
            &self.retry,
            message,
            |client, message| {
                let mut client = client.clone();
                let request = authorized_request(message, credentials, Some(STATE_TIMEOUT));
                async move { client.get_customer_state(request?).await }
            },
            "engage.get_customer_state",
        )
        .await?;
        reply.into_inner().try_into()
    }

    async fn adopt_customer_state(
        &self,
        customer_id: &str,
        other: &CustomerRef,
    ) -> Result<UpdateReply, SdkError> {
        let request = self.request(
            proto::AdoptCustomerStateRequest {
                org_id: self.org_id.clone(),
                customer_id: customer_id.to_owned(),
                other_customer: Self::identity(other),
            },
            STATE_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .adopt_customer_state(request)
            .instrument(call_span("adopt_customer_state"))
            .await?;
        reply.into_inner().try_into()
    }

    async fn add_customer_reminder(
        &self,
        customer: &CustomerRef,
        reminder: &Reminder,
    ) -> Result<UpdateReply, SdkError> {
        let request = self.request(
            proto::AddCustomerReminderRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
                customer: Self::identity(customer),
                reminder: Some(reminder.into()),
            },
            STATE_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .add_customer_reminder(request)
            .instrument(call_span("add_customer_reminder"))
            .await?;
        reply.into_inner().try_into()
    }

    async fn add_customer_reminder_by_tag(
        &self,
        tag: &Tag,
        reminder: &Reminder,
    ) -> Result<TagCommandReply, SdkError> {
        let request = self.request(
            proto::AddCustomerReminderByTagRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
                tag: Some(tag.into()),
                reminder: Some(reminder.into()),
            },
            STATE_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .add_customer_reminder_by_tag(request)
            .instrument(call_span("add_customer_reminder_by_tag"))
            .await?;
        reply.into_inner().try_into()
    }

    async fn cancel_customer_reminder(
        &self,
        customer: &CustomerRef,
        key: &str,
    ) -> Result<UpdateReply, SdkError> {
        let request = self.request(
            proto::CancelCustomerReminderRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
                customer: Self::identity(customer),
                key: key.to_owned(),
            },
            STATE_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .cancel_customer_reminder(request)
            .instrument(call_span("cancel_customer_reminder"))
            .await?;
        reply.into_inner().try_into()
    }

    async fn cancel_customer_reminder_by_tag(
        &self,
        tag: &Tag,
        key: &str,
    ) -> Result<TagCommandReply, SdkError> {
        let request = self.request(
            proto::CancelCustomerReminderByTagRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
                tag: Some(tag.into()),
                key: key.to_owned(),
            },
            STATE_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .cancel_customer_reminder_by_tag(request)
            .instrument(call_span("cancel_customer_reminder_by_tag"))
            .await?;
        reply.into_inner().try_into()
    }

    async fn update_customer_tags(
        &self,
        customer: &CustomerRef,
        tags: &[CustomerTag],
    ) -> Result<UpdateReply, SdkError> {
        let request = self.request(
            proto::UpdateCustomerTagRequest {
                org_id: self.org_id.clone(),
                customer: Self::identity(customer),
                updates: tags.iter().map(Into::into).collect(),
            },
            STATE_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .update_customer_tag(request)
            .instrument(call_span("update_customer_tag"))
            .await?;
        reply.into_inner().try_into()
    }

    async fn delete_customer_tags(
        &self,
        customer: &CustomerRef,
        keys: &[String],
    ) -> Result<UpdateReply, SdkError> {
        let request = self.request(
            proto::DeleteCustomerTagRequest {
                org_id: self.org_id.clone(),
                customer: Self::identity(customer),
                deletions: keys.to_vec(),
            },
            STATE_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .delete_customer_tag(request)
            .instrument(call_span("delete_customer_tag"))
            .await?;
        reply.into_inner().try_into()
    }

    async fn update_customer_metadata(
        &self,
        customer: &CustomerRef,
        metadata: &HashMap<String, DataValue>,
    ) -> Result<UpdateReply, SdkError> {
        let request = self.request(
            proto::UpdateCustomerMetadataRequest {
                org_id: self.org_id.clone(),
                customer: Self::identity(customer),
                updates: metadata
                    .iter()
                    .map(|(key, value)| (key.clone(), value.into()))
                    .collect(),
            },
            STATE_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .update_customer_metadata(request)
            .instrument(call_span("update_customer_metadata"))
            .await?;
        reply.into_inner().try_into()
    }

    async fn delete_customer_metadata(
        &self,
        customer: &CustomerRef,
        keys: &[String],
    ) -> Result<UpdateReply, SdkError> {
        let request = self.request(
            proto::DeleteCustomerMetadataRequest {
                org_id: self.org_id.clone(),
                customer: Self::identity(customer),
                deletions: keys.to_vec(),
            },
            STATE_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .delete_customer_metadata(request)
            .instrument(call_span("delete_customer_metadata"))
            .await?;
        reply.into_inner().try_into()
    }

    async fn update_customer_app_data(
        &self,
        customer: &CustomerRef,
        value: &DataValue,
    ) -> Result<UpdateReply, SdkError> {
        let request = self.request(
            proto::UpdateCustomerAppDataRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
                customer: Self::identity(customer),
                update: Some(value.into()),
            },
            STATE_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .update_customer_app_data(request)
            .instrument(call_span("update_customer_app_data"))
            .await?;
        reply.into_inner().try_into()
    }

    async fn lease_customer_app_data(
        &self,
        customer: &CustomerRef,
    ) -> Result<LeasedAppData, SdkError> {
        let request = self.request(
            proto::LeaseCustomerAppDataRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
                customer: Self::identity(customer),
            },
            STATE_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .lease_customer_app_data(request)
            .instrument(call_span("lease_customer_app_data"))
            .await?;
        reply.into_inner().try_into()
    }

    async fn delete_customer_app_data(
        &self,
        customer: &CustomerRef,
    ) -> Result<UpdateReply, SdkError> {
        let request = self.request(
            proto::DeleteCustomerAppDataRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
                customer: Self::identity(customer),
            },
            STATE_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .delete_customer_app_data(request)
            .instrument(call_span("delete_customer_app_data"))
            .await?;
        reply.into_inner().try_into()
    }

    async fn send_message(
        &self,
        customer_number: &CustomerNumber,
        channel_number: &MessagingChannelNumber,
        message: &OutboundMessage,
    ) -> Result<SendMessageReply, SdkError> {
        let request = self.request(
            proto::SendMessageRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
                customer_number: Some(customer_number.into()),
                channel_number: Some(channel_number.into()),
                message: Some(message.into()),
            },
            MESSAGING_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .send_message(request)
            .instrument(call_span("send_message"))
            .await?;
        Ok(reply.into_inner().into())
    }

    async fn send_message_by_tag(
        &self,
        tag: &Tag,
        channel_number: &MessagingChannelNumber,
        message: &OutboundMessage,
    ) -> Result<TagCommandReply, SdkError> {
        let request = self.request(
            proto::SendMessageByTagRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
                tag: Some(tag.into()),
                channel_number: Some(channel_number.into()),
                message: Some(message.into()),
            },
            MESSAGING_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .send_message_by_tag(request)
            .instrument(call_span("send_message_by_tag"))
            .await?;
        reply.into_inner().try_into()
    }

    async fn reply_to_message(
        &self,
        customer_id: &str,
        message_id: &str,
        message: &OutboundMessage,
    ) -> Result<SendMessageReply, SdkError> {
        let request = self.request(
            proto::ReplyToMessageRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
                customer_id: customer_id.to_owned(),
                message_id: message_id.to_owned(),
                message: Some(message.into()),
            },
            MESSAGING_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .reply_to_message(request)
            .instrument(call_span("reply_to_message"))
            .await?;
        Ok(reply.into_inner().into())
    }

    async fn update_messaging_consent(
        &self,
        customer_number: &CustomerNumber,
        channel_number: &MessagingChannelNumber,
        update: MessagingConsentUpdate,
    ) -> Result<ConsentUpdateReply, SdkError> {
        let request = self.request(
            proto::UpdateMessagingConsentRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
                customer_number: Some(customer_number.into()),
                channel_number: Some(channel_number.into()),
                update: proto::MessagingConsentUpdate::from(update).into(),
            },
            MESSAGING_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .update_messaging_consent(request)
            .instrument(call_span("update_messaging_consent"))
            .await?;
        Ok(reply.into_inner().into())
    }

    async fn initiate_payment(
        &self,
        debit_party: &PaymentCounterParty,
        credit_party: &PaymentCounterParty,
        value: &Cash,
        narration: Option<&str>,
    ) -> Result<InitiatePaymentReply, SdkError> {
        let request = self.request(
            proto::InitiatePaymentRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
                debit_party: Some(debit_party.into()),
                credit_party: Some(credit_party.into()),
                value: Some(value.into()),
                narration: narration.map(ToOwned::to_owned),
            },
            PAYMENT_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .initiate_payment(request)
            .instrument(call_span("initiate_payment"))
            .await?;
        Ok(reply.into_inner().into())
    }

    async fn make_voice_call(
        &self,
        customer_number: &CustomerNumber,
        channel_number: &MessagingChannelNumber,
    ) -> Result<VoiceCallReply, SdkError> {
        let request = self.request(
            proto::MakeVoiceCallRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
                customer_number: Some(customer_number.into()),
                channel_number: Some(channel_number.into()),
            },
            VOICE_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .make_voice_call(request)
            .instrument(call_span("make_voice_call"))
            .await?;
        reply.into_inner().try_into()
    }
}

#[async_trait]
impl NotificationSource for EngageGrpcClient {
    async fn open(&self, app_id: &str) -> Result<FrameStream, SdkError> {
        if app_id.trim().is_empty() {
            return Err(SdkError::InvalidArgument(
                "app_id must not be empty".to_owned(),
            ));
        }
        // Server stream: no deadline, it lives until cancelled.
        let request = authorized_request(
            proto::StreamNotificationsRequest {
                org_id: self.org_id.clone(),
                app_id: app_id.to_owned(),
            },
            &self.credentials,
            None,
        )?;
        let response = self
            .inner
            .clone()
            .stream_notifications(request)
            .instrument(call_span("stream_notifications"))
            .await?;
        Ok(Box::pin(response.into_inner()))
    }
}

#[async_trait]
impl NotificationReplySink for EngageGrpcClient {
    async fn send_notification_reply(&self, envelope: ReplyEnvelope) -> Result<(), SdkError> {
        let request = self.request(
            proto::SendNotificationReplyRequest {
                org_id: self.org_id.clone(),
                app_id: self.app_id.clone(),
                notification_id: envelope.notification_id,
                customer_id: envelope.customer_id,
                app_data: envelope.reply.app_data.as_ref().map(Into::into),
                message: envelope.reply.message.as_ref().map(Into::into),
                error: envelope.error,
            },
            REPLY_TIMEOUT,
        )?;
        let reply = self
            .inner
            .clone()
            .send_notification_reply(request)
            .instrument(call_span("send_notification_reply"))
            .await?
            .into_inner();
        accepted(reply.status, &reply.description)
    }
}

impl std::fmt::Debug for EngageGrpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngageGrpcClient")
            .field("org_id", &self.org_id)
            .field("app_id", &self.app_id)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
