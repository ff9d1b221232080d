//! The service facade: one connection, one subscriber registry and at most
//! one notification worker.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::EngageApi;
use crate::client::EngageGrpcClient;
use crate::config::EngageConfig;
use crate::customer::Customer;
use crate::error::{SdkError, StreamError};
use crate::models::{
    AuthToken, Cash, ConsentUpdateReply, CustomerNumber, CustomerRef, CustomerState, CustomerTag,
    DataValue, InitiatePaymentReply, LeasedAppData, MessagingChannelNumber,
    MessagingConsentUpdate, OutboundMessage, PaymentCounterParty, Reminder, SendMessageReply, Tag,
    TagCommandReply, UpdateReply, VoiceCallReply,
};
use crate::notification::intake::IntakeWorker;
use crate::notification::{
    DispatchStats, DispatchStatsSnapshot, Dispatcher, NotificationHandler, NotificationKind,
    NotificationReplySink, NotificationSource, ReplyEnvelope, SubscriberRegistry, SubscriptionId,
};

struct WorkerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Entry point of the SDK.
///
/// ```no_run
/// # async fn run() -> Result<(), engage_sdk::SdkError> {
/// use engage_sdk::{EngageConfig, NotificationKind, Service, handler_fn};
///
/// let service = Service::connect(EngageConfig::load(None)?).await?;
/// service.on(
///     NotificationKind::Reminder,
///     handler_fn(|event, ack| async move {
///         tracing::info!(customer = ?event.customer.id(), "reminder due");
///         ack.ack().await?;
///         Ok(())
///     }),
/// );
/// let mut errors = service.start_notifications()?;
/// while let Some(err) = errors.recv().await {
///     tracing::warn!(error = %err, "notification stream");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Service {
    config: EngageConfig,
    api: Arc<dyn EngageApi>,
    source: Arc<dyn NotificationSource>,
    replies: Arc<dyn NotificationReplySink>,
    registry: Arc<SubscriberRegistry>,
    stats: Arc<DispatchStats>,
    worker: Mutex<Option<WorkerHandle>>,
}

impl Service {
    /// Validate `config` and connect to the platform.
    ///
    /// # Errors
    /// Returns [`SdkError::Config`] for an invalid configuration and
    /// [`SdkError::Transport`] when the channel cannot be established.
    pub async fn connect(config: EngageConfig) -> Result<Self, SdkError> {
        config.validate()?;
        let client = Arc::new(EngageGrpcClient::connect(&config).await?);
        tracing::info!(
            org_id = %config.org_id,
            app_id = %config.app_id,
            endpoint = %config.resolved_endpoint(),
            "engage service connected"
        );
        Ok(Self::with_backend(config, client))
    }

    /// Build a service over any backend, e.g. an in-memory fake.
    #[must_use]
    pub fn with_backend<B>(config: EngageConfig, backend: Arc<B>) -> Self
    where
        B: EngageApi + NotificationSource + NotificationReplySink + 'static,
    {
        Self {
            config,
            api: backend.clone(),
            source: backend.clone(),
            replies: backend,
            registry: Arc::new(SubscriberRegistry::new()),
            stats: Arc::new(DispatchStats::default()),
            worker: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngageConfig {
        &self.config
    }

    /// Handle on a customer; no remote call is made.
    #[must_use]
    pub fn customer(&self, reference: impl Into<CustomerRef>) -> Customer {
        Customer::new(reference.into(), Arc::clone(&self.api))
    }

    /// Subscribe `handler` to notifications of `kind`.
    ///
    /// Subscribers of one kind are invoked in subscription order. Subscribing
    /// while the stream runs takes effect from the next frame.
    pub fn on(
        &self,
        kind: NotificationKind,
        handler: Arc<dyn NotificationHandler>,
    ) -> SubscriptionId {
        self.registry.subscribe(kind, handler)
    }

    #[must_use]
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe(id)
    }

    #[must_use]
    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    #[must_use]
    pub fn dispatch_stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }

    fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.api),
            Arc::clone(&self.replies),
            Arc::clone(&self.stats),
        )
    }

    /// Open the notification stream and start dispatching.
    ///
    /// Returns the receiving side of the stream error channel. Dropping it
    /// does not stop the worker.
    ///
    /// # Errors
    /// [`SdkError::AlreadyStarted`] when the worker is running and
    /// [`SdkError::InvalidArgument`] when no application id is configured.
    pub fn start_notifications(&self) -> Result<mpsc::Receiver<StreamError>, SdkError> {
        let app_id = self.config.app_id.trim();
        if app_id.is_empty() {
            return Err(SdkError::InvalidArgument(
                "app_id must not be empty".to_owned(),
            ));
        }

        let mut worker = self.worker.lock();
        if worker.as_ref().is_some_and(|w| !w.task.is_finished()) {
            return Err(SdkError::AlreadyStarted);
        }

        let settings = &self.config.notifications;
        let (errors, receiver) = mpsc::channel(settings.error_channel_capacity.max(1));
        let cancel = CancellationToken::new();
        let intake = IntakeWorker {
            source: Arc::clone(&self.source),
            app_id: app_id.to_owned(),
            dispatcher: self.dispatcher(),
            mode: settings.dispatch_mode,
            lane_capacity: settings.lane_capacity,
            reconnect: settings.reconnect.clone(),
            errors,
            cancel: cancel.clone(),
        };

        tracing::info!(app_id, mode = ?settings.dispatch_mode, "starting notification worker");
        *worker = Some(WorkerHandle {
            cancel,
            task: tokio::spawn(intake.run()),
        });
        Ok(receiver)
    }

    /// Whether the notification worker is running.
    #[must_use]
    pub fn is_receiving_notifications(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|w| !w.task.is_finished())
    }

    /// Stop dispatching and wait for the worker to exit.
    ///
    /// The frame being dispatched finishes; no further frame is admitted.
    ///
    /// # Errors
    /// [`SdkError::NotStarted`] when no worker was started.
    pub async fn stop_notifications(&self) -> Result<(), SdkError> {
        let handle = self.worker.lock().take().ok_or(SdkError::NotStarted)?;
        handle.cancel.cancel();
        if let Err(e) = handle.task.await {
            tracing::warn!(error = %e, "notification worker failed");
        }
        tracing::info!("notification worker joined");
        Ok(())
    }

    /// Stop the notification worker, if any, and drop all subscriptions.
    pub async fn disconnect(&self) {
        match self.stop_notifications().await {
            Ok(()) | Err(SdkError::NotStarted) => {}
            Err(e) => tracing::warn!(error = %e, "stopping notifications failed"),
        }
        self.registry.clear();
        tracing::info!(app_id = %self.config.app_id, "engage service disconnected");
    }

    /// # Errors
    /// See [`EngageApi::generate_auth_token`].
    pub async fn generate_auth_token(&self) -> Result<AuthToken, SdkError> {
        self.api.generate_auth_token().await
    }

    /// # Errors
    /// See [`EngageApi::get_customer_state`].
    pub async fn get_customer_state(
        &self,
        customer: &CustomerRef,
    ) -> Result<CustomerState, SdkError> {
        self.api.get_customer_state(customer).await
    }

    /// # Errors
    /// See [`EngageApi::adopt_customer_state`].
    pub async fn adopt_customer_state(
        &self,
        customer_id: &str,
        other: &CustomerRef,
    ) -> Result<UpdateReply, SdkError> {
        self.api.adopt_customer_state(customer_id, other).await
    }

    /// # Errors
    /// See [`EngageApi::add_customer_reminder`].
    pub async fn add_customer_reminder(
        &self,
        customer: &CustomerRef,
        reminder: &Reminder,
    ) -> Result<UpdateReply, SdkError> {
        self.api.add_customer_reminder(customer, reminder).await
    }

    /// # Errors
    /// See [`EngageApi::add_customer_reminder_by_tag`].
    pub async fn add_customer_reminder_by_tag(
        &self,
        tag: &Tag,
        reminder: &Reminder,
    ) -> Result<TagCommandReply, SdkError> {
        self.api.add_customer_reminder_by_tag(tag, reminder).await
    }

    /// # Errors
    /// See [`EngageApi::cancel_customer_reminder`].
    pub async fn cancel_customer_reminder(
        &self,
        customer: &CustomerRef,
        key: &str,
    ) -> Result<UpdateReply, SdkError> {
        self.api.cancel_customer_reminder(customer, key).await
    }

    /// # Errors
    /// See [`EngageApi::cancel_customer_reminder_by_tag`].
    pub async fn cancel_customer_reminder_by_tag(
        &self,
        tag: &Tag,
        key: &str,
    ) -> Result<TagCommandReply, SdkError> {
        self.api.cancel_customer_reminder_by_tag(tag, key).await
    }

    /// # Errors
    /// See [`EngageApi::update_customer_tags`].
    pub async fn update_customer_tags(
        &self,
        customer: &CustomerRef,
        tags: &[CustomerTag],
    ) -> Result<UpdateReply, SdkError> {
        self.api.update_customer_tags(customer, tags).await
    }

    /// # Errors
    /// See [`EngageApi::delete_customer_tags`].
    pub async fn delete_customer_tags(
        &self,
        customer: &CustomerRef,
        keys: &[String],
    ) -> Result<UpdateReply, SdkError> {
        self.api.delete_customer_tags(customer, keys).await
    }

    /// # Errors
    /// See [`EngageApi::update_customer_metadata`].
    pub async fn update_customer_metadata(
        &self,
        customer: &CustomerRef,
        metadata: &HashMap<String, DataValue>,
    ) -> Result<UpdateReply, SdkError> {
        self.api.update_customer_metadata(customer, metadata).await
    }

    /// # Errors
    /// See [`EngageApi::delete_customer_metadata`].
    pub async fn delete_customer_metadata(
        &self,
        customer: &CustomerRef,
        keys: &[String],
    ) -> Result<UpdateReply, SdkError> {
        self.api.delete_customer_metadata(customer, keys).await
    }

    /// # Errors
    /// See [`EngageApi::update_customer_app_data`].
    pub async fn update_customer_app_data(
        &self,
        customer: &CustomerRef,
        value: &DataValue,
    ) -> Result<UpdateReply, SdkError> {
        self.api.update_customer_app_data(customer, value).await
    }

    /// # Errors
    /// See [`EngageApi::lease_customer_app_data`].
    pub async fn lease_customer_app_data(
        &self,
        customer: &CustomerRef,
    ) -> Result<LeasedAppData, SdkError> {
        self.api.lease_customer_app_data(customer).await
    }

    /// # Errors
    /// See [`EngageApi::delete_customer_app_data`].
    pub async fn delete_customer_app_data(
        &self,
        customer: &CustomerRef,
    ) -> Result<UpdateReply, SdkError> {
        self.api.delete_customer_app_data(customer).await
    }

    /// # Errors
    /// See [`EngageApi::send_message`].
    pub async fn send_message(
        &self,
        customer_number: &CustomerNumber,
        channel_number: &MessagingChannelNumber,
        message: &OutboundMessage,
    ) -> Result<SendMessageReply, SdkError> {
        self.api
            .send_message(customer_number, channel_number, message)
            .await
    }

    /// # Errors
    /// See [`EngageApi::send_message_by_tag`].
    pub async fn send_message_by_tag(
        &self,
        tag: &Tag,
        channel_number: &MessagingChannelNumber,
        message: &OutboundMessage,
    ) -> Result<TagCommandReply, SdkError> {
        self.api
            .send_message_by_tag(tag, channel_number, message)
            .await
    }

    /// # Errors
    /// See [`EngageApi::reply_to_message`].
    pub async fn reply_to_message(
        &self,
        customer_id: &str,
        message_id: &str,
        message: &OutboundMessage,
    ) -> Result<SendMessageReply, SdkError> {
        self.api
            .reply_to_message(customer_id, message_id, message)
            .await
    }

    /// # Errors
    /// See [`EngageApi::update_messaging_consent`].
    pub async fn update_messaging_consent(
        &self,
        customer_number: &CustomerNumber,
        channel_number: &MessagingChannelNumber,
        update: MessagingConsentUpdate,
    ) -> Result<ConsentUpdateReply, SdkError> {
        self.api
            .update_messaging_consent(customer_number, channel_number, update)
            .await
    }

    /// # Errors
    /// See [`EngageApi::initiate_payment`].
    pub async fn initiate_payment(
        &self,
        debit_party: &PaymentCounterParty,
        credit_party: &PaymentCounterParty,
        value: &Cash,
        narration: Option<&str>,
    ) -> Result<InitiatePaymentReply, SdkError> {
        self.api
            .initiate_payment(debit_party, credit_party, value, narration)
            .await
    }

    /// # Errors
    /// See [`EngageApi::make_voice_call`].
    pub async fn make_voice_call(
        &self,
        customer_number: &CustomerNumber,
        channel_number: &MessagingChannelNumber,
    ) -> Result<VoiceCallReply, SdkError> {
        self.api
            .make_voice_call(customer_number, channel_number)
            .await
    }

    /// Reply to a notification outside of a subscriber, e.g. after a restart.
    ///
    /// # Errors
    /// Propagates the reply call's failure.
    pub async fn send_notification_reply(&self, envelope: ReplyEnvelope) -> Result<(), SdkError> {
        self.replies.send_notification_reply(envelope).await
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.get_mut().take() {
            handle.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("org_id", &self.config.org_id)
            .field("app_id", &self.config.app_id)
            .field("registry", &self.registry)
            .field("receiving", &self.is_receiving_notifications())
            .finish_non_exhaustive()
    }
}
