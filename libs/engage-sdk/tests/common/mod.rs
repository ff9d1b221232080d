//! In-memory backend and frame builders shared by the integration tests.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures::Stream;
use parking_lot::Mutex;
use secrecy::SecretString;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use engage_sdk::models::{MessageDeliveryStatus, MessagingConsentUpdateStatus, PaymentStatus};
use engage_sdk::notification::{FrameStream, NotificationReplySink, NotificationSource};
use engage_sdk::proto;
use engage_sdk::proto::webhook_request::Entry;
use engage_sdk::{
    AuthToken, Cash, ConsentUpdateReply, CustomerNumber, CustomerRef, CustomerState, CustomerTag,
    DataValue, EngageApi, EngageConfig, InitiatePaymentReply, LeasedAppData,
    MessagingChannelNumber, MessagingConsentUpdate, OutboundMessage, PaymentCounterParty,
    Reminder, ReplyEnvelope, SdkError, SendMessageReply, Tag, TagCommandReply, UpdateReply,
    VoiceCallReply,
};

pub type FrameResult = Result<proto::WebhookRequest, tonic::Status>;

/// Feeds frames into a stream handed out by [`FakeBackend::open`].
pub struct StreamFeed {
    pub frames: mpsc::Sender<FrameResult>,
    pub drops: Arc<AtomicUsize>,
}

impl StreamFeed {
    pub async fn send(&self, frame: proto::WebhookRequest) {
        self.frames.send(Ok(frame)).await.unwrap();
    }

    pub async fn fail(&self, status: tonic::Status) {
        self.frames.send(Err(status)).await.unwrap();
    }

    pub fn drop_count(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }
}

/// Stream wrapper counting how often it is dropped.
struct TrackedStream {
    inner: FrameStream,
    drops: Arc<AtomicUsize>,
}

impl Stream for TrackedStream {
    type Item = FrameResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for TrackedStream {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

enum ScriptedOpen {
    Stream(FrameStream),
    Fail(String),
}

/// Backend recording every call; unary calls succeed with canned replies.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<String>>,
    replies: Mutex<Vec<ReplyEnvelope>>,
    opens: Mutex<VecDeque<ScriptedOpen>>,
    opened_for: Mutex<Vec<String>>,
    pub open_count: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script the next `open` to hand out a stream fed by the returned feed.
    pub fn push_stream(&self) -> StreamFeed {
        let (tx, rx) = mpsc::channel(64);
        let drops = Arc::new(AtomicUsize::new(0));
        let stream = TrackedStream {
            inner: Box::pin(ReceiverStream::new(rx)),
            drops: Arc::clone(&drops),
        };
        self.opens
            .lock()
            .push_back(ScriptedOpen::Stream(Box::pin(stream)));
        StreamFeed { frames: tx, drops }
    }

    /// Script the next `open` to fail.
    pub fn push_open_failure(&self, message: &str) {
        self.opens
            .lock()
            .push_back(ScriptedOpen::Fail(message.to_owned()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn replies(&self) -> Vec<ReplyEnvelope> {
        self.replies.lock().clone()
    }

    pub fn opened_for(&self) -> Vec<String> {
        self.opened_for.lock().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

#[async_trait]
impl NotificationSource for FakeBackend {
    async fn open(&self, app_id: &str) -> Result<FrameStream, SdkError> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        self.opened_for.lock().push(app_id.to_owned());
        match self.opens.lock().pop_front() {
            Some(ScriptedOpen::Stream(stream)) => Ok(stream),
            Some(ScriptedOpen::Fail(message)) => Err(SdkError::Transport(message)),
            // Nothing scripted: a stream that never yields.
            None => Ok(Box::pin(futures::stream::pending::<FrameResult>())),
        }
    }
}

#[async_trait]
impl NotificationReplySink for FakeBackend {
    async fn send_notification_reply(&self, envelope: ReplyEnvelope) -> Result<(), SdkError> {
        self.replies.lock().push(envelope);
        Ok(())
    }
}

fn updated(customer: &CustomerRef) -> UpdateReply {
    UpdateReply {
        description: "ok".to_owned(),
        customer_id: Some(customer.id().unwrap_or("resolved-id").to_owned()),
    }
}

fn tag_command() -> TagCommandReply {
    TagCommandReply {
        description: "ok".to_owned(),
        work_id: Some("work-1".to_owned()),
    }
}

#[async_trait]
impl EngageApi for FakeBackend {
    async fn generate_auth_token(&self) -> Result<AuthToken, SdkError> {
        self.record("generate_auth_token");
        Ok(AuthToken {
            token: SecretString::from("token-1".to_owned()),
            lifetime: Duration::from_secs(3600),
        })
    }

    async fn get_customer_state(&self, customer: &CustomerRef) -> Result<CustomerState, SdkError> {
        self.record(format!("get_customer_state {customer}"));
        Ok(CustomerState {
            customer_id: customer.id().unwrap_or("resolved-id").to_owned(),
            ..Default::default()
        })
    }

    async fn adopt_customer_state(
        &self,
        customer_id: &str,
        other: &CustomerRef,
    ) -> Result<UpdateReply, SdkError> {
        self.record(format!("adopt_customer_state {customer_id} {other}"));
        Ok(updated(&CustomerRef::Id(customer_id.to_owned())))
    }

    async fn add_customer_reminder(
        &self,
        customer: &CustomerRef,
        reminder: &Reminder,
    ) -> Result<UpdateReply, SdkError> {
        self.record(format!("add_customer_reminder {customer} {}", reminder.key));
        Ok(updated(customer))
    }

    async fn add_customer_reminder_by_tag(
        &self,
        tag: &Tag,
        reminder: &Reminder,
    ) -> Result<TagCommandReply, SdkError> {
        self.record(format!("add_customer_reminder_by_tag {} {}", tag.key, reminder.key));
        Ok(tag_command())
    }

    async fn cancel_customer_reminder(
        &self,
        customer: &CustomerRef,
        key: &str,
    ) -> Result<UpdateReply, SdkError> {
        self.record(format!("cancel_customer_reminder {customer} {key}"));
        Ok(updated(customer))
    }

    async fn cancel_customer_reminder_by_tag(
        &self,
        tag: &Tag,
        key: &str,
    ) -> Result<TagCommandReply, SdkError> {
        self.record(format!("cancel_customer_reminder_by_tag {} {key}", tag.key));
        Ok(tag_command())
    }

    async fn update_customer_tags(
        &self,
        customer: &CustomerRef,
        tags: &[CustomerTag],
    ) -> Result<UpdateReply, SdkError> {
        self.record(format!("update_customer_tags {customer} {}", tags.len()));
        Ok(updated(customer))
    }

    async fn delete_customer_tags(
        &self,
        customer: &CustomerRef,
        keys: &[String],
    ) -> Result<UpdateReply, SdkError> {
        self.record(format!("delete_customer_tags {customer} {}", keys.join(",")));
        Ok(updated(customer))
    }

    async fn update_customer_metadata(
        &self,
        customer: &CustomerRef,
        metadata: &HashMap<String, DataValue>,
    ) -> Result<UpdateReply, SdkError> {
        self.record(format!("update_customer_metadata {customer} {}", metadata.len()));
        Ok(updated(customer))
    }

    async fn delete_customer_metadata(
        &self,
        customer: &CustomerRef,
        keys: &[String],
    ) -> Result<UpdateReply, SdkError> {
        self.record(format!("delete_customer_metadata {customer} {}", keys.join(",")));
        Ok(updated(customer))
    }

    async fn update_customer_app_data(
        &self,
        customer: &CustomerRef,
        _value: &DataValue,
    ) -> Result<UpdateReply, SdkError> {
        self.record(format!("update_customer_app_data {customer}"));
        Ok(updated(customer))
    }

    async fn lease_customer_app_data(
        &self,
        customer: &CustomerRef,
    ) -> Result<LeasedAppData, SdkError> {
        self.record(format!("lease_customer_app_data {customer}"));
        Ok(LeasedAppData {
            customer_id: customer.id().map(ToOwned::to_owned),
            value: Some(DataValue::Text("step-1".to_owned())),
        })
    }

    async fn delete_customer_app_data(
        &self,
        customer: &CustomerRef,
    ) -> Result<UpdateReply, SdkError> {
        self.record(format!("delete_customer_app_data {customer}"));
        Ok(updated(customer))
    }

    async fn send_message(
        &self,
        customer_number: &CustomerNumber,
        channel_number: &MessagingChannelNumber,
        _message: &OutboundMessage,
    ) -> Result<SendMessageReply, SdkError> {
        self.record(format!(
            "send_message {} {}",
            customer_number.number, channel_number.number
        ));
        Ok(SendMessageReply {
            status: MessageDeliveryStatus::Queued,
            description: "queued".to_owned(),
            customer_id: Some("resolved-id".to_owned()),
            message_id: Some("msg-1".to_owned()),
            session_id: None,
        })
    }

    async fn send_message_by_tag(
        &self,
        tag: &Tag,
        channel_number: &MessagingChannelNumber,
        _message: &OutboundMessage,
    ) -> Result<TagCommandReply, SdkError> {
        self.record(format!("send_message_by_tag {} {}", tag.key, channel_number.number));
        Ok(tag_command())
    }

    async fn reply_to_message(
        &self,
        customer_id: &str,
        message_id: &str,
        _message: &OutboundMessage,
    ) -> Result<SendMessageReply, SdkError> {
        self.record(format!("reply_to_message {customer_id} {message_id}"));
        Ok(SendMessageReply {
            status: MessageDeliveryStatus::Sent,
            description: "sent".to_owned(),
            customer_id: Some(customer_id.to_owned()),
            message_id: Some("msg-2".to_owned()),
            session_id: None,
        })
    }

    async fn update_messaging_consent(
        &self,
        customer_number: &CustomerNumber,
        _channel_number: &MessagingChannelNumber,
        update: MessagingConsentUpdate,
    ) -> Result<ConsentUpdateReply, SdkError> {
        self.record(format!(
            "update_messaging_consent {} {update:?}",
            customer_number.number
        ));
        Ok(ConsentUpdateReply {
            status: MessagingConsentUpdateStatus::Queued,
            description: "queued".to_owned(),
            customer_id: None,
        })
    }

    async fn initiate_payment(
        &self,
        _debit_party: &PaymentCounterParty,
        _credit_party: &PaymentCounterParty,
        value: &Cash,
        narration: Option<&str>,
    ) -> Result<InitiatePaymentReply, SdkError> {
        self.record(format!(
            "initiate_payment {} {} {}",
            value.currency_code,
            value.amount,
            narration.unwrap_or("-")
        ));
        Ok(InitiatePaymentReply {
            status: PaymentStatus::PendingConfirmation,
            description: "pending".to_owned(),
            transaction_id: Some("tx-1".to_owned()),
            debit_customer_id: None,
            credit_customer_id: None,
        })
    }

    async fn make_voice_call(
        &self,
        customer_number: &CustomerNumber,
        channel_number: &MessagingChannelNumber,
    ) -> Result<VoiceCallReply, SdkError> {
        self.record(format!(
            "make_voice_call {} {}",
            customer_number.number, channel_number.number
        ));
        Ok(VoiceCallReply {
            description: "ringing".to_owned(),
            customer_id: Some("resolved-id".to_owned()),
            session_id: Some("call-1".to_owned()),
        })
    }
}

pub fn config() -> EngageConfig {
    let mut config = EngageConfig::new("org-1", "app-1", "key-1");
    config.notifications.reconnect.base_backoff = Duration::from_millis(5);
    config.notifications.reconnect.max_backoff = Duration::from_millis(20);
    config
}

pub fn reminder_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
}

pub fn cellular_number(number: &str) -> proto::CustomerNumber {
    proto::CustomerNumber {
        provider: proto::CustomerNumberProvider::Cellular.into(),
        number: number.to_owned(),
        partition: None,
    }
}

pub fn frame(notification_id: &str, customer_id: &str, entry: Entry) -> proto::WebhookRequest {
    proto::WebhookRequest {
        notification_id: notification_id.to_owned(),
        org_id: "org-1".to_owned(),
        app_id: "app-1".to_owned(),
        customer_id: Some(customer_id.to_owned()),
        entry: Some(entry),
        ..Default::default()
    }
}

pub fn reminder_frame(notification_id: &str, key: &str, payload: &str) -> proto::WebhookRequest {
    let reminder = Reminder::new(key, reminder_time()).with_payload(payload);
    frame(
        notification_id,
        "cust-1",
        Entry::Reminder(proto::ReminderNotification {
            reminder: Some(proto::CustomerReminder::from(&reminder)),
            tag: None,
            work_id: None,
        }),
    )
}

pub fn message_status_frame(notification_id: &str, message_id: &str) -> proto::WebhookRequest {
    frame(
        notification_id,
        "cust-1",
        Entry::MessageStatus(proto::MessageStatusNotification {
            message_id: message_id.to_owned(),
            status: proto::MessageDeliveryStatus::Delivered.into(),
        }),
    )
}

pub fn received_payment_frame(
    notification_id: &str,
    amount: f64,
    currency: &str,
) -> proto::WebhookRequest {
    frame(
        notification_id,
        "cust-1",
        Entry::ReceivedPayment(proto::ReceivedPaymentNotification {
            purse_id: "purse-1".to_owned(),
            transaction_id: "tx-1".to_owned(),
            customer_number: Some(cellular_number("+254700000001")),
            channel_number: Some(proto::PaymentChannelNumber {
                channel: proto::PaymentChannel::Cellular.into(),
                number: "525900".to_owned(),
            }),
            value: Some(proto::Cash {
                currency_code: currency.to_owned(),
                amount,
            }),
            status: proto::PaymentStatus::Success.into(),
        }),
    )
}

pub fn empty_frame(notification_id: &str) -> proto::WebhookRequest {
    proto::WebhookRequest {
        notification_id: notification_id.to_owned(),
        customer_id: Some("cust-1".to_owned()),
        ..Default::default()
    }
}

/// Reminder frame whose nested reminder is missing.
pub fn corrupt_reminder_frame(notification_id: &str) -> proto::WebhookRequest {
    frame(
        notification_id,
        "cust-1",
        Entry::Reminder(proto::ReminderNotification {
            reminder: None,
            tag: None,
            work_id: Some("work-9".to_owned()),
        }),
    )
}

/// Wait until `check` holds, polling every few milliseconds.
pub async fn eventually(check: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
