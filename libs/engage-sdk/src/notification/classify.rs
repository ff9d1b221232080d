//! Frame classification: decide once, at the transport boundary, which
//! notification a frame carries and who it is about.

use chrono::{DateTime, Utc};

use crate::convert::{customer_number_from_wire, data_value_from_wire, optional_datetime};
use crate::error::ConversionError;
use crate::models::{CustomerRef, DataValue};
use crate::notification::{Notification, NotificationKind};
use crate::proto;
use crate::proto::webhook_request::Entry;

/// A frame after classification; every optional is decided here.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundNotification {
    pub kind: NotificationKind,
    pub notification: Notification,
    pub customer: CustomerRef,
    pub notification_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub app_data: Option<DataValue>,
}

fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

fn entry_kind(entry: &Entry) -> NotificationKind {
    match entry {
        Entry::Reminder(_) => NotificationKind::Reminder,
        Entry::UssdSession(_) => NotificationKind::UssdSession,
        Entry::PaymentStatus(_) => NotificationKind::PaymentStatus,
        Entry::ReceivedPayment(_) => NotificationKind::ReceivedPayment,
        Entry::WalletPaymentStatus(_) => NotificationKind::WalletPaymentStatus,
        Entry::MessageStatus(_) => NotificationKind::MessageStatus,
        Entry::MessagingSessionStatus(_) => NotificationKind::MessagingSessionStatus,
        Entry::MessagingConsentStatus(_) => NotificationKind::MessagingConsentStatus,
        Entry::ReceivedMessage(_) => NotificationKind::ReceivedMessage,
        Entry::VoiceCall(_) => NotificationKind::VoiceCall,
    }
}

fn entry_is_zero(entry: &Entry) -> bool {
    match entry {
        Entry::Reminder(n) => is_zero(n),
        Entry::UssdSession(n) => is_zero(n),
        Entry::PaymentStatus(n) => is_zero(n),
        Entry::ReceivedPayment(n) => is_zero(n),
        Entry::WalletPaymentStatus(n) => is_zero(n),
        Entry::MessageStatus(n) => is_zero(n),
        Entry::MessagingSessionStatus(n) => is_zero(n),
        Entry::MessagingConsentStatus(n) => is_zero(n),
        Entry::ReceivedMessage(n) => is_zero(n),
        Entry::VoiceCall(n) => is_zero(n),
    }
}

/// Kind of the populated variant, or `None` for an empty or zero frame.
#[must_use]
pub fn frame_kind(frame: &proto::WebhookRequest) -> Option<NotificationKind> {
    frame
        .entry
        .as_ref()
        .filter(|entry| !entry_is_zero(entry))
        .map(entry_kind)
}

/// Pick the customer a frame refers to; an explicit id wins over a number.
///
/// Never performs a remote lookup.
///
/// # Errors
/// Fails when the frame identifies no customer or carries an invalid number.
pub fn resolve_customer(
    customer_id: Option<String>,
    customer_number: Option<proto::CustomerNumber>,
) -> Result<CustomerRef, ConversionError> {
    if let Some(id) = customer_id.filter(|id| !id.is_empty()) {
        return Ok(CustomerRef::Id(id));
    }
    customer_number_from_wire(customer_number)?
        .map(CustomerRef::Number)
        .ok_or_else(|| ConversionError::missing("WebhookRequest", "customer_id|customer_number"))
}

/// Classify and convert one frame.
///
/// Returns `Ok(None)` for frames with no populated (or only a zero-valued)
/// variant; those are dropped without error.
///
/// # Errors
/// Returns the first conversion failure of the payload, the customer
/// reference or the frame metadata.
pub fn classify(
    frame: proto::WebhookRequest,
) -> Result<Option<InboundNotification>, ConversionError> {
    let Some(entry) = frame.entry else {
        return Ok(None);
    };
    if entry_is_zero(&entry) {
        return Ok(None);
    }

    let notification = Notification::try_from(entry)?;
    let customer = resolve_customer(frame.customer_id, frame.customer_number)?;

    Ok(Some(InboundNotification {
        kind: notification.kind(),
        notification,
        customer,
        notification_id: frame.notification_id,
        created_at: optional_datetime(frame.created_at, "created_at")?,
        app_data: data_value_from_wire(frame.app_data),
    }))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::models::{CustomerNumberProvider, MessageDeliveryStatus};

    fn cellular(number: &str) -> proto::CustomerNumber {
        proto::CustomerNumber {
            provider: proto::CustomerNumberProvider::Cellular.into(),
            number: number.to_owned(),
            partition: Some("ke".to_owned()),
        }
    }

    fn message_status_frame() -> proto::WebhookRequest {
        proto::WebhookRequest {
            notification_id: "n-1".to_owned(),
            customer_id: Some("c-1".to_owned()),
            entry: Some(Entry::MessageStatus(proto::MessageStatusNotification {
                message_id: "m-1".to_owned(),
                status: proto::MessageDeliveryStatus::Delivered.into(),
            })),
            ..Default::default()
        }
    }

    #[test]
    fn frame_without_entry_is_dropped() {
        let frame = proto::WebhookRequest {
            notification_id: "n-1".to_owned(),
            customer_id: Some("c-1".to_owned()),
            ..Default::default()
        };
        assert_eq!(frame_kind(&frame), None);
        assert_eq!(classify(frame).unwrap(), None);
    }

    #[test]
    fn zero_valued_variant_is_dropped() {
        let frame = proto::WebhookRequest {
            customer_id: Some("c-1".to_owned()),
            entry: Some(Entry::PaymentStatus(proto::PaymentStatusNotification::default())),
            ..Default::default()
        };
        assert_eq!(frame_kind(&frame), None);
        assert_eq!(classify(frame).unwrap(), None);
    }

    #[test]
    fn populated_variant_is_converted() {
        let frame = message_status_frame();
        assert_eq!(frame_kind(&frame), Some(NotificationKind::MessageStatus));

        let inbound = classify(frame).unwrap().unwrap();
        assert_eq!(inbound.kind, NotificationKind::MessageStatus);
        assert_eq!(inbound.customer, CustomerRef::Id("c-1".to_owned()));
        assert_eq!(inbound.notification_id, "n-1");
        assert_eq!(inbound.created_at, None);
        assert_eq!(inbound.app_data, None);
        let Notification::MessageStatus(status) = inbound.notification else {
            panic!("expected message status");
        };
        assert_eq!(status.status, MessageDeliveryStatus::Delivered);
    }

    #[test]
    fn customer_id_wins_over_number() {
        let customer = resolve_customer(Some("c-9".to_owned()), Some(cellular("+254700"))).unwrap();
        assert_eq!(customer, CustomerRef::Id("c-9".to_owned()));
    }

    #[test]
    fn number_only_customer_is_verbatim() {
        let customer = resolve_customer(None, Some(cellular("+254700000001"))).unwrap();
        assert_eq!(customer.id(), None);
        let number = customer.number().unwrap();
        assert_eq!(number.number, "+254700000001");
        assert_eq!(number.provider, CustomerNumberProvider::Cellular);
        assert_eq!(number.partition.as_deref(), Some("ke"));
    }

    #[test]
    fn empty_id_falls_back_to_number() {
        let customer = resolve_customer(Some(String::new()), Some(cellular("+1"))).unwrap();
        assert!(matches!(customer, CustomerRef::Number(_)));
    }

    #[test]
    fn frame_without_customer_is_a_conversion_error() {
        let mut frame = message_status_frame();
        frame.customer_id = None;
        assert!(matches!(
            classify(frame),
            Err(ConversionError::MissingField {
                kind: "WebhookRequest",
                ..
            })
        ));
    }
}
