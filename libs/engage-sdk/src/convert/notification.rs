use crate::convert::{optional_datetime, optional_duration, required, timestamp_to_datetime};
use crate::error::ConversionError;
use crate::models::{
    CustomerNumber, InboundMessageBody, MessagingChannelNumber, MessagingConsentUpdate,
    PaymentChannelNumber,
};
use crate::notification::{
    MessageStatusNotification, MessagingConsentStatusNotification,
    MessagingSessionStatusNotification, Notification, PaymentStatusNotification,
    ReceivedMessageNotification, ReceivedPaymentNotification, ReminderNotification,
    UssdSessionNotification, UssdSessionStatus, VoiceCallDialInput, VoiceCallNotification,
    VoiceCallQueueInput, WalletPaymentStatusNotification,
};
use crate::proto;

fn channel_number(
    wire: Option<proto::MessagingChannelNumber>,
    kind: &'static str,
) -> Result<MessagingChannelNumber, ConversionError> {
    required(wire, kind, "channel_number")?.try_into()
}

impl From<i32> for UssdSessionStatus {
    fn from(value: i32) -> Self {
        match proto::UssdSessionStatus::try_from(value) {
            Ok(proto::UssdSessionStatus::Active) => Self::Active,
            Ok(proto::UssdSessionStatus::Completed) => Self::Completed,
            Ok(proto::UssdSessionStatus::Error) => Self::Error,
            Ok(proto::UssdSessionStatus::Unspecified) | Err(_) => Self::Unknown,
        }
    }
}

impl TryFrom<proto::ReminderNotification> for ReminderNotification {
    type Error = ConversionError;

    fn try_from(wire: proto::ReminderNotification) -> Result<Self, Self::Error> {
        const KIND: &str = "ReminderNotification";

        let reminder = required(wire.reminder, KIND, "reminder")?;
        let remind_at = required(reminder.remind_at, KIND, "reminder.remind_at")?;
        Ok(Self {
            key: reminder.key,
            payload: reminder.payload,
            expiration: timestamp_to_datetime(&remind_at, "reminder.remind_at")?,
            interval: optional_duration(reminder.interval, "reminder.interval")?,
            tag: wire.tag.map(Into::into),
            work_id: wire.work_id,
        })
    }
}

impl TryFrom<proto::UssdSessionNotification> for UssdSessionNotification {
    type Error = ConversionError;

    fn try_from(wire: proto::UssdSessionNotification) -> Result<Self, Self::Error> {
        Ok(Self {
            session_id: wire.session_id,
            channel_number: channel_number(wire.channel_number, "UssdSessionNotification")?,
            input: wire.input,
            status: wire.status.into(),
        })
    }
}

impl From<proto::PaymentStatusNotification> for PaymentStatusNotification {
    fn from(wire: proto::PaymentStatusNotification) -> Self {
        Self {
            transaction_id: wire.transaction_id,
            status: wire.status.into(),
        }
    }
}

impl TryFrom<proto::ReceivedPaymentNotification> for ReceivedPaymentNotification {
    type Error = ConversionError;

    fn try_from(wire: proto::ReceivedPaymentNotification) -> Result<Self, Self::Error> {
        const KIND: &str = "ReceivedPaymentNotification";

        Ok(Self {
            purse_id: wire.purse_id,
            transaction_id: wire.transaction_id,
            customer_number: CustomerNumber::try_from(required(
                wire.customer_number,
                KIND,
                "customer_number",
            )?)?,
            channel_number: PaymentChannelNumber::try_from(required(
                wire.channel_number,
                KIND,
                "channel_number",
            )?)?,
            value: required(wire.value, KIND, "value")?.into(),
            status: wire.status.into(),
        })
    }
}

impl From<proto::WalletPaymentStatusNotification> for WalletPaymentStatusNotification {
    fn from(wire: proto::WalletPaymentStatusNotification) -> Self {
        Self {
            wallet_id: wire.wallet_id,
            transaction_id: wire.transaction_id,
            status: wire.status.into(),
        }
    }
}

impl From<proto::MessageStatusNotification> for MessageStatusNotification {
    fn from(wire: proto::MessageStatusNotification) -> Self {
        Self {
            message_id: wire.message_id,
            status: wire.status.into(),
        }
    }
}

impl TryFrom<proto::MessagingSessionStatusNotification> for MessagingSessionStatusNotification {
    type Error = ConversionError;

    fn try_from(wire: proto::MessagingSessionStatusNotification) -> Result<Self, Self::Error> {
        Ok(Self {
            channel_number: channel_number(
                wire.channel_number,
                "MessagingSessionStatusNotification",
            )?,
            session_id: wire.session_id,
            status: wire.status.into(),
            expires_at: optional_datetime(wire.expires_at, "expires_at")?,
        })
    }
}

impl TryFrom<proto::MessagingConsentStatusNotification> for MessagingConsentStatusNotification {
    type Error = ConversionError;

    fn try_from(wire: proto::MessagingConsentStatusNotification) -> Result<Self, Self::Error> {
        Ok(Self {
            channel_number: channel_number(
                wire.channel_number,
                "MessagingConsentStatusNotification",
            )?,
            update: MessagingConsentUpdate::try_from(wire.update)?,
            status: wire.status.into(),
        })
    }
}

impl TryFrom<proto::ReceivedMessageNotification> for ReceivedMessageNotification {
    type Error = ConversionError;

    fn try_from(wire: proto::ReceivedMessageNotification) -> Result<Self, Self::Error> {
        Ok(Self {
            message_id: wire.message_id,
            channel_number: channel_number(wire.channel_number, "ReceivedMessageNotification")?,
            parts: wire
                .parts
                .into_iter()
                .map(InboundMessageBody::try_from)
                .collect::<Result<_, _>>()?,
            session_id: wire.session_id,
            in_reply_to: wire.in_reply_to,
        })
    }
}

impl TryFrom<proto::VoiceCallDialInput> for VoiceCallDialInput {
    type Error = ConversionError;

    fn try_from(wire: proto::VoiceCallDialInput) -> Result<Self, Self::Error> {
        Ok(Self {
            destination_number: wire.destination_number,
            started_at: optional_datetime(wire.started_at, "dial_data.started_at")?,
            duration: optional_duration(wire.duration, "dial_data.duration")?,
        })
    }
}

impl TryFrom<proto::VoiceCallQueueInput> for VoiceCallQueueInput {
    type Error = ConversionError;

    fn try_from(wire: proto::VoiceCallQueueInput) -> Result<Self, Self::Error> {
        Ok(Self {
            enqueued_at: optional_datetime(wire.enqueued_at, "queue_data.enqueued_at")?,
            dequeued_at: optional_datetime(wire.dequeued_at, "queue_data.dequeued_at")?,
            dequeued_to_number: wire.dequeued_to_number,
            queue_duration: optional_duration(wire.queue_duration, "queue_data.queue_duration")?,
        })
    }
}

impl TryFrom<proto::VoiceCallNotification> for VoiceCallNotification {
    type Error = ConversionError;

    fn try_from(wire: proto::VoiceCallNotification) -> Result<Self, Self::Error> {
        Ok(Self {
            channel_number: channel_number(wire.channel_number, "VoiceCallNotification")?,
            session_id: wire.session_id,
            direction: wire.direction.into(),
            status: wire.status.into(),
            started_at: optional_datetime(wire.started_at, "started_at")?,
            hangup_cause: wire.hangup_cause.into(),
            dtmf_digits: wire.dtmf_digits,
            recording_url: wire.recording_url,
            dial_data: wire.dial_data.map(TryInto::try_into).transpose()?,
            queue_data: wire.queue_data.map(TryInto::try_into).transpose()?,
            cost: wire.cost.map(Into::into),
        })
    }
}

impl TryFrom<proto::webhook_request::Entry> for Notification {
    type Error = ConversionError;

    fn try_from(entry: proto::webhook_request::Entry) -> Result<Self, Self::Error> {
        use proto::webhook_request::Entry;

        Ok(match entry {
            Entry::Reminder(n) => Self::Reminder(n.try_into()?),
            Entry::UssdSession(n) => Self::UssdSession(n.try_into()?),
            Entry::PaymentStatus(n) => Self::PaymentStatus(n.into()),
            Entry::ReceivedPayment(n) => Self::ReceivedPayment(n.try_into()?),
            Entry::WalletPaymentStatus(n) => Self::WalletPaymentStatus(n.into()),
            Entry::MessageStatus(n) => Self::MessageStatus(n.into()),
            Entry::MessagingSessionStatus(n) => Self::MessagingSessionStatus(n.try_into()?),
            Entry::MessagingConsentStatus(n) => Self::MessagingConsentStatus(n.try_into()?),
            Entry::ReceivedMessage(n) => Self::ReceivedMessage(n.try_into()?),
            Entry::VoiceCall(n) => Self::VoiceCall(n.try_into()?),
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::models::{CustomerNumberProvider, MessagingChannel, PaymentStatus, VoiceCallStatus};

    fn voice_channel() -> proto::MessagingChannelNumber {
        proto::MessagingChannelNumber {
            channel: proto::MessagingChannel::Voice.into(),
            number: "+254711082000".to_owned(),
        }
    }

    #[test]
    fn reminder_without_reminder_is_missing_field() {
        let wire = proto::ReminderNotification {
            work_id: Some("w-1".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            ReminderNotification::try_from(wire).unwrap_err(),
            ConversionError::MissingField {
                kind: "ReminderNotification",
                field: "reminder"
            }
        );
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn received_payment_fills_nested_values() {
        let wire = proto::ReceivedPaymentNotification {
            purse_id: "purse-1".to_owned(),
            transaction_id: "tx-1".to_owned(),
            customer_number: Some(proto::CustomerNumber {
                provider: proto::CustomerNumberProvider::Cellular.into(),
                number: "+254700000001".to_owned(),
                partition: None,
            }),
            channel_number: Some(proto::PaymentChannelNumber {
                channel: proto::PaymentChannel::Cellular.into(),
                number: "525900".to_owned(),
            }),
            value: Some(proto::Cash {
                currency_code: "KES".to_owned(),
                amount: 100.00,
            }),
            status: proto::PaymentStatus::Success.into(),
        };

        let n = ReceivedPaymentNotification::try_from(wire).unwrap();
        assert_eq!(n.value.amount, 100.00);
        assert_eq!(n.value.currency_code, "KES");
        assert_eq!(n.customer_number.provider, CustomerNumberProvider::Cellular);
        assert_eq!(n.status, PaymentStatus::Success);
    }

    #[test]
    fn received_payment_without_value_is_rejected() {
        let wire = proto::ReceivedPaymentNotification {
            customer_number: Some(proto::CustomerNumber {
                provider: proto::CustomerNumberProvider::Cellular.into(),
                number: "1".to_owned(),
                partition: None,
            }),
            channel_number: Some(proto::PaymentChannelNumber {
                channel: proto::PaymentChannel::Cellular.into(),
                number: "2".to_owned(),
            }),
            ..Default::default()
        };
        assert!(matches!(
            ReceivedPaymentNotification::try_from(wire),
            Err(ConversionError::MissingField { field: "value", .. })
        ));
    }

    #[test]
    fn voice_call_keeps_unset_optionals() {
        let wire = proto::VoiceCallNotification {
            channel_number: Some(voice_channel()),
            session_id: "s-1".to_owned(),
            status: proto::VoiceCallStatus::Ringing.into(),
            ..Default::default()
        };

        let n = VoiceCallNotification::try_from(wire).unwrap();
        assert_eq!(n.channel_number.channel, MessagingChannel::Voice);
        assert_eq!(n.status, VoiceCallStatus::Ringing);
        assert_eq!(n.dtmf_digits, None);
        assert_eq!(n.dial_data, None);
        assert_eq!(n.cost, None);
    }

    #[test]
    fn voice_call_without_channel_is_rejected() {
        let wire = proto::VoiceCallNotification {
            session_id: "s-1".to_owned(),
            ..Default::default()
        };
        assert!(matches!(
            VoiceCallNotification::try_from(wire),
            Err(ConversionError::MissingField {
                kind: "VoiceCallNotification",
                field: "channel_number"
            })
        ));
    }

    #[test]
    fn consent_with_unknown_update_is_rejected() {
        let wire = proto::MessagingConsentStatusNotification {
            channel_number: Some(voice_channel()),
            update: 42,
            status: 0,
        };
        assert!(matches!(
            MessagingConsentStatusNotification::try_from(wire),
            Err(ConversionError::UnknownEnum { value: 42, .. })
        ));
    }
}
