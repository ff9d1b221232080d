use crate::convert::required;
use crate::error::ConversionError;
use crate::models::{
    EmailBody, InboundMessageBody, LocationBody, MediaBody, MediaType, MessageBody,
    MessageDeliveryStatus, MessagingChannel, MessagingChannelNumber, MessagingConsentUpdate,
    MessagingConsentUpdateStatus, MessagingSessionStatus, OutboundMessage, TemplateBody,
    UssdMenuBody, VoiceAction,
};
use crate::proto;

impl From<MessagingChannel> for proto::MessagingChannel {
    fn from(channel: MessagingChannel) -> Self {
        match channel {
            MessagingChannel::Sms => Self::Sms,
            MessagingChannel::Voice => Self::Voice,
            MessagingChannel::Ussd => Self::Ussd,
            MessagingChannel::FbMessenger => Self::FbMessenger,
            MessagingChannel::Telegram => Self::Telegram,
            MessagingChannel::Whatsapp => Self::Whatsapp,
            MessagingChannel::Email => Self::Email,
        }
    }
}

impl TryFrom<i32> for MessagingChannel {
    type Error = ConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match proto::MessagingChannel::try_from(value) {
            Ok(proto::MessagingChannel::Sms) => Ok(Self::Sms),
            Ok(proto::MessagingChannel::Voice) => Ok(Self::Voice),
            Ok(proto::MessagingChannel::Ussd) => Ok(Self::Ussd),
            Ok(proto::MessagingChannel::FbMessenger) => Ok(Self::FbMessenger),
            Ok(proto::MessagingChannel::Telegram) => Ok(Self::Telegram),
            Ok(proto::MessagingChannel::Whatsapp) => Ok(Self::Whatsapp),
            Ok(proto::MessagingChannel::Email) => Ok(Self::Email),
            Ok(proto::MessagingChannel::Unspecified) | Err(_) => Err(ConversionError::UnknownEnum {
                enum_name: "MessagingChannel",
                value,
            }),
        }
    }
}

impl From<&MessagingChannelNumber> for proto::MessagingChannelNumber {
    fn from(number: &MessagingChannelNumber) -> Self {
        Self {
            channel: proto::MessagingChannel::from(number.channel).into(),
            number: number.number.clone(),
        }
    }
}

impl TryFrom<proto::MessagingChannelNumber> for MessagingChannelNumber {
    type Error = ConversionError;

    fn try_from(wire: proto::MessagingChannelNumber) -> Result<Self, Self::Error> {
        Ok(Self {
            channel: MessagingChannel::try_from(wire.channel)?,
            number: wire.number,
        })
    }
}

impl From<MediaType> for proto::MediaType {
    fn from(media: MediaType) -> Self {
        match media {
            MediaType::Image => Self::Image,
            MediaType::Audio => Self::Audio,
            MediaType::Video => Self::Video,
            MediaType::Document => Self::Document,
            MediaType::Voice => Self::Voice,
            MediaType::Sticker => Self::Sticker,
        }
    }
}

impl TryFrom<i32> for MediaType {
    type Error = ConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match proto::MediaType::try_from(value) {
            Ok(proto::MediaType::Image) => Ok(Self::Image),
            Ok(proto::MediaType::Audio) => Ok(Self::Audio),
            Ok(proto::MediaType::Video) => Ok(Self::Video),
            Ok(proto::MediaType::Document) => Ok(Self::Document),
            Ok(proto::MediaType::Voice) => Ok(Self::Voice),
            Ok(proto::MediaType::Sticker) => Ok(Self::Sticker),
            Ok(proto::MediaType::Unspecified) | Err(_) => Err(ConversionError::UnknownEnum {
                enum_name: "MediaType",
                value,
            }),
        }
    }
}

impl From<&MediaBody> for proto::MediaMessageBody {
    fn from(body: &MediaBody) -> Self {
        Self {
            url: body.url.clone(),
            media: proto::MediaType::from(body.media_type).into(),
        }
    }
}

impl TryFrom<proto::MediaMessageBody> for MediaBody {
    type Error = ConversionError;

    fn try_from(wire: proto::MediaMessageBody) -> Result<Self, Self::Error> {
        Ok(Self {
            url: wire.url,
            media_type: MediaType::try_from(wire.media)?,
        })
    }
}

impl From<&LocationBody> for proto::LocationMessageBody {
    fn from(body: &LocationBody) -> Self {
        Self {
            latitude: body.latitude,
            longitude: body.longitude,
            label: body.label.clone(),
            address: body.address.clone(),
        }
    }
}

impl From<proto::LocationMessageBody> for LocationBody {
    fn from(wire: proto::LocationMessageBody) -> Self {
        Self {
            latitude: wire.latitude,
            longitude: wire.longitude,
            label: wire.label,
            address: wire.address,
        }
    }
}

impl From<&EmailBody> for proto::EmailMessageBody {
    fn from(body: &EmailBody) -> Self {
        Self {
            subject: body.subject.clone(),
            plain: body.plain.clone(),
            html: body.html.clone(),
            cc_list: body.cc.clone(),
            bcc_list: body.bcc.clone(),
            attachments: body.attachments.clone(),
        }
    }
}

impl From<proto::EmailMessageBody> for EmailBody {
    fn from(wire: proto::EmailMessageBody) -> Self {
        Self {
            subject: wire.subject,
            plain: wire.plain,
            html: wire.html,
            cc: wire.cc_list,
            bcc: wire.bcc_list,
            attachments: wire.attachments,
        }
    }
}

impl From<&MessageBody> for proto::MessageBody {
    fn from(body: &MessageBody) -> Self {
        use proto::message_body::Entry;

        let entry = match body {
            MessageBody::Text(text) => Entry::Text(text.clone()),
            MessageBody::Media(media) => Entry::Media(media.into()),
            MessageBody::Location(location) => Entry::Location(location.into()),
            MessageBody::Email(email) => Entry::Email(email.into()),
            MessageBody::Template(template) => Entry::Template(proto::TemplateMessageBody {
                id: template.id.clone(),
                params: template.params.clone(),
            }),
            MessageBody::Url(url) => Entry::Url(url.clone()),
            MessageBody::Voice(actions) => Entry::Voice(proto::VoiceCallDialplanMessageBody {
                actions: actions.iter().map(proto::VoiceCallAction::from).collect(),
            }),
            MessageBody::UssdMenu(menu) => Entry::Ussd(proto::UssdMenuMessageBody {
                text: menu.text.clone(),
                is_terminal: menu.is_terminal,
            }),
        };
        Self { entry: Some(entry) }
    }
}

impl TryFrom<proto::MessageBody> for MessageBody {
    type Error = ConversionError;

    fn try_from(wire: proto::MessageBody) -> Result<Self, Self::Error> {
        use proto::message_body::Entry;

        Ok(match required(wire.entry, "MessageBody", "entry")? {
            Entry::Text(text) => Self::Text(text),
            Entry::Media(media) => Self::Media(media.try_into()?),
            Entry::Location(location) => Self::Location(location.into()),
            Entry::Email(email) => Self::Email(email.into()),
            Entry::Template(template) => Self::Template(TemplateBody {
                id: template.id,
                params: template.params,
            }),
            Entry::Url(url) => Self::Url(url),
            Entry::Voice(plan) => Self::Voice(
                plan.actions
                    .into_iter()
                    .map(VoiceAction::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Entry::Ussd(menu) => Self::UssdMenu(UssdMenuBody {
                text: menu.text,
                is_terminal: menu.is_terminal,
            }),
        })
    }
}

impl From<&OutboundMessage> for proto::OutboundMessage {
    fn from(message: &OutboundMessage) -> Self {
        Self {
            body: Some((&message.body).into()),
            labels: message.labels.clone(),
            provider_tag: message.provider_tag.clone(),
            reply_token: message.reply_token.clone(),
        }
    }
}

impl TryFrom<proto::OutboundMessage> for OutboundMessage {
    type Error = ConversionError;

    fn try_from(wire: proto::OutboundMessage) -> Result<Self, Self::Error> {
        Ok(Self {
            body: required(wire.body, "OutboundMessage", "body")?.try_into()?,
            labels: wire.labels,
            provider_tag: wire.provider_tag,
            reply_token: wire.reply_token,
        })
    }
}

impl TryFrom<proto::InboundMessageBody> for InboundMessageBody {
    type Error = ConversionError;

    fn try_from(wire: proto::InboundMessageBody) -> Result<Self, Self::Error> {
        use proto::inbound_message_body::Entry;

        Ok(match required(wire.entry, "InboundMessageBody", "entry")? {
            Entry::Text(text) => Self::Text(text),
            Entry::Media(media) => Self::Media(media.try_into()?),
            Entry::Location(location) => Self::Location(location.into()),
            Entry::Email(email) => Self::Email(email.into()),
        })
    }
}

impl From<i32> for MessageDeliveryStatus {
    fn from(value: i32) -> Self {
        use proto::MessageDeliveryStatus as Wire;

        match Wire::try_from(value) {
            Ok(Wire::Queued) => Self::Queued,
            Ok(Wire::Sent) => Self::Sent,
            Ok(Wire::Delivered) => Self::Delivered,
            Ok(Wire::Read) => Self::Read,
            Ok(Wire::Received) => Self::Received,
            Ok(Wire::SessionInitiated) => Self::SessionInitiated,
            Ok(Wire::Failed) => Self::Failed,
            Ok(Wire::NoSession) => Self::NoSession,
            Ok(Wire::NoConsent) => Self::NoConsent,
            Ok(Wire::InsufficientCredit) => Self::InsufficientCredit,
            Ok(Wire::NotSupported) => Self::NotSupported,
            Ok(Wire::InvalidChannelNumber) => Self::InvalidChannelNumber,
            Ok(Wire::DecommissionedCustomerId) => Self::DecommissionedCustomerId,
            Ok(Wire::ApplicationError) => Self::ApplicationError,
            Ok(Wire::Unspecified) | Err(_) => Self::Unknown,
        }
    }
}

impl From<i32> for MessagingSessionStatus {
    fn from(value: i32) -> Self {
        match proto::MessagingSessionStatus::try_from(value) {
            Ok(proto::MessagingSessionStatus::Active) => Self::Active,
            Ok(proto::MessagingSessionStatus::Expired) => Self::Expired,
            Ok(proto::MessagingSessionStatus::Failed) => Self::Failed,
            Ok(proto::MessagingSessionStatus::Unspecified) | Err(_) => Self::Unknown,
        }
    }
}

impl From<MessagingConsentUpdate> for proto::MessagingConsentUpdate {
    fn from(update: MessagingConsentUpdate) -> Self {
        match update {
            MessagingConsentUpdate::Allow => Self::Allow,
            MessagingConsentUpdate::Block => Self::Block,
        }
    }
}

impl TryFrom<i32> for MessagingConsentUpdate {
    type Error = ConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match proto::MessagingConsentUpdate::try_from(value) {
            Ok(proto::MessagingConsentUpdate::Allow) => Ok(Self::Allow),
            Ok(proto::MessagingConsentUpdate::Block) => Ok(Self::Block),
            Ok(proto::MessagingConsentUpdate::Unspecified) | Err(_) => {
                Err(ConversionError::UnknownEnum {
                    enum_name: "MessagingConsentUpdate",
                    value,
                })
            }
        }
    }
}

impl From<i32> for MessagingConsentUpdateStatus {
    fn from(value: i32) -> Self {
        use proto::MessagingConsentUpdateStatus as Wire;

        match Wire::try_from(value) {
            Ok(Wire::Queued) => Self::Queued,
            Ok(Wire::Completed) => Self::Completed,
            Ok(Wire::InvalidChannelNumber) => Self::InvalidChannelNumber,
            Ok(Wire::DecommissionedCustomerId) => Self::DecommissionedCustomerId,
            Ok(Wire::ApplicationError) => Self::ApplicationError,
            Ok(Wire::Unspecified) | Err(_) => Self::Unknown,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::models::{SayAction, VoiceAction};
    use std::collections::HashMap;

    #[test]
    fn outbound_message_round_trip_keeps_optionals() {
        let message = OutboundMessage::text("hello")
            .with_label("promo")
            .with_provider_tag("acme");

        let wire = proto::OutboundMessage::from(&message);
        assert_eq!(wire.reply_token, None);
        assert_eq!(wire.provider_tag.as_deref(), Some("acme"));

        let back = OutboundMessage::try_from(wire).unwrap();
        assert_eq!(back, message);
        assert_eq!(back.reply_token, None);
    }

    #[test]
    fn location_round_trip_keeps_unset_label() {
        let body = MessageBody::Location(LocationBody {
            latitude: -1.2921,
            longitude: 36.8219,
            label: None,
            address: Some("Nairobi".to_owned()),
        });
        let back = MessageBody::try_from(proto::MessageBody::from(&body)).unwrap();
        assert_eq!(back, body);
    }

    #[test]
    fn template_and_voice_bodies_round_trip() {
        let template = MessageBody::Template(TemplateBody {
            id: "welcome".to_owned(),
            params: HashMap::from([("name".to_owned(), "Ada".to_owned())]),
        });
        assert_eq!(
            MessageBody::try_from(proto::MessageBody::from(&template)).unwrap(),
            template
        );

        let voice = MessageBody::Voice(vec![
            VoiceAction::Say(SayAction::new("Welcome")),
            VoiceAction::Reject,
        ]);
        assert_eq!(
            MessageBody::try_from(proto::MessageBody::from(&voice)).unwrap(),
            voice
        );
    }

    #[test]
    fn empty_message_body_is_missing_entry() {
        assert!(matches!(
            MessageBody::try_from(proto::MessageBody::default()),
            Err(ConversionError::MissingField {
                kind: "MessageBody",
                field: "entry"
            })
        ));
    }

    #[test]
    fn unknown_delivery_status_is_tolerated() {
        assert_eq!(MessageDeliveryStatus::from(9999), MessageDeliveryStatus::Unknown);
        assert_eq!(MessageDeliveryStatus::from(3), MessageDeliveryStatus::Delivered);
        assert!(MessageDeliveryStatus::from(102).is_failure());
    }

    #[test]
    fn unspecified_channel_is_rejected() {
        let wire = proto::MessagingChannelNumber {
            channel: 0,
            number: "1234".to_owned(),
        };
        assert!(MessagingChannelNumber::try_from(wire).is_err());
    }
}
