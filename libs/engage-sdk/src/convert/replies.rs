use std::time::Duration;

use secrecy::SecretString;

use crate::convert::{data_value_from_wire, optional_datetime, optional_duration, required};
use crate::error::SdkError;
use crate::models::{
    AuthToken, ConsentUpdateReply, CustomerNumber, CustomerState, CustomerTag,
    InitiatePaymentReply, LeasedAppData, Reminder, SendMessageReply, TagCommandReply, UpdateReply,
    VoiceCallReply,
};
use crate::proto;

pub(crate) fn accepted(status: bool, description: &str) -> Result<(), SdkError> {
    if status {
        Ok(())
    } else {
        Err(SdkError::Rejected {
            description: description.to_owned(),
        })
    }
}

impl TryFrom<proto::UpdateCustomerStateReply> for UpdateReply {
    type Error = SdkError;

    fn try_from(wire: proto::UpdateCustomerStateReply) -> Result<Self, Self::Error> {
        accepted(wire.status, &wire.description)?;
        Ok(Self {
            description: wire.description,
            customer_id: wire.customer_id,
        })
    }
}

impl TryFrom<proto::UpdateCustomerAppDataReply> for UpdateReply {
    type Error = SdkError;

    fn try_from(wire: proto::UpdateCustomerAppDataReply) -> Result<Self, Self::Error> {
        accepted(wire.status, &wire.description)?;
        Ok(Self {
            description: wire.description,
            customer_id: wire.customer_id,
        })
    }
}

impl TryFrom<proto::TagCommandReply> for TagCommandReply {
    type Error = SdkError;

    fn try_from(wire: proto::TagCommandReply) -> Result<Self, Self::Error> {
        accepted(wire.status, &wire.description)?;
        Ok(Self {
            description: wire.description,
            work_id: wire.work_id,
        })
    }
}

impl TryFrom<proto::LeaseCustomerAppDataReply> for LeasedAppData {
    type Error = SdkError;

    fn try_from(wire: proto::LeaseCustomerAppDataReply) -> Result<Self, Self::Error> {
        accepted(wire.status, &wire.description)?;
        Ok(Self {
            customer_id: wire.customer_id,
            value: data_value_from_wire(wire.value),
        })
    }
}

impl TryFrom<proto::MakeVoiceCallReply> for VoiceCallReply {
    type Error = SdkError;

    fn try_from(wire: proto::MakeVoiceCallReply) -> Result<Self, Self::Error> {
        accepted(wire.status, &wire.description)?;
        Ok(Self {
            description: wire.description,
            customer_id: wire.customer_id,
            session_id: wire.session_id,
        })
    }
}

impl TryFrom<proto::GetCustomerStateReply> for CustomerState {
    type Error = SdkError;

    fn try_from(wire: proto::GetCustomerStateReply) -> Result<Self, Self::Error> {
        accepted(wire.status, &wire.description)?;
        let data = required(wire.data, "GetCustomerStateReply", "data")?;

        Ok(Self {
            customer_id: data.customer_id,
            numbers: data
                .customer_numbers
                .into_iter()
                .map(CustomerNumber::try_from)
                .collect::<Result<_, _>>()?,
            tags: data
                .tags
                .into_iter()
                .map(CustomerTag::try_from)
                .collect::<Result<_, _>>()?,
            secondary_ids: data
                .secondary_ids
                .into_iter()
                .map(CustomerTag::try_from)
                .collect::<Result<_, _>>()?,
            reminders: data
                .reminders
                .into_iter()
                .map(Reminder::try_from)
                .collect::<Result<_, _>>()?,
            metadata: data
                .metadata
                .into_iter()
                .filter_map(|(k, v)| data_value_from_wire(Some(v)).map(|v| (k, v)))
                .collect(),
            created_at: optional_datetime(data.created_at, "created_at")?,
        })
    }
}

impl TryFrom<proto::GetAuthTokenReply> for AuthToken {
    type Error = SdkError;

    fn try_from(wire: proto::GetAuthTokenReply) -> Result<Self, Self::Error> {
        if wire.token.is_empty() {
            return Err(SdkError::Rejected {
                description: "platform issued an empty auth token".to_owned(),
            });
        }
        Ok(Self {
            token: SecretString::from(wire.token),
            lifetime: optional_duration(wire.lifetime, "lifetime")?.unwrap_or(Duration::ZERO),
        })
    }
}

impl From<proto::SendMessageReply> for SendMessageReply {
    fn from(wire: proto::SendMessageReply) -> Self {
        Self {
            status: wire.status.into(),
            description: wire.description,
            customer_id: wire.customer_id,
            message_id: wire.message_id,
            session_id: wire.session_id,
        }
    }
}

impl From<proto::UpdateMessagingConsentReply> for ConsentUpdateReply {
    fn from(wire: proto::UpdateMessagingConsentReply) -> Self {
        Self {
            status: wire.status.into(),
            description: wire.description,
            customer_id: wire.customer_id,
        }
    }
}

impl From<proto::InitiatePaymentReply> for InitiatePaymentReply {
    fn from(wire: proto::InitiatePaymentReply) -> Self {
        Self {
            status: wire.status.into(),
            description: wire.description,
            transaction_id: wire.transaction_id,
            debit_customer_id: wire.debit_customer_id,
            credit_customer_id: wire.credit_customer_id,
        }
    }
}
