use crate::convert::{
    datetime_to_timestamp, duration_to_wire, optional_datetime, optional_duration, required,
    timestamp_to_datetime,
};
use crate::error::ConversionError;
use crate::models::{
    CustomerNumber, CustomerNumberProvider, CustomerRef, CustomerTag, DataValue, Reminder, Tag,
};
use crate::proto;

impl From<CustomerNumberProvider> for proto::CustomerNumberProvider {
    fn from(provider: CustomerNumberProvider) -> Self {
        match provider {
            CustomerNumberProvider::Facebook => Self::Facebook,
            CustomerNumberProvider::Cellular => Self::Cellular,
            CustomerNumberProvider::Telegram => Self::Telegram,
            CustomerNumberProvider::App => Self::App,
            CustomerNumberProvider::Email => Self::Email,
        }
    }
}

impl TryFrom<i32> for CustomerNumberProvider {
    type Error = ConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match proto::CustomerNumberProvider::try_from(value) {
            Ok(proto::CustomerNumberProvider::Facebook) => Ok(Self::Facebook),
            Ok(proto::CustomerNumberProvider::Cellular) => Ok(Self::Cellular),
            Ok(proto::CustomerNumberProvider::Telegram) => Ok(Self::Telegram),
            Ok(proto::CustomerNumberProvider::App) => Ok(Self::App),
            Ok(proto::CustomerNumberProvider::Email) => Ok(Self::Email),
            Ok(proto::CustomerNumberProvider::Unspecified) | Err(_) => {
                Err(ConversionError::UnknownEnum {
                    enum_name: "CustomerNumberProvider",
                    value,
                })
            }
        }
    }
}

impl From<&CustomerNumber> for proto::CustomerNumber {
    fn from(number: &CustomerNumber) -> Self {
        Self {
            provider: proto::CustomerNumberProvider::from(number.provider).into(),
            number: number.number.clone(),
            partition: number.partition.clone(),
        }
    }
}

impl TryFrom<proto::CustomerNumber> for CustomerNumber {
    type Error = ConversionError;

    fn try_from(wire: proto::CustomerNumber) -> Result<Self, Self::Error> {
        Ok(Self {
            provider: CustomerNumberProvider::try_from(wire.provider)?,
            number: wire.number,
            partition: wire.partition,
        })
    }
}

/// Convert a nested customer number, treating the zero message as absent.
pub(crate) fn customer_number_from_wire(
    wire: Option<proto::CustomerNumber>,
) -> Result<Option<CustomerNumber>, ConversionError> {
    match wire {
        Some(n) if n != proto::CustomerNumber::default() => CustomerNumber::try_from(n).map(Some),
        _ => Ok(None),
    }
}

impl From<&CustomerRef> for proto::CustomerIdentity {
    fn from(customer: &CustomerRef) -> Self {
        let entry = match customer {
            CustomerRef::Id(id) => proto::customer_identity::Entry::CustomerId(id.clone()),
            CustomerRef::Number(number) => {
                proto::customer_identity::Entry::CustomerNumber(number.into())
            }
        };
        Self { entry: Some(entry) }
    }
}

impl From<&Tag> for proto::IndexMapping {
    fn from(tag: &Tag) -> Self {
        Self {
            key: tag.key.clone(),
            value: tag.value.clone(),
        }
    }
}

impl From<proto::IndexMapping> for Tag {
    fn from(wire: proto::IndexMapping) -> Self {
        Self {
            key: wire.key,
            value: wire.value,
        }
    }
}

impl From<&CustomerTag> for proto::CustomerIndex {
    fn from(tag: &CustomerTag) -> Self {
        Self {
            mapping: Some((&tag.tag).into()),
            expires_at: tag.expires_at.as_ref().map(datetime_to_timestamp),
        }
    }
}

impl TryFrom<proto::CustomerIndex> for CustomerTag {
    type Error = ConversionError;

    fn try_from(wire: proto::CustomerIndex) -> Result<Self, Self::Error> {
        Ok(Self {
            tag: required(wire.mapping, "CustomerIndex", "mapping")?.into(),
            expires_at: optional_datetime(wire.expires_at, "expires_at")?,
        })
    }
}

impl From<&Reminder> for proto::CustomerReminder {
    fn from(reminder: &Reminder) -> Self {
        Self {
            key: reminder.key.clone(),
            remind_at: Some(datetime_to_timestamp(&reminder.expiration)),
            interval: reminder.interval.map(duration_to_wire),
            payload: reminder.payload.clone(),
        }
    }
}

impl TryFrom<proto::CustomerReminder> for Reminder {
    type Error = ConversionError;

    fn try_from(wire: proto::CustomerReminder) -> Result<Self, Self::Error> {
        let remind_at = required(wire.remind_at, "CustomerReminder", "remind_at")?;
        Ok(Self {
            key: wire.key,
            expiration: timestamp_to_datetime(&remind_at, "remind_at")?,
            interval: optional_duration(wire.interval, "interval")?,
            payload: wire.payload,
        })
    }
}

impl From<&DataValue> for proto::DataMapValue {
    fn from(value: &DataValue) -> Self {
        let value = match value {
            DataValue::Text(s) => proto::data_map_value::Value::StringVal(s.clone()),
            DataValue::Bytes(b) => proto::data_map_value::Value::BytesVal(b.clone()),
        };
        Self { value: Some(value) }
    }
}

/// An empty `DataMapValue` carries no data and maps to `None`.
pub(crate) fn data_value_from_wire(wire: Option<proto::DataMapValue>) -> Option<DataValue> {
    match wire?.value? {
        proto::data_map_value::Value::StringVal(s) => Some(DataValue::Text(s)),
        proto::data_map_value::Value::BytesVal(b) => Some(DataValue::Bytes(b)),
    }
}
