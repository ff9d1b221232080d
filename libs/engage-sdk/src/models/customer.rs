use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Network a customer number belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomerNumberProvider {
    Facebook,
    Cellular,
    Telegram,
    App,
    Email,
}

impl CustomerNumberProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Cellular => "cellular",
            Self::Telegram => "telegram",
            Self::App => "app",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for CustomerNumberProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A number (phone, handle, address) through which a customer is reached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomerNumber {
    pub number: String,
    pub provider: CustomerNumberProvider,
    pub partition: Option<String>,
}

impl CustomerNumber {
    #[must_use]
    pub fn new(number: impl Into<String>, provider: CustomerNumberProvider) -> Self {
        Self {
            number: number.into(),
            provider,
            partition: None,
        }
    }

    #[must_use]
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }
}

/// How a customer is identified on the wire: by platform id or by number.
///
/// An id takes priority whenever both are known.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CustomerRef {
    Id(String),
    Number(CustomerNumber),
}

impl CustomerRef {
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id),
            Self::Number(_) => None,
        }
    }

    #[must_use]
    pub fn number(&self) -> Option<&CustomerNumber> {
        match self {
            Self::Id(_) => None,
            Self::Number(number) => Some(number),
        }
    }
}

impl From<CustomerNumber> for CustomerRef {
    fn from(number: CustomerNumber) -> Self {
        Self::Number(number)
    }
}

impl fmt::Display for CustomerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id:{id}"),
            Self::Number(n) => write!(f, "{}:{}", n.provider, n.number),
        }
    }
}

/// Key/value label attached to customers; also used to address groups of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: String,
    pub value: Option<String>,
}

impl Tag {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// A tag or secondary id stored on a customer, optionally expiring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerTag {
    pub tag: Tag,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Tag> for CustomerTag {
    fn from(tag: Tag) -> Self {
        Self {
            tag,
            expires_at: None,
        }
    }
}

/// A scheduled callback delivered back as a reminder notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub key: String,
    pub expiration: DateTime<Utc>,
    /// Repeat period; `None` fires once.
    pub interval: Option<Duration>,
    pub payload: String,
}

impl Reminder {
    #[must_use]
    pub fn new(key: impl Into<String>, expiration: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            expiration,
            interval: None,
            payload: String::new(),
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }
}

/// Opaque value stored in customer metadata or app data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl DataValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Bytes(_) => None,
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for DataValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Snapshot of a customer as returned by `get_customer_state`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomerState {
    pub customer_id: String,
    pub numbers: Vec<CustomerNumber>,
    pub tags: Vec<CustomerTag>,
    pub secondary_ids: Vec<CustomerTag>,
    pub reminders: Vec<Reminder>,
    pub metadata: HashMap<String, DataValue>,
    pub created_at: Option<DateTime<Utc>>,
}
