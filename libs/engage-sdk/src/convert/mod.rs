//! Conversions between the domain model and the generated wire types.
//!
//! Domain to wire is infallible (`From<&T>`). Wire to domain is fallible
//! (`TryFrom<proto::T>`) because required nested messages may be absent and
//! enum fields may carry values this SDK does not know.
//!
//! Wrapped scalars (`google.protobuf.*Value`) are already `Option<T>` in the
//! generated code and are passed through unchanged, so an unset wrapper stays
//! `None` in both directions.

mod common;
mod messaging;
mod notification;
mod payment;
mod replies;
mod voice;

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::ConversionError;

pub(crate) use common::{customer_number_from_wire, data_value_from_wire};
pub(crate) use replies::accepted;

/// Unwrap a required nested message.
pub(crate) fn required<T>(
    value: Option<T>,
    kind: &'static str,
    field: &'static str,
) -> Result<T, ConversionError> {
    value.ok_or_else(|| ConversionError::missing(kind, field))
}

pub(crate) fn timestamp_to_datetime(
    ts: &prost_types::Timestamp,
    field: &'static str,
) -> Result<DateTime<Utc>, ConversionError> {
    let nanos = u32::try_from(ts.nanos).map_err(|_| ConversionError::InvalidTimestamp {
        field,
        reason: format!("negative nanos {}", ts.nanos),
    })?;
    DateTime::from_timestamp(ts.seconds, nanos).ok_or_else(|| ConversionError::InvalidTimestamp {
        field,
        reason: format!("{}s is out of range", ts.seconds),
    })
}

pub(crate) fn optional_datetime(
    ts: Option<prost_types::Timestamp>,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, ConversionError> {
    ts.as_ref()
        .map(|ts| timestamp_to_datetime(ts, field))
        .transpose()
}

pub(crate) fn datetime_to_timestamp(dt: &DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: dt.timestamp(),
        // subsec nanos stay below 2e9 even on leap seconds
        nanos: i32::try_from(dt.timestamp_subsec_nanos()).unwrap_or(i32::MAX),
    }
}

pub(crate) fn optional_duration(
    duration: Option<prost_types::Duration>,
    field: &'static str,
) -> Result<Option<Duration>, ConversionError> {
    duration
        .map(|d| {
            Duration::try_from(d).map_err(|e| ConversionError::InvalidDuration {
                field,
                reason: e.to_string(),
            })
        })
        .transpose()
}

pub(crate) fn duration_to_wire(duration: Duration) -> prost_types::Duration {
    prost_types::Duration {
        seconds: i64::try_from(duration.as_secs()).unwrap_or(i64::MAX),
        nanos: i32::try_from(duration.subsec_nanos()).unwrap_or(0),
    }
}
