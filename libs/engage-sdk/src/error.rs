//! Error types for the Engage SDK.
//!
//! - [`SdkError`]: returned by unary calls and service lifecycle operations
//! - [`ConversionError`]: a wire value could not be turned into a domain value
//! - [`StreamError`]: items of the notification stream's error channel

use thiserror::Error;
use tonic::Code;

/// Error type for Engage operations.
#[derive(Error, Debug)]
pub enum SdkError {
    /// The channel could not be established or the call did not complete.
    #[error("transport error: {0}")]
    Transport(String),

    /// Credentials were missing or refused.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Rejected locally or by the platform's request validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Any other status returned by the platform.
    #[error("remote error ({code:?}): {message}")]
    Remote { code: Code, message: String },

    /// The call completed but the reply carried `status = false`.
    #[error("request rejected: {description}")]
    Rejected { description: String },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("notification stream is not running")]
    NotStarted,

    #[error("notification stream is already running")]
    AlreadyStarted,
}

impl SdkError {
    /// Whether retrying the same call could succeed without changes.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<tonic::Status> for SdkError {
    fn from(status: tonic::Status) -> Self {
        let message = status.message().to_owned();
        match status.code() {
            Code::Unauthenticated | Code::PermissionDenied => Self::Unauthorized(message),
            Code::NotFound => Self::NotFound(message),
            Code::InvalidArgument | Code::FailedPrecondition | Code::OutOfRange => {
                Self::InvalidArgument(message)
            }
            Code::Unavailable | Code::DeadlineExceeded | Code::Cancelled => {
                Self::Transport(message)
            }
            code => Self::Remote { code, message },
        }
    }
}

/// A wire value that cannot be represented in the domain model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("{kind} is missing required field `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("unknown {enum_name} value {value}")]
    UnknownEnum { enum_name: &'static str, value: i32 },

    #[error("invalid timestamp in `{field}`: {reason}")]
    InvalidTimestamp { field: &'static str, reason: String },

    #[error("invalid duration in `{field}`: {reason}")]
    InvalidDuration { field: &'static str, reason: String },
}

impl ConversionError {
    pub(crate) fn missing(kind: &'static str, field: &'static str) -> Self {
        Self::MissingField { kind, field }
    }
}

/// Transport condition reported by the notification worker.
///
/// These never stop dispatch of frames already received; the consumer
/// decides whether to log, restart or shut the service down.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("failed to open notification stream: {0}")]
    Open(String),

    #[error("notification stream failed ({code:?}): {message}")]
    Transport { code: Code, message: String },

    #[error("notification stream closed by the server")]
    Ended,

    #[error("gave up reconnecting the notification stream after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },
}

impl From<tonic::Status> for StreamError {
    fn from(status: tonic::Status) -> Self {
        Self::Transport {
            code: status.code(),
            message: status.message().to_owned(),
        }
    }
}
