use crate::models::CustomerNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentChannel {
    Cellular,
    Airtime,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaymentChannelNumber {
    pub channel: PaymentChannel,
    pub number: String,
}

impl PaymentChannelNumber {
    #[must_use]
    pub fn new(channel: PaymentChannel, number: impl Into<String>) -> Self {
        Self {
            channel,
            number: number.into(),
        }
    }
}

/// Monetary amount in a given currency.
///
/// The amount travels as an IEEE double and is never rounded by the SDK.
#[derive(Debug, Clone, PartialEq)]
pub struct Cash {
    pub currency_code: String,
    pub amount: f64,
}

impl Cash {
    #[must_use]
    pub fn new(currency_code: impl Into<String>, amount: f64) -> Self {
        Self {
            currency_code: currency_code.into(),
            amount,
        }
    }
}

/// Source or destination of a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentCounterParty {
    Customer {
        customer_number: CustomerNumber,
        channel_number: PaymentChannelNumber,
    },
    Purse {
        purse_id: String,
    },
    Wallet {
        customer_id: String,
        wallet_id: String,
    },
    Channel {
        channel_number: PaymentChannelNumber,
        account: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Queued,
    PendingConfirmation,
    PendingValidation,
    Validated,
    InvalidRequest,
    NotSupported,
    InsufficientFunds,
    ApplicationError,
    NotAllowed,
    DuplicateRequest,
    InvalidPurse,
    InvalidWallet,
    DecommissionedCustomerId,
    Success,
    PassThrough,
    Failed,
    Throttled,
    Expired,
    Rejected,
    Reversed,
    Unknown,
}

impl PaymentStatus {
    /// No further status notifications follow for this transaction.
    #[must_use]
    pub fn is_final(self) -> bool {
        !matches!(
            self,
            Self::Queued | Self::PendingConfirmation | Self::PendingValidation | Self::Validated
        )
    }
}
