use crate::convert::required;
use crate::error::ConversionError;
use crate::models::{Cash, PaymentChannel, PaymentChannelNumber, PaymentCounterParty, PaymentStatus};
use crate::proto;

impl From<PaymentChannel> for proto::PaymentChannel {
    fn from(channel: PaymentChannel) -> Self {
        match channel {
            PaymentChannel::Cellular => Self::Cellular,
            PaymentChannel::Airtime => Self::Airtime,
        }
    }
}

impl TryFrom<i32> for PaymentChannel {
    type Error = ConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match proto::PaymentChannel::try_from(value) {
            Ok(proto::PaymentChannel::Cellular) => Ok(Self::Cellular),
            Ok(proto::PaymentChannel::Airtime) => Ok(Self::Airtime),
            Ok(proto::PaymentChannel::Unspecified) | Err(_) => Err(ConversionError::UnknownEnum {
                enum_name: "PaymentChannel",
                value,
            }),
        }
    }
}

impl From<&PaymentChannelNumber> for proto::PaymentChannelNumber {
    fn from(number: &PaymentChannelNumber) -> Self {
        Self {
            channel: proto::PaymentChannel::from(number.channel).into(),
            number: number.number.clone(),
        }
    }
}

impl TryFrom<proto::PaymentChannelNumber> for PaymentChannelNumber {
    type Error = ConversionError;

    fn try_from(wire: proto::PaymentChannelNumber) -> Result<Self, Self::Error> {
        Ok(Self {
            channel: PaymentChannel::try_from(wire.channel)?,
            number: wire.number,
        })
    }
}

impl From<&Cash> for proto::Cash {
    fn from(cash: &Cash) -> Self {
        Self {
            currency_code: cash.currency_code.clone(),
            amount: cash.amount,
        }
    }
}

impl From<proto::Cash> for Cash {
    fn from(wire: proto::Cash) -> Self {
        Self {
            currency_code: wire.currency_code,
            amount: wire.amount,
        }
    }
}

impl From<&PaymentCounterParty> for proto::PaymentCounterParty {
    fn from(party: &PaymentCounterParty) -> Self {
        use proto::payment_counter_party::Party;

        let party = match party {
            PaymentCounterParty::Customer {
                customer_number,
                channel_number,
            } => Party::Customer(proto::PaymentCustomerCounterParty {
                customer_number: Some(customer_number.into()),
                channel_number: Some(channel_number.into()),
            }),
            PaymentCounterParty::Purse { purse_id } => {
                Party::Purse(proto::PaymentPurseCounterParty {
                    purse_id: purse_id.clone(),
                })
            }
            PaymentCounterParty::Wallet {
                customer_id,
                wallet_id,
            } => Party::Wallet(proto::PaymentWalletCounterParty {
                customer_id: customer_id.clone(),
                wallet_id: wallet_id.clone(),
            }),
            PaymentCounterParty::Channel {
                channel_number,
                account,
            } => Party::Channel(proto::PaymentChannelCounterParty {
                channel_number: Some(channel_number.into()),
                account: account.clone(),
            }),
        };
        Self { party: Some(party) }
    }
}

impl TryFrom<proto::PaymentCounterParty> for PaymentCounterParty {
    type Error = ConversionError;

    fn try_from(wire: proto::PaymentCounterParty) -> Result<Self, Self::Error> {
        use proto::payment_counter_party::Party;

        Ok(match required(wire.party, "PaymentCounterParty", "party")? {
            Party::Customer(c) => Self::Customer {
                customer_number: required(
                    c.customer_number,
                    "PaymentCustomerCounterParty",
                    "customer_number",
                )?
                .try_into()?,
                channel_number: required(
                    c.channel_number,
                    "PaymentCustomerCounterParty",
                    "channel_number",
                )?
                .try_into()?,
            },
            Party::Purse(p) => Self::Purse {
                purse_id: p.purse_id,
            },
            Party::Wallet(w) => Self::Wallet {
                customer_id: w.customer_id,
                wallet_id: w.wallet_id,
            },
            Party::Channel(c) => Self::Channel {
                channel_number: required(
                    c.channel_number,
                    "PaymentChannelCounterParty",
                    "channel_number",
                )?
                .try_into()?,
                account: c.account,
            },
        })
    }
}

impl From<i32> for PaymentStatus {
    fn from(value: i32) -> Self {
        use proto::PaymentStatus as Wire;

        match Wire::try_from(value) {
            Ok(Wire::Queued) => Self::Queued,
            Ok(Wire::PendingConfirmation) => Self::PendingConfirmation,
            Ok(Wire::PendingValidation) => Self::PendingValidation,
            Ok(Wire::Validated) => Self::Validated,
            Ok(Wire::InvalidRequest) => Self::InvalidRequest,
            Ok(Wire::NotSupported) => Self::NotSupported,
            Ok(Wire::InsufficientFunds) => Self::InsufficientFunds,
            Ok(Wire::ApplicationError) => Self::ApplicationError,
            Ok(Wire::NotAllowed) => Self::NotAllowed,
            Ok(Wire::DuplicateRequest) => Self::DuplicateRequest,
            Ok(Wire::InvalidPurse) => Self::InvalidPurse,
            Ok(Wire::InvalidWallet) => Self::InvalidWallet,
            Ok(Wire::DecommissionedCustomerId) => Self::DecommissionedCustomerId,
            Ok(Wire::Success) => Self::Success,
            Ok(Wire::PassThrough) => Self::PassThrough,
            Ok(Wire::Failed) => Self::Failed,
            Ok(Wire::Throttled) => Self::Throttled,
            Ok(Wire::Expired) => Self::Expired,
            Ok(Wire::Rejected) => Self::Rejected,
            Ok(Wire::Reversed) => Self::Reversed,
            Ok(Wire::Unspecified) | Err(_) => Self::Unknown,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::models::{CustomerNumber, CustomerNumberProvider};

    #[test]
    #[allow(clippy::float_cmp)]
    fn cash_is_not_rounded() {
        let cash = Cash::from(proto::Cash {
            currency_code: "KES".to_owned(),
            amount: 100.00,
        });
        assert_eq!(cash.amount, 100.00);
        assert_eq!(cash.currency_code, "KES");

        let back = proto::Cash::from(&Cash::new("USD", 0.1 + 0.2));
        assert_eq!(back.amount, 0.1 + 0.2);
    }

    #[test]
    fn customer_counter_party_round_trip() {
        let party = PaymentCounterParty::Customer {
            customer_number: CustomerNumber::new("+254700000001", CustomerNumberProvider::Cellular),
            channel_number: PaymentChannelNumber::new(PaymentChannel::Cellular, "525900"),
        };
        let back = PaymentCounterParty::try_from(proto::PaymentCounterParty::from(&party)).unwrap();
        assert_eq!(back, party);
    }

    #[test]
    fn customer_counter_party_without_channel_is_rejected() {
        let wire = proto::PaymentCounterParty {
            party: Some(proto::payment_counter_party::Party::Customer(
                proto::PaymentCustomerCounterParty {
                    customer_number: Some(proto::CustomerNumber {
                        provider: proto::CustomerNumberProvider::Cellular.into(),
                        number: "1".to_owned(),
                        partition: None,
                    }),
                    channel_number: None,
                },
            )),
        };
        assert!(matches!(
            PaymentCounterParty::try_from(wire),
            Err(ConversionError::MissingField {
                field: "channel_number",
                ..
            })
        ));
    }

    #[test]
    fn status_mapping_tolerates_unknown_values() {
        assert_eq!(PaymentStatus::from(100), PaymentStatus::Success);
        assert_eq!(PaymentStatus::from(300), PaymentStatus::Reversed);
        assert_eq!(PaymentStatus::from(-7), PaymentStatus::Unknown);
        assert!(!PaymentStatus::Queued.is_final());
        assert!(PaymentStatus::Failed.is_final());
    }
}
