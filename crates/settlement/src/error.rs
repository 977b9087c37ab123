use batch_distributor_types::{Address, RevertReason};
use cosmwasm_std::Uint128;
use thiserror::Error;

use crate::LedgerError;

/// Terminal failures of a settlement call. Every variant means the call was
/// reverted and no balance changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("InsufficientFunding: required {required}, provided {provided}")]
    InsufficientFunding { required: Uint128, provided: Uint128 },

    #[error("InsufficientAuthorization: required {required}, allowance {allowance}")]
    InsufficientAuthorization {
        required: Uint128,
        allowance: Uint128,
    },

    #[error("EtherTransferFail: item {index} to {recipient}")]
    EtherTransferFail { index: usize, recipient: Address },

    #[error("TransferRejected: item {index} to {recipient}: {reason}")]
    TransferRejected {
        index: usize,
        recipient: Address,
        reason: String,
    },

    #[error("InsufficientBalance: required {required}, available {available}")]
    InsufficientBalance {
        required: Uint128,
        available: Uint128,
    },

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl SettlementError {
    /// Wire form carried by receipts
    pub fn reason(&self) -> RevertReason {
        match self {
            SettlementError::InsufficientFunding { required, provided } => {
                RevertReason::InsufficientFunding {
                    required: *required,
                    provided: *provided,
                }
            }
            SettlementError::InsufficientAuthorization {
                required,
                allowance,
            } => RevertReason::InsufficientAuthorization {
                required: *required,
                allowance: *allowance,
            },
            SettlementError::EtherTransferFail { index, recipient } => {
                RevertReason::EtherTransferFail {
                    index: *index,
                    recipient: recipient.clone(),
                }
            }
            SettlementError::TransferRejected {
                index, recipient, ..
            } => RevertReason::TransferRejected {
                index: *index,
                recipient: recipient.clone(),
            },
            SettlementError::InsufficientBalance {
                required,
                available,
            } => RevertReason::InsufficientBalance {
                required: *required,
                available: *available,
            },
            SettlementError::Ledger(LedgerError::Overflow) => RevertReason::Overflow,
            SettlementError::Ledger(e) => RevertReason::Other {
                message: e.to_string(),
            },
        }
    }
}
