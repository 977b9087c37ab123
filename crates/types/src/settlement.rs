use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;

use crate::Address;

/// Lifecycle of a single settlement call
#[cw_serde]
#[derive(Copy, Eq)]
pub enum CallState {
    /// Funding (native) or authorization (asset) checked
    Funded,
    /// Line items being moved
    Distributing,
    /// Every line item moved, unused funding refunded
    Settled,
    /// Nothing moved
    Reverted,
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Settled | CallState::Reverted)
    }
}

#[cw_serde]
#[derive(Copy, Eq)]
pub enum TransferOutcome {
    Transferred,
    Failed,
}

/// Per-recipient line of a settlement result, in batch order
#[cw_serde]
pub struct RecipientOutcome {
    pub recipient: Address,
    pub amount: Uint128,
    pub outcome: TransferOutcome,
}

/// Output of a settled call. Immutable once returned and never persisted by
/// the engine; reverted calls produce a [`RevertReason`] instead.
#[cw_serde]
pub struct SettlementResult {
    pub success: bool,
    pub moved_total: Uint128,
    /// Unused native funding returned to the sender, zero for token batches
    pub refunded: Uint128,
    pub outcomes: Vec<RecipientOutcome>,
}

impl SettlementResult {
    pub fn transferred_total(&self) -> Uint128 {
        self.outcomes
            .iter()
            .filter(|o| o.outcome == TransferOutcome::Transferred)
            .map(|o| o.amount)
            .sum()
    }
}

/// Terminal failure kinds surfaced for a reverted call
#[cw_serde]
#[derive(Eq)]
pub enum RevertReason {
    /// Attached native value is below the batch total
    InsufficientFunding { required: Uint128, provided: Uint128 },

    /// Allowance towards the engine is below the batch total
    InsufficientAuthorization { required: Uint128, allowance: Uint128 },

    /// A recipient could not accept native value
    EtherTransferFail { index: usize, recipient: Address },

    /// The token raised or returned false for a transfer
    TransferRejected { index: usize, recipient: Address },

    /// The sender cannot cover the attached value
    InsufficientBalance { required: Uint128, available: Uint128 },

    /// Arithmetic overflow while moving value
    Overflow,

    /// Execution exceeded the supplied cost limit
    OutOfResources { limit: u64, required: u64 },

    /// Any other execution failure
    Other { message: String },
}

impl RevertReason {
    /// Short stable name, used in logs and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            RevertReason::InsufficientFunding { .. } => "insufficient_funding",
            RevertReason::InsufficientAuthorization { .. } => "insufficient_authorization",
            RevertReason::EtherTransferFail { .. } => "ether_transfer_fail",
            RevertReason::TransferRejected { .. } => "transfer_rejected",
            RevertReason::InsufficientBalance { .. } => "insufficient_balance",
            RevertReason::Overflow => "overflow",
            RevertReason::OutOfResources { .. } => "out_of_resources",
            RevertReason::Other { .. } => "other",
        }
    }
}

impl std::fmt::Display for RevertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevertReason::InsufficientFunding { required, provided } => write!(
                f,
                "InsufficientFunding: required {required}, provided {provided}"
            ),
            RevertReason::InsufficientAuthorization {
                required,
                allowance,
            } => write!(
                f,
                "InsufficientAuthorization: required {required}, allowance {allowance}"
            ),
            RevertReason::EtherTransferFail { index, recipient } => {
                write!(f, "EtherTransferFail: item {index} to {recipient}")
            }
            RevertReason::TransferRejected { index, recipient } => {
                write!(f, "TransferRejected: item {index} to {recipient}")
            }
            RevertReason::InsufficientBalance {
                required,
                available,
            } => write!(
                f,
                "InsufficientBalance: required {required}, available {available}"
            ),
            RevertReason::Overflow => write!(f, "Overflow"),
            RevertReason::OutOfResources { limit, required } => {
                write!(f, "OutOfResources: limit {limit}, required {required}")
            }
            RevertReason::Other { message } => write!(f, "{message}"),
        }
    }
}
