use async_trait::async_trait;
use batch_distributor_types::{Address, Batch, RevertReason, SettlementResult};
use cosmwasm_std::Uint128;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A call the orchestrator asks the provider to execute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettlementCall {
    /// Native batch; the funding travels as the context's `value`
    DistributeNative { batch: Batch },
    /// Token batch spent through the sender's allowance
    DistributeAsset { asset: Address, batch: Batch },
    /// Allowance change on the token contract itself
    Approve {
        asset: Address,
        spender: Address,
        amount: Uint128,
    },
}

impl SettlementCall {
    pub fn kind(&self) -> &'static str {
        match self {
            SettlementCall::DistributeNative { .. } => "distribute_native",
            SettlementCall::DistributeAsset { .. } => "distribute_asset",
            SettlementCall::Approve { .. } => "approve",
        }
    }

    /// Line items carried by the call, zero for approvals
    pub fn item_count(&self) -> usize {
        match self {
            SettlementCall::DistributeNative { batch, .. }
            | SettlementCall::DistributeAsset { batch, .. } => batch.len(),
            SettlementCall::Approve { .. } => 0,
        }
    }
}

/// Who sends the call, where it goes and what value it carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub from: Address,
    pub to: Address,
    pub value: Uint128,
}

/// Resource limits attached to a submitted call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxLimits {
    pub cost_limit: u64,
    pub price: Uint128,
}

/// Confirmed outcome of a submitted call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: String,
    pub success: bool,
    pub cost_used: u64,
    pub revert_reason: Option<RevertReason>,
    /// Settlement output, present for settled distribution calls
    pub result: Option<SettlementResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("confirmation failed: {0}")]
    Confirmation(String),

    #[error("unknown account: {0}")]
    UnknownAccount(Address),

    #[error("unknown asset: {0}")]
    UnknownAsset(Address),

    #[error("no settlement engine deployed on network {network_id}")]
    NoDeployment { network_id: u64 },

    #[error("call encoding failed: {0}")]
    Encoding(String),
}

/// Connection to the chain hosting the settlement engine.
///
/// `submit` only returns once the call is confirmed; a reverted call is a
/// successful submission with `Receipt::success == false`.
#[async_trait]
pub trait ValueTransferProvider: Send + Sync {
    async fn network_id(&self) -> Result<u64, ProviderError>;

    /// Accounts controlled by the connected signer, first one is the default
    async fn get_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    async fn estimate_cost(
        &self,
        call: &SettlementCall,
        context: &CallContext,
    ) -> Result<u64, ProviderError>;

    async fn get_current_price(&self) -> Result<Uint128, ProviderError>;

    async fn submit(
        &self,
        call: &SettlementCall,
        context: &CallContext,
        limits: &TxLimits,
    ) -> Result<Receipt, ProviderError>;

    async fn read_allowance(
        &self,
        owner: &Address,
        spender: &Address,
        asset: &Address,
    ) -> Result<Uint128, ProviderError>;

    /// Decimal places of a token
    async fn read_unit_exponent(&self, asset: &Address) -> Result<u32, ProviderError>;

    fn is_well_formed_address(&self, value: &str) -> bool {
        Address::parse(value).is_ok()
    }
}
