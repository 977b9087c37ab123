//! Simulated chain provider
//!
//! Hosts a [`SettlementEngine`] over an [`InMemoryLedger`], giving fast,
//! deterministic behavior for tests and local runs. Execution cost is a
//! fixed per-call model and is checked against the submitted cost limit;
//! no fees are charged.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use batch_distributor_settlement::{
    InMemoryLedger, Ledger, LedgerError, SettlementEngine, TokenBehavior,
};
use batch_distributor_types::{Address, RevertReason, SettlementResult};
use chrono::{DateTime, Utc};
use cosmwasm_std::Uint128;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::{CallContext, ProviderError, Receipt, SettlementCall, TxLimits, ValueTransferProvider};

/// Network id reported by a default simulated provider
pub const SIMULATED_NETWORK_ID: u64 = 1337;

/// Deterministic execution cost of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostModel {
    /// Fixed cost of any call
    pub base: u64,
    /// Added per line item of a distribution
    pub per_item: u64,
    /// Cost of an allowance change
    pub approve: u64,
    /// Executed cost above the estimate, for exercising the estimate buffer
    pub execution_overhead: u64,
}

impl CostModel {
    pub fn estimate(&self, call: &SettlementCall) -> u64 {
        match call {
            SettlementCall::Approve { .. } => self.approve,
            _ => self
                .base
                .saturating_add(self.per_item.saturating_mul(call.item_count() as u64)),
        }
    }

    pub fn execution_cost(&self, call: &SettlementCall) -> u64 {
        self.estimate(call).saturating_add(self.execution_overhead)
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            base: 21_000,
            per_item: 9_000,
            approve: 46_000,
            execution_overhead: 0,
        }
    }
}

/// One confirmed simulated transaction
#[derive(Debug, Clone)]
pub struct TxRecord {
    pub tx_hash: String,
    pub kind: &'static str,
    pub from: Address,
    pub to: Address,
    pub value: Uint128,
    pub success: bool,
    pub cost_used: u64,
    pub confirmed_at: DateTime<Utc>,
}

/// In-memory chain implementing [`ValueTransferProvider`]
pub struct SimulatedProvider {
    network_id: u64,
    engine: SettlementEngine,
    ledger: Arc<Mutex<InMemoryLedger>>,
    accounts: Arc<RwLock<Vec<Address>>>,
    tx_log: Arc<RwLock<Vec<TxRecord>>>,
    price: Uint128,
    cost_model: CostModel,
    nonce: AtomicU64,
}

impl SimulatedProvider {
    /// Create a provider with the engine deployed at its default address
    pub fn new() -> Self {
        Self {
            network_id: SIMULATED_NETWORK_ID,
            engine: SettlementEngine::new(Self::default_engine_address()),
            ledger: Arc::new(Mutex::new(InMemoryLedger::new())),
            accounts: Arc::new(RwLock::new(Vec::new())),
            tx_log: Arc::new(RwLock::new(Vec::new())),
            price: Uint128::new(1_000_000_000),
            cost_model: CostModel::default(),
            nonce: AtomicU64::new(0),
        }
    }

    pub fn default_engine_address() -> Address {
        Address::from_label("batch-distributor")
    }

    pub fn with_network_id(mut self, network_id: u64) -> Self {
        self.network_id = network_id;
        self
    }

    pub fn with_engine_address(mut self, address: Address) -> Self {
        self.engine = SettlementEngine::new(address);
        self
    }

    pub fn with_price(mut self, price: Uint128) -> Self {
        self.price = price;
        self
    }

    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    pub fn engine_address(&self) -> &Address {
        self.engine.address()
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CHAIN SETUP
    // ═══════════════════════════════════════════════════════════════════════════

    /// Register a signer account holding `native_balance`
    pub async fn add_account(
        &self,
        account: &Address,
        native_balance: Uint128,
    ) -> Result<(), LedgerError> {
        self.ledger.lock().await.fund_native(account, native_balance)?;
        let mut accounts = self.accounts.write().await;
        if !accounts.contains(account) {
            accounts.push(account.clone());
        }
        Ok(())
    }

    /// Mark an account as a contract that refuses native value
    pub async fn deploy_non_payable(&self, account: &Address) {
        self.ledger.lock().await.mark_non_payable(account);
    }

    pub async fn deploy_token(&self, asset: &Address, behavior: TokenBehavior, decimals: u32) {
        self.ledger
            .lock()
            .await
            .create_token(asset, behavior, decimals);
    }

    pub async fn mint(
        &self,
        asset: &Address,
        to: &Address,
        amount: Uint128,
    ) -> Result<(), LedgerError> {
        self.ledger.lock().await.mint(asset, to, amount)
    }

    /// Set an allowance directly, without a transaction
    pub async fn set_allowance(
        &self,
        asset: &Address,
        owner: &Address,
        spender: &Address,
        amount: Uint128,
    ) -> Result<(), LedgerError> {
        self.ledger
            .lock()
            .await
            .approve(asset, owner, spender, amount)
            .map(|_| ())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INSPECTION
    // ═══════════════════════════════════════════════════════════════════════════

    pub async fn native_balance(&self, account: &Address) -> Uint128 {
        self.ledger.lock().await.native_balance(account)
    }

    pub async fn token_balance(
        &self,
        asset: &Address,
        account: &Address,
    ) -> Result<Uint128, LedgerError> {
        self.ledger.lock().await.token_balance(asset, account)
    }

    pub async fn native_supply(&self) -> Uint128 {
        self.ledger.lock().await.native_supply()
    }

    pub async fn tx_log(&self) -> Vec<TxRecord> {
        self.tx_log.read().await.clone()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXECUTION
    // ═══════════════════════════════════════════════════════════════════════════

    fn next_tx_hash(
        &self,
        call: &SettlementCall,
        context: &CallContext,
    ) -> Result<String, ProviderError> {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let encoded =
            serde_json::to_vec(call).map_err(|e| ProviderError::Encoding(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        hasher.update(context.from.as_str().as_bytes());
        hasher.update(nonce.to_be_bytes());
        Ok(format!("0x{}", hex::encode(hasher.finalize())))
    }

    fn target_of(&self, call: &SettlementCall) -> Address {
        match call {
            SettlementCall::Approve { asset, .. } => asset.clone(),
            _ => self.engine.address().clone(),
        }
    }

    /// Run the call against the ledger. `Err` is a revert reason.
    fn execute(
        &self,
        ledger: &mut InMemoryLedger,
        call: &SettlementCall,
        context: &CallContext,
    ) -> Result<Option<SettlementResult>, RevertReason> {
        let target = self.target_of(call);
        if context.to != target {
            return Err(RevertReason::Other {
                message: format!("{} call sent to {}, expected {}", call.kind(), context.to, target),
            });
        }

        match call {
            SettlementCall::DistributeNative { batch } => self
                .engine
                .distribute_native(ledger, &context.from, batch, context.value)
                .map(Some)
                .map_err(|e| e.reason()),
            _ if !context.value.is_zero() => Err(RevertReason::Other {
                message: format!("{} does not accept native value", call.kind()),
            }),
            SettlementCall::DistributeAsset { asset, batch } => self
                .engine
                .distribute_asset(ledger, &context.from, asset, batch)
                .map(Some)
                .map_err(|e| e.reason()),
            SettlementCall::Approve {
                asset,
                spender,
                amount,
            } => match ledger.approve(asset, &context.from, spender, *amount) {
                Ok(true) => Ok(None),
                Ok(false) => Err(RevertReason::Other {
                    message: "approve returned false".to_string(),
                }),
                Err(e) => Err(RevertReason::Other {
                    message: e.to_string(),
                }),
            },
        }
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ValueTransferProvider for SimulatedProvider {
    async fn network_id(&self) -> Result<u64, ProviderError> {
        Ok(self.network_id)
    }

    async fn get_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(self.accounts.read().await.clone())
    }

    async fn estimate_cost(
        &self,
        call: &SettlementCall,
        _context: &CallContext,
    ) -> Result<u64, ProviderError> {
        Ok(self.cost_model.estimate(call))
    }

    async fn get_current_price(&self) -> Result<Uint128, ProviderError> {
        Ok(self.price)
    }

    async fn submit(
        &self,
        call: &SettlementCall,
        context: &CallContext,
        limits: &TxLimits,
    ) -> Result<Receipt, ProviderError> {
        if !self.accounts.read().await.contains(&context.from) {
            return Err(ProviderError::UnknownAccount(context.from.clone()));
        }

        let tx_hash = self.next_tx_hash(call, context)?;
        let required = self.cost_model.execution_cost(call);

        let (outcome, cost_used) = if required > limits.cost_limit {
            (
                Err(RevertReason::OutOfResources {
                    limit: limits.cost_limit,
                    required,
                }),
                limits.cost_limit,
            )
        } else {
            let mut ledger = self.ledger.lock().await;
            (self.execute(&mut ledger, call, context), required)
        };

        let receipt = match outcome {
            Ok(result) => Receipt {
                tx_hash: tx_hash.clone(),
                success: true,
                cost_used,
                revert_reason: None,
                result,
            },
            Err(reason) => Receipt {
                tx_hash: tx_hash.clone(),
                success: false,
                cost_used,
                revert_reason: Some(reason),
                result: None,
            },
        };

        self.tx_log.write().await.push(TxRecord {
            tx_hash: tx_hash.clone(),
            kind: call.kind(),
            from: context.from.clone(),
            to: context.to.clone(),
            value: context.value,
            success: receipt.success,
            cost_used,
            confirmed_at: Utc::now(),
        });

        if receipt.success {
            info!(tx_hash = %tx_hash, call = call.kind(), cost_used, "Simulated call confirmed");
        } else {
            debug!(
                tx_hash = %tx_hash,
                call = call.kind(),
                reason = ?receipt.revert_reason,
                "Simulated call reverted"
            );
        }

        Ok(receipt)
    }

    async fn read_allowance(
        &self,
        owner: &Address,
        spender: &Address,
        asset: &Address,
    ) -> Result<Uint128, ProviderError> {
        self.ledger
            .lock()
            .await
            .allowance(asset, owner, spender)
            .map_err(|_| ProviderError::UnknownAsset(asset.clone()))
    }

    async fn read_unit_exponent(&self, asset: &Address) -> Result<u32, ProviderError> {
        self.ledger
            .lock()
            .await
            .token_decimals(asset)
            .map_err(|_| ProviderError::UnknownAsset(asset.clone()))
    }
}
