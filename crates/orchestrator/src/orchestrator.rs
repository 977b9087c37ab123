use std::sync::Arc;
use std::time::Instant;

use batch_distributor_metrics::{DistributionId, DistributionSpan, MetricsCollector};
use batch_distributor_types::{
    Address, AssetHandle, Batch, BatchError, RevertReason, SettlementResult,
    DEFAULT_MAX_BATCH_SIZE,
};
use cosmwasm_std::Uint128;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn, Instrument};

use crate::provider::{
    CallContext, ProviderError, Receipt, SettlementCall, TxLimits, ValueTransferProvider,
};
use crate::session::Session;
use crate::validator::BatchValidator;

/// Default native unit exponent (18 decimal places)
pub const DEFAULT_NATIVE_UNIT_EXPONENT: u32 = 18;

/// Configuration for the orchestrator
#[derive(Clone, Debug, PartialEq)]
pub struct OrchestratorConfig {
    /// Maximum line items per batch
    pub max_batch_size: usize,

    /// Factor applied to cost estimates, rounded up
    pub buffer_multiplier: Decimal,

    /// Decimal places of the native currency
    pub native_unit_exponent: u32,
}

impl OrchestratorConfig {
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn with_buffer_multiplier(mut self, buffer_multiplier: Decimal) -> Self {
        self.buffer_multiplier = buffer_multiplier;
        self
    }

    pub fn with_native_unit_exponent(mut self, native_unit_exponent: u32) -> Self {
        self.native_unit_exponent = native_unit_exponent;
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            buffer_multiplier: Decimal::new(12, 1), // 1.2
            native_unit_exponent: DEFAULT_NATIVE_UNIT_EXPONENT,
        }
    }
}

/// Per-request transaction settings replacing provider defaults
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxOverrides {
    /// Used instead of the provider's current price
    pub price_override: Option<Uint128>,
    /// Used instead of the buffered cost estimate
    pub limit_override: Option<u64>,
}

/// Distribution stage, for log correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionStage {
    Validating,
    Authorizing,
    Estimating,
    Submitting,
}

/// User-visible state of a distribution. There is no partial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionStatus {
    /// Batch validated, ready to submit
    Validated,
    /// Waiting for an allowance increase to confirm
    AuthorizationPending,
    /// Every line item moved
    Settled,
    /// Nothing moved
    Reverted,
}

/// Result of the authorization step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationStatus {
    /// Native value needs no allowance
    NotRequired,
    /// Existing allowance already covers the batch
    AlreadySufficient,
    /// An approval was submitted and confirmed
    Increased { tx_hash: String },
}

/// Raw caller input for one distribution
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionRequest {
    pub asset: AssetHandle,
    pub recipients: Vec<String>,
    /// Human decimal amounts, parallel to `recipients`
    pub amounts: Vec<String>,
    /// Token decimals; read from the token when absent
    pub unit_exponent: Option<u32>,
    pub overrides: TxOverrides,
}

impl DistributionRequest {
    pub fn native(recipients: Vec<String>, amounts: Vec<String>) -> Self {
        Self {
            asset: AssetHandle::Native,
            recipients,
            amounts,
            unit_exponent: None,
            overrides: TxOverrides::default(),
        }
    }

    pub fn token(asset: Address, recipients: Vec<String>, amounts: Vec<String>) -> Self {
        Self {
            asset: AssetHandle::Token(asset),
            recipients,
            amounts,
            unit_exponent: None,
            overrides: TxOverrides::default(),
        }
    }

    pub fn with_unit_exponent(mut self, unit_exponent: u32) -> Self {
        self.unit_exponent = Some(unit_exponent);
        self
    }

    pub fn with_overrides(mut self, overrides: TxOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Confirmed settlement of a submitted batch
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementReceipt {
    pub tx_hash: String,
    pub cost_used: u64,
    pub result: SettlementResult,
}

/// Final report of [`BatchOrchestrator::distribute`]
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionOutcome {
    pub distribution_id: DistributionId,
    /// `Settled` or `Reverted`
    pub status: DistributionStatus,
    pub sender: Address,
    pub asset: AssetHandle,
    pub total: Uint128,
    pub authorization: AuthorizationStatus,
    pub tx_hash: String,
    pub result: Option<SettlementResult>,
    pub revert_reason: Option<RevertReason>,
}

impl DistributionOutcome {
    pub fn is_settled(&self) -> bool {
        self.status == DistributionStatus::Settled
    }
}

/// Progress notification published to subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionEvent {
    pub distribution_id: DistributionId,
    pub status: DistributionStatus,
    pub total: Uint128,
    pub tx_hash: Option<String>,
    pub revert_reason: Option<RevertReason>,
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid batch: {0}")]
    Batch(#[from] BatchError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("distribution reverted in {tx_hash}: {reason}")]
    Reverted { reason: RevertReason, tx_hash: String },

    #[error("authorization failed in {tx_hash}: {reason}")]
    AuthorizationFailed { tx_hash: String, reason: String },

    #[error("no signer account available")]
    NoAccount,

    #[error("session closed")]
    SessionClosed,
}

/// Cost limit for `estimate`, scaled by `multiplier` and rounded up
pub fn buffered_limit(estimate: u64, multiplier: Decimal) -> u64 {
    Decimal::from(estimate)
        .checked_mul(multiplier)
        .and_then(|limit| limit.ceil().to_u64())
        .unwrap_or(u64::MAX)
}

/// Turns caller requests into settled or reverted distributions
pub struct BatchOrchestrator<P: ValueTransferProvider> {
    session: Session<P>,
    config: OrchestratorConfig,
    validator: BatchValidator,
    metrics: Option<Arc<MetricsCollector>>,
    event_tx: broadcast::Sender<DistributionEvent>,
}

impl<P: ValueTransferProvider> BatchOrchestrator<P> {
    pub fn new(session: Session<P>, config: OrchestratorConfig) -> Result<Self, OrchestratorError> {
        let validator = BatchValidator::new(config.max_batch_size)?;
        let (event_tx, _) = broadcast::channel(256);

        Ok(Self {
            session,
            config,
            validator,
            metrics: None,
            event_tx,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn session(&self) -> &Session<P> {
        &self.session
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DistributionEvent> {
        self.event_tx.subscribe()
    }

    /// Change the batch size limit for subsequent requests
    pub fn set_max_batch_size(&mut self, max_batch_size: usize) -> Result<(), OrchestratorError> {
        self.validator.set_max_batch_size(max_batch_size)?;
        self.config.max_batch_size = max_batch_size;
        info!(max_batch_size, "Max batch size updated");
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PIPELINE STEPS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn build_batch(
        &self,
        raw_recipients: &[String],
        raw_amounts: &[String],
        unit_exponent: u32,
    ) -> Result<Batch, OrchestratorError> {
        let provider = self.session.provider()?;
        Ok(self
            .validator
            .build_batch(provider, raw_recipients, raw_amounts, unit_exponent)?)
    }

    /// Make sure the engine may spend `required_total` of `sender`'s asset.
    ///
    /// Idempotent: nothing is submitted while the allowance already covers
    /// the total.
    pub async fn ensure_authorization(
        &self,
        asset: &AssetHandle,
        sender: &Address,
        required_total: Uint128,
        overrides: &TxOverrides,
    ) -> Result<AuthorizationStatus, OrchestratorError> {
        let AssetHandle::Token(token) = asset else {
            return Ok(AuthorizationStatus::NotRequired);
        };

        let provider = self.session.provider()?;
        let engine = self.session.engine_address();

        let allowance = provider.read_allowance(sender, engine, token).await?;
        if allowance >= required_total {
            debug!(
                asset = %token,
                allowance = %allowance,
                required = %required_total,
                "Allowance already sufficient"
            );
            return Ok(AuthorizationStatus::AlreadySufficient);
        }

        info!(
            stage = ?DistributionStage::Authorizing,
            asset = %token,
            allowance = %allowance,
            required = %required_total,
            "Increasing allowance"
        );

        let call = SettlementCall::Approve {
            asset: token.clone(),
            spender: engine.clone(),
            amount: required_total,
        };
        let context = CallContext {
            from: sender.clone(),
            to: token.clone(),
            value: Uint128::zero(),
        };
        let limits = self.estimate_and_buffer(&call, &context, overrides).await?;
        let receipt = provider.submit(&call, &context, &limits).await?;

        if !receipt.success {
            let reason = receipt
                .revert_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "approval reverted".to_string());
            warn!(tx_hash = %receipt.tx_hash, reason = %reason, "Allowance increase failed");
            return Err(OrchestratorError::AuthorizationFailed {
                tx_hash: receipt.tx_hash,
                reason,
            });
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_authorization_increase();
        }
        info!(tx_hash = %receipt.tx_hash, "Allowance increase confirmed");

        Ok(AuthorizationStatus::Increased {
            tx_hash: receipt.tx_hash,
        })
    }

    /// Price and buffered cost limit for a call
    pub async fn estimate_and_buffer(
        &self,
        call: &SettlementCall,
        context: &CallContext,
        overrides: &TxOverrides,
    ) -> Result<TxLimits, OrchestratorError> {
        let provider = self.session.provider()?;

        let cost_limit = match overrides.limit_override {
            Some(limit) => limit,
            None => {
                let estimate = provider.estimate_cost(call, context).await?;
                buffered_limit(estimate, self.config.buffer_multiplier)
            }
        };

        let price = match overrides.price_override {
            Some(price) => price,
            None => provider.get_current_price().await?,
        };

        debug!(
            stage = ?DistributionStage::Estimating,
            call = call.kind(),
            cost_limit,
            price = %price,
            "Transaction limits resolved"
        );

        Ok(TxLimits { cost_limit, price })
    }

    /// Submit a validated batch and wait for its receipt.
    ///
    /// Native batches attach exactly the batch total. A reverted receipt
    /// becomes [`OrchestratorError::Reverted`].
    pub async fn submit(
        &self,
        batch: &Batch,
        asset: &AssetHandle,
        sender: &Address,
        overrides: &TxOverrides,
    ) -> Result<SettlementReceipt, OrchestratorError> {
        let provider = self.session.provider()?;

        let (call, value) = match asset {
            AssetHandle::Native => (
                SettlementCall::DistributeNative {
                    batch: batch.clone(),
                },
                batch.total(),
            ),
            AssetHandle::Token(token) => (
                SettlementCall::DistributeAsset {
                    asset: token.clone(),
                    batch: batch.clone(),
                },
                Uint128::zero(),
            ),
        };
        let context = CallContext {
            from: sender.clone(),
            to: self.session.engine_address().clone(),
            value,
        };

        let limits = self.estimate_and_buffer(&call, &context, overrides).await?;

        info!(
            stage = ?DistributionStage::Submitting,
            call = call.kind(),
            recipients = batch.len(),
            total = %batch.total(),
            cost_limit = limits.cost_limit,
            "Submitting distribution"
        );

        let Receipt {
            tx_hash,
            success,
            cost_used,
            revert_reason,
            result,
        } = provider.submit(&call, &context, &limits).await?;

        if !success {
            let reason = revert_reason.unwrap_or_else(|| RevertReason::Other {
                message: "reverted without reason".to_string(),
            });
            warn!(tx_hash = %tx_hash, reason = %reason, "Distribution reverted");
            return Err(OrchestratorError::Reverted { reason, tx_hash });
        }

        let result = result.ok_or_else(|| {
            ProviderError::Confirmation(format!("receipt {tx_hash} carries no settlement result"))
        })?;

        info!(
            tx_hash = %tx_hash,
            moved_total = %result.moved_total,
            refunded = %result.refunded,
            cost_used,
            "Distribution confirmed"
        );

        Ok(SettlementReceipt {
            tx_hash,
            cost_used,
            result,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FULL FLOW
    // ═══════════════════════════════════════════════════════════════════════════

    /// Validate, authorize and submit one distribution.
    ///
    /// Input errors surface as `Err` before anything is submitted. Once the
    /// settlement call is submitted the outcome is either `Settled` or
    /// `Reverted`; provider failures still propagate as `Err`.
    pub async fn distribute(
        &self,
        request: DistributionRequest,
    ) -> Result<DistributionOutcome, OrchestratorError> {
        let span = DistributionSpan::new(request.asset.label(), request.recipients.len());
        let distribution_id = span.distribution_id;
        self.run_distribution(distribution_id, request)
            .instrument(span.span())
            .await
    }

    async fn run_distribution(
        &self,
        distribution_id: DistributionId,
        request: DistributionRequest,
    ) -> Result<DistributionOutcome, OrchestratorError> {
        let DistributionRequest {
            asset,
            recipients,
            amounts,
            unit_exponent,
            overrides,
        } = request;

        // 1. Validate
        info!(stage = ?DistributionStage::Validating, "Validating distribution");
        let provider = self.session.provider()?;
        self.validator.check_inputs(provider, &recipients, &amounts)?;

        let unit_exponent = match (&asset, unit_exponent) {
            (AssetHandle::Native, _) => self.config.native_unit_exponent,
            (AssetHandle::Token(_), Some(exponent)) => exponent,
            (AssetHandle::Token(token), None) => provider.read_unit_exponent(token).await?,
        };

        let batch = self.build_batch(&recipients, &amounts, unit_exponent)?;
        let total = batch.total();
        self.emit(distribution_id, DistributionStatus::Validated, total, None, None);

        let sender = self.session.current_account().await?;

        // 2. Authorize
        if let AssetHandle::Token(token) = &asset {
            debug!(asset = %token, required = %total, "Authorization pending");
            self.emit(
                distribution_id,
                DistributionStatus::AuthorizationPending,
                total,
                None,
                None,
            );
        }
        let authorization = self
            .ensure_authorization(&asset, &sender, total, &overrides)
            .await?;

        // 3. Submit
        if let Some(metrics) = &self.metrics {
            metrics.record_distribution_started(batch.len());
        }
        let started = Instant::now();

        match self.submit(&batch, &asset, &sender, &overrides).await {
            Ok(settled) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_distribution_settled(batch.len(), started.elapsed());
                }
                self.emit(
                    distribution_id,
                    DistributionStatus::Settled,
                    total,
                    Some(settled.tx_hash.clone()),
                    None,
                );

                Ok(DistributionOutcome {
                    distribution_id,
                    status: DistributionStatus::Settled,
                    sender,
                    asset,
                    total,
                    authorization,
                    tx_hash: settled.tx_hash,
                    result: Some(settled.result),
                    revert_reason: None,
                })
            }
            Err(OrchestratorError::Reverted { reason, tx_hash }) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_distribution_reverted(&reason, started.elapsed());
                }
                self.emit(
                    distribution_id,
                    DistributionStatus::Reverted,
                    total,
                    Some(tx_hash.clone()),
                    Some(reason.clone()),
                );

                Ok(DistributionOutcome {
                    distribution_id,
                    status: DistributionStatus::Reverted,
                    sender,
                    asset,
                    total,
                    authorization,
                    tx_hash,
                    result: None,
                    revert_reason: Some(reason),
                })
            }
            Err(e) => Err(e),
        }
    }

    fn emit(
        &self,
        distribution_id: DistributionId,
        status: DistributionStatus,
        total: Uint128,
        tx_hash: Option<String>,
        revert_reason: Option<RevertReason>,
    ) {
        let _ = self.event_tx.send(DistributionEvent {
            distribution_id,
            status,
            total,
            tx_hash,
            revert_reason,
        });
    }
}
