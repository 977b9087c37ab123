use batch_distributor_types::{
    Address, Batch, CallState, RecipientOutcome, SettlementResult, TransferOutcome,
};
use cosmwasm_std::Uint128;
use tracing::{debug, info, warn};

use crate::{Ledger, LedgerError, SettlementError};

/// Tracks one settlement call through `Funded → Distributing → {Settled, Reverted}`
#[derive(Debug)]
pub(crate) struct Call {
    kind: &'static str,
    state: CallState,
}

impl Call {
    pub(crate) fn open(kind: &'static str) -> Self {
        Self {
            kind,
            state: CallState::Funded,
        }
    }

    pub(crate) fn state(&self) -> CallState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: CallState) {
        debug_assert!(
            is_valid_transition(self.state, next),
            "invalid call transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(call = self.kind, from = ?self.state, to = ?next, "Call state transition");
        self.state = next;
    }
}

pub(crate) fn is_valid_transition(from: CallState, to: CallState) -> bool {
    matches!(
        (from, to),
        (CallState::Funded, CallState::Distributing)
            | (CallState::Funded, CallState::Reverted)
            | (CallState::Distributing, CallState::Settled)
            | (CallState::Distributing, CallState::Reverted)
    )
}

/// Executes one batch per call against a [`Ledger`].
///
/// A call is globally settled or globally reverted: every balance change of
/// a reverted call is rolled back through the ledger checkpoint, so callers
/// never observe a partially distributed batch.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    address: Address,
}

impl SettlementEngine {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Account that receives attached funding and spends token allowances
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Distribute native value attached to the call.
    ///
    /// `funding_amount` is taken from `sender` on entry; anything above the
    /// batch total is returned to `sender` once every recipient is paid.
    pub fn distribute_native<L: Ledger>(
        &self,
        ledger: &mut L,
        sender: &Address,
        batch: &Batch,
        funding_amount: Uint128,
    ) -> Result<SettlementResult, SettlementError> {
        info!(
            sender = %sender,
            recipients = batch.len(),
            total = %batch.total(),
            funding = %funding_amount,
            "Native distribution started"
        );

        let mut call = Call::open("native");
        let checkpoint = ledger.checkpoint();
        let result = self.run_native(ledger, &mut call, sender, batch, funding_amount);
        Self::finish(ledger, checkpoint, call, result)
    }

    /// Distribute a token through `sender`'s allowance towards the engine
    pub fn distribute_asset<L: Ledger>(
        &self,
        ledger: &mut L,
        sender: &Address,
        asset: &Address,
        batch: &Batch,
    ) -> Result<SettlementResult, SettlementError> {
        info!(
            sender = %sender,
            asset = %asset,
            recipients = batch.len(),
            total = %batch.total(),
            "Asset distribution started"
        );

        let mut call = Call::open("asset");
        let checkpoint = ledger.checkpoint();
        let result = self.run_asset(ledger, &mut call, sender, asset, batch);
        Self::finish(ledger, checkpoint, call, result)
    }

    fn run_native<L: Ledger>(
        &self,
        ledger: &mut L,
        call: &mut Call,
        sender: &Address,
        batch: &Batch,
        funding_amount: Uint128,
    ) -> Result<SettlementResult, SettlementError> {
        ledger
            .transfer_native(sender, &self.address, funding_amount)
            .map_err(|e| match e {
                LedgerError::InsufficientBalance {
                    required,
                    available,
                    ..
                } => SettlementError::InsufficientBalance {
                    required,
                    available,
                },
                other => SettlementError::Ledger(other),
            })?;

        let total = batch.total();
        if funding_amount < total {
            return Err(SettlementError::InsufficientFunding {
                required: total,
                provided: funding_amount,
            });
        }

        call.advance(CallState::Distributing);

        let mut outcomes = Vec::with_capacity(batch.len());
        for (index, item) in batch.iter().enumerate() {
            match ledger.transfer_native(&self.address, &item.recipient, item.amount) {
                Ok(()) => outcomes.push(RecipientOutcome {
                    recipient: item.recipient.clone(),
                    amount: item.amount,
                    outcome: TransferOutcome::Transferred,
                }),
                Err(LedgerError::NotPayable(recipient)) => {
                    warn!(
                        index,
                        recipient = %recipient,
                        outcome = ?TransferOutcome::Failed,
                        "Recipient rejected native value"
                    );
                    return Err(SettlementError::EtherTransferFail { index, recipient });
                }
                Err(e) => return Err(e.into()),
            }
        }

        // funding_amount >= total was checked above
        let unused = funding_amount - total;
        if !unused.is_zero() {
            ledger.transfer_native(&self.address, sender, unused)?;
            debug!(sender = %sender, refunded = %unused, "Unused funding returned");
        }

        Ok(SettlementResult {
            success: true,
            moved_total: total,
            refunded: unused,
            outcomes,
        })
    }

    fn run_asset<L: Ledger>(
        &self,
        ledger: &mut L,
        call: &mut Call,
        sender: &Address,
        asset: &Address,
        batch: &Batch,
    ) -> Result<SettlementResult, SettlementError> {
        let total = batch.total();
        let allowance = ledger.allowance(asset, sender, &self.address)?;
        if allowance < total {
            return Err(SettlementError::InsufficientAuthorization {
                required: total,
                allowance,
            });
        }

        call.advance(CallState::Distributing);

        let mut outcomes = Vec::with_capacity(batch.len());
        for (index, item) in batch.iter().enumerate() {
            // The token's own return value decides, not merely the absence of an error
            let rejection = match ledger.transfer_from(
                asset,
                &self.address,
                sender,
                &item.recipient,
                item.amount,
            ) {
                Ok(true) => None,
                Ok(false) => Some("token returned false".to_string()),
                Err(e) => Some(e.to_string()),
            };

            if let Some(reason) = rejection {
                warn!(
                    index,
                    recipient = %item.recipient,
                    reason = %reason,
                    "Token transfer rejected"
                );
                return Err(SettlementError::TransferRejected {
                    index,
                    recipient: item.recipient.clone(),
                    reason,
                });
            }

            outcomes.push(RecipientOutcome {
                recipient: item.recipient.clone(),
                amount: item.amount,
                outcome: TransferOutcome::Transferred,
            });
        }

        Ok(SettlementResult {
            success: true,
            moved_total: total,
            refunded: Uint128::zero(),
            outcomes,
        })
    }

    fn finish<L: Ledger>(
        ledger: &mut L,
        checkpoint: L::Checkpoint,
        mut call: Call,
        result: Result<SettlementResult, SettlementError>,
    ) -> Result<SettlementResult, SettlementError> {
        match result {
            Ok(settled) => {
                ledger.commit(checkpoint);
                call.advance(CallState::Settled);
                info!(
                    call = call.kind,
                    moved_total = %settled.moved_total,
                    refunded = %settled.refunded,
                    "Distribution settled"
                );
                Ok(settled)
            }
            Err(e) => {
                ledger.rollback(checkpoint);
                let failed_in = call.state();
                call.advance(CallState::Reverted);
                warn!(call = call.kind, state = ?failed_in, error = %e, "Distribution reverted");
                Err(e)
            }
        }
    }
}
