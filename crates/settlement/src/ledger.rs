use std::collections::{HashMap, HashSet};

use batch_distributor_types::Address;
use cosmwasm_std::Uint128;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════
// LEDGER INTERFACE
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("account does not accept native value: {0}")]
    NotPayable(Address),

    #[error("insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: Address,
        required: Uint128,
        available: Uint128,
    },

    #[error("insufficient allowance: required {required}, allowance {allowance}")]
    InsufficientAllowance {
        required: Uint128,
        allowance: Uint128,
    },

    #[error("unknown asset: {0}")]
    UnknownAsset(Address),

    #[error("balance overflow")]
    Overflow,
}

/// Transactional view of balances and token allowances.
///
/// A settlement call opens a checkpoint before touching any balance and
/// either commits or rolls back to it, so a reverted call leaves no trace.
pub trait Ledger {
    type Checkpoint;

    fn checkpoint(&mut self) -> Self::Checkpoint;

    /// Discard every change made since `checkpoint`
    fn rollback(&mut self, checkpoint: Self::Checkpoint);

    /// Keep every change made since `checkpoint`
    fn commit(&mut self, checkpoint: Self::Checkpoint);

    fn native_balance(&self, account: &Address) -> Uint128;

    /// Move native value; fails with [`LedgerError::NotPayable`] when the
    /// destination refuses it.
    fn transfer_native(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Uint128,
    ) -> Result<(), LedgerError>;

    fn allowance(
        &self,
        asset: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<Uint128, LedgerError>;

    /// Set the allowance of `spender` over `owner`'s tokens
    fn approve(
        &mut self,
        asset: &Address,
        owner: &Address,
        spender: &Address,
        amount: Uint128,
    ) -> Result<bool, LedgerError>;

    /// Debit `from` through `spender`'s allowance and credit `to`.
    ///
    /// The returned flag is the token's own success signal. Non-conforming
    /// tokens may return `Ok(false)` instead of raising.
    fn transfer_from(
        &mut self,
        asset: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Uint128,
    ) -> Result<bool, LedgerError>;
}

// ═══════════════════════════════════════════════════════════════════════════
// IN-MEMORY LEDGER
// ═══════════════════════════════════════════════════════════════════════════

/// How a simulated token reports transfer results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenBehavior {
    /// Raises on failure, returns `true` on success
    Standard,
    /// Returns `false` instead of raising when a transfer cannot be made
    FalseOnFailure,
    /// Never moves anything and always returns `false`
    AlwaysFalse,
}

#[derive(Debug, Clone)]
struct TokenState {
    behavior: TokenBehavior,
    decimals: u32,
    balances: HashMap<Address, Uint128>,
    allowances: HashMap<(Address, Address), Uint128>,
}

impl TokenState {
    fn balance(&self, account: &Address) -> Uint128 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Uint128 {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn standard_transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Uint128,
    ) -> Result<(), LedgerError> {
        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                required: amount,
                allowance,
            });
        }

        let available = self.balance(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from.clone(),
                required: amount,
                available,
            });
        }

        self.allowances
            .insert((from.clone(), spender.clone()), allowance - amount);

        if from == to {
            return Ok(());
        }

        let credited = self
            .balance(to)
            .checked_add(amount)
            .map_err(|_| LedgerError::Overflow)?;
        self.balances.insert(from.clone(), available - amount);
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    native: HashMap<Address, Uint128>,
    non_payable: HashSet<Address>,
    tokens: HashMap<Address, TokenState>,
}

/// Snapshot-based ledger used by tests and the simulated provider
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: LedgerState,
    snapshots: Vec<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit native value out of thin air (genesis allocation)
    pub fn fund_native(&mut self, account: &Address, amount: Uint128) -> Result<(), LedgerError> {
        let credited = self
            .native_balance(account)
            .checked_add(amount)
            .map_err(|_| LedgerError::Overflow)?;
        self.state.native.insert(account.clone(), credited);
        Ok(())
    }

    /// Mark an account as unable to receive native value
    pub fn mark_non_payable(&mut self, account: &Address) {
        self.state.non_payable.insert(account.clone());
    }

    pub fn is_payable(&self, account: &Address) -> bool {
        !self.state.non_payable.contains(account)
    }

    /// Deploy a token contract. Token contracts do not accept native value.
    pub fn create_token(&mut self, asset: &Address, behavior: TokenBehavior, decimals: u32) {
        self.state.tokens.insert(
            asset.clone(),
            TokenState {
                behavior,
                decimals,
                balances: HashMap::new(),
                allowances: HashMap::new(),
            },
        );
        self.mark_non_payable(asset);
    }

    pub fn mint(
        &mut self,
        asset: &Address,
        to: &Address,
        amount: Uint128,
    ) -> Result<(), LedgerError> {
        let token = self.token_mut(asset)?;
        let credited = token
            .balance(to)
            .checked_add(amount)
            .map_err(|_| LedgerError::Overflow)?;
        token.balances.insert(to.clone(), credited);
        Ok(())
    }

    pub fn token_balance(&self, asset: &Address, account: &Address) -> Result<Uint128, LedgerError> {
        Ok(self.token(asset)?.balance(account))
    }

    pub fn token_decimals(&self, asset: &Address) -> Result<u32, LedgerError> {
        Ok(self.token(asset)?.decimals)
    }

    pub fn has_token(&self, asset: &Address) -> bool {
        self.state.tokens.contains_key(asset)
    }

    /// Sum of every native balance
    pub fn native_supply(&self) -> Uint128 {
        self.state.native.values().copied().sum()
    }

    /// Sum of every balance of `asset`
    pub fn token_supply(&self, asset: &Address) -> Result<Uint128, LedgerError> {
        Ok(self.token(asset)?.balances.values().copied().sum())
    }

    fn token(&self, asset: &Address) -> Result<&TokenState, LedgerError> {
        self.state
            .tokens
            .get(asset)
            .ok_or_else(|| LedgerError::UnknownAsset(asset.clone()))
    }

    fn token_mut(&mut self, asset: &Address) -> Result<&mut TokenState, LedgerError> {
        self.state
            .tokens
            .get_mut(asset)
            .ok_or_else(|| LedgerError::UnknownAsset(asset.clone()))
    }
}

impl Ledger for InMemoryLedger {
    type Checkpoint = usize;

    fn checkpoint(&mut self) -> usize {
        self.snapshots.push(self.state.clone());
        self.snapshots.len() - 1
    }

    fn rollback(&mut self, checkpoint: usize) {
        if let Some(snapshot) = self.snapshots.get(checkpoint).cloned() {
            self.state = snapshot;
        }
        self.snapshots.truncate(checkpoint);
    }

    fn commit(&mut self, checkpoint: usize) {
        self.snapshots.truncate(checkpoint);
    }

    fn native_balance(&self, account: &Address) -> Uint128 {
        self.state.native.get(account).copied().unwrap_or_default()
    }

    fn transfer_native(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Uint128,
    ) -> Result<(), LedgerError> {
        if !self.is_payable(to) {
            return Err(LedgerError::NotPayable(to.clone()));
        }

        let available = self.native_balance(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from.clone(),
                required: amount,
                available,
            });
        }

        if from == to {
            return Ok(());
        }

        let credited = self
            .native_balance(to)
            .checked_add(amount)
            .map_err(|_| LedgerError::Overflow)?;

        self.state.native.insert(from.clone(), available - amount);
        self.state.native.insert(to.clone(), credited);
        Ok(())
    }

    fn allowance(
        &self,
        asset: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<Uint128, LedgerError> {
        Ok(self.token(asset)?.allowance(owner, spender))
    }

    fn approve(
        &mut self,
        asset: &Address,
        owner: &Address,
        spender: &Address,
        amount: Uint128,
    ) -> Result<bool, LedgerError> {
        let token = self.token_mut(asset)?;
        token
            .allowances
            .insert((owner.clone(), spender.clone()), amount);
        Ok(true)
    }

    fn transfer_from(
        &mut self,
        asset: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Uint128,
    ) -> Result<bool, LedgerError> {
        let token = self.token_mut(asset)?;
        match token.behavior {
            TokenBehavior::Standard => {
                token.standard_transfer_from(spender, from, to, amount)?;
                Ok(true)
            }
            TokenBehavior::FalseOnFailure => {
                Ok(token.standard_transfer_from(spender, from, to, amount).is_ok())
            }
            TokenBehavior::AlwaysFalse => Ok(false),
        }
    }
}
