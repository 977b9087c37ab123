use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;
use thiserror::Error;

use crate::Address;

/// Default upper bound on line items per batch
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Input errors, all detected before anything is submitted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("batch has no line items")]
    EmptyBatch,

    #[error("recipients ({recipients}) and amounts ({amounts}) differ in length")]
    ShapeMismatch { recipients: usize, amounts: usize },

    #[error("batch of {len} items exceeds maximum of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("invalid recipient at index {index}: {value}")]
    InvalidRecipient { index: usize, value: String },

    #[error("invalid amount at index {index}: {value} ({reason})")]
    InvalidAmount {
        index: usize,
        value: String,
        reason: String,
    },

    #[error("batch total overflows")]
    Overflow,

    #[error("invalid max batch size: {0}")]
    InvalidBatchSize(usize),
}

/// One transfer of a batch
#[cw_serde]
pub struct LineItem {
    pub recipient: Address,
    /// Amount in the asset's smallest unit
    pub amount: Uint128,
}

impl LineItem {
    pub fn new(recipient: Address, amount: u128) -> Self {
        Self {
            recipient,
            amount: Uint128::new(amount),
        }
    }
}

/// Validated, immutable sequence of line items.
///
/// Order is preserved for reporting; settlement does not depend on it.
/// Encoded as the bare item list; decoding recomputes the total and checks
/// every item invariant. The size limit is a caller setting and is applied
/// by [`Batch::new`] only.
#[cw_serde]
#[serde(try_from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Batch {
    items: Vec<LineItem>,
    total: Uint128,
}

impl Batch {
    /// Validate `items` against the batch invariants
    pub fn new(items: Vec<LineItem>, max_size: usize) -> Result<Self, BatchError> {
        if items.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        if items.len() > max_size {
            return Err(BatchError::BatchTooLarge {
                len: items.len(),
                max: max_size,
            });
        }

        let mut total = Uint128::zero();
        for (index, item) in items.iter().enumerate() {
            if item.recipient.is_zero() {
                return Err(BatchError::InvalidRecipient {
                    index,
                    value: item.recipient.to_string(),
                });
            }

            if item.amount.is_zero() {
                return Err(BatchError::InvalidAmount {
                    index,
                    value: item.amount.to_string(),
                    reason: "amount must be greater than zero".to_string(),
                });
            }

            total = total
                .checked_add(item.amount)
                .map_err(|_| BatchError::Overflow)?;
        }

        Ok(Self { items, total })
    }

    /// Validate `items` without a size limit
    pub fn from_items(items: Vec<LineItem>) -> Result<Self, BatchError> {
        Self::new(items, usize::MAX)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line item amounts
    pub fn total(&self) -> Uint128 {
        self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }
}

impl TryFrom<Vec<LineItem>> for Batch {
    type Error = BatchError;

    fn try_from(items: Vec<LineItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<Batch> for Vec<LineItem> {
    fn from(batch: Batch) -> Self {
        batch.items
    }
}
