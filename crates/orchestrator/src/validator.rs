use batch_distributor_types::{
    parse_positive_decimal, to_smallest_unit, Address, Batch, BatchError, LineItem,
};

use crate::ValueTransferProvider;

/// Turns raw caller input into a validated [`Batch`]
#[derive(Debug, Clone)]
pub struct BatchValidator {
    max_batch_size: usize,
}

impl BatchValidator {
    pub fn new(max_batch_size: usize) -> Result<Self, BatchError> {
        if max_batch_size == 0 {
            return Err(BatchError::InvalidBatchSize(max_batch_size));
        }
        Ok(Self { max_batch_size })
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Change the batch size limit, rejecting zero
    pub fn set_max_batch_size(&mut self, max_batch_size: usize) -> Result<(), BatchError> {
        if max_batch_size == 0 {
            return Err(BatchError::InvalidBatchSize(max_batch_size));
        }
        self.max_batch_size = max_batch_size;
        Ok(())
    }

    /// Length checks that need no item values: shape, emptiness, size
    pub fn check_shape(&self, recipients: usize, amounts: usize) -> Result<(), BatchError> {
        if recipients != amounts {
            return Err(BatchError::ShapeMismatch {
                recipients,
                amounts,
            });
        }

        if recipients == 0 {
            return Err(BatchError::EmptyBatch);
        }

        if recipients > self.max_batch_size {
            return Err(BatchError::BatchTooLarge {
                len: recipients,
                max: self.max_batch_size,
            });
        }

        Ok(())
    }

    /// Every check that needs no unit exponent: shape, emptiness, size, then
    /// each recipient and each amount as a positive decimal, in item order.
    ///
    /// Runs before anything is read from the network.
    pub fn check_inputs<P>(
        &self,
        provider: &P,
        raw_recipients: &[String],
        raw_amounts: &[String],
    ) -> Result<(), BatchError>
    where
        P: ValueTransferProvider + ?Sized,
    {
        self.check_shape(raw_recipients.len(), raw_amounts.len())?;

        for (index, (recipient, amount)) in raw_recipients.iter().zip(raw_amounts).enumerate() {
            self.validate_recipient(provider, index, recipient)?;
            parse_positive_decimal(amount).map_err(|e| BatchError::InvalidAmount {
                index,
                value: amount.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    /// Validate parallel recipient/amount lists.
    ///
    /// Checks run in a fixed order: shape, emptiness, size, then each item
    /// in sequence. Amounts are decimal strings converted once into the
    /// smallest unit with `unit_exponent` decimal places.
    pub fn build_batch<P>(
        &self,
        provider: &P,
        raw_recipients: &[String],
        raw_amounts: &[String],
        unit_exponent: u32,
    ) -> Result<Batch, BatchError>
    where
        P: ValueTransferProvider + ?Sized,
    {
        self.check_shape(raw_recipients.len(), raw_amounts.len())?;

        let items = raw_recipients
            .iter()
            .zip(raw_amounts)
            .enumerate()
            .map(|(index, (recipient, amount))| {
                Ok(LineItem {
                    recipient: self.validate_recipient(provider, index, recipient)?,
                    amount: to_smallest_unit(amount, unit_exponent).map_err(|e| {
                        BatchError::InvalidAmount {
                            index,
                            value: amount.clone(),
                            reason: e.to_string(),
                        }
                    })?,
                })
            })
            .collect::<Result<Vec<_>, BatchError>>()?;

        Batch::new(items, self.max_batch_size)
    }

    fn validate_recipient<P>(
        &self,
        provider: &P,
        index: usize,
        raw: &str,
    ) -> Result<Address, BatchError>
    where
        P: ValueTransferProvider + ?Sized,
    {
        let invalid = || BatchError::InvalidRecipient {
            index,
            value: raw.to_string(),
        };

        if !provider.is_well_formed_address(raw) {
            return Err(invalid());
        }

        let address = Address::parse(raw).map_err(|_| invalid())?;
        if address.is_zero() {
            return Err(invalid());
        }

        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimulatedProvider;
    use batch_distributor_types::DEFAULT_MAX_BATCH_SIZE;
    use cosmwasm_std::Uint128;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn recipient(label: &str) -> String {
        Address::from_label(label).to_string()
    }

    fn validator() -> BatchValidator {
        BatchValidator::new(DEFAULT_MAX_BATCH_SIZE).unwrap()
    }

    #[test]
    fn test_valid_batch() {
        let provider = SimulatedProvider::new();
        let batch = validator()
            .build_batch(
                &provider,
                &[recipient("r1"), recipient("r2")],
                &strings(&["1.5", "2"]),
                6,
            )
            .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.items()[0].amount, Uint128::new(1_500_000));
        assert_eq!(batch.total(), Uint128::new(3_500_000));
    }

    #[test]
    fn test_shape_checked_before_values() {
        let provider = SimulatedProvider::new();
        let err = validator()
            .build_batch(
                &provider,
                &strings(&["not-an-address", "also-bad", "x"]),
                &strings(&["-1", "abc"]),
                18,
            )
            .unwrap_err();

        assert_eq!(
            err,
            BatchError::ShapeMismatch {
                recipients: 3,
                amounts: 2
            }
        );
    }

    #[test]
    fn test_empty_batch() {
        let provider = SimulatedProvider::new();
        let err = validator().build_batch(&provider, &[], &[], 18).unwrap_err();
        assert_eq!(err, BatchError::EmptyBatch);
    }

    #[test]
    fn test_batch_too_large() {
        let provider = SimulatedProvider::new();
        let recipients: Vec<_> = (0..101).map(|i| recipient(&format!("r{i}"))).collect();
        let amounts = vec!["1".to_string(); 101];

        let err = validator()
            .build_batch(&provider, &recipients, &amounts, 18)
            .unwrap_err();

        assert_eq!(err, BatchError::BatchTooLarge { len: 101, max: 100 });
    }

    #[test]
    fn test_invalid_recipient_reports_index() {
        let provider = SimulatedProvider::new();
        let err = validator()
            .build_batch(
                &provider,
                &[recipient("r1"), "0x1234".to_string()],
                &strings(&["1", "1"]),
                18,
            )
            .unwrap_err();

        assert_eq!(
            err,
            BatchError::InvalidRecipient {
                index: 1,
                value: "0x1234".to_string()
            }
        );
    }

    #[test]
    fn test_check_inputs_needs_no_exponent() {
        let provider = SimulatedProvider::new();
        let validator = validator();

        assert!(validator
            .check_inputs(&provider, &[recipient("r1")], &strings(&["0.0000000000000000001"]))
            .is_ok());

        let err = validator
            .check_inputs(&provider, &strings(&["not-an-address"]), &strings(&["-1"]))
            .unwrap_err();
        assert!(matches!(err, BatchError::InvalidRecipient { index: 0, .. }));

        let err = validator
            .check_inputs(&provider, &[recipient("r1")], &strings(&["-1"]))
            .unwrap_err();
        assert!(matches!(err, BatchError::InvalidAmount { index: 0, .. }));
    }

    #[test]
    fn test_zero_address_rejected() {
        let provider = SimulatedProvider::new();
        let err = validator()
            .build_batch(
                &provider,
                &[Address::zero().to_string()],
                &strings(&["1"]),
                18,
            )
            .unwrap_err();

        assert!(matches!(err, BatchError::InvalidRecipient { index: 0, .. }));
    }

    #[test]
    fn test_invalid_amounts() {
        let provider = SimulatedProvider::new();
        for bad in ["0", "-3", "abc", "0.0000001"] {
            let err = validator()
                .build_batch(&provider, &[recipient("r1")], &strings(&[bad]), 6)
                .unwrap_err();
            assert!(
                matches!(err, BatchError::InvalidAmount { index: 0, .. }),
                "{bad} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn test_set_max_batch_size_rejects_zero() {
        let mut validator = validator();
        assert_eq!(
            validator.set_max_batch_size(0),
            Err(BatchError::InvalidBatchSize(0))
        );
        assert_eq!(validator.max_batch_size(), 100);

        validator.set_max_batch_size(2).unwrap();
        let provider = SimulatedProvider::new();
        let err = validator
            .build_batch(
                &provider,
                &[recipient("a"), recipient("b"), recipient("c")],
                &strings(&["1", "1", "1"]),
                0,
            )
            .unwrap_err();
        assert_eq!(err, BatchError::BatchTooLarge { len: 3, max: 2 });
    }
}
