use std::str::FromStr;

use cosmwasm_std::Uint128;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("not a decimal number: {0}")]
    NotNumeric(String),

    #[error("amount must be greater than zero: {0}")]
    NonPositive(String),

    #[error("{value} has more than {exponent} fractional digits")]
    TooPrecise { value: String, exponent: u32 },

    #[error("{value} overflows at exponent {exponent}")]
    Overflow { value: String, exponent: u32 },
}

/// Convert a human decimal amount into the asset's smallest indivisible unit.
///
/// `unit_exponent` is the number of decimal places of the asset (18 for a
/// typical native currency, 6 for many stable tokens). Amounts that cannot be
/// represented exactly are rejected rather than rounded.
pub fn to_smallest_unit(decimal_amount: &str, unit_exponent: u32) -> Result<Uint128, UnitError> {
    let value = parse_positive_decimal(decimal_amount)?;
    let scale = value.scale();
    if scale > unit_exponent {
        return Err(UnitError::TooPrecise {
            value: decimal_amount.to_string(),
            exponent: unit_exponent,
        });
    }

    let overflow = || UnitError::Overflow {
        value: decimal_amount.to_string(),
        exponent: unit_exponent,
    };

    // mantissa is positive here, value > 0
    let mantissa = u128::try_from(value.mantissa()).map_err(|_| overflow())?;
    let factor = 10u128
        .checked_pow(unit_exponent - scale)
        .ok_or_else(overflow)?;
    let units = mantissa.checked_mul(factor).ok_or_else(overflow)?;

    Ok(Uint128::new(units))
}

/// Parse a strictly positive decimal amount, normalized.
///
/// Needs no unit exponent, so amounts can be checked before the asset's
/// exponent is known.
pub fn parse_positive_decimal(decimal_amount: &str) -> Result<Decimal, UnitError> {
    let trimmed = decimal_amount.trim();
    let value = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| UnitError::NotNumeric(decimal_amount.to_string()))?;

    if value <= Decimal::ZERO {
        return Err(UnitError::NonPositive(decimal_amount.to_string()));
    }

    Ok(value.normalize())
}
