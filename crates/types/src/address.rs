use std::fmt;
use std::str::FromStr;

use cosmwasm_schema::cw_serde;
use thiserror::Error;

/// Number of bytes in an account address
pub const ADDRESS_LENGTH: usize = 20;

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),

    #[error("address must be {expected} hex digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("address is not valid hex: {0}")]
    InvalidHex(String),
}

/// Account address in canonical lowercase `0x`-prefixed hex form.
///
/// Parsing accepts mixed case input; the stored form is always lowercase so
/// that equality and hashing are case-insensitive. Deserialization goes
/// through [`Address::parse`].
#[cw_serde]
#[derive(Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and canonicalize a textual address
    pub fn parse(value: &str) -> Result<Self, AddressError> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(value.to_string()))?;

        if digits.len() != ADDRESS_LENGTH * 2 {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LENGTH * 2,
                actual: digits.len(),
            });
        }

        hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;

        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// Build an address from raw bytes
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// Deterministic test/simulation address derived from a short label.
    ///
    /// The label bytes are right-aligned into the 20 byte body, so distinct
    /// labels of up to 20 bytes never collide.
    pub fn from_label(label: &str) -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        let raw = label.as_bytes();
        let take = raw.len().min(ADDRESS_LENGTH);
        bytes[ADDRESS_LENGTH - take..].copy_from_slice(&raw[raw.len() - take..]);
        Self::from_bytes(bytes)
    }

    pub fn zero() -> Self {
        Self(ZERO_ADDRESS.to_string())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == ZERO_ADDRESS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonicalizes_case() {
        let upper = Address::parse("0xABCDEF0123456789ABCDEF0123456789ABCDEF01").unwrap();
        let lower = Address::parse("0xabcdef0123456789abcdef0123456789abcdef01").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            Address::parse("abcdef0123456789abcdef0123456789abcdef01"),
            Err(AddressError::MissingPrefix(_))
        ));
        assert!(matches!(
            Address::parse("0x1234"),
            Err(AddressError::InvalidLength { actual: 4, .. })
        ));
        assert!(matches!(
            Address::parse("0xzzzzzz0123456789abcdef0123456789abcdef01"),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_zero_address() {
        let zero = Address::parse(ZERO_ADDRESS).unwrap();
        assert!(zero.is_zero());
        assert_eq!(zero, Address::zero());
        assert!(!Address::from_label("alice").is_zero());
    }

    #[test]
    fn test_from_label_is_distinct_and_valid() {
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        assert_ne!(alice, bob);
        assert_eq!(Address::parse(alice.as_str()).unwrap(), alice);
    }

    #[test]
    fn test_serializes_as_string() {
        let addr = Address::from_label("alice");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
    }

    #[test]
    fn test_deserialize_canonicalizes_and_validates() {
        let addr: Address =
            serde_json::from_str("\"0xABCDEF0123456789ABCDEF0123456789ABCDEF01\"").unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");

        assert!(serde_json::from_str::<Address>("\"0x1234\"").is_err());
        assert!(serde_json::from_str::<Address>("\"not-an-address\"").is_err());
    }
}
