use cosmwasm_schema::cw_serde;

use crate::Address;

/// The single kind of value moved by a batch.
///
/// A batch is bound to one handle for its whole lifetime; there is no way to
/// mix native value and token transfers in one settlement call.
#[cw_serde]
#[derive(Eq, Hash)]
pub enum AssetHandle {
    /// The chain's base currency, attached directly to the call
    Native,

    /// A fungible token contract moving value through allowances
    Token(Address),
}

impl AssetHandle {
    pub fn token(address: Address) -> Self {
        AssetHandle::Token(address)
    }

    pub fn is_native(&self) -> bool {
        matches!(self, AssetHandle::Native)
    }

    /// Token contract address, `None` for native value
    pub fn token_address(&self) -> Option<&Address> {
        match self {
            AssetHandle::Native => None,
            AssetHandle::Token(address) => Some(address),
        }
    }

    pub fn label(&self) -> String {
        match self {
            AssetHandle::Native => "native".to_string(),
            AssetHandle::Token(address) => address.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_address() {
        let token = Address::from_label("token");
        assert_eq!(AssetHandle::Native.token_address(), None);
        assert_eq!(AssetHandle::token(token.clone()).token_address(), Some(&token));
        assert!(AssetHandle::Native.is_native());
        assert_eq!(AssetHandle::Native.label(), "native");
    }
}
