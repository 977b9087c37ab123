//! Core configuration structures for the batch distributor

use batch_distributor_types::Address;
use cosmwasm_std::Uint128;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{ConfigError, Result};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DistributorConfig {
    /// Network configuration
    pub network: NetworkConfig,

    /// Settlement engine addresses keyed by network id
    #[serde(default)]
    pub deployments: HashMap<String, String>,

    /// Distribution defaults
    #[serde(default)]
    pub distribution: DistributionConfig,
}

/// Network environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Environment type (mainnet, testnet, local)
    pub environment: Environment,

    /// Numeric network id reported by the provider
    pub network_id: u64,

    /// RPC endpoint URL
    #[serde(default)]
    pub rpc_url: String,

    /// Engine address used instead of the deployment registry
    #[serde(default)]
    pub engine_address: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable metrics collection
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Mainnet,
    Testnet,
    Local,
}

/// Distribution defaults applied to every request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionConfig {
    /// Maximum line items per batch
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Factor applied to cost estimates
    #[serde(default = "default_buffer_multiplier")]
    pub buffer_multiplier: Decimal,

    /// Fixed price instead of the provider's current price
    #[serde(default)]
    pub price_override: Option<Uint128>,

    /// Fixed cost limit instead of the buffered estimate
    #[serde(default)]
    pub limit_override: Option<u64>,

    /// Decimal places of the native currency
    #[serde(default = "default_native_unit_exponent")]
    pub native_unit_exponent: u32,
}

impl DistributorConfig {
    /// Parsed deployment registry
    pub fn deployment_map(&self) -> Result<HashMap<u64, Address>> {
        self.deployments
            .iter()
            .map(|(network_id, address)| {
                let field = || format!("deployments.{network_id}");
                let id = network_id.parse::<u64>().map_err(|_| ConfigError::InvalidEntry {
                    field: field(),
                    reason: "network id must be an unsigned integer".to_string(),
                })?;
                let address = Address::parse(address).map_err(|e| ConfigError::InvalidEntry {
                    field: field(),
                    reason: e.to_string(),
                })?;
                Ok((id, address))
            })
            .collect()
    }

    /// Parsed custom engine address, if configured
    pub fn engine_override(&self) -> Result<Option<Address>> {
        self.network
            .engine_address
            .as_deref()
            .map(|raw| {
                Address::parse(raw).map_err(|e| ConfigError::InvalidEntry {
                    field: "network.engine_address".to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_batch_size() -> usize {
    100
}

fn default_buffer_multiplier() -> Decimal {
    Decimal::new(12, 1) // 1.2
}

fn default_native_unit_exponent() -> u32 {
    18
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            network_id: 5777,
            rpc_url: "http://127.0.0.1:7545".to_string(),
            engine_address: None,
            log_level: default_log_level(),
            metrics_enabled: default_true(),
        }
    }
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            buffer_multiplier: default_buffer_multiplier(),
            price_override: None,
            limit_override: None,
            native_unit_exponent: default_native_unit_exponent(),
        }
    }
}
