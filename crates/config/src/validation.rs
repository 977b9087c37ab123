//! Configuration validation

use crate::{ConfigError, DistributorConfig, Environment, Result};
use batch_distributor_types::Address;
use rust_decimal::Decimal;

/// Largest exponent whose scale factor still fits the 128 bit amount range
pub const MAX_UNIT_EXPONENT: u32 = 38;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire configuration, reporting every invalid field
pub fn validate_config(config: &DistributorConfig) -> Result<()> {
    let mut errors = Vec::new();

    // Validate network config
    if let Err(e) = validate_log_level(&config.network.log_level) {
        errors.push(e);
    }

    if config.network.environment != Environment::Local || !config.network.rpc_url.is_empty() {
        if let Err(e) = validate_url(&config.network.rpc_url) {
            errors.push(ValidationError::new("network.rpc_url", e));
        }
    }

    if let Some(engine) = &config.network.engine_address {
        if let Err(e) = validate_engine_address(engine) {
            errors.push(ValidationError::new("network.engine_address", e));
        }
    }

    // Validate deployments
    for (network_id, address) in &config.deployments {
        if network_id.parse::<u64>().is_err() {
            errors.push(ValidationError::new(
                format!("deployments.{network_id}"),
                "network id must be an unsigned integer",
            ));
        }

        if let Err(e) = validate_engine_address(address) {
            errors.push(ValidationError::new(format!("deployments.{network_id}"), e));
        }
    }

    // Validate distribution config
    if config.distribution.max_batch_size == 0 {
        errors.push(ValidationError::new(
            "distribution.max_batch_size",
            "must be greater than 0",
        ));
    }

    if config.distribution.buffer_multiplier < Decimal::ONE {
        errors.push(ValidationError::new(
            "distribution.buffer_multiplier",
            "must be >= 1",
        ));
    }

    if config.distribution.limit_override == Some(0) {
        errors.push(ValidationError::new(
            "distribution.limit_override",
            "must be greater than 0 when set",
        ));
    }

    if config.distribution.native_unit_exponent > MAX_UNIT_EXPONENT {
        errors.push(ValidationError::new(
            "distribution.native_unit_exponent",
            format!("must be <= {MAX_UNIT_EXPONENT}"),
        ));
    }

    // Return all errors if any were found
    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::Validation(error_msg));
    }

    Ok(())
}

/// Validate an engine address: well formed and non-zero
pub fn validate_engine_address(raw: &str) -> std::result::Result<(), String> {
    let address = Address::parse(raw).map_err(|e| e.to_string())?;
    if address.is_zero() {
        return Err("engine address cannot be the zero address".to_string());
    }
    Ok(())
}

/// Validate a URL
pub fn validate_url(url: &str) -> std::result::Result<(), String> {
    if url.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    // Basic URL validation - check for scheme
    if !url.starts_with("http://")
        && !url.starts_with("https://")
        && !url.starts_with("ws://")
        && !url.starts_with("wss://")
    {
        return Err("URL must start with http://, https://, ws://, or wss://".to_string());
    }

    Ok(())
}

/// Validate log level
fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new(
            "network.log_level",
            format!(
                "invalid log level '{level}', must be one of: trace, debug, info, warn, error"
            ),
        )),
    }
}
