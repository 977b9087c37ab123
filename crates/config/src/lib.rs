//! Batch distributor configuration
//!
//! A [`DistributorConfig`] has three sections: `network` (where to connect),
//! `deployments` (engine address per network id) and `distribution`
//! (batch limit, estimate buffer, overrides, native exponent). It loads from
//! TOML, YAML or JSON files, with `BATCH_DISTRIBUTOR_SECTION__KEY`
//! environment overrides, and [`validate_config`] reports every bad field
//! at once. Presets live in the workspace `config/` directory.

mod config;
mod loader;
mod validation;

pub use self::config::*;
pub use loader::*;
pub use validation::*;

/// Failures while loading or checking a [`DistributorConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File extension is missing or not one of toml, yaml, yml, json
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A value that deserialized but does not parse as its domain type
    #[error("invalid {field}: {reason}")]
    InvalidEntry { field: String, reason: String },

    /// Every field error found by [`validate_config`], joined with "; "
    #[error("config validation failed: {0}")]
    Validation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config source error: {0}")]
    Source(#[from] ::config::ConfigError),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
