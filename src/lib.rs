//! Batch distribution engine
//!
//! Re-exports the workspace crates and wires a loaded [`DistributorConfig`]
//! into a connected [`BatchOrchestrator`].

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

pub use batch_distributor_config as config;
pub use batch_distributor_metrics as metrics;
pub use batch_distributor_orchestrator as orchestrator;
pub use batch_distributor_settlement as settlement;
pub use batch_distributor_types as types;

use batch_distributor_config::{validate_config, ConfigError, DistributionConfig, DistributorConfig};
use batch_distributor_metrics::{MetricsCollector, MetricsError};
use batch_distributor_orchestrator::{
    BatchOrchestrator, OrchestratorConfig, OrchestratorError, ProviderError, Session, TxOverrides,
    ValueTransferProvider,
};

#[derive(Debug, Error)]
pub enum DistributorError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),
}

/// Orchestrator settings taken from the `[distribution]` section
pub fn orchestrator_config(distribution: &DistributionConfig) -> OrchestratorConfig {
    OrchestratorConfig::default()
        .with_max_batch_size(distribution.max_batch_size)
        .with_buffer_multiplier(distribution.buffer_multiplier)
        .with_native_unit_exponent(distribution.native_unit_exponent)
}

/// Default per-request overrides taken from the `[distribution]` section
pub fn default_overrides(distribution: &DistributionConfig) -> TxOverrides {
    TxOverrides {
        price_override: distribution.price_override,
        limit_override: distribution.limit_override,
    }
}

/// Validate `config`, open a session on `provider` and build the orchestrator.
///
/// The engine address comes from `network.engine_address` when set, and from
/// the deployment registry entry for the provider's network otherwise. A
/// metrics collector is attached when `network.metrics_enabled` is true.
pub async fn connect<P: ValueTransferProvider>(
    provider: Arc<P>,
    config: &DistributorConfig,
) -> Result<BatchOrchestrator<P>, DistributorError> {
    validate_config(config)?;

    let deployments = config.deployment_map()?;
    let session = Session::open(provider, &deployments, config.engine_override()?).await?;

    if session.network_id() != config.network.network_id {
        info!(
            configured = config.network.network_id,
            reported = session.network_id(),
            "Provider network differs from configured network id"
        );
    }

    let mut orchestrator =
        BatchOrchestrator::new(session, orchestrator_config(&config.distribution))?;
    if config.network.metrics_enabled {
        orchestrator = orchestrator.with_metrics(Arc::new(MetricsCollector::new()?));
    }

    Ok(orchestrator)
}
