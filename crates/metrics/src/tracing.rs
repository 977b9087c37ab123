use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,batch_distributor=debug";

/// Initialize JSON tracing output.
///
/// `RUST_LOG` takes precedence; otherwise `default_filter` is used, falling
/// back to `info,batch_distributor=debug`.
pub fn init_tracing(default_filter: Option<&str>) -> Result<(), TracingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter.unwrap_or(DEFAULT_FILTER)))
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    Ok(())
}

/// Identifier correlating every log line of one distribution request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DistributionId(uuid::Uuid);

impl DistributionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for DistributionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DistributionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Span context for one distribution flow
#[derive(Debug, Clone)]
pub struct DistributionSpan {
    pub distribution_id: DistributionId,
    pub asset: String,
    pub recipients: usize,
}

impl DistributionSpan {
    pub fn new(asset: impl Into<String>, recipients: usize) -> Self {
        Self {
            distribution_id: DistributionId::new(),
            asset: asset.into(),
            recipients,
        }
    }

    /// Span to attach to the distribution future with `Instrument`
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "distribution",
            distribution_id = %self.distribution_id,
            asset = %self.asset,
            recipients = self.recipients,
        )
    }
}

/// Tracing error types
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("tracing initialization error: {0}")]
    InitError(String),
}
