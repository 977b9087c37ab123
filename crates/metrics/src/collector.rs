use std::time::Duration;

use batch_distributor_types::RevertReason;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "batch_distributor";

/// Prometheus metrics for batch distributions.
///
/// Each collector owns its registry, so independent orchestrators (and
/// tests) never share counters.
pub struct MetricsCollector {
    registry: Registry,
    distributions_started: IntCounter,
    distributions_settled: IntCounter,
    distributions_reverted: IntCounterVec,
    recipients_paid: IntCounter,
    authorization_increases: IntCounter,
    batch_size: Histogram,
    distribution_duration: Histogram,
}

impl MetricsCollector {
    /// Create a collector with a fresh registry
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_registry(Registry::new())
    }

    /// Create a collector registering into an existing registry
    pub fn with_registry(registry: Registry) -> Result<Self, MetricsError> {
        let distributions_started = IntCounter::with_opts(
            Opts::new("distributions_started_total", "Total distributions submitted")
                .namespace(NAMESPACE),
        )?;
        let distributions_settled = IntCounter::with_opts(
            Opts::new("distributions_settled_total", "Total distributions settled")
                .namespace(NAMESPACE),
        )?;
        let distributions_reverted = IntCounterVec::new(
            Opts::new(
                "distributions_reverted_total",
                "Total distributions reverted by reason",
            )
            .namespace(NAMESPACE),
            &["reason"],
        )?;
        let recipients_paid = IntCounter::with_opts(
            Opts::new("recipients_paid_total", "Total line items transferred")
                .namespace(NAMESPACE),
        )?;
        let authorization_increases = IntCounter::with_opts(
            Opts::new(
                "authorization_increases_total",
                "Total allowance increases submitted before a distribution",
            )
            .namespace(NAMESPACE),
        )?;
        let batch_size = Histogram::with_opts(
            HistogramOpts::new("batch_size", "Line items per validated batch")
                .namespace(NAMESPACE)
                .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 75.0, 100.0, 250.0]),
        )?;
        let distribution_duration = Histogram::with_opts(
            HistogramOpts::new(
                "distribution_duration_ms",
                "Time from submission to confirmed receipt",
            )
            .namespace(NAMESPACE)
            .buckets(vec![10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 30000.0]),
        )?;

        registry.register(Box::new(distributions_started.clone()))?;
        registry.register(Box::new(distributions_settled.clone()))?;
        registry.register(Box::new(distributions_reverted.clone()))?;
        registry.register(Box::new(recipients_paid.clone()))?;
        registry.register(Box::new(authorization_increases.clone()))?;
        registry.register(Box::new(batch_size.clone()))?;
        registry.register(Box::new(distribution_duration.clone()))?;

        Ok(Self {
            registry,
            distributions_started,
            distributions_settled,
            distributions_reverted,
            recipients_paid,
            authorization_increases,
            batch_size,
            distribution_duration,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DISTRIBUTION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record a validated batch about to be submitted
    pub fn record_distribution_started(&self, batch_len: usize) {
        self.distributions_started.inc();
        self.batch_size.observe(batch_len as f64);
    }

    /// Record a settled distribution
    pub fn record_distribution_settled(&self, recipients: usize, duration: Duration) {
        self.distributions_settled.inc();
        self.recipients_paid.inc_by(recipients as u64);
        self.distribution_duration
            .observe(duration.as_millis() as f64);
    }

    /// Record a reverted distribution
    pub fn record_distribution_reverted(&self, reason: &RevertReason, duration: Duration) {
        self.distributions_reverted
            .with_label_values(&[reason.kind()])
            .inc();
        self.distribution_duration
            .observe(duration.as_millis() as f64);
    }

    /// Record an allowance increase sent ahead of a token distribution
    pub fn record_authorization_increase(&self) {
        self.authorization_increases.inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // READ ACCESS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn distributions_started(&self) -> u64 {
        self.distributions_started.get()
    }

    pub fn distributions_settled(&self) -> u64 {
        self.distributions_settled.get()
    }

    pub fn distributions_reverted(&self, reason_kind: &str) -> u64 {
        self.distributions_reverted
            .with_label_values(&[reason_kind])
            .get()
    }

    pub fn recipients_paid(&self) -> u64 {
        self.recipients_paid.get()
    }

    pub fn authorization_increases(&self) -> u64 {
        self.authorization_increases.get()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Export metrics in Prometheus text format
    pub fn export_metrics(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }
}

/// Metrics errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("encoding error: {0}")]
    EncodingError(String),
    #[error("registry error: {0}")]
    RegistryError(String),
}

impl From<prometheus::Error> for MetricsError {
    fn from(e: prometheus::Error) -> Self {
        MetricsError::RegistryError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batch_distributor_types::Address;
    use cosmwasm_std::Uint128;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().unwrap();
        assert!(collector.export_metrics().is_ok());
    }

    #[test]
    fn test_collectors_do_not_share_counters() {
        let first = MetricsCollector::new().unwrap();
        let second = MetricsCollector::new().unwrap();

        first.record_distribution_started(3);

        assert_eq!(first.distributions_started(), 1);
        assert_eq!(second.distributions_started(), 0);
    }

    #[test]
    fn test_shared_registry_rejects_duplicate_collector() {
        let registry = Registry::new();
        MetricsCollector::with_registry(registry.clone()).unwrap();

        let err = MetricsCollector::with_registry(registry).err().unwrap();
        assert!(matches!(err, MetricsError::RegistryError(_)));
    }

    #[test]
    fn test_record_settled_distribution() {
        let collector = MetricsCollector::new().unwrap();

        collector.record_distribution_started(4);
        collector.record_distribution_settled(4, Duration::from_millis(120));

        assert_eq!(collector.distributions_settled(), 1);
        assert_eq!(collector.recipients_paid(), 4);

        let metrics = collector.export_metrics().unwrap();
        assert!(metrics.contains("batch_distributor_distributions_started_total"));
        assert!(metrics.contains("batch_distributor_batch_size"));
        assert!(metrics.contains("batch_distributor_distribution_duration_ms"));
    }

    #[test]
    fn test_record_reverted_by_reason() {
        let collector = MetricsCollector::new().unwrap();
        let reason = RevertReason::EtherTransferFail {
            index: 2,
            recipient: Address::from_label("vault"),
        };

        collector.record_distribution_reverted(&reason, Duration::from_millis(5));
        collector.record_distribution_reverted(
            &RevertReason::InsufficientAuthorization {
                required: Uint128::new(3000),
                allowance: Uint128::new(1500),
            },
            Duration::from_millis(5),
        );

        assert_eq!(collector.distributions_reverted("ether_transfer_fail"), 1);
        assert_eq!(collector.distributions_reverted("insufficient_authorization"), 1);
        assert_eq!(collector.distributions_reverted("transfer_rejected"), 0);

        let metrics = collector.export_metrics().unwrap();
        assert!(metrics.contains("reason=\"ether_transfer_fail\""));
    }

    #[test]
    fn test_record_authorization_increase() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_authorization_increase();
        assert_eq!(collector.authorization_increases(), 1);
    }
}
