//! Metrics and tracing for batch distributions
//!
//! # Features
//!
//! - Per-collector Prometheus registry with distribution counters
//! - JSON tracing output filtered through `RUST_LOG`
//! - Distribution IDs correlating the log lines of one request
//!
//! # Example
//!
//! ```no_run
//! use batch_distributor_metrics::{init_tracing, MetricsCollector};
//! use std::time::Duration;
//!
//! init_tracing(None).unwrap();
//!
//! let collector = MetricsCollector::new().unwrap();
//! collector.record_distribution_started(2);
//! collector.record_distribution_settled(2, Duration::from_millis(40));
//!
//! println!("{}", collector.export_metrics().unwrap());
//! ```

pub mod collector;
pub mod tracing;

pub use collector::{MetricsCollector, MetricsError};
pub use self::tracing::{init_tracing, DistributionId, DistributionSpan, TracingError};
