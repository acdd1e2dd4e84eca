//! Operation counters for a [`Cache`](crate::cache::Cache).
//!
//! Compiled only with the `metrics` feature. Counters are relaxed atomics
//! bumped on the cache's hot paths; reading them goes through a
//! [`CacheMetricsSnapshot`], which also captures size gauges.
//!
//! ```text
//!   Cache ──record_*──► CacheMetrics (AtomicU64 cells)
//!     │
//!     └── metrics_snapshot() ──► CacheMetricsSnapshot ──► MetricsExporter
//! ```

pub mod cell;
pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;

pub use exporter::PrometheusTextExporter;
pub use metrics_impl::CacheMetrics;
pub use snapshot::CacheMetricsSnapshot;
pub use traits::{CacheMetricsRecorder, MetricsExporter};
