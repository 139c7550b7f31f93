//! `tracing`/`metrics`-backed defaults for `kdt_core::observability`'s
//! `Logger`/`MetricsSink` seams.

use std::sync::Arc;

use kdt_core::observability::{Logger, MetricsSink, NoopObserver};

/// Convenience bound combining both observability traits, since the
/// registry always needs both together.
pub trait Observer: Logger + MetricsSink {}
impl<T: Logger + MetricsSink> Observer for T {}

#[cfg(feature = "observe")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

#[cfg(feature = "observe")]
impl Logger for TracingObserver {
    fn log_evaluation(&self, feature_id: &str, used_default: bool) {
        tracing::debug!(feature_id, used_default, "feature evaluated");
    }

    fn log_registry_update(&self, namespace: &str, feature_count: usize) {
        tracing::info!(namespace, feature_count, "registry snapshot published");
    }

    fn log_parse_error(&self, detail: &str) {
        tracing::warn!(detail, "parse boundary rejected input");
    }
}

#[cfg(feature = "observe")]
impl MetricsSink for TracingObserver {
    fn record_evaluation(&self, feature_id: &str, used_default: bool) {
        metrics::increment_counter!(
            "kdt_evaluations_total",
            "feature_id" => feature_id.to_string(),
            "used_default" => used_default.to_string(),
        );
    }

    fn record_registry_update(&self, namespace: &str) {
        metrics::increment_counter!("kdt_registry_updates_total", "namespace" => namespace.to_string());
    }

    fn record_cycle_detected(&self, feature_id: &str) {
        metrics::increment_counter!("kdt_cycles_detected_total", "feature_id" => feature_id.to_string());
    }
}

/// The observer a [`crate::registry::Registry`] uses when none is supplied
/// explicitly: `tracing`/`metrics`-backed when the `observe` feature is on,
/// otherwise the no-op pair from `kdt_core`.
pub fn default_observer() -> Arc<dyn Observer> {
    #[cfg(feature = "observe")]
    {
        Arc::new(TracingObserver)
    }
    #[cfg(not(feature = "observe"))]
    {
        Arc::new(NoopObserver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_observer_never_panics() {
        let o = default_observer();
        o.log_evaluation("f1", true);
        o.record_evaluation("f1", true);
        o.record_cycle_detected("f1");
    }
}
