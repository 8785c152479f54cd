//! Metrics for the notification services.
//!
//! ```rust,ignore
//! use observability::{init_metrics, NotificationMetrics};
//!
//! init_metrics();
//! NotificationMetrics::record_channel("email", "welcome", "delivered");
//! ```

pub mod notifications;

pub use notifications::{NotificationMetrics, duration_millis};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder once per process.
///
/// Returns `None` when another recorder was installed first; metric calls then
/// go to that recorder.
pub fn init_metrics() -> Option<&'static PrometheusHandle> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Some(handle);
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            register_metric_descriptions();
            info!("Prometheus metrics recorder initialized");
            Some(METRICS_HANDLE.get_or_init(|| handle))
        }
        Err(e) => {
            warn!(error = %e, "Metrics recorder not installed");
            None
        }
    }
}

/// Prometheus text exposition of everything recorded so far.
pub fn render_metrics() -> String {
    match METRICS_HANDLE.get() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        notifications::DISPATCH_TOTAL,
        "Per-channel dispatch outcomes by notification type"
    );
    describe_counter!(notifications::BULK_RUNS_TOTAL, "Bulk dispatch runs");
    describe_histogram!(
        notifications::BULK_DURATION_SECONDS,
        "Wall-clock duration of bulk dispatch runs"
    );
    describe_gauge!(
        notifications::BULK_LAST_RECIPIENTS,
        "Recipients matched by the most recent bulk run"
    );
    describe_counter!(
        notifications::BULK_RECIPIENT_FAILURES_TOTAL,
        "Recipients whose dispatch errored during bulk runs"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_before_and_after_init() {
        let handle = init_metrics();
        // A second call returns the same recorder.
        assert_eq!(init_metrics().is_some(), handle.is_some());

        NotificationMetrics::record_channel("email", "welcome", "delivered");
        if handle.is_some() {
            assert!(render_metrics().contains(notifications::DISPATCH_TOTAL));
        }
    }
}
