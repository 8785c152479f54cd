//! Notification dispatch metrics.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

pub const DISPATCH_TOTAL: &str = "notification_dispatch_total";
pub const BULK_RUNS_TOTAL: &str = "notification_bulk_runs_total";
pub const BULK_DURATION_SECONDS: &str = "notification_bulk_duration_seconds";
pub const BULK_LAST_RECIPIENTS: &str = "notification_bulk_last_recipients";
pub const BULK_RECIPIENT_FAILURES_TOTAL: &str = "notification_bulk_recipient_failures_total";

/// Notification metrics recorder
pub struct NotificationMetrics;

impl NotificationMetrics {
    /// One channel of one dispatch. `outcome` is `delivered`, `skipped` or `failed`.
    pub fn record_channel(channel: &'static str, notification_type: &str, outcome: &'static str) {
        counter!(
            DISPATCH_TOTAL,
            "channel" => channel,
            "notification_type" => notification_type.to_string(),
            "outcome" => outcome
        )
        .increment(1);
    }

    pub fn record_bulk_run(notification_type: &str, recipients: usize, failed: usize, elapsed: Duration) {
        counter!(BULK_RUNS_TOTAL, "notification_type" => notification_type.to_string()).increment(1);
        histogram!(BULK_DURATION_SECONDS, "notification_type" => notification_type.to_string())
            .record(elapsed.as_secs_f64());
        gauge!(BULK_LAST_RECIPIENTS).set(recipients as f64);
        if failed > 0 {
            counter!(BULK_RECIPIENT_FAILURES_TOTAL).increment(failed as u64);
        }

        tracing::debug!(
            notification_type,
            recipients,
            failed,
            elapsed_ms = duration_millis(elapsed),
            "Recorded bulk run"
        );
    }
}

/// Whole milliseconds in `elapsed`, saturating at `u64::MAX`.
pub fn duration_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
