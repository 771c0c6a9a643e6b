//! Store-level metrics.
//!
//! Only the `metrics` facade is used here; installing a recorder (and
//! exporter) is left to the host application.

use metrics::{counter, gauge, histogram};
use schoolbook_models::ResourceKind;
use std::sync::OnceLock;
use std::time::Duration;

static METRICS_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if metrics are enabled via the METRICS_ENABLED env var
pub fn is_metrics_enabled() -> bool {
    *METRICS_ENABLED.get_or_init(|| {
        std::env::var("METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Record one settled store action.
pub fn track_store_action(kind: ResourceKind, action: &'static str, success: bool, elapsed: Duration) {
    if !is_metrics_enabled() {
        return;
    }
    let outcome = if success { "success" } else { "error" };
    counter!(
        "store_actions_total",
        "resource" => kind.as_str(),
        "action" => action,
        "outcome" => outcome
    )
    .increment(1);

    histogram!("store_action_duration_seconds", "resource" => kind.as_str(), "action" => action)
        .record(elapsed.as_secs_f64());
}

pub fn track_requests_in_flight(kind: ResourceKind, delta: f64) {
    if !is_metrics_enabled() {
        return;
    }
    gauge!("store_requests_in_flight", "resource" => kind.as_str()).increment(delta);
}

/// Track roll-call saves by outcome ("complete", "partial", "failed").
pub fn track_roll_call_save(outcome: &'static str, rows: usize) {
    if !is_metrics_enabled() {
        return;
    }
    counter!("roll_call_saves_total", "outcome" => outcome).increment(1);
    histogram!("roll_call_rows").record(rows as f64);
}
