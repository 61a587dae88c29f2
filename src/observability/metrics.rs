//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ballot_actions_total` (counter): executor runs by action, status
//! - `ballot_action_duration_seconds` (histogram): time to confirmation
//! - `ballot_deployments_total` (counter): deployments by contract, status
//! - `ballot_verifications_total` (counter): verification submissions by status
//!
//! The recorder is only installed when a textfile path is configured; the
//! rendered exposition is written once when the command finishes.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;
use std::time::Duration;

/// Install the Prometheus recorder.
pub fn install_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install metrics recorder");
            None
        }
    }
}

/// Render current metrics into a node_exporter textfile.
pub fn write_textfile(handle: &PrometheusHandle, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, handle.render())?;
    tracing::debug!(path = %path.display(), "Metrics written");
    Ok(())
}

/// `status` label value shared by every counter.
pub fn status_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failed"
    }
}

/// Record an executor outcome.
pub fn record_action(action: &'static str, success: bool, elapsed: Duration) {
    metrics::counter!(
        "ballot_actions_total",
        "action" => action,
        "status" => status_label(success)
    )
    .increment(1);
    metrics::histogram!("ballot_action_duration_seconds", "action" => action)
        .record(elapsed.as_secs_f64());
}

/// Record a deployment attempt.
pub fn record_deployment(contract: &str, success: bool) {
    metrics::counter!(
        "ballot_deployments_total",
        "contract" => contract.to_string(),
        "status" => status_label(success)
    )
    .increment(1);
}

/// Record a verification attempt.
pub fn record_verification(success: bool) {
    metrics::counter!("ballot_verifications_total", "status" => status_label(success)).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_status_labels_share_one_spelling() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_action("mint", true, Duration::from_millis(5));
            record_action("vote", false, Duration::from_millis(5));
            record_deployment("Ballot", true);
            record_verification(false);
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"status="success""#));
        assert!(rendered.contains(r#"status="failed""#));
        assert!(!rendered.contains("SUCCESS"));
        assert!(!rendered.contains("FAILED"));
    }
}
