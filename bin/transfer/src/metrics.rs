//! Prometheus metrics for bridge transfers.
//!
//! All metrics are aggregated in the [`Metrics`] struct.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Aggregated metrics for transfers.
///
/// Metrics are registered with the global metrics registry on creation. Without
/// an installed exporter every record is a no-op.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        // Step metrics
        describe_counter!(
            "transfer_step_success_total",
            "Total successful flow operations by flow and step"
        );
        describe_counter!(
            "transfer_step_failure_total",
            "Total failed flow operations by flow, step and error kind"
        );
        describe_histogram!(
            "transfer_step_duration_seconds",
            "Duration of each flow operation in seconds, including waits"
        );

        // Deposit metrics
        describe_counter!(
            "transfer_deposits_completed_total",
            "Total number of L1→L2 deposits included on L2"
        );
        describe_counter!(
            "transfer_deposit_amount_wei_total",
            "Total amount deposited in wei"
        );

        // Withdrawal metrics
        describe_counter!(
            "transfer_withdrawals_initiated_total",
            "Total number of L2→L1 withdrawals initiated"
        );
        describe_counter!(
            "transfer_withdrawals_proven_total",
            "Total number of withdrawals proven on L1"
        );
        describe_counter!(
            "transfer_withdrawals_finalized_total",
            "Total number of withdrawals finalized on L1"
        );
        describe_counter!(
            "transfer_withdrawal_amount_wei_total",
            "Total amount withdrawn in wei"
        );
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Step metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Record a successful operation and how long it took.
    pub fn record_step_success(&self, flow: &'static str, step: &'static str, duration: Duration) {
        counter!("transfer_step_success_total", "flow" => flow, "step" => step).increment(1);
        histogram!("transfer_step_duration_seconds", "flow" => flow, "step" => step)
            .record(duration.as_secs_f64());
    }

    /// Record a failed operation.
    pub fn record_step_failure(&self, flow: &'static str, step: &'static str, kind: &'static str) {
        counter!(
            "transfer_step_failure_total",
            "flow" => flow,
            "step" => step,
            "kind" => kind
        )
        .increment(1);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Deposit metrics
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn record_deposit_completed(&self, amount_wei: u128) {
        counter!("transfer_deposits_completed_total").increment(1);
        counter!("transfer_deposit_amount_wei_total").increment(saturating_u64(amount_wei));
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Withdrawal metrics
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn record_withdrawal_initiated(&self, amount_wei: u128) {
        counter!("transfer_withdrawals_initiated_total").increment(1);
        counter!("transfer_withdrawal_amount_wei_total").increment(saturating_u64(amount_wei));
    }

    pub fn record_withdrawal_proven(&self) {
        counter!("transfer_withdrawals_proven_total").increment(1);
    }

    pub fn record_withdrawal_finalized(&self) {
        counter!("transfer_withdrawals_finalized_total").increment(1);
    }
}

fn saturating_u64(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter() {
        let metrics = Metrics::new();
        metrics.record_step_success("deposit", "prepare", Duration::from_millis(5));
        metrics.record_step_failure("withdrawal", "prove", "not_yet_provable");
        metrics.record_deposit_completed(u128::MAX);
    }

    #[test]
    fn test_saturating_amount() {
        assert_eq!(saturating_u64(42), 42);
        assert_eq!(saturating_u64(u128::from(u64::MAX) + 1), u64::MAX);
    }
}
