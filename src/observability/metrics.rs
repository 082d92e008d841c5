//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define normalizer metrics (completed messages, anomalies, fatal errors)
//! - Optionally install a Prometheus recorder for the command line tool
//!
//! # Metrics
//! - `normalizer_transactions_total` (counter): messages completed, by direction
//! - `normalizer_anomalies_total` (counter): anomalies raised, by class
//! - `normalizer_fatal_errors_total` (counter): fatal errors, by direction and kind
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without a recorder every
//!   call is a no-op
//! - Anomalies are counted once per transaction, like the diagnostic log

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::connection::Direction;
use crate::error::NormalizerError;
use crate::http::flags::Anomaly;

/// Install a global Prometheus recorder and return a handle for rendering.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::debug!("metrics recorder installed");
    Ok(handle)
}

/// A direction finished one message.
pub fn record_message(direction: Direction) {
    ::metrics::counter!("normalizer_transactions_total", "direction" => direction.as_str())
        .increment(1);
}

/// An anomaly was raised on a transaction for the first time.
pub fn record_anomaly(anomaly: Anomaly) {
    ::metrics::counter!("normalizer_anomalies_total", "class" => anomaly.as_str()).increment(1);
}

/// A direction entered the error state.
pub fn record_fatal(direction: Direction, err: &NormalizerError) {
    ::metrics::counter!(
        "normalizer_fatal_errors_total",
        "direction" => direction.as_str(),
        "kind" => err.kind()
    )
    .increment(1);
}
