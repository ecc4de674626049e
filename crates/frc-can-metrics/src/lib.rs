//! Metrics infrastructure for the FRC CAN device core.
//!
//! This crate declares every metric the device core emits as a structured
//! [`Metric`] constant and re-exports the `metrics` crate. Installing a
//! recorder is the host's job; without one, recording is a no-op.
//!
//! # Example
//!
//! ```rust,ignore
//! use frc_can_metrics::{describe_metrics, metric_defs, MetricLabels};
//!
//! describe_metrics();
//!
//! let labels = MetricLabels::new(10, 8, 1);
//! metrics::counter!(metric_defs::FRAMES_RECEIVED.name, labels.to_labels().as_slice()).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A gauge that can go up and down.
    Gauge,
    /// A histogram for recording distributions.
    Histogram,
}

impl MetricKind {
    /// Returns the kind as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// ```rust
/// use frc_can_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const FRAMES: Metric = Metric::counter("frc_can.frames")
///     .with_description("Frames seen")
///     .with_unit(Unit::Count)
///     .with_labels(&["device_number"]);
///
/// assert_eq!(FRAMES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "frc_can.rx.frames").
    pub name: &'static str,
    /// The kind of metric (counter, gauge, histogram).
    pub kind: MetricKind,
    /// Human-readable description of the metric.
    pub description: &'static str,
    /// The unit of measurement (optional).
    pub unit: Option<Unit>,
    /// Expected label keys for this metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    /// Creates a new counter metric with the given name.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Creates a new gauge metric with the given name.
    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    /// Creates a new histogram metric with the given name.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Sets the description for the metric.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit for the metric.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys for the metric.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the metrics recorder.
    ///
    /// This should be called once at startup for each metric.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Gauge, Some(unit)) => {
                describe_gauge!(self.name, unit, self.description);
            }
            (MetricKind::Gauge, None) => {
                describe_gauge!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// All metric definitions for the device core.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Labels present on every device-scoped metric.
    pub const DEVICE_LABELS: &[&str] = &["device_type", "manufacturer", "device_number"];

    /// Labels for per-category breakdown.
    pub const CATEGORY_LABELS: &[&str] =
        &["device_type", "manufacturer", "device_number", "category"];

    // ========================================================================
    // Receive Path
    // ========================================================================

    /// Frames pulled from the transport.
    pub const FRAMES_RECEIVED: Metric = Metric::counter("frc_can.rx.frames")
        .with_description("Frames received from the transport")
        .with_unit(Unit::Count)
        .with_labels(DEVICE_LABELS);

    /// Frames dropped because they failed classification.
    pub const FRAMES_DROPPED: Metric = Metric::counter("frc_can.rx.dropped")
        .with_description("Malformed frames dropped before dispatch")
        .with_unit(Unit::Count)
        .with_labels(DEVICE_LABELS);

    /// Messages delivered to a registered handler.
    pub const MESSAGES_HANDLED: Metric = Metric::counter("frc_can.dispatch.handled")
        .with_description("Messages delivered to a registered handler")
        .with_unit(Unit::Count)
        .with_labels(CATEGORY_LABELS);

    /// Messages with no registered handler.
    pub const MESSAGES_UNHANDLED: Metric = Metric::counter("frc_can.dispatch.unhandled")
        .with_description("Messages with no registered handler")
        .with_unit(Unit::Count)
        .with_labels(CATEGORY_LABELS);

    /// Handler invocations that returned an error.
    pub const HANDLER_FAILURES: Metric = Metric::counter("frc_can.dispatch.handler_failures")
        .with_description("Handler invocations that returned an error")
        .with_unit(Unit::Count)
        .with_labels(CATEGORY_LABELS);

    // ========================================================================
    // Transmit Path
    // ========================================================================

    /// Frames handed to the transport.
    pub const FRAMES_SENT: Metric = Metric::counter("frc_can.tx.frames")
        .with_description("Frames handed to the transport")
        .with_unit(Unit::Count)
        .with_labels(DEVICE_LABELS);

    /// Frames the transport refused.
    pub const SEND_FAILURES: Metric = Metric::counter("frc_can.tx.failures")
        .with_description("Frames the transport refused")
        .with_unit(Unit::Count)
        .with_labels(DEVICE_LABELS);

    // ========================================================================
    // Liveness
    // ========================================================================

    /// Enabled/disabled transitions.
    pub const STATUS_TRANSITIONS: Metric = Metric::counter("frc_can.watchdog.transitions")
        .with_description("Enabled/disabled transitions")
        .with_unit(Unit::Count)
        .with_labels(&["device_type", "manufacturer", "device_number", "to"]);

    /// Disables caused by a stale heartbeat.
    pub const HEARTBEAT_TIMEOUTS: Metric = Metric::counter("frc_can.watchdog.timeouts")
        .with_description("Disables caused by a stale heartbeat")
        .with_unit(Unit::Count)
        .with_labels(DEVICE_LABELS);

    /// 1 while the device is enabled, 0 otherwise.
    pub const ENABLED: Metric = Metric::gauge("frc_can.watchdog.enabled")
        .with_description("1 while the device is enabled, 0 otherwise")
        .with_labels(DEVICE_LABELS);

    /// Time between consecutive heartbeats.
    pub const HEARTBEAT_INTERVAL: Metric = Metric::histogram("frc_can.watchdog.heartbeat_interval_ms")
        .with_description("Time between consecutive heartbeats in milliseconds")
        .with_unit(Unit::Milliseconds)
        .with_labels(DEVICE_LABELS);

    /// Returns a slice of all defined metrics.
    pub const ALL: &[&Metric] = &[
        // Receive Path
        &FRAMES_RECEIVED,
        &FRAMES_DROPPED,
        &MESSAGES_HANDLED,
        &MESSAGES_UNHANDLED,
        &HANDLER_FAILURES,
        // Transmit Path
        &FRAMES_SENT,
        &SEND_FAILURES,
        // Liveness
        &STATUS_TRANSITIONS,
        &HEARTBEAT_TIMEOUTS,
        &ENABLED,
        &HEARTBEAT_INTERVAL,
    ];
}

/// Metric labels identifying a device by its bus address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricLabels {
    /// Device type code.
    pub device_type: u8,
    /// Manufacturer code.
    pub manufacturer: u8,
    /// Device number.
    pub device_number: u8,
}

impl MetricLabels {
    /// Creates labels for a device address.
    pub fn new(device_type: u8, manufacturer: u8, device_number: u8) -> Self {
        Self {
            device_type,
            manufacturer,
            device_number,
        }
    }

    /// Converts the labels to the metrics crate label format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("device_type", self.device_type.to_string()),
            ("manufacturer", self.manufacturer.to_string()),
            ("device_number", self.device_number.to_string()),
        ]
    }

    /// Returns labels with additional key-value pairs.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }
}

/// Describes all metrics used by the device core.
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_labels() {
        let labels = MetricLabels::new(10, 8, 1);
        let label_vec = labels.to_labels();

        assert_eq!(label_vec.len(), 3);
        assert!(label_vec.contains(&("device_type", "10".to_string())));
        assert!(label_vec.contains(&("manufacturer", "8".to_string())));
        assert!(label_vec.contains(&("device_number", "1".to_string())));
    }

    #[test]
    fn test_with_extra_labels() {
        let labels = MetricLabels::new(10, 8, 1);
        let extended = labels.with(&[("category", "device".to_string())]);

        assert_eq!(extended.len(), 4);
        assert!(extended.contains(&("category", "device".to_string())));
    }

    #[test]
    fn test_metric_definitions() {
        assert_eq!(metric_defs::FRAMES_RECEIVED.name, "frc_can.rx.frames");
        assert_eq!(metric_defs::FRAMES_RECEIVED.kind, MetricKind::Counter);
        assert_eq!(metric_defs::ENABLED.kind, MetricKind::Gauge);
        assert_eq!(metric_defs::HEARTBEAT_INTERVAL.kind, MetricKind::Histogram);
        assert_eq!(
            metric_defs::HEARTBEAT_INTERVAL.unit,
            Some(Unit::Milliseconds)
        );
        assert_eq!(metric_defs::MESSAGES_UNHANDLED.labels, metric_defs::CATEGORY_LABELS);
    }

    #[test]
    fn test_all_metrics_count() {
        assert_eq!(metric_defs::ALL.len(), 11);
    }

    #[test]
    fn test_metric_minimal() {
        const MINIMAL: Metric = Metric::counter("minimal");

        assert_eq!(MINIMAL.name, "minimal");
        assert_eq!(MINIMAL.kind, MetricKind::Counter);
        assert_eq!(MINIMAL.description, "");
        assert_eq!(MINIMAL.unit, None);
        assert_eq!(MINIMAL.labels, &[] as &[&str]);
    }

    #[test]
    fn test_describe_without_recorder() {
        describe_metrics();
    }
}
