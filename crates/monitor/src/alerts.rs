//! Alert thresholds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A metric that can carry an alert threshold.
///
/// Declaration order is the order alerts are evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Ceiling on errors per task
    ErrorCount,
    /// Floor on recoveries per error
    SuccessRate,
    /// Floor on recoveries per attempt
    RecoveryRate,
    /// Floor on validation passes per attempt
    ValidationRate,
    /// Ceiling on task duration in seconds
    Duration,
}

impl MetricKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::ErrorCount => "error_count",
            MetricKind::SuccessRate => "success_rate",
            MetricKind::RecoveryRate => "recovery_rate",
            MetricKind::ValidationRate => "validation_rate",
            MetricKind::Duration => "duration",
        }
    }

    /// Whether the threshold is an upper bound.
    pub fn is_ceiling(&self) -> bool {
        matches!(self, MetricKind::ErrorCount | MetricKind::Duration)
    }

    /// Whether `value` violates `threshold` for this kind.
    pub fn breached(&self, value: f64, threshold: f64) -> bool {
        if self.is_ceiling() {
            value > threshold
        } else {
            value < threshold
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds keyed by metric, e.g. `{"error_count": 2, "success_rate": 0.5}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertThresholds(BTreeMap<MetricKind, f64>);

impl AlertThresholds {
    /// No thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a threshold, replacing the previous one.
    pub fn set(&mut self, kind: MetricKind, threshold: f64) {
        self.0.insert(kind, threshold);
    }

    /// Builder form of [`AlertThresholds::set`].
    pub fn with(mut self, kind: MetricKind, threshold: f64) -> Self {
        self.set(kind, threshold);
        self
    }

    /// Threshold for a metric.
    pub fn get(&self, kind: MetricKind) -> Option<f64> {
        self.0.get(&kind).copied()
    }

    /// Thresholds in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, f64)> + '_ {
        self.0.iter().map(|(kind, threshold)| (*kind, *threshold))
    }

    /// No thresholds set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A threshold violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// Task that breached
    pub task_name: String,
    /// Metric that breached
    pub metric: MetricKind,
    /// Current value
    pub current_value: f64,
    /// Configured threshold
    pub threshold: f64,
}
