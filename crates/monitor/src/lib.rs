//! Task Monitoring
//!
//! Per-task counters, cross-task error patterns, and threshold alerts.

#![warn(missing_docs)]

mod metrics;
mod alerts;
mod monitor;

pub use metrics::{TaskMetrics, TaskSummary};
pub use alerts::{Alert, AlertThresholds, MetricKind};
pub use monitor::{GlobalPatterns, TaskMonitor, TOP_ERROR_TYPES};
