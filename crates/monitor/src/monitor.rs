//! Task monitor - aggregates metrics across pipeline phases.

use crate::alerts::{Alert, AlertThresholds, MetricKind};
use crate::metrics::{TaskMetrics, TaskSummary};
use indexmap::IndexMap;
use phasewatch_core::{Clock, ContextMap, SystemClock};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Number of error types listed as most common.
pub const TOP_ERROR_TYPES: usize = 5;

/// Error patterns across all tasks.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalPatterns {
    /// Sum over all error types
    pub total_errors: u64,
    /// Error type to count, in first-seen order
    pub error_types: IndexMap<String, u64>,
    /// Most frequent types, ties in first-seen order
    pub most_common_errors: Vec<(String, u64)>,
}

/// Monitors task execution patterns.
///
/// Every `record_*` call on a task that was never started is ignored.
pub struct TaskMonitor {
    clock: Arc<dyn Clock>,
    task_metrics: IndexMap<String, TaskMetrics>,
    global_patterns: IndexMap<String, u64>,
    alert_thresholds: AlertThresholds,
}

impl TaskMonitor {
    /// Create a monitor using the system clock and no thresholds.
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            task_metrics: IndexMap::new(),
            global_patterns: IndexMap::new(),
            alert_thresholds: AlertThresholds::default(),
        }
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Install a whole threshold set.
    pub fn with_thresholds(mut self, thresholds: AlertThresholds) -> Self {
        self.alert_thresholds = thresholds;
        self
    }

    /// Start monitoring a task.
    ///
    /// Restarting replaces the task's metrics with a fresh window; the
    /// global histogram keeps what was already counted.
    pub fn start_task(&mut self, task_name: &str) {
        let metrics = TaskMetrics::new(task_name, self.clock.now());
        if self.task_metrics.insert(task_name.to_string(), metrics).is_some() {
            debug!(task = %task_name, "Restarted task monitoring, previous metrics discarded");
        } else {
            debug!(task = %task_name, "Started task monitoring");
        }
    }

    /// End task monitoring.
    pub fn end_task(&mut self, task_name: &str) {
        let now = self.clock.now();
        if let Some(metrics) = self.task_metrics.get_mut(task_name) {
            metrics.end_time = Some(now);
            debug!(task = %task_name, duration_secs = ?metrics.duration_secs(), "Ended task monitoring");
        }
    }

    /// Record an error occurrence.
    pub fn record_error(&mut self, task_name: &str, error_type: &str, error_context: &ContextMap) {
        let Some(metrics) = self.task_metrics.get_mut(task_name) else {
            return;
        };
        metrics.error_count += 1;
        *metrics.error_patterns.entry(error_type.to_string()).or_insert(0) += 1;
        *self.global_patterns.entry(error_type.to_string()).or_insert(0) += 1;
        debug!(
            task = %task_name,
            error_type = %error_type,
            context_keys = error_context.len(),
            "Recorded error"
        );
    }

    /// Record a recovery attempt.
    pub fn record_recovery_attempt(&mut self, task_name: &str, successful: bool) {
        if let Some(metrics) = self.task_metrics.get_mut(task_name) {
            metrics.recovery_attempts += 1;
            if successful {
                metrics.successful_recoveries += 1;
            }
        }
    }

    /// Record a validation attempt.
    pub fn record_validation(&mut self, task_name: &str, passed: bool) {
        if let Some(metrics) = self.task_metrics.get_mut(task_name) {
            metrics.validation_attempts += 1;
            if passed {
                metrics.validation_passes += 1;
            }
        }
    }

    /// Record a task checkpoint, overwriting an earlier one of the same name.
    pub fn record_checkpoint(&mut self, task_name: &str, checkpoint_name: &str) {
        let now = self.clock.now();
        if let Some(metrics) = self.task_metrics.get_mut(task_name) {
            metrics.checkpoint_times.insert(checkpoint_name.to_string(), now);
        }
    }

    /// Raw metrics for a task.
    pub fn metrics(&self, task_name: &str) -> Option<&TaskMetrics> {
        self.task_metrics.get(task_name)
    }

    /// Summary metrics for a task, `None` if never started.
    pub fn get_task_summary(&self, task_name: &str) -> Option<TaskSummary> {
        self.task_metrics.get(task_name).map(TaskMetrics::summary)
    }

    /// Error patterns across all tasks.
    pub fn get_global_patterns(&self) -> GlobalPatterns {
        let mut most_common: Vec<(String, u64)> = self
            .global_patterns
            .iter()
            .map(|(error_type, count)| (error_type.clone(), *count))
            .collect();
        // Stable sort keeps first-seen order among equal counts.
        most_common.sort_by(|a, b| b.1.cmp(&a.1));
        most_common.truncate(TOP_ERROR_TYPES);

        GlobalPatterns {
            total_errors: self.global_patterns.values().sum(),
            error_types: self.global_patterns.clone(),
            most_common_errors: most_common,
        }
    }

    /// Set an alert threshold for a metric.
    pub fn set_alert_threshold(&mut self, metric: MetricKind, threshold: f64) {
        self.alert_thresholds.set(metric, threshold);
    }

    /// Current thresholds.
    pub fn alert_thresholds(&self) -> &AlertThresholds {
        &self.alert_thresholds
    }

    /// Check every task against every threshold.
    pub fn check_alerts(&self) -> Vec<Alert> {
        let mut alerts = Vec::new();
        for (task_name, metrics) in &self.task_metrics {
            for (metric, threshold) in self.alert_thresholds.iter() {
                let Some(current_value) = metrics.value(metric) else {
                    continue;
                };
                if metric.breached(current_value, threshold) {
                    warn!(
                        task = %task_name,
                        metric = %metric,
                        current_value,
                        threshold,
                        "Alert threshold breached"
                    );
                    alerts.push(Alert {
                        task_name: task_name.clone(),
                        metric,
                        current_value,
                        threshold,
                    });
                }
            }
        }
        alerts
    }
}

impl Default for TaskMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phasewatch_core::ManualClock;

    fn empty() -> ContextMap {
        ContextMap::new()
    }

    #[test]
    fn test_success_rate_scenario() {
        let mut monitor = TaskMonitor::new();
        monitor.start_task("X");
        for _ in 0..3 {
            monitor.record_error("X", "timeout", &empty());
        }
        monitor.record_recovery_attempt("X", true);

        let summary = monitor.get_task_summary("X").unwrap();
        assert_eq!(summary.error_count, 3);
        assert!((summary.success_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.error_patterns["timeout"], 3);
    }

    #[test]
    fn test_success_rate_is_one_without_errors() {
        let mut monitor = TaskMonitor::new();
        monitor.start_task("clean");
        monitor.record_recovery_attempt("clean", false);
        monitor.record_recovery_attempt("clean", true);
        assert_eq!(monitor.get_task_summary("clean").unwrap().success_rate, 1.0);
    }

    #[test]
    fn test_unknown_task_is_noop() {
        let mut monitor = TaskMonitor::new();
        monitor.record_error("ghost", "timeout", &empty());
        monitor.record_recovery_attempt("ghost", true);
        monitor.record_validation("ghost", false);
        monitor.record_checkpoint("ghost", "halfway");
        monitor.end_task("ghost");

        assert!(monitor.metrics("ghost").is_none());
        assert!(monitor.get_task_summary("ghost").is_none());
        assert_eq!(monitor.get_global_patterns().total_errors, 0);
    }

    #[test]
    fn test_restart_resets_metrics_but_not_global_patterns() {
        let mut monitor = TaskMonitor::new();
        monitor.start_task("X");
        monitor.record_error("X", "timeout", &empty());
        monitor.record_validation("X", true);
        monitor.start_task("X");

        let metrics = monitor.metrics("X").unwrap();
        assert_eq!(metrics.error_count, 0);
        assert_eq!(metrics.validation_attempts, 0);
        assert_eq!(monitor.get_global_patterns().total_errors, 1);
    }

    #[test]
    fn test_duration_and_checkpoints() {
        let clock = Arc::new(ManualClock::default());
        let mut monitor = TaskMonitor::new().with_clock(clock.clone());
        monitor.start_task("X");
        clock.advance_secs(5.0);
        monitor.record_checkpoint("X", "draft");
        clock.advance_secs(5.0);
        monitor.record_checkpoint("X", "review");
        clock.advance_secs(5.0);
        monitor.record_checkpoint("X", "draft");
        monitor.end_task("X");

        let summary = monitor.get_task_summary("X").unwrap();
        assert_eq!(summary.duration_secs, Some(15.0));
        let names: Vec<_> = summary.checkpoints.keys().cloned().collect();
        assert_eq!(names, vec!["draft", "review"]);
        assert_eq!(summary.checkpoints["draft"], clock.now());
    }

    #[test]
    fn test_validation_rate() {
        let mut monitor = TaskMonitor::new();
        monitor.start_task("X");
        monitor.record_validation("X", true);
        monitor.record_validation("X", false);
        monitor.record_validation("X", true);
        monitor.record_validation("X", true);
        assert_eq!(monitor.get_task_summary("X").unwrap().validation_rate, 0.75);
    }

    #[test]
    fn test_global_patterns_top_five_with_first_seen_ties() {
        let mut monitor = TaskMonitor::new();
        monitor.start_task("A");
        monitor.start_task("B");
        for error_type in ["parse", "timeout", "model", "io", "quota", "auth"] {
            monitor.record_error("A", error_type, &empty());
        }
        monitor.record_error("B", "auth", &empty());
        monitor.record_error("B", "quota", &empty());

        let patterns = monitor.get_global_patterns();
        assert_eq!(patterns.total_errors, 8);
        assert_eq!(patterns.error_types.len(), 6);
        let top: Vec<_> = patterns
            .most_common_errors
            .iter()
            .map(|(t, c)| (t.as_str(), *c))
            .collect();
        assert_eq!(
            top,
            vec![("quota", 2), ("auth", 2), ("parse", 1), ("timeout", 1), ("model", 1)]
        );
    }

    #[test]
    fn test_no_thresholds_no_alerts() {
        let mut monitor = TaskMonitor::new();
        monitor.start_task("Y");
        for _ in 0..10 {
            monitor.record_error("Y", "timeout", &empty());
        }
        assert!(monitor.check_alerts().is_empty());
    }

    #[test]
    fn test_error_count_alert_scenario() {
        let mut monitor = TaskMonitor::new();
        monitor.set_alert_threshold(MetricKind::ErrorCount, 2.0);
        monitor.start_task("Y");
        monitor.start_task("Z");
        for _ in 0..3 {
            monitor.record_error("Y", "timeout", &empty());
        }
        monitor.record_error("Z", "timeout", &empty());

        let alerts = monitor.check_alerts();
        assert_eq!(
            alerts,
            vec![Alert {
                task_name: "Y".into(),
                metric: MetricKind::ErrorCount,
                current_value: 3.0,
                threshold: 2.0,
            }]
        );
    }

    #[test]
    fn test_alert_kinds_are_additive() {
        let mut monitor = TaskMonitor::new().with_thresholds(
            AlertThresholds::new()
                .with(MetricKind::ErrorCount, 1.0)
                .with(MetricKind::SuccessRate, 0.5),
        );
        monitor.start_task("Y");
        monitor.record_error("Y", "timeout", &empty());
        monitor.record_error("Y", "timeout", &empty());
        monitor.record_recovery_attempt("Y", false);

        let alerts = monitor.check_alerts();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].metric, MetricKind::ErrorCount);
        assert_eq!(alerts[1].metric, MetricKind::SuccessRate);
        assert_eq!(alerts[1].current_value, 0.0);
    }

    #[test]
    fn test_duration_alert_needs_finished_task() {
        let clock = Arc::new(ManualClock::default());
        let mut monitor = TaskMonitor::new().with_clock(clock.clone());
        monitor.set_alert_threshold(MetricKind::Duration, 60.0);
        monitor.start_task("slow");
        clock.advance_secs(120.0);
        assert!(monitor.check_alerts().is_empty());

        monitor.end_task("slow");
        let alerts = monitor.check_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].current_value, 120.0);
    }

    #[test]
    fn test_summary_serializes() {
        let mut monitor = TaskMonitor::new();
        monitor.start_task("X");
        monitor.record_error("X", "timeout", &empty());
        let json = serde_json::to_value(monitor.get_task_summary("X").unwrap()).unwrap();
        assert_eq!(json["error_count"], 1);
        assert!(json["duration_secs"].is_null());
    }
}
