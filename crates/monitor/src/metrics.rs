//! Metrics for a single task.

use crate::alerts::MetricKind;
use indexmap::IndexMap;
use phasewatch_core::{seconds_between, Time};
use serde::Serialize;

/// Metrics for a specific task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskMetrics {
    /// Task name
    pub task_name: String,
    /// When monitoring started
    pub start_time: Option<Time>,
    /// When monitoring ended
    pub end_time: Option<Time>,
    /// Errors recorded
    pub error_count: u64,
    /// Recovery attempts recorded
    pub recovery_attempts: u64,
    /// Recovery attempts that succeeded
    pub successful_recoveries: u64,
    /// Validations recorded
    pub validation_attempts: u64,
    /// Validations that passed
    pub validation_passes: u64,
    /// Checkpoint name to last time reached, in first-reached order
    pub checkpoint_times: IndexMap<String, Time>,
    /// Error type to count, in first-seen order
    pub error_patterns: IndexMap<String, u64>,
}

impl TaskMetrics {
    /// Fresh metrics starting at `start_time`.
    pub fn new(task_name: impl Into<String>, start_time: Time) -> Self {
        Self {
            task_name: task_name.into(),
            start_time: Some(start_time),
            end_time: None,
            error_count: 0,
            recovery_attempts: 0,
            successful_recoveries: 0,
            validation_attempts: 0,
            validation_passes: 0,
            checkpoint_times: IndexMap::new(),
            error_patterns: IndexMap::new(),
        }
    }

    /// Task duration, once both ends are known.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.end_time? - self.start_time?)
    }

    /// Task duration in seconds.
    pub fn duration_secs(&self) -> Option<f64> {
        Some(seconds_between(self.start_time?, self.end_time?))
    }

    /// Successful recoveries per error; 1.0 with no errors.
    pub fn success_rate(&self) -> f64 {
        ratio(self.successful_recoveries, self.error_count)
    }

    /// Successful recoveries per attempt; 1.0 with no attempts.
    pub fn recovery_rate(&self) -> f64 {
        ratio(self.successful_recoveries, self.recovery_attempts)
    }

    /// Passed validations per attempt; 1.0 with no attempts.
    pub fn validation_success_rate(&self) -> f64 {
        ratio(self.validation_passes, self.validation_attempts)
    }

    /// Current value of a metric, `None` when undefined.
    pub fn value(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::ErrorCount => Some(self.error_count as f64),
            MetricKind::SuccessRate => Some(self.success_rate()),
            MetricKind::RecoveryRate => Some(self.recovery_rate()),
            MetricKind::ValidationRate => Some(self.validation_success_rate()),
            MetricKind::Duration => self.duration_secs(),
        }
    }

    /// Summary view.
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            duration_secs: self.duration_secs(),
            error_count: self.error_count,
            success_rate: self.success_rate(),
            validation_rate: self.validation_success_rate(),
            checkpoints: self.checkpoint_times.clone(),
            error_patterns: self.error_patterns.clone(),
        }
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        1.0
    } else {
        part as f64 / whole as f64
    }
}

/// Summary metrics for a task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    /// Seconds from start to end
    pub duration_secs: Option<f64>,
    /// Errors recorded
    pub error_count: u64,
    /// See [`TaskMetrics::success_rate`]
    pub success_rate: f64,
    /// See [`TaskMetrics::validation_success_rate`]
    pub validation_rate: f64,
    /// Checkpoint times
    pub checkpoints: IndexMap<String, Time>,
    /// Per-task error histogram
    pub error_patterns: IndexMap<String, u64>,
}
