//! Timing for a single task.

use phasewatch_core::{seconds_between, Time};
use serde::Serialize;

/// Progress never reaches 100% before an explicit completion.
pub const DEFAULT_PROGRESS_CAP: f64 = 0.95;

/// Tracks the execution time and progress of a single task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskTracker {
    /// Name of the task being tracked
    pub task_name: String,

    /// Expected duration in seconds
    pub estimated_duration: f64,

    start_time: Option<Time>,
    end_time: Option<Time>,
    actual_duration: Option<f64>,
}

impl TaskTracker {
    /// Create an unstarted tracker.
    pub fn new(task_name: impl Into<String>, estimated_duration: f64) -> Self {
        Self {
            task_name: task_name.into(),
            estimated_duration,
            start_time: None,
            end_time: None,
            actual_duration: None,
        }
    }

    /// When the task started.
    pub fn start_time(&self) -> Option<Time> {
        self.start_time
    }

    /// When the task completed.
    pub fn end_time(&self) -> Option<Time> {
        self.end_time
    }

    /// Seconds between start and completion, once both are known.
    pub fn actual_duration(&self) -> Option<f64> {
        self.actual_duration
    }

    /// Stamp the start time.
    ///
    /// Returns `false` when the tracker has already completed; a finished
    /// tracker keeps its timestamps.
    pub fn start(&mut self, now: Time) -> bool {
        if self.end_time.is_some() {
            return false;
        }
        self.start_time = Some(now);
        true
    }

    /// Stamp the end time and fix the actual duration.
    ///
    /// Returns `false` without touching anything if the tracker was never
    /// started or has already completed.
    pub fn complete(&mut self, now: Time) -> bool {
        let Some(start) = self.start_time else {
            return false;
        };
        if self.end_time.is_some() {
            return false;
        }
        let end = now.max(start);
        self.end_time = Some(end);
        self.actual_duration = Some(seconds_between(start, end));
        true
    }

    /// Started and not yet completed.
    pub fn is_running(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_none()
    }

    /// Whether completion has been recorded.
    pub fn is_completed(&self) -> bool {
        self.end_time.is_some()
    }

    /// Progress fraction at `now`, capped at [`DEFAULT_PROGRESS_CAP`].
    pub fn progress(&self, now: Time) -> f64 {
        self.progress_with_cap(now, DEFAULT_PROGRESS_CAP)
    }

    /// Progress fraction at `now`.
    ///
    /// 0.0 before start, 1.0 after completion, otherwise elapsed over
    /// estimate saturating at `cap`.
    pub fn progress_with_cap(&self, now: Time, cap: f64) -> f64 {
        let Some(start) = self.start_time else {
            return 0.0;
        };
        if self.end_time.is_some() {
            return 1.0;
        }
        if self.estimated_duration <= 0.0 {
            return cap;
        }
        let elapsed = seconds_between(start, now).max(0.0);
        (elapsed / self.estimated_duration).min(cap)
    }
}
