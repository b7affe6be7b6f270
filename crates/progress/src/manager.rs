//! Progress manager - a registry of named trackers bound to a sink.

use crate::report::DurationReport;
use crate::sink::{ProgressSink, SinkError, SinkHandle};
use crate::tracker::{TaskTracker, DEFAULT_PROGRESS_CAP};
use indexmap::IndexMap;
use phasewatch_core::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Sink rows are sized in percent.
const SINK_TOTAL: f64 = 100.0;

/// Errors from progress registration.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// Estimates must be positive, finite seconds
    #[error("invalid estimate for {task}: {seconds}s (must be positive)")]
    InvalidEstimate {
        /// Task name
        task: String,
        /// Rejected estimate
        seconds: f64,
    },
}

/// Configuration for progress tracking and reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Highest fraction reported before explicit completion
    pub progress_cap: f64,
    /// Relative deviation from the estimate still considered on target
    pub tolerance: f64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            progress_cap: DEFAULT_PROGRESS_CAP,
            tolerance: 0.10,
        }
    }
}

/// Manages progress tracking for multiple named tasks.
///
/// Unknown names passed to `start_task`/`complete_task` are ignored.
pub struct ProgressManager {
    sink: Arc<dyn ProgressSink>,
    clock: Arc<dyn Clock>,
    config: ProgressConfig,
    tasks: IndexMap<String, (SinkHandle, TaskTracker)>,
    current_phase: Option<String>,
    next_handle: u64,
}

impl ProgressManager {
    /// Create a manager reporting to `sink`, using the system clock.
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            sink,
            clock: Arc::new(SystemClock),
            config: ProgressConfig::default(),
            tasks: IndexMap::new(),
            current_phase: None,
            next_handle: 0,
        }
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: ProgressConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a task with its estimated duration in seconds.
    ///
    /// Re-adding an existing name replaces its tracker.
    pub fn add_task(
        &mut self,
        description: impl Into<String>,
        estimated_duration: f64,
    ) -> Result<String, ProgressError> {
        let description = description.into();
        if !estimated_duration.is_finite() || estimated_duration <= 0.0 {
            return Err(ProgressError::InvalidEstimate {
                task: description,
                seconds: estimated_duration,
            });
        }

        let handle = SinkHandle(self.next_handle);
        self.next_handle += 1;
        self.push(self.sink.register(handle, &description, SINK_TOTAL));

        let tracker = TaskTracker::new(description.clone(), estimated_duration);
        if self.tasks.insert(description.clone(), (handle, tracker)).is_some() {
            debug!(task = %description, "Replaced existing tracker");
        } else {
            debug!(task = %description, estimated_duration, "Added task");
        }
        Ok(description)
    }

    /// Start tracking a task and make it the current phase.
    pub fn start_task(&mut self, description: &str) {
        let now = self.clock.now();
        let Some((handle, tracker)) = self.tasks.get_mut(description) else {
            debug!(task = %description, "Ignoring start of unknown task");
            return;
        };
        if !tracker.start(now) {
            debug!(task = %description, "Ignoring start of completed task");
            return;
        }
        let handle = *handle;
        self.push(self.sink.start(handle));
        self.current_phase = Some(description.to_string());
        debug!(task = %description, "Started task");
    }

    /// Mark a task as completed.
    pub fn complete_task(&mut self, description: &str) {
        let now = self.clock.now();
        let Some((handle, tracker)) = self.tasks.get_mut(description) else {
            debug!(task = %description, "Ignoring completion of unknown task");
            return;
        };
        if !tracker.complete(now) {
            debug!(task = %description, "Ignoring completion of task that is not running");
            return;
        }
        let handle = *handle;
        let actual = tracker.actual_duration();
        self.push(self.sink.update(handle, SINK_TOTAL));
        debug!(task = %description, actual_duration = ?actual, "Completed task");
    }

    /// Push the current percentage of every running task to the sink.
    pub fn update_progress(&self) {
        let now = self.clock.now();
        for (handle, tracker) in self.tasks.values() {
            if tracker.is_running() {
                let percent = tracker.progress_with_cap(now, self.config.progress_cap) * SINK_TOTAL;
                self.push(self.sink.update(*handle, percent));
            }
        }
    }

    /// Current progress fraction of a task, `None` if unknown.
    pub fn progress(&self, description: &str) -> Option<f64> {
        let (_, tracker) = self.tasks.get(description)?;
        Some(tracker.progress_with_cap(self.clock.now(), self.config.progress_cap))
    }

    /// Get a tracker by name.
    pub fn tracker(&self, description: &str) -> Option<&TaskTracker> {
        self.tasks.get(description).map(|(_, tracker)| tracker)
    }

    /// Sink handle assigned to a task.
    pub fn handle(&self, description: &str) -> Option<SinkHandle> {
        self.tasks.get(description).map(|(handle, _)| *handle)
    }

    /// All trackers in registration order.
    pub fn trackers(&self) -> impl Iterator<Item = &TaskTracker> {
        self.tasks.values().map(|(_, tracker)| tracker)
    }

    /// The most recently started task.
    pub fn current_phase(&self) -> Option<&str> {
        self.current_phase.as_deref()
    }

    /// Estimated vs. actual durations of every completed task.
    pub fn generate_report(&self) -> DurationReport {
        DurationReport::from_trackers(self.trackers(), self.config.tolerance)
    }

    fn push(&self, result: Result<(), SinkError>) {
        if let Err(e) = result {
            warn!(error = %e, "Progress sink update failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{RecordingSink, SinkEvent};
    use phasewatch_core::ManualClock;

    fn manager() -> (ProgressManager, Arc<ManualClock>, RecordingSink) {
        let clock = Arc::new(ManualClock::default());
        let sink = RecordingSink::new();
        let mgr = ProgressManager::new(Arc::new(sink.clone())).with_clock(clock.clone());
        (mgr, clock, sink)
    }

    struct FailingSink;

    impl ProgressSink for FailingSink {
        fn register(&self, _: SinkHandle, _: &str, _: f64) -> Result<(), SinkError> {
            Err(SinkError::Other("terminal gone".into()))
        }
        fn start(&self, handle: SinkHandle) -> Result<(), SinkError> {
            Err(SinkError::UnknownHandle(handle))
        }
        fn update(&self, _: SinkHandle, _: f64) -> Result<(), SinkError> {
            Err(SinkError::Poisoned)
        }
    }

    #[test]
    fn test_build_scenario() {
        let (mut mgr, clock, sink) = manager();
        mgr.add_task("Build", 10.0).unwrap();
        assert_eq!(mgr.progress("Build"), Some(0.0));

        mgr.start_task("Build");
        clock.advance_secs(3.0);
        let p = mgr.progress("Build").unwrap();
        assert!((p - 0.3).abs() < 0.05);

        mgr.complete_task("Build");
        assert_eq!(mgr.progress("Build"), Some(1.0));
        let actual = mgr.tracker("Build").unwrap().actual_duration().unwrap();
        assert!((actual - 3.0).abs() < 0.2);

        let handle = mgr.handle("Build").unwrap();
        assert_eq!(sink.last_update(handle), Some(100.0));
    }

    #[test]
    fn test_invalid_estimate_rejected() {
        let (mut mgr, _, _) = manager();
        assert!(matches!(
            mgr.add_task("Build", 0.0),
            Err(ProgressError::InvalidEstimate { .. })
        ));
        assert!(mgr.add_task("Build", -5.0).is_err());
        assert!(mgr.add_task("Build", f64::NAN).is_err());
        assert!(mgr.tracker("Build").is_none());
    }

    #[test]
    fn test_unknown_names_are_noops() {
        let (mut mgr, _, sink) = manager();
        mgr.start_task("Ghost");
        mgr.complete_task("Ghost");
        assert!(mgr.current_phase().is_none());
        assert!(mgr.progress("Ghost").is_none());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_complete_before_start_leaves_duration_unset() {
        let (mut mgr, _, _) = manager();
        mgr.add_task("Deploy", 5.0).unwrap();
        mgr.complete_task("Deploy");
        assert!(mgr.tracker("Deploy").unwrap().actual_duration().is_none());
        assert_eq!(mgr.progress("Deploy"), Some(0.0));
    }

    #[test]
    fn test_readd_replaces_tracker() {
        let (mut mgr, clock, _) = manager();
        mgr.add_task("Build", 10.0).unwrap();
        mgr.add_task("Test", 10.0).unwrap();
        mgr.start_task("Build");
        clock.advance_secs(2.0);
        mgr.add_task("Build", 20.0).unwrap();

        let tracker = mgr.tracker("Build").unwrap();
        assert_eq!(tracker.estimated_duration, 20.0);
        assert!(tracker.start_time().is_none());
        let names: Vec<_> = mgr.trackers().map(|t| t.task_name.as_str()).collect();
        assert_eq!(names, vec!["Build", "Test"]);
    }

    #[test]
    fn test_current_phase_follows_last_start() {
        let (mut mgr, _, _) = manager();
        mgr.add_task("Design", 10.0).unwrap();
        mgr.add_task("Build", 10.0).unwrap();
        mgr.start_task("Design");
        mgr.start_task("Build");
        mgr.complete_task("Build");
        assert_eq!(mgr.current_phase(), Some("Build"));
    }

    #[test]
    fn test_update_progress_only_touches_running_tasks() {
        let (mut mgr, clock, sink) = manager();
        mgr.add_task("Design", 10.0).unwrap();
        mgr.add_task("Build", 10.0).unwrap();
        mgr.start_task("Design");
        clock.advance_secs(5.0);
        mgr.update_progress();

        let design = mgr.handle("Design").unwrap();
        let build = mgr.handle("Build").unwrap();
        let percent = sink.last_update(design).unwrap();
        assert!((percent - 50.0).abs() < 1e-6);
        assert_eq!(sink.last_update(build), None);
        assert!(sink.events().contains(&SinkEvent::Started(design)));
    }

    #[test]
    fn test_sink_failures_are_swallowed() {
        let clock = Arc::new(ManualClock::default());
        let mut mgr = ProgressManager::new(Arc::new(FailingSink)).with_clock(clock.clone());
        mgr.add_task("Build", 4.0).unwrap();
        mgr.start_task("Build");
        clock.advance_secs(1.0);
        mgr.update_progress();
        mgr.complete_task("Build");
        assert_eq!(mgr.tracker("Build").unwrap().actual_duration(), Some(1.0));
    }

    #[test]
    fn test_config_cap_applies() {
        let (mgr, clock, _) = manager();
        let mut mgr = mgr.with_config(ProgressConfig {
            progress_cap: 0.5,
            ..Default::default()
        });
        mgr.add_task("Build", 1.0).unwrap();
        mgr.start_task("Build");
        clock.advance_secs(10.0);
        assert_eq!(mgr.progress("Build"), Some(0.5));
    }
}
