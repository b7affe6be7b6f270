//! Estimate-vs-actual duration report.

use crate::tracker::TaskTracker;
use serde::Serialize;
use std::fmt;

/// How an actual duration compares with its estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Deviation {
    /// Took longer than the tolerance band allows
    Over,
    /// Finished faster than the tolerance band allows
    Under,
    /// Within the tolerance band
    WithinTolerance,
}

impl Deviation {
    /// Whether the difference falls outside the tolerance band.
    pub fn is_significant(&self) -> bool {
        !matches!(self, Deviation::WithinTolerance)
    }
}

/// One completed task in the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    /// Task name
    pub task_name: String,
    /// Estimated seconds
    pub estimated: f64,
    /// Actual seconds
    pub actual: f64,
    /// `actual - estimated`
    pub difference: f64,
    /// Classification of the difference
    pub deviation: Deviation,
}

/// Aggregate over all completed tasks.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    /// Sum of estimates
    pub total_estimated: f64,
    /// Sum of actual durations
    pub total_actual: f64,
    /// `(total_estimated / total_actual - 1) * 100`
    pub estimation_accuracy: f64,
}

/// Timing report over a set of trackers.
#[derive(Debug, Clone, Serialize)]
pub struct DurationReport {
    /// Completed tasks in registration order
    pub entries: Vec<ReportEntry>,
    /// Absent when no completed task has a positive actual duration
    pub summary: Option<ReportSummary>,
}

impl DurationReport {
    /// Build a report from trackers; only those with an actual duration count.
    pub fn from_trackers<'a>(trackers: impl IntoIterator<Item = &'a TaskTracker>, tolerance: f64) -> Self {
        let mut entries = Vec::new();
        let mut total_estimated = 0.0;
        let mut total_actual = 0.0;

        for tracker in trackers {
            let Some(actual) = tracker.actual_duration() else {
                continue;
            };
            let estimated = tracker.estimated_duration;
            let difference = actual - estimated;
            let deviation = if difference.abs() <= estimated * tolerance {
                Deviation::WithinTolerance
            } else if difference > 0.0 {
                Deviation::Over
            } else {
                Deviation::Under
            };

            total_estimated += estimated;
            total_actual += actual;
            entries.push(ReportEntry {
                task_name: tracker.task_name.clone(),
                estimated,
                actual,
                difference,
                deviation,
            });
        }

        let summary = (total_actual > 0.0).then(|| ReportSummary {
            total_estimated,
            total_actual,
            estimation_accuracy: (total_estimated / total_actual - 1.0) * 100.0,
        });

        Self { entries, summary }
    }
}

impl fmt::Display for DurationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Task Duration Report")?;
        writeln!(f, "{}", "=".repeat(50))?;

        for entry in &self.entries {
            writeln!(f)?;
            writeln!(f, "Task: {}", entry.task_name)?;
            writeln!(f, "Estimated: {:.1}s", entry.estimated)?;
            writeln!(f, "Actual: {:.1}s", entry.actual)?;
            match entry.deviation {
                Deviation::WithinTolerance => writeln!(f, "Difference: {:+.1}s", entry.difference)?,
                Deviation::Over => writeln!(f, "Difference: {:+.1}s (over estimate)", entry.difference)?,
                Deviation::Under => writeln!(f, "Difference: {:+.1}s (under estimate)", entry.difference)?,
            }
        }

        if let Some(summary) = &self.summary {
            writeln!(f)?;
            writeln!(f, "Overall Summary")?;
            writeln!(f, "{}", "-".repeat(30))?;
            writeln!(f, "Total Estimated: {:.1}s", summary.total_estimated)?;
            writeln!(f, "Total Actual: {:.1}s", summary.total_actual)?;
            writeln!(f, "Estimation Accuracy: {:+.1}%", summary.estimation_accuracy)?;
        }

        Ok(())
    }
}
