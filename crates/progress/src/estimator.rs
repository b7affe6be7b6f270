//! Project time estimation.
//!
//! Classifies a free-text project description by size and technology
//! level, then scales a fixed table of per-phase base times.

use crate::manager::{ProgressError, ProgressManager};
use serde::Serialize;

/// Base phase times in minutes, in pipeline order.
const BASE_PHASE_TIMES: &[(&str, f64)] = &[
    ("Requirements Analysis", 30.0),
    ("Product Backlog Creation", 45.0),
    ("System Architecture Design", 60.0),
    ("UI/UX Design", 45.0),
    ("Development Planning", 60.0),
    ("QA Strategy", 30.0),
    ("DevOps Setup", 45.0),
    ("Technical Documentation", 30.0),
    ("User Documentation", 30.0),
];

/// Phases that get shorter with more people.
const TEAM_SCALED_PHASES: &[&str] = &[
    "Development Planning",
    "System Architecture Design",
    "QA Strategy",
];

/// Project size classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectSize {
    /// Simple projects
    Small,
    /// Standard projects
    Medium,
    /// Complex projects
    Large,
    /// Large-scale enterprise projects
    Enterprise,
}

impl ProjectSize {
    /// Duration multiplier.
    pub fn multiplier(&self) -> f64 {
        match self {
            ProjectSize::Small => 0.7,
            ProjectSize::Medium => 1.0,
            ProjectSize::Large => 1.5,
            ProjectSize::Enterprise => 2.0,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectSize::Small => "small",
            ProjectSize::Medium => "medium",
            ProjectSize::Large => "large",
            ProjectSize::Enterprise => "enterprise",
        }
    }

    // Checked in this order; the first hit wins.
    fn indicators() -> [(ProjectSize, &'static [&'static str]); 4] {
        [
            (ProjectSize::Enterprise, &["enterprise", "large-scale", "multi-team", "corporate"]),
            (ProjectSize::Large, &["complex", "distributed", "scalable", "high-availability"]),
            (ProjectSize::Medium, &["web application", "database", "api", "authentication"]),
            (ProjectSize::Small, &["script", "simple", "basic", "single-user"]),
        ]
    }
}

/// Technology stack classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TechLevel {
    /// Single technology
    Simple,
    /// Common stack
    Standard,
    /// Multiple technologies
    Complex,
    /// Microservices, ML and the like
    Advanced,
}

impl TechLevel {
    /// Duration multiplier.
    pub fn multiplier(&self) -> f64 {
        match self {
            TechLevel::Simple => 0.8,
            TechLevel::Standard => 1.0,
            TechLevel::Complex => 1.3,
            TechLevel::Advanced => 1.6,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TechLevel::Simple => "simple",
            TechLevel::Standard => "standard",
            TechLevel::Complex => "complex",
            TechLevel::Advanced => "advanced",
        }
    }

    fn indicators() -> [(TechLevel, &'static [&'static str]); 4] {
        [
            (TechLevel::Advanced, &["machine learning", "ai", "microservices", "kubernetes", "distributed"]),
            (TechLevel::Complex, &["full-stack", "real-time", "react", "angular", "cloud"]),
            (TechLevel::Standard, &["database", "api", "authentication", "crud"]),
            (TechLevel::Simple, &["script", "basic", "command-line", "single-file"]),
        ]
    }
}

/// Estimated minutes for one phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseEstimate {
    /// Phase name
    pub phase: String,
    /// Whole minutes
    pub minutes: u32,
}

/// Result of estimating a project.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectEstimate {
    /// Sum of phase minutes
    pub total_minutes: u32,
    /// Total hours, one decimal
    pub total_hours: f64,
    /// Per-phase breakdown in pipeline order
    pub phase_breakdown: Vec<PhaseEstimate>,
    /// Size classification
    pub project_complexity: ProjectSize,
    /// Tech classification
    pub tech_complexity: TechLevel,
    /// Team members
    pub team_size: u32,
    /// Team factor as a percentage
    pub team_efficiency: f64,
}

impl ProjectEstimate {
    /// Add every phase to `manager` with its estimate converted to seconds.
    pub fn register_phases(&self, manager: &mut ProgressManager) -> Result<(), ProgressError> {
        for phase in &self.phase_breakdown {
            // A phase can round down to zero minutes; keep it trackable.
            let seconds = f64::from(phase.minutes.max(1)) * 60.0;
            manager.add_task(phase.phase.clone(), seconds)?;
        }
        Ok(())
    }
}

/// Project time estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectEstimator;

impl ProjectEstimator {
    /// Create a new estimator.
    pub fn new() -> Self {
        Self
    }

    /// Classify a description into size and tech level.
    pub fn analyze_complexity(&self, description: &str) -> (ProjectSize, TechLevel) {
        let text = description.to_lowercase();
        let size = ProjectSize::indicators()
            .into_iter()
            .find(|(_, words)| words.iter().any(|w| text.contains(w)))
            .map(|(size, _)| size)
            .unwrap_or(ProjectSize::Medium);
        let tech = TechLevel::indicators()
            .into_iter()
            .find(|(_, words)| words.iter().any(|w| text.contains(w)))
            .map(|(tech, _)| tech)
            .unwrap_or(TechLevel::Standard);
        (size, tech)
    }

    /// Team efficiency factor, with diminishing returns past three people.
    pub fn team_factor(team_size: u32) -> f64 {
        if team_size <= 1 {
            1.0
        } else {
            1.0 + 0.2 * f64::from((team_size - 1).min(2))
        }
    }

    /// Estimate a project from its description and team size.
    pub fn estimate(&self, description: &str, team_size: u32) -> ProjectEstimate {
        let (size, tech) = self.analyze_complexity(description);
        let team_factor = Self::team_factor(team_size);

        let mut phase_breakdown = Vec::with_capacity(BASE_PHASE_TIMES.len());
        let mut total_minutes = 0;
        for &(phase, base) in BASE_PHASE_TIMES {
            let mut adjusted = base * size.multiplier() * tech.multiplier();
            if TEAM_SCALED_PHASES.contains(&phase) {
                adjusted /= team_factor;
            }
            let minutes = round_half_even(adjusted) as u32;
            total_minutes += minutes;
            phase_breakdown.push(PhaseEstimate {
                phase: phase.to_string(),
                minutes,
            });
        }

        tracing::debug!(
            size = size.as_str(),
            tech = tech.as_str(),
            team_size,
            total_minutes,
            "Estimated project"
        );

        ProjectEstimate {
            total_minutes,
            total_hours: round_half_even(f64::from(total_minutes) / 60.0 * 10.0) / 10.0,
            phase_breakdown,
            project_complexity: size,
            tech_complexity: tech,
            team_size,
            team_efficiency: (team_factor * 1000.0).round() / 10.0,
        }
    }
}

/// Banker's rounding, so 52.5 minutes becomes 52.
fn round_half_even(value: f64) -> f64 {
    let rounded = value.round();
    if (value - value.trunc()).abs() == 0.5 && rounded % 2.0 != 0.0 {
        rounded - value.signum()
    } else {
        rounded
    }
}
