//! Phasewatch CLI - phase progress, recovery and quality checks.

mod config;
mod console;
mod simulate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::EngineConfig;
use console::ConsoleSink;
use phasewatch_progress::{ProgressManager, ProjectEstimator};
use phasewatch_quality::{Direction, TaskValidator};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "phasewatch")]
#[command(about = "Phase progress tracking, error recovery and output validation", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate a project and print the phase breakdown
    Estimate {
        /// Project description
        description: String,
        /// Team members
        #[arg(long, default_value = "1")]
        team_size: u32,
    },
    /// Track phases live, each running for a fixed wall time
    Track {
        /// Project description
        description: String,
        /// Team members
        #[arg(long, default_value = "1")]
        team_size: u32,
        /// Wall time per phase in milliseconds
        #[arg(long, default_value = "2000")]
        phase_ms: u64,
        /// Progress refresh interval in milliseconds
        #[arg(long, default_value = "200")]
        tick_ms: u64,
    },
    /// Validate a JSON payload against the built-in rules
    Validate {
        /// Task type, e.g. requirements_spec
        #[arg(long)]
        task_type: String,
        /// Which rule set to apply
        #[arg(long, value_enum, default_value = "output")]
        direction: DirectionArg,
        /// JSON payload; plain text is treated as a string
        payload: String,
    },
    /// Run a full pipeline on a simulated clock and print what was observed
    Simulate {
        /// Project description
        description: String,
        /// Team members
        #[arg(long, default_value = "1")]
        team_size: u32,
        /// Phase that raises an error (repeatable)
        #[arg(long = "fail")]
        failing: Vec<String>,
        /// Failing phase whose recovery also fails (repeatable)
        #[arg(long)]
        unrecoverable: Vec<String>,
        /// Actual time as a fraction of the estimate
        #[arg(long, default_value = "1.0")]
        pace: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Input,
    Output,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Input => Direction::Input,
            DirectionArg::Output => Direction::Output,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref())?;
    let estimator = ProjectEstimator::new();

    match cli.command {
        Commands::Estimate { description, team_size } => {
            let estimate = estimator.estimate(&description, team_size);
            println!("Project: {} / {}", estimate.project_complexity.as_str(), estimate.tech_complexity.as_str());
            println!("Team: {} ({:.1}% efficiency)", estimate.team_size, estimate.team_efficiency);
            for phase in &estimate.phase_breakdown {
                println!("  {:<28} {:>4} min", phase.phase, phase.minutes);
            }
            println!("Total: {} min ({:.1} h)", estimate.total_minutes, estimate.total_hours);
        }
        Commands::Track { description, team_size, phase_ms, tick_ms } => {
            let estimate = estimator.estimate(&description, team_size);
            let mut manager = ProgressManager::new(Arc::new(ConsoleSink::new()))
                .with_config(config.progress.clone());
            estimate.register_phases(&mut manager)?;

            let phase_time = Duration::from_millis(phase_ms);
            let mut ticker = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
            for phase in &estimate.phase_breakdown {
                manager.start_task(&phase.phase);
                let deadline = tokio::time::Instant::now() + phase_time;
                while tokio::time::Instant::now() < deadline {
                    ticker.tick().await;
                    manager.update_progress();
                }
                manager.complete_task(&phase.phase);
            }

            info!("Tracked {} phases", estimate.phase_breakdown.len());
            println!("{}", manager.generate_report());
        }
        Commands::Validate { task_type, direction, payload } => {
            let data = parse_payload(&payload);
            let validator = TaskValidator::with_common_rules();
            let result = validator.validate(direction.into(), &task_type, &data);
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_valid {
                std::process::exit(1);
            }
        }
        Commands::Simulate { description, team_size, failing, unrecoverable, pace } => {
            let estimate = estimator.estimate(&description, team_size);
            let scenario = simulate::Scenario { failing, unrecoverable, pace };
            let report = simulate::run(&estimate, &description, &scenario, &config)
                .context("simulation failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// JSON when it parses, otherwise the raw text as a string.
fn parse_payload(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_payload() {
        assert_eq!(parse_payload(r#"{"feedback": []}"#)["feedback"], serde_json::json!([]));
        assert_eq!(parse_payload("plain words"), Value::String("plain words".into()));
    }

    #[test]
    fn test_simulate_args() {
        let cli = Cli::try_parse_from([
            "phasewatch", "simulate", "a web app", "--fail", "QA Strategy", "--fail", "DevOps Setup",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate { failing, pace, .. } => {
                assert_eq!(failing, vec!["QA Strategy", "DevOps Setup"]);
                assert_eq!(pace, 1.0);
            }
            _ => panic!("expected simulate"),
        }
    }
}
