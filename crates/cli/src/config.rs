//! Driver configuration.

use anyhow::{Context, Result};
use phasewatch_monitor::AlertThresholds;
use phasewatch_progress::ProgressConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything the driver can configure, loaded from a JSON file.
///
/// ```json
/// { "progress": { "progress_cap": 0.95, "tolerance": 0.1 },
///   "alerts": { "error_count": 2, "success_rate": 0.5 } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Progress tracking settings
    pub progress: ProgressConfig,
    /// Alert thresholds for the monitor
    pub alerts: AlertThresholds,
}

impl EngineConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phasewatch_monitor::MetricKind;
    use std::io::Write;

    #[test]
    fn test_defaults_without_path() {
        let config = EngineConfig::load(None).unwrap();
        assert_eq!(config.progress.progress_cap, 0.95);
        assert!(config.alerts.is_empty());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"alerts": {{"error_count": 2}}, "progress": {{"tolerance": 0.2}}}}"#).unwrap();

        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.alerts.get(MetricKind::ErrorCount), Some(2.0));
        assert_eq!(config.progress.tolerance, 0.2);
        assert_eq!(config.progress.progress_cap, 0.95);
    }

    #[test]
    fn test_bad_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = EngineConfig::load(Some(file.path())).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing config"));
    }

    #[test]
    fn test_unknown_metric_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"alerts": {{"latency": 2}}}}"#).unwrap();
        assert!(EngineConfig::load(Some(file.path())).is_err());
    }
}
