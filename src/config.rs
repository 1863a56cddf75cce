//! Verifier configuration
//!
//! Settings for the end-to-end flow. Values can come from a TOML file; any
//! key left out falls back to its default.
//!
//! ```toml
//! tolerance = 2.0
//! baseline_duration_secs = 50
//! live_duration_secs = 10
//! ```

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tolerance used by the end-to-end verification flow
pub const END_TO_END_TOLERANCE: f64 = 2.0;

/// Default baseline capture length in seconds
pub const DEFAULT_BASELINE_DURATION_SECS: u64 = 50;

/// Default live capture length in seconds
pub const DEFAULT_LIVE_DURATION_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Standard-deviation multiplier for acceptance intervals
    pub tolerance: f64,
    /// Length of each baseline capture interval
    pub baseline_duration_secs: u64,
    /// Length of the live capture interval
    pub live_duration_secs: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            tolerance: END_TO_END_TOLERANCE,
            baseline_duration_secs: DEFAULT_BASELINE_DURATION_SECS,
            live_duration_secs: DEFAULT_LIVE_DURATION_SECS,
        }
    }
}

impl VerifierConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, ComputeError> {
        let config: Self =
            toml::from_str(s).map_err(|e| ComputeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ComputeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ComputeError::InvalidConfig(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if self.baseline_duration_secs == 0 || self.live_duration_secs == 0 {
            return Err(ComputeError::InvalidConfig(
                "capture durations must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply a tolerance override, then validate the result
    pub fn with_tolerance(mut self, tolerance: Option<f64>) -> Result<Self, ComputeError> {
        if let Some(tolerance) = tolerance {
            self.tolerance = tolerance;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn baseline_duration(&self) -> Duration {
        Duration::from_secs(self.baseline_duration_secs)
    }

    pub fn live_duration(&self) -> Duration {
        Duration::from_secs(self.live_duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = VerifierConfig::default();
        assert_eq!(config.tolerance, 2.0);
        assert_eq!(config.baseline_duration(), Duration::from_secs(50));
        assert_eq!(config.live_duration(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = VerifierConfig::from_toml_str("tolerance = 1.5\n").unwrap();
        assert_eq!(
            config,
            VerifierConfig {
                tolerance: 1.5,
                ..VerifierConfig::default()
            }
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            VerifierConfig::from_toml_str("tolerance = -1.0"),
            Err(ComputeError::InvalidConfig(_))
        ));
        assert!(matches!(
            VerifierConfig::from_toml_str("live_duration_secs = 0"),
            Err(ComputeError::InvalidConfig(_))
        ));
        assert!(matches!(
            VerifierConfig::from_toml_str("tolerance = \"wide\""),
            Err(ComputeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_tolerance_override() {
        let config = VerifierConfig::default().with_tolerance(Some(1.5)).unwrap();
        assert_eq!(config.tolerance, 1.5);

        let config = VerifierConfig::from_toml_str("tolerance = 3.0")
            .unwrap()
            .with_tolerance(None)
            .unwrap();
        assert_eq!(config.tolerance, 3.0);
    }

    #[test]
    fn test_invalid_tolerance_override_rejected() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                VerifierConfig::default().with_tolerance(Some(bad)),
                Err(ComputeError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tolerance = 3.0").unwrap();
        writeln!(file, "baseline_duration_secs = 30").unwrap();

        let config = VerifierConfig::load(file.path()).unwrap();
        assert_eq!(config.tolerance, 3.0);
        assert_eq!(config.baseline_duration_secs, 30);
        assert_eq!(config.live_duration_secs, DEFAULT_LIVE_DURATION_SECS);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = VerifierConfig::load(Path::new("/nonexistent/ados.toml")).unwrap_err();
        assert!(matches!(err, ComputeError::Io(_)));
    }
}
