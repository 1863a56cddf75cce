//! Baseline profiling
//!
//! Derives a per-metric acceptance interval from one or more baseline
//! sessions using the population mean and standard deviation of each metric.

use crate::error::ComputeError;
use crate::types::{AcceptanceInterval, Baseline, Metric, PerMetric, Session};
use serde::{Deserialize, Serialize};

/// Default tolerance multiplier applied to the standard deviation
pub const DEFAULT_TOLERANCE: f64 = 1.5;

/// Computes acceptance intervals from baseline sessions
#[derive(Debug, Clone, Copy)]
pub struct BaselineProfiler {
    tolerance: f64,
}

impl Default for BaselineProfiler {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl BaselineProfiler {
    /// Create a profiler with the given tolerance multiplier `k`
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Derive `(mean - k*std, mean + k*std)` for every metric
    ///
    /// A single session yields zero variance and a point interval.
    pub fn profile(&self, sessions: &[Session]) -> Result<Baseline, ComputeError> {
        if sessions.is_empty() {
            return Err(ComputeError::EmptyBaseline);
        }

        if sessions.len() == 1 {
            tracing::warn!("baseline built from a single session, intervals collapse to points");
        }

        let intervals = PerMetric::from_fn(|metric| {
            let values: Vec<f64> = sessions.iter().map(|s| metric.extract(s)).collect();
            let interval = self.interval_for(&values);
            tracing::debug!(
                metric = metric.as_str(),
                lower = interval.lower,
                upper = interval.upper,
                "derived acceptance interval"
            );
            interval
        });

        Ok(Baseline {
            tolerance: self.tolerance,
            sessions_in_baseline: sessions.len() as u32,
            intervals,
        })
    }

    /// Derive the interval for one metric by name
    pub fn profile_metric(
        &self,
        sessions: &[Session],
        name: &str,
    ) -> Result<AcceptanceInterval, ComputeError> {
        let metric: Metric = name.parse()?;
        if sessions.is_empty() {
            return Err(ComputeError::EmptyBaseline);
        }
        let values: Vec<f64> = sessions.iter().map(|s| metric.extract(s)).collect();
        Ok(self.interval_for(&values))
    }

    fn interval_for(&self, values: &[f64]) -> AcceptanceInterval {
        let (mean, std) = mean_and_std(values);
        AcceptanceInterval::new(mean - self.tolerance * std, mean + self.tolerance * std)
    }
}

/// Population mean and standard deviation (divides by `n`)
///
/// Returns `(0.0, 0.0)` for an empty slice.
pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Baseline sessions kept for persistence between capture runs
///
/// Serializes as a JSON array of sessions, each an array of event records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaselineSessionStore {
    sessions: Vec<Session>,
}

impl BaselineSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished baseline session
    pub fn push(&mut self, session: Session) {
        self.sessions.push(session);
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Get the number of sessions in the store
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Clear all baseline sessions
    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    /// Derive acceptance intervals from the stored sessions
    pub fn profile(&self, tolerance: f64) -> Result<Baseline, ComputeError> {
        BaselineProfiler::new(tolerance).profile(&self.sessions)
    }

    /// Load baseline sessions from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize baseline sessions to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn into_sessions(self) -> Vec<Session> {
        self.sessions
    }
}

impl From<Vec<Session>> for BaselineSessionStore {
    fn from(sessions: Vec<Session>) -> Self {
        Self { sessions }
    }
}
