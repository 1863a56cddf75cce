//! Error types for ados-mouse

use thiserror::Error;

/// Errors that can occur while profiling or scoring sessions.
///
/// Degenerate metric inputs (too few events, a single baseline session) are
/// not errors; they resolve to documented defaults.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse session data: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Baseline requires at least one session")]
    EmptyBaseline,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Pipeline is in stage {actual}, expected {expected}")]
    InvalidStage {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
