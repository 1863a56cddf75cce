//! ados-mouse - Behavior-based user verification from pointer dynamics
//!
//! Builds a statistical baseline of how a user moves and clicks a pointing
//! device, then decides whether a later session plausibly belongs to the same
//! user: event capture → feature extraction → baseline profiling →
//! classification → report.
//!
//! ## Modules
//!
//! - **Capture**: hand-off of listener events into finished sessions
//! - **Features**: speed, click interval, path curvature, dwell and idle time
//! - **Baseline**: per-metric acceptance intervals from baseline sessions
//! - **Classifier**: relaxed interval checks fused by majority vote

pub mod baseline;
pub mod capture;
pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod types;

pub use baseline::{BaselineProfiler, BaselineSessionStore, DEFAULT_TOLERANCE};
pub use classifier::{Classification, Classifier, Decision, MetricVerdict};
pub use config::VerifierConfig;
pub use encoder::{ReportEncoder, VerificationReport};
pub use error::ComputeError;
pub use features::extract_all;
pub use pipeline::{verify, Stage, VerificationPipeline};
pub use types::{
    AcceptanceInterval, Baseline, Button, Event, Metric, MetricValues, PerMetric, QualityFlag,
    Session,
};

/// Crate version embedded in every report
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "ados-mouse";
