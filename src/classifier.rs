//! Live session classification
//!
//! Widens each baseline interval, checks the live metric values against it,
//! and fuses the per-metric verdicts with a majority rule.

use crate::types::{AcceptanceInterval, Baseline, Metric, MetricValues};
use serde::{Deserialize, Serialize};

/// Fraction each bound is scaled by before membership checks
pub const RELAXATION_FACTOR: f64 = 0.4;

/// Minimum fraction of in-range metrics for a session to match
pub const MATCH_THRESHOLD: f64 = 0.6;

/// Final accept/reject outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Behavior matches the expected pattern
    Match,
    /// Behavior does not match the expected pattern
    NoMatch,
}

impl Decision {
    pub fn is_match(&self) -> bool {
        matches!(self, Decision::Match)
    }
}

/// Membership result for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricVerdict {
    pub metric: Metric,
    /// Live session value
    pub value: f64,
    /// Relaxed lower bound
    pub lower: f64,
    /// Relaxed upper bound
    pub upper: f64,
    pub in_range: bool,
}

/// Fused classification for a live session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub verdicts: Vec<MetricVerdict>,
    pub matched_metrics: u32,
    pub match_ratio: f64,
    pub decision: Decision,
}

/// Scale the lower bound by `1 - RELAXATION_FACTOR` and the upper bound by
/// `1 + RELAXATION_FACTOR`
///
/// Positive bounds widen the interval. A negative lower bound moves toward
/// zero and a negative upper bound moves away from it, so intervals below
/// zero narrow and may end up inverted (accepting nothing).
pub fn relax(interval: AcceptanceInterval) -> AcceptanceInterval {
    let AcceptanceInterval { lower, upper } = interval;
    AcceptanceInterval::new(
        lower - lower * RELAXATION_FACTOR,
        upper + upper * RELAXATION_FACTOR,
    )
}

/// Classifier for live sessions against a baseline
pub struct Classifier;

impl Classifier {
    /// Check one metric value against its relaxed baseline interval
    pub fn verdict(baseline: &Baseline, metric: Metric, value: f64) -> MetricVerdict {
        let relaxed = relax(baseline.interval(metric));
        let in_range = relaxed.contains(value);
        tracing::debug!(
            metric = metric.as_str(),
            value,
            lower = relaxed.lower,
            upper = relaxed.upper,
            in_range,
            "metric verdict"
        );
        MetricVerdict {
            metric,
            value,
            lower: relaxed.lower,
            upper: relaxed.upper,
            in_range,
        }
    }

    /// Score every metric and fuse the verdicts
    ///
    /// All metrics weigh the same. The session matches when at least
    /// [`MATCH_THRESHOLD`] of them are in range.
    pub fn classify(baseline: &Baseline, live: &MetricValues) -> Classification {
        let verdicts: Vec<MetricVerdict> = live
            .iter()
            .map(|(metric, &value)| Self::verdict(baseline, metric, value))
            .collect();

        let matched_metrics = verdicts.iter().filter(|v| v.in_range).count() as u32;
        let match_ratio = matched_metrics as f64 / verdicts.len() as f64;
        let decision = if match_ratio >= MATCH_THRESHOLD {
            Decision::Match
        } else {
            Decision::NoMatch
        };

        Classification {
            verdicts,
            matched_metrics,
            match_ratio,
            decision,
        }
    }
}
