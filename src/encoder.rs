//! Verification report encoder
//!
//! Packages a baseline, the live metrics and the fused classification into a
//! serializable report.

use crate::classifier::{Classification, Decision, MetricVerdict};
use crate::error::ComputeError;
use crate::types::{Baseline, MetricValues, QualityFlag};
use crate::{PRODUCER_NAME, VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Software that produced a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Terminal output of one verification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Unique report identifier (UUID)
    pub report_id: String,
    /// When the report was computed (RFC3339)
    pub computed_at_utc: String,
    pub producer: ReportProducer,
    pub tolerance: f64,
    pub sessions_in_baseline: u32,
    /// Acceptance intervals before relaxation
    pub baseline: Baseline,
    pub live_metrics: MetricValues,
    /// Per-metric verdicts against the relaxed intervals
    pub verdicts: Vec<MetricVerdict>,
    pub matched_metrics: u32,
    pub match_ratio: f64,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality_flags: Vec<QualityFlag>,
}

impl VerificationReport {
    pub fn is_match(&self) -> bool {
        self.decision.is_match()
    }
}

/// Report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn encode(
        &self,
        baseline: &Baseline,
        live_metrics: &MetricValues,
        classification: Classification,
        quality_flags: Vec<QualityFlag>,
    ) -> VerificationReport {
        VerificationReport {
            report_id: Uuid::new_v4().to_string(),
            computed_at_utc: Utc::now().to_rfc3339(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            tolerance: baseline.tolerance,
            sessions_in_baseline: baseline.sessions_in_baseline,
            baseline: baseline.clone(),
            live_metrics: *live_metrics,
            verdicts: classification.verdicts,
            matched_metrics: classification.matched_metrics,
            match_ratio: classification.match_ratio,
            decision: classification.decision,
            quality_flags,
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(&self, report: &VerificationReport) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(report).map_err(ComputeError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::types::{AcceptanceInterval, PerMetric};

    fn sample_baseline() -> Baseline {
        Baseline {
            tolerance: 2.0,
            sessions_in_baseline: 1,
            intervals: PerMetric::from_fn(|_| AcceptanceInterval::new(1.0, 1.0)),
        }
    }

    #[test]
    fn test_report_carries_classification() {
        let baseline = sample_baseline();
        let live = MetricValues::from_fn(|_| 1.2);
        let classification = Classifier::classify(&baseline, &live);

        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(
            &baseline,
            &live,
            classification,
            vec![QualityFlag::SingleBaselineSession],
        );

        assert!(report.is_match());
        assert_eq!(report.matched_metrics, 5);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.instance_id, "test-instance");
        assert!(Uuid::parse_str(&report.report_id).is_ok());
    }

    #[test]
    fn test_report_json_shape() {
        let baseline = sample_baseline();
        let live = MetricValues::from_fn(|_| 5.0);
        let classification = Classifier::classify(&baseline, &live);

        let encoder = ReportEncoder::new();
        let report = encoder.encode(&baseline, &live, classification, vec![]);
        let json = encoder.encode_to_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["decision"], "no_match");
        assert_eq!(value["match_ratio"], 0.0);
        assert_eq!(value["baseline"]["intervals"]["dwell_time"]["upper"], 1.0);
        assert_eq!(value["live_metrics"]["speed"], 5.0);
        assert_eq!(value["verdicts"][1]["metric"], "click_frequency");
        assert!(value.get("quality_flags").is_none());
        assert!(chrono::DateTime::parse_from_rfc3339(
            value["computed_at_utc"].as_str().unwrap()
        )
        .is_ok());
    }
}
