//! Verification pipeline orchestration
//!
//! Sequences baseline profiling, live extraction and classification. The
//! stateless [`verify`] runs everything in one call; [`VerificationPipeline`]
//! walks the same steps one stage at a time.

use crate::baseline::{BaselineProfiler, BaselineSessionStore};
use crate::classifier::{Classification, Classifier};
use crate::config::VerifierConfig;
use crate::encoder::{ReportEncoder, VerificationReport};
use crate::error::ComputeError;
use crate::features::{assess_quality, extract_all};
use crate::types::{Baseline, MetricValues, QualityFlag, Session};
use std::fmt;

/// Verify a live session against baseline sessions (stateless, one-shot).
///
/// # Example
/// ```
/// use ados_mouse::{verify, Event, Session};
///
/// let session = Session::new(vec![
///     Event::Move { x: 0.0, y: 0.0, timestamp: 0.0 },
///     Event::Move { x: 3.0, y: 4.0, timestamp: 0.5 },
/// ]);
/// let report = verify(&[session.clone()], &session, 2.0)?;
/// assert!(report.is_match());
/// # Ok::<(), ados_mouse::ComputeError>(())
/// ```
pub fn verify(
    baseline_sessions: &[Session],
    live: &Session,
    tolerance: f64,
) -> Result<VerificationReport, ComputeError> {
    let baseline = BaselineProfiler::new(tolerance).profile(baseline_sessions)?;
    let live_metrics = extract_all(live);
    let classification = Classifier::classify(&baseline, &live_metrics);
    let quality_flags = quality_flags_for(&baseline, live);

    log_decision(&classification);
    Ok(ReportEncoder::new().encode(&baseline, &live_metrics, classification, quality_flags))
}

/// Stages of the decision pipeline, strictly in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    BaselineCollected,
    ThresholdsDerived,
    LiveCollected,
    Scored,
    Decided,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::BaselineCollected => "baseline_collected",
            Stage::ThresholdsDerived => "thresholds_derived",
            Stage::LiveCollected => "live_collected",
            Stage::Scored => "scored",
            Stage::Decided => "decided",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateful pipeline that enforces the linear stage order.
///
/// Empty or short sessions are never rejected; they yield `0` metrics and
/// still flow through scoring.
pub struct VerificationPipeline {
    stage: Stage,
    config: VerifierConfig,
    store: BaselineSessionStore,
    baseline: Option<Baseline>,
    live: Option<Session>,
    live_metrics: Option<MetricValues>,
    classification: Option<Classification>,
    encoder: ReportEncoder,
}

impl Default for VerificationPipeline {
    fn default() -> Self {
        Self::new(VerifierConfig::default())
    }
}

impl VerificationPipeline {
    pub fn new(config: VerifierConfig) -> Self {
        Self {
            stage: Stage::Idle,
            config,
            store: BaselineSessionStore::new(),
            baseline: None,
            live: None,
            live_metrics: None,
            classification: None,
            encoder: ReportEncoder::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Derived thresholds, once available
    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    /// Get the number of baseline sessions collected so far
    pub fn baseline_session_count(&self) -> usize {
        self.store.session_count()
    }

    /// Hand over a finished baseline session
    pub fn add_baseline_session(&mut self, session: Session) -> Result<(), ComputeError> {
        self.expect_collecting_baseline()?;
        tracing::debug!(events = session.len(), "baseline session added");
        self.store.push(session);
        self.stage = Stage::BaselineCollected;
        Ok(())
    }

    /// Derive acceptance intervals from the collected baseline sessions
    pub fn derive_thresholds(&mut self) -> Result<&Baseline, ComputeError> {
        self.expect(Stage::BaselineCollected)?;
        let baseline = self.store.profile(self.config.tolerance)?;
        self.stage = Stage::ThresholdsDerived;
        Ok(self.baseline.insert(baseline))
    }

    /// Hand over the finished live session
    pub fn set_live_session(&mut self, session: Session) -> Result<(), ComputeError> {
        self.expect(Stage::ThresholdsDerived)?;
        self.live = Some(session);
        self.stage = Stage::LiveCollected;
        Ok(())
    }

    /// Extract live metrics and classify them against the thresholds
    pub fn score(&mut self) -> Result<&Classification, ComputeError> {
        self.expect(Stage::LiveCollected)?;
        let (baseline, live) = match (&self.baseline, &self.live) {
            (Some(baseline), Some(live)) => (baseline, live),
            _ => return Err(self.stage_error(Stage::LiveCollected)),
        };

        let live_metrics = extract_all(live);
        let classification = Classifier::classify(baseline, &live_metrics);
        self.live_metrics = Some(live_metrics);
        self.stage = Stage::Scored;
        Ok(self.classification.insert(classification))
    }

    /// Produce the final report
    pub fn decide(&mut self) -> Result<VerificationReport, ComputeError> {
        self.expect(Stage::Scored)?;
        let (baseline, live, live_metrics, classification) = match (
            &self.baseline,
            &self.live,
            &self.live_metrics,
            self.classification.take(),
        ) {
            (Some(b), Some(l), Some(m), Some(c)) => (b, l, m, c),
            _ => return Err(self.stage_error(Stage::Scored)),
        };

        log_decision(&classification);
        let quality_flags = quality_flags_for(baseline, live);
        let report = self
            .encoder
            .encode(baseline, live_metrics, classification, quality_flags);
        self.stage = Stage::Decided;
        Ok(report)
    }

    /// Save collected baseline sessions to JSON for persistence
    pub fn save_baselines(&self) -> Result<String, ComputeError> {
        self.store
            .to_json()
            .map_err(|e| ComputeError::ParseError(e.to_string()))
    }

    /// Load baseline sessions from JSON, appending to any already collected
    pub fn load_baselines(&mut self, json: &str) -> Result<(), ComputeError> {
        self.expect_collecting_baseline()?;
        let loaded = BaselineSessionStore::from_json(json)
            .map_err(|e| ComputeError::ParseError(e.to_string()))?;
        for session in loaded.into_sessions() {
            self.store.push(session);
        }
        if self.store.session_count() > 0 {
            self.stage = Stage::BaselineCollected;
        }
        Ok(())
    }

    fn expect_collecting_baseline(&self) -> Result<(), ComputeError> {
        match self.stage {
            Stage::Idle | Stage::BaselineCollected => Ok(()),
            _ => Err(self.stage_error(Stage::BaselineCollected)),
        }
    }

    fn expect(&self, expected: Stage) -> Result<(), ComputeError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(self.stage_error(expected))
        }
    }

    fn stage_error(&self, expected: Stage) -> ComputeError {
        ComputeError::InvalidStage {
            expected: expected.as_str(),
            actual: self.stage.as_str(),
        }
    }
}

fn quality_flags_for(baseline: &Baseline, live: &Session) -> Vec<QualityFlag> {
    let mut flags = Vec::new();
    if baseline.sessions_in_baseline == 1 {
        flags.push(QualityFlag::SingleBaselineSession);
    }
    flags.extend(assess_quality(live));
    flags
}

fn log_decision(classification: &Classification) {
    tracing::info!(
        matched = classification.matched_metrics,
        match_ratio = classification.match_ratio,
        decision = ?classification.decision,
        "verification decided"
    );
}
