//! Pointer event and metric types
//!
//! This module defines the event records produced by the capture side and the
//! per-metric containers that flow through profiling and classification.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pointer button label
///
/// Listener dumps spell buttons as `Button.left`; those spellings are accepted
/// on input and normalized to the short form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    #[serde(alias = "Button.left")]
    Left,
    #[serde(alias = "Button.right")]
    Right,
    #[serde(alias = "Button.middle")]
    Middle,
    /// Any other button label, kept verbatim
    #[serde(untagged)]
    Other(String),
}

/// A single pointer input occurrence
///
/// `timestamp` is in seconds and is only ever differenced, so monotonic and
/// wall-clock sources are equally valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Move {
        x: f64,
        y: f64,
        timestamp: f64,
    },
    Click {
        x: f64,
        y: f64,
        button: Button,
        pressed: bool,
        timestamp: f64,
    },
    Scroll {
        x: f64,
        y: f64,
        dx: f64,
        dy: f64,
        timestamp: f64,
    },
}

impl Event {
    /// Event timestamp in seconds
    pub fn timestamp(&self) -> f64 {
        match self {
            Event::Move { timestamp, .. }
            | Event::Click { timestamp, .. }
            | Event::Scroll { timestamp, .. } => *timestamp,
        }
    }

    /// Pointer position at the time of the event
    pub fn position(&self) -> (f64, f64) {
        match self {
            Event::Move { x, y, .. } | Event::Click { x, y, .. } | Event::Scroll { x, y, .. } => {
                (*x, *y)
            }
        }
    }

    /// Position of a `Move` event, `None` for every other kind
    pub fn as_move(&self) -> Option<(f64, f64)> {
        match self {
            Event::Move { x, y, .. } => Some((*x, *y)),
            _ => None,
        }
    }

    /// Whether this is a button press (not a release)
    pub fn is_press(&self) -> bool {
        matches!(self, Event::Click { pressed: true, .. })
    }
}

/// An ordered sequence of events from one capture interval
///
/// Events keep capture order and are never re-sorted. Serializes as a plain
/// JSON array of event records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    events: Vec<Event>,
}

impl Session {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl From<Vec<Event>> for Session {
    fn from(events: Vec<Event>) -> Self {
        Self::new(events)
    }
}

/// The five behavioral metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Speed,
    ClickFrequency,
    PathCurvature,
    DwellTime,
    IdleTime,
}

impl Metric {
    /// All metrics in canonical order
    pub const ALL: [Metric; 5] = [
        Metric::Speed,
        Metric::ClickFrequency,
        Metric::PathCurvature,
        Metric::DwellTime,
        Metric::IdleTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Speed => "speed",
            Metric::ClickFrequency => "click_frequency",
            Metric::PathCurvature => "path_curvature",
            Metric::DwellTime => "dwell_time",
            Metric::IdleTime => "idle_time",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ComputeError::UnknownMetric(s.to_string()))
    }
}

/// One value per metric, keyed by metric name when serialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerMetric<T> {
    pub speed: T,
    pub click_frequency: T,
    pub path_curvature: T,
    pub dwell_time: T,
    pub idle_time: T,
}

impl<T> PerMetric<T> {
    /// Build a value for every metric from a function of the metric
    pub fn from_fn(mut f: impl FnMut(Metric) -> T) -> Self {
        Self {
            speed: f(Metric::Speed),
            click_frequency: f(Metric::ClickFrequency),
            path_curvature: f(Metric::PathCurvature),
            dwell_time: f(Metric::DwellTime),
            idle_time: f(Metric::IdleTime),
        }
    }

    pub fn get(&self, metric: Metric) -> &T {
        match metric {
            Metric::Speed => &self.speed,
            Metric::ClickFrequency => &self.click_frequency,
            Metric::PathCurvature => &self.path_curvature,
            Metric::DwellTime => &self.dwell_time,
            Metric::IdleTime => &self.idle_time,
        }
    }

    /// Look up a value by metric name
    pub fn get_by_name(&self, name: &str) -> Result<&T, ComputeError> {
        Ok(self.get(name.parse()?))
    }

    /// Iterate `(metric, value)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Metric, &T)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

/// Scalar metric values for one session
pub type MetricValues = PerMetric<f64>;

/// Closed interval `[lower, upper]` a metric value is accepted within
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl AcceptanceInterval {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Inclusive on both ends
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Per-metric acceptance intervals derived from baseline sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Tolerance multiplier applied to the standard deviation
    pub tolerance: f64,
    /// Number of sessions the intervals were derived from
    pub sessions_in_baseline: u32,
    /// Acceptance interval per metric (before relaxation)
    pub intervals: PerMetric<AcceptanceInterval>,
}

impl Baseline {
    pub fn interval(&self, metric: Metric) -> AcceptanceInterval {
        *self.intervals.get(metric)
    }
}

/// Annotations for sessions whose metrics fell back to defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    /// Session holds no events at all
    EmptySession,
    /// Fewer than three move events
    InsufficientMoves,
    /// Fewer than two button presses
    InsufficientClicks,
    /// No gap between events exceeds the idle threshold
    NoIdleGaps,
    /// Baseline built from a single session, intervals are points
    SingleBaselineSession,
}

impl QualityFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityFlag::EmptySession => "empty_session",
            QualityFlag::InsufficientMoves => "insufficient_moves",
            QualityFlag::InsufficientClicks => "insufficient_clicks",
            QualityFlag::NoIdleGaps => "no_idle_gaps",
            QualityFlag::SingleBaselineSession => "single_baseline_session",
        }
    }
}

impl fmt::Display for QualityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
