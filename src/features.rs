//! Behavioral feature extraction
//!
//! Reduces an ordered event sequence to the five scalar metrics. Every
//! extractor is a pure function of the session and falls back to `0.0` when
//! too few qualifying events exist.

use crate::types::{Event, Metric, MetricValues, QualityFlag, Session};

/// Gap between adjacent events (seconds) above which the pointer counts as idle
pub const IDLE_THRESHOLD_SEC: f64 = 0.5;

impl Metric {
    /// Compute this metric for a session
    pub fn extract(self, session: &Session) -> f64 {
        let events = session.events();
        match self {
            Metric::Speed => speed(events),
            Metric::ClickFrequency => click_frequency(events),
            Metric::PathCurvature => path_curvature(events),
            Metric::DwellTime => dwell_time(events),
            Metric::IdleTime => idle_time(events),
        }
    }
}

/// Compute all five metrics for a session
pub fn extract_all(session: &Session) -> MetricValues {
    let values = MetricValues::from_fn(|metric| metric.extract(session));
    tracing::debug!(
        events = session.len(),
        speed = values.speed,
        click_frequency = values.click_frequency,
        path_curvature = values.path_curvature,
        dwell_time = values.dwell_time,
        idle_time = values.idle_time,
        "extracted session metrics"
    );
    values
}

/// Mean pointer speed over adjacent move pairs
///
/// Pairs with a non-positive time delta are skipped.
pub fn speed(events: &[Event]) -> f64 {
    let speeds = events.windows(2).filter_map(|pair| {
        let (x0, y0) = pair[0].as_move()?;
        let (x1, y1) = pair[1].as_move()?;
        let dt = pair[1].timestamp() - pair[0].timestamp();
        if dt > 0.0 {
            Some((x1 - x0).hypot(y1 - y0) / dt)
        } else {
            None
        }
    });
    mean(speeds)
}

/// Mean interval in seconds between consecutive button presses
///
/// Despite the name this is an interval, not a rate.
pub fn click_frequency(events: &[Event]) -> f64 {
    let presses: Vec<f64> = events
        .iter()
        .filter(|e| e.is_press())
        .map(Event::timestamp)
        .collect();

    if presses.len() < 2 {
        return 0.0;
    }

    mean(presses.windows(2).map(|pair| pair[1] - pair[0]))
}

/// Mean absolute heading change over runs of three consecutive moves
///
/// The raw `atan2` difference is used without wrapping into `[-pi, pi]`.
pub fn path_curvature(events: &[Event]) -> f64 {
    let angles = events.windows(3).filter_map(|triple| {
        let (x0, y0) = triple[0].as_move()?;
        let (x1, y1) = triple[1].as_move()?;
        let (x2, y2) = triple[2].as_move()?;
        let first = (y1 - y0).atan2(x1 - x0);
        let second = (y2 - y1).atan2(x2 - x1);
        Some((second - first).abs())
    });
    mean(angles)
}

/// Mean time spent between adjacent moves at the exact same position
pub fn dwell_time(events: &[Event]) -> f64 {
    let dwells = events.windows(2).filter_map(|pair| {
        let prev = pair[0].as_move()?;
        let curr = pair[1].as_move()?;
        (prev == curr).then(|| pair[1].timestamp() - pair[0].timestamp())
    });
    mean(dwells)
}

/// Mean length of gaps between adjacent events longer than [`IDLE_THRESHOLD_SEC`]
pub fn idle_time(events: &[Event]) -> f64 {
    let gaps = events
        .windows(2)
        .map(|pair| pair[1].timestamp() - pair[0].timestamp())
        .filter(|&gap| gap > IDLE_THRESHOLD_SEC);
    mean(gaps)
}

/// Flag sessions whose metrics will fall back to the `0` default
pub fn assess_quality(session: &Session) -> Vec<QualityFlag> {
    let events = session.events();
    if events.is_empty() {
        return vec![QualityFlag::EmptySession];
    }

    let mut flags = Vec::new();

    let moves = events.iter().filter(|e| e.as_move().is_some()).count();
    if moves < 3 {
        flags.push(QualityFlag::InsufficientMoves);
    }

    let presses = events.iter().filter(|e| e.is_press()).count();
    if presses < 2 {
        flags.push(QualityFlag::InsufficientClicks);
    }

    let has_idle_gap = events
        .windows(2)
        .any(|pair| pair[1].timestamp() - pair[0].timestamp() > IDLE_THRESHOLD_SEC);
    if !has_idle_gap {
        flags.push(QualityFlag::NoIdleGaps);
    }

    flags
}

/// Arithmetic mean, `0.0` for an empty sequence
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Button;
    use pretty_assertions::assert_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn mv(x: f64, y: f64, t: f64) -> Event {
        Event::Move { x, y, timestamp: t }
    }

    fn click(t: f64, pressed: bool) -> Event {
        Event::Click {
            x: 0.0,
            y: 0.0,
            button: Button::Left,
            pressed,
            timestamp: t,
        }
    }

    fn scroll(t: f64) -> Event {
        Event::Scroll {
            x: 0.0,
            y: 0.0,
            dx: 0.0,
            dy: 1.0,
            timestamp: t,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_speed_needs_two_moves() {
        assert_eq!(speed(&[]), 0.0);
        assert_eq!(speed(&[mv(0.0, 0.0, 0.0)]), 0.0);
        assert_eq!(speed(&[mv(0.0, 0.0, 0.0), click(0.1, true)]), 0.0);
    }

    #[test]
    fn test_speed_mean_of_pairs() {
        // 3-4-5 triangle over 0.5s = 10 px/s, then 6 px over 1s = 6 px/s
        let events = [mv(0.0, 0.0, 0.0), mv(3.0, 4.0, 0.5), mv(3.0, 10.0, 1.5)];
        assert_close(speed(&events), 8.0);
    }

    #[test]
    fn test_speed_skips_non_positive_deltas() {
        let events = [
            mv(0.0, 0.0, 1.0),
            mv(5.0, 0.0, 1.0),  // zero delta
            mv(10.0, 0.0, 0.5), // negative delta
            mv(20.0, 0.0, 1.5),
        ];
        assert_close(speed(&events), 10.0);

        let stalled = [mv(0.0, 0.0, 1.0), mv(5.0, 0.0, 1.0)];
        assert_eq!(speed(&stalled), 0.0);
    }

    #[test]
    fn test_speed_ignores_non_move_neighbours() {
        let events = [mv(0.0, 0.0, 0.0), click(0.5, true), mv(100.0, 0.0, 1.0)];
        assert_eq!(speed(&events), 0.0);
    }

    #[test]
    fn test_click_frequency_needs_two_presses() {
        assert_eq!(click_frequency(&[click(1.0, true)]), 0.0);
        // releases do not count
        assert_eq!(click_frequency(&[click(1.0, true), click(1.1, false)]), 0.0);
    }

    #[test]
    fn test_click_frequency_is_mean_interval() {
        let events = [
            click(1.0, true),
            click(1.1, false),
            mv(5.0, 5.0, 1.5),
            click(2.0, true),
            click(2.1, false),
            click(4.0, true),
        ];
        // intervals 1.0 and 2.0
        assert_close(click_frequency(&events), 1.5);
    }

    #[test]
    fn test_path_curvature_needs_three_consecutive_moves() {
        assert_eq!(path_curvature(&[mv(0.0, 0.0, 0.0), mv(1.0, 0.0, 0.1)]), 0.0);

        let broken = [
            mv(0.0, 0.0, 0.0),
            mv(1.0, 0.0, 0.1),
            scroll(0.2),
            mv(1.0, 1.0, 0.3),
            mv(2.0, 1.0, 0.4),
        ];
        assert_eq!(path_curvature(&broken), 0.0);
    }

    #[test]
    fn test_path_curvature_right_angle() {
        // east then north
        let events = [mv(0.0, 0.0, 0.0), mv(1.0, 0.0, 0.1), mv(1.0, 1.0, 0.2)];
        assert_close(path_curvature(&events), FRAC_PI_2);
    }

    #[test]
    fn test_path_curvature_is_not_wrapped() {
        // heading 3pi/4 then -3pi/4: raw difference is 3pi/2, wrapped would be pi/2
        let events = [mv(0.0, 0.0, 0.0), mv(-1.0, 1.0, 0.1), mv(-2.0, 0.0, 0.2)];
        assert_close(path_curvature(&events), 1.5 * PI);
    }

    #[test]
    fn test_path_curvature_mean_over_runs() {
        let events = [
            mv(0.0, 0.0, 0.0),
            mv(1.0, 0.0, 0.1),
            mv(2.0, 0.0, 0.2), // straight: 0
            mv(2.0, 1.0, 0.3), // turn left: pi/2
        ];
        assert_close(path_curvature(&events), FRAC_PI_2 / 2.0);
    }

    #[test]
    fn test_dwell_time_exact_positions_only() {
        let events = [
            mv(5.0, 5.0, 0.0),
            mv(5.0, 5.0, 0.4),
            mv(5.0, 5.000001, 0.9),
            mv(5.0, 5.000001, 1.2),
        ];
        assert_close(dwell_time(&events), (0.4 + 0.3) / 2.0);
    }

    #[test]
    fn test_dwell_time_requires_positional_adjacency() {
        let interleaved = [mv(5.0, 5.0, 0.0), click(0.2, true), mv(5.0, 5.0, 0.4)];
        assert_eq!(dwell_time(&interleaved), 0.0);
    }

    #[test]
    fn test_idle_time_threshold_is_exclusive() {
        let busy = [mv(0.0, 0.0, 0.0), mv(1.0, 0.0, 0.5), scroll(1.0)];
        assert_eq!(idle_time(&busy), 0.0);
    }

    #[test]
    fn test_idle_time_mean_of_long_gaps() {
        let events = [
            mv(0.0, 0.0, 0.0),
            click(2.0, true),
            scroll(2.1),
            mv(1.0, 1.0, 5.1),
        ];
        assert_close(idle_time(&events), 2.5);
    }

    #[test]
    fn test_extract_all_on_empty_session() {
        let values = extract_all(&Session::default());
        assert_eq!(values, MetricValues::default());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let session = Session::new(vec![
            mv(0.0, 0.0, 0.0),
            mv(3.0, 4.0, 0.1),
            mv(3.0, 4.0, 0.7),
            click(0.8, true),
            click(1.9, true),
            mv(7.0, 1.0, 2.6),
        ]);

        let first = extract_all(&session);
        let second = extract_all(&session);
        for metric in Metric::ALL {
            assert_eq!(
                first.get(metric).to_bits(),
                second.get(metric).to_bits(),
                "{metric} differs between runs"
            );
        }
    }

    #[test]
    fn test_metric_dispatch_matches_functions() {
        let session = Session::new(vec![
            mv(0.0, 0.0, 0.0),
            mv(1.0, 0.0, 0.1),
            mv(1.0, 1.0, 0.9),
        ]);
        assert_eq!(Metric::Speed.extract(&session), speed(session.events()));
        assert_eq!(
            Metric::PathCurvature.extract(&session),
            path_curvature(session.events())
        );
        assert_eq!(Metric::IdleTime.extract(&session), idle_time(session.events()));
    }

    #[test]
    fn test_quality_flags() {
        assert_eq!(
            assess_quality(&Session::default()),
            vec![QualityFlag::EmptySession]
        );

        let sparse = Session::new(vec![mv(0.0, 0.0, 0.0), click(0.1, true)]);
        assert_eq!(
            assess_quality(&sparse),
            vec![
                QualityFlag::InsufficientMoves,
                QualityFlag::InsufficientClicks,
                QualityFlag::NoIdleGaps,
            ]
        );
    }
}
