//! Timeline scrubber geometry and tick arithmetic
//!
//! Positions are fractions of the track measured from the top, where the top
//! is the newest flow (`max`) and the bottom the oldest (`min`).

use serde::Serialize;
use shovel_core::{SessionConfig, Timestamp, TimestampBounds, MICROS_PER_SECOND};

/// Smallest visible-range indicator, as a fraction of the track.
pub const MIN_INDICATOR_SIZE: f64 = 0.005;

/// Fraction of the track at which `ts` sits, clamped to `[0, 1]`.
///
/// Degenerate bounds (`max <= min`) yield [`MIN_INDICATOR_SIZE`].
pub fn position(bounds: TimestampBounds, ts: Timestamp) -> f64 {
    if bounds.is_degenerate() {
        return MIN_INDICATOR_SIZE;
    }
    let fraction = (bounds.max - ts) as f64 / bounds.span() as f64;
    fraction.clamp(0.0, 1.0)
}

/// Timestamp under the track fraction `p`, as a click sets the `to` bound.
pub fn timestamp_at(bounds: TimestampBounds, p: f64) -> Timestamp {
    let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
    (bounds.max as f64 - p * bounds.span() as f64).floor() as Timestamp
}

/// Visible-range indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Indicator {
    pub top: f64,
    pub size: f64,
}

/// Indicator spanning the first (`newest`) to the last (`oldest`) visible
/// flow, at least [`MIN_INDICATOR_SIZE`] tall.
pub fn indicator(bounds: TimestampBounds, newest: Timestamp, oldest: Timestamp) -> Indicator {
    if bounds.is_degenerate() {
        return Indicator {
            top: 0.0,
            size: MIN_INDICATOR_SIZE,
        };
    }
    let size = (newest - oldest) as f64 / bounds.span() as f64;
    Indicator {
        top: position(bounds, newest),
        size: size.max(MIN_INDICATOR_SIZE),
    }
}

/// Session-start marker, shown only strictly inside the bounds.
pub fn session_marker(bounds: TimestampBounds, session_start: Timestamp) -> Option<f64> {
    bounds
        .strictly_contains(session_start)
        .then(|| position(bounds, session_start))
}

/// Timeline geometry for one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineView {
    pub bounds: TimestampBounds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator: Option<Indicator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_marker: Option<f64>,
}

impl TimelineView {
    /// `visible` is the `(newest, oldest)` start timestamps of the flows in
    /// the viewport.
    pub fn new(
        bounds: TimestampBounds,
        visible: Option<(Timestamp, Timestamp)>,
        session_start: Option<Timestamp>,
    ) -> Self {
        Self {
            bounds,
            indicator: visible.map(|(newest, oldest)| indicator(bounds, newest, oldest)),
            session_marker: session_start.and_then(|start| session_marker(bounds, start)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Ticks
// ─────────────────────────────────────────────────────────────────

/// Tick arithmetic for one session configuration.
///
/// Ticks count whole `tick_length` periods since the session start; the
/// start is kept in whole seconds so that every conversion goes through
/// seconds first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickClock {
    /// Session start in Unix seconds.
    pub session_start_secs: i64,
    /// Tick length in seconds, `0` when ticks are disabled.
    pub tick_length: u64,
}

impl TickClock {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            session_start_secs: config
                .session_start()
                .map(|us| us.div_euclid(MICROS_PER_SECOND))
                .unwrap_or_default(),
            tick_length: config.tick_length,
        }
    }

    pub fn ticks_enabled(&self) -> bool {
        self.tick_length > 0
    }

    pub fn session_start(&self) -> Timestamp {
        self.session_start_secs.saturating_mul(MICROS_PER_SECOND)
    }

    /// Tick containing `ts`, `None` when ticks are disabled.
    pub fn tick_of(&self, ts: Timestamp) -> Option<i64> {
        if !self.ticks_enabled() {
            return None;
        }
        let period = (self.tick_length as i64).saturating_mul(MICROS_PER_SECOND);
        Some(ts.saturating_sub(self.session_start()).div_euclid(period))
    }

    /// Fractional tick of `ts`, as shown next to a selected flow.
    pub fn fractional_tick(&self, ts: Timestamp) -> Option<f64> {
        if !self.ticks_enabled() {
            return None;
        }
        let secs = ts as f64 / MICROS_PER_SECOND as f64 - self.session_start_secs as f64;
        Some(secs / self.tick_length as f64)
    }

    fn effective_length(&self) -> i64 {
        self.tick_length.max(1) as i64
    }

    /// `to` bound that keeps every flow up to the end of `tick`.
    ///
    /// A zero tick length counts as one second.
    pub fn until_tick_bound(&self, tick: i64) -> Timestamp {
        let secs = tick
            .saturating_add(1)
            .saturating_mul(self.effective_length())
            .saturating_add(self.session_start_secs);
        secs.saturating_mul(MICROS_PER_SECOND)
    }

    /// Inverse of [`until_tick_bound`](Self::until_tick_bound), for the
    /// until-tick control.
    pub fn tick_for_bound(&self, to: Timestamp) -> f64 {
        let secs = to as f64 / MICROS_PER_SECOND as f64 - self.session_start_secs as f64;
        secs / self.effective_length() as f64 - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: TimestampBounds = TimestampBounds { min: 100, max: 200 };

    #[test]
    fn test_position_monotonic() {
        assert_eq!(position(BOUNDS, 150), 0.5);
        assert_eq!(position(BOUNDS, 100), 1.0);
        assert_eq!(position(BOUNDS, 200), 0.0);
        assert!(position(BOUNDS, 120) > position(BOUNDS, 180));
    }

    #[test]
    fn test_position_clamped() {
        assert_eq!(position(BOUNDS, 50), 1.0);
        assert_eq!(position(BOUNDS, 500), 0.0);
    }

    #[test]
    fn test_position_degenerate_bounds() {
        let flat = TimestampBounds::new(100, 100);
        assert_eq!(position(flat, 100), MIN_INDICATOR_SIZE);
        assert_eq!(position(flat, 7), MIN_INDICATOR_SIZE);
    }

    #[test]
    fn test_timestamp_at() {
        assert_eq!(timestamp_at(BOUNDS, 0.0), 200);
        assert_eq!(timestamp_at(BOUNDS, 1.0), 100);
        assert_eq!(timestamp_at(BOUNDS, 0.255), 174);
        assert_eq!(timestamp_at(BOUNDS, f64::NAN), 200);
    }

    #[test]
    fn test_indicator_floor() {
        let single = indicator(BOUNDS, 150, 150);
        assert_eq!(single.top, 0.5);
        assert_eq!(single.size, MIN_INDICATOR_SIZE);

        let range = indicator(BOUNDS, 180, 130);
        assert!((range.top - 0.2).abs() < 1e-9);
        assert!((range.size - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_session_marker_strictly_inside() {
        assert_eq!(session_marker(BOUNDS, 150), Some(0.5));
        assert_eq!(session_marker(BOUNDS, 100), None);
        assert_eq!(session_marker(BOUNDS, 200), None);
        assert_eq!(session_marker(BOUNDS, 20), None);
    }

    fn clock(start: i64, len: u64) -> TickClock {
        TickClock {
            session_start_secs: start,
            tick_length: len,
        }
    }

    #[test]
    fn test_tick_of() {
        let c = clock(1_000, 60);
        assert_eq!(c.tick_of(1_000 * MICROS_PER_SECOND), Some(0));
        assert_eq!(c.tick_of(1_059_999_999), Some(0));
        assert_eq!(c.tick_of(1_060 * MICROS_PER_SECOND), Some(1));
        // Flows captured before the session start fall in negative ticks
        assert_eq!(c.tick_of(999 * MICROS_PER_SECOND), Some(-1));
        assert_eq!(clock(1_000, 0).tick_of(5), None);
    }

    #[test]
    fn test_until_tick_bound_round_trip() {
        let c = clock(1_000, 60);
        let to = c.until_tick_bound(3);
        assert_eq!(to, (4 * 60 + 1_000) * MICROS_PER_SECOND);
        assert_eq!(c.tick_for_bound(to), 3.0);
    }

    #[test]
    fn test_until_tick_bound_saturates() {
        let c = clock(1_000, 60);
        assert_eq!(c.until_tick_bound(i64::MAX), i64::MAX);
        assert_eq!(c.until_tick_bound(i64::MAX / 60), i64::MAX);
        assert_eq!(c.tick_of(i64::MIN), Some(i64::MIN.div_euclid(60 * MICROS_PER_SECOND)));
    }

    #[test]
    fn test_zero_tick_length_counts_as_one_second() {
        let c = clock(10, 0);
        assert_eq!(c.until_tick_bound(4), 15 * MICROS_PER_SECOND);
        assert_eq!(c.tick_for_bound(15 * MICROS_PER_SECOND), 4.0);
    }

    #[test]
    fn test_from_config() {
        let config = SessionConfig {
            start_date: "2024-01-01T00:00+00:00".to_string(),
            tick_length: 120,
            ..Default::default()
        };
        let c = TickClock::from_config(&config);
        assert_eq!(c.session_start_secs, 1_704_067_200);
        assert!(c.ticks_enabled());
        assert_eq!(c.fractional_tick(c.session_start() + 180 * MICROS_PER_SECOND), Some(1.5));
    }
}
