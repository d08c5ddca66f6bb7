//! Trend-reversal signal detection.
//!
//! The detector folds closes through three stages:
//! - `PivotTracker`: confirms local lows and highs on direction flips.
//! - `SwingRangeMachine`: keeps the widest low/high swing as breakout thresholds.
//! - `evaluate`: classifies every close against those thresholds.
//!
//! A breakout resets the range. Its signal stays in effect while closes stay
//! beyond the broken bound, and falls back to `Hold` once price returns
//! inside it or a new range is established.

mod pivot;
mod range;
mod signal;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    engine::{Observation, Series, ensure_ordered},
    errors::{Error, Result},
};

pub use pivot::*;
pub use range::*;
pub use signal::*;

/// Detector settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Observations required before the detector reports anything but `Hold`.
    min_points: usize,
    /// Range seeding after a breakout.
    reseed: Reseed,
    /// Number of confirmed pivots kept for inspection.
    pivot_history: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_points: 2,
            reseed: Reseed::Clear,
            pivot_history: PIVOT_HISTORY,
        }
    }
}

impl DetectorConfig {
    /// Sets the warm-up length. Values below 2 are raised to 2, the minimum
    /// for any direction to exist.
    pub fn min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points.max(2);
        self
    }

    /// Sets the range seeding policy after a breakout.
    pub fn reseed(mut self, reseed: Reseed) -> Self {
        self.reseed = reseed;
        self
    }

    /// Sets how many confirmed pivots the detector remembers. Zero keeps none.
    pub fn pivot_history(mut self, pivot_history: usize) -> Self {
        self.pivot_history = pivot_history;
        self
    }

    /// Returns the warm-up length.
    pub fn warmup(&self) -> usize {
        self.min_points
    }

    /// Returns the range seeding policy.
    pub fn reseed_policy(&self) -> Reseed {
        self.reseed
    }

    /// Returns the pivot history length.
    pub fn history(&self) -> usize {
        self.pivot_history
    }
}

/// Stateful breakout scanner over a single price series.
///
/// Each instance owns its state; evaluate concurrent markets with separate
/// instances.
///
/// ### Example
/// ```rust
/// use swing_rs::prelude::*;
/// use chrono::{DateTime, Duration};
///
/// let start = DateTime::from_timestamp_secs(1515151515).unwrap();
/// let closes = [1.0, 2.0, 5.0, 4.0, 3.0, 4.0, 3.0, 4.0, 3.0, 5.0, 6.0];
/// let series = Series::from_closes(start, Duration::minutes(30), &closes).unwrap();
///
/// let mut detector = TrendDetector::default();
/// assert_eq!(detector.detect(&series), Signal::Buy);
/// assert_eq!(detector.range().high(), None); // range reset by the breakout
/// ```
#[derive(Debug, Clone, Default)]
pub struct TrendDetector {
    config: DetectorConfig,
    tracker: PivotTracker,
    machine: SwingRangeMachine,
    /// Last breakout and the bound it broke.
    latch: Option<(Signal, f64)>,
    len: usize,
    last_timestamp: Option<DateTime<Utc>>,
}

impl TrendDetector {
    /// Creates a detector with no observations.
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            machine: SwingRangeMachine::new(config.reseed).pivot_history(config.pivot_history),
            ..Self::default()
        }
    }

    /// Returns the settings.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Returns the signal in effect after the last observation.
    pub fn signal(&self) -> Signal {
        if self.len < self.config.min_points {
            return Signal::Hold;
        }
        self.latch.map_or(Signal::Hold, |(signal, _)| signal)
    }

    /// Returns the phase of the current range.
    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    /// Returns the current breakout thresholds.
    pub fn range(&self) -> &SwingRange {
        self.machine.range()
    }

    /// The most recent confirmed pivots, oldest first, up to the configured
    /// history.
    pub fn pivots(&self) -> std::collections::vec_deque::Iter<'_, Pivot> {
        self.machine.pivots()
    }

    /// Number of observations processed.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no observation was processed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Forgets everything but the configuration.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// Feeds the next observation.
    ///
    /// ### Returns
    /// The signal in effect after this observation, or an error if its
    /// timestamp is older than the previous one. A rejected observation
    /// leaves the detector unchanged.
    pub fn update(&mut self, observation: &Observation) -> Result<Signal> {
        let timestamp = observation.timestamp();
        if let Some(previous) = self.last_timestamp
            && timestamp < previous
        {
            return Err(Error::NonMonotonicTimestamps {
                index: self.len,
                previous,
                current: timestamp,
            });
        }
        self.last_timestamp = Some(timestamp);
        Ok(self.step(observation.close()))
    }

    /// Scans `observations` from a fresh state.
    ///
    /// ### Returns
    /// The signal in effect after the final observation. The whole input is
    /// rejected up front if it is not ordered by timestamp.
    pub fn scan(&mut self, observations: &[Observation]) -> Result<Signal> {
        ensure_ordered(observations)?;
        self.reset();
        self.last_timestamp = observations.last().map(Observation::timestamp);
        for observation in observations {
            self.step(observation.close());
        }
        Ok(self.signal())
    }

    /// Scans an already validated series from a fresh state.
    pub fn detect(&mut self, series: &Series) -> Signal {
        self.reset();
        self.last_timestamp = series.last().map(Observation::timestamp);
        for close in series.closes() {
            self.step(close);
        }
        self.signal()
    }

    fn step(&mut self, close: f64) -> Signal {
        let index = self.len;
        self.len += 1;

        let mut breakout = None;
        if let Some(pivot) = self.tracker.push(index, close) {
            let before = self.machine.phase();
            debug!(index, kind = ?pivot.kind, value = pivot.value, "pivot confirmed");
            breakout = self.machine.apply(pivot);
            if before != self.machine.phase() {
                debug!(index, phase = ?self.machine.phase(), "phase changed");
            }
        }

        let breakout = breakout.or_else(|| {
            Some(evaluate(self.machine.phase(), self.machine.range(), close)).filter(|s| s.is_breakout())
        });

        match breakout {
            Some(signal) => {
                let range = *self.machine.range();
                info!(
                    index,
                    close,
                    low = ?range.low(),
                    high = ?range.high(),
                    "breakout {signal}"
                );
                let broken = match signal {
                    Signal::Buy => range.high(),
                    _ => range.low(),
                };
                self.machine.reset(close, signal);
                self.tracker.reseed(index, close);
                self.latch = broken.map(|bound| (signal, bound));
            }
            None if self.machine.phase() == Phase::InRange => self.latch = None,
            None => {
                // the breakout holds only while the close stays beyond the broken bound
                if let Some((signal, bound)) = self.latch {
                    let beyond = match signal {
                        Signal::Buy => close > bound,
                        Signal::Sell => close < bound,
                        Signal::Hold => false,
                    };
                    if !beyond {
                        debug!(index, close, bound, "breakout {signal} faded");
                        self.latch = None;
                    }
                }
            }
        }

        self.signal()
    }
}

/// Scans `observations` with the default detector.
///
/// ### Returns
/// `Hold`, `Buy` or `Sell` as in effect after the last observation, or an error
/// if the observations are not ordered by timestamp.
pub fn followtrend(observations: &[Observation]) -> Result<Signal> {
    TrendDetector::default().scan(observations)
}
