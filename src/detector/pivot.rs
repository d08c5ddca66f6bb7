//! Direction tracking and pivot confirmation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The sign of the change between two consecutive closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Close went up.
    Rising,
    /// Close went down.
    Falling,
    /// Close did not change.
    Flat,
}

impl Direction {
    /// Determine the direction of the step `previous -> current`.
    #[inline]
    pub fn between(previous: f64, current: f64) -> Self {
        if current > previous {
            Direction::Rising
        } else if current < previous {
            Direction::Falling
        } else {
            Direction::Flat
        }
    }

    /// Returns `true` for a step that did not change the close.
    #[inline]
    pub fn is_flat(self) -> bool {
        matches!(self, Direction::Flat)
    }

    /// Returns the opposite direction.
    /// Flat returns Flat.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Rising => Direction::Falling,
            Direction::Falling => Direction::Rising,
            Direction::Flat => Direction::Flat,
        }
    }
}

/// Which extremum a pivot marks.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PivotKind {
    /// Local minimum: the series turned from falling to rising.
    Low,
    /// Local maximum: the series turned from rising to falling.
    High,
}

impl PivotKind {
    /// The extremum that closes a swing started by this one.
    pub fn opposite(self) -> Self {
        match self {
            PivotKind::Low => PivotKind::High,
            PivotKind::High => PivotKind::Low,
        }
    }
}

/// A confirmed local extremum. Never revised once emitted.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    /// Low or high.
    pub kind: PivotKind,
    /// Close at the turning point.
    pub value: f64,
    /// Position of the turning point in the series.
    pub index: usize,
}

impl Pivot {
    /// A low pivot of `value` at `index`.
    pub fn low(value: f64, index: usize) -> Self {
        Self {
            kind: PivotKind::Low,
            value,
            index,
        }
    }

    /// A high pivot of `value` at `index`.
    pub fn high(value: f64, index: usize) -> Self {
        Self {
            kind: PivotKind::High,
            value,
            index,
        }
    }
}

/// Incremental fold over closes that confirms pivots on direction flips.
///
/// Flat steps are skipped: a flip is always measured against the last
/// non-flat direction, so `3, 3, 4` after a decline still confirms a low.
#[derive(Debug, Clone, Default)]
pub struct PivotTracker {
    previous: Option<(usize, f64)>,
    trend: Option<Direction>,
}

impl PivotTracker {
    /// Creates a tracker that has seen nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last non-flat direction, if any.
    pub fn trend(&self) -> Option<Direction> {
        self.trend
    }

    /// Folds the close at `index` and returns the pivot it confirms, if any.
    ///
    /// The pivot sits at the previous observation, the turning point itself.
    pub fn push(&mut self, index: usize, close: f64) -> Option<Pivot> {
        let (previous_index, previous_close) = self.previous.replace((index, close))?;

        let direction = Direction::between(previous_close, close);
        if direction.is_flat() {
            return None;
        }

        let pivot = match (self.trend, direction) {
            (Some(Direction::Falling), Direction::Rising) => Some(Pivot::low(previous_close, previous_index)),
            (Some(Direction::Rising), Direction::Falling) => Some(Pivot::high(previous_close, previous_index)),
            _ => None,
        };
        self.trend = Some(direction);
        pivot
    }

    /// Restarts the fold with `close` as the only known observation.
    pub fn reseed(&mut self, index: usize, close: f64) {
        self.previous = Some((index, close));
        self.trend = None;
    }

    /// Forgets every observation.
    pub fn reset(&mut self) {
        self.previous = None;
        self.trend = None;
    }
}

/// Returns the direction of every step `i-1 -> i` in `closes`.
pub fn directions(closes: &[f64]) -> Vec<Direction> {
    closes.windows(2).map(|w| Direction::between(w[0], w[1])).collect()
}

/// Returns every pivot confirmed over `closes`.
pub fn pivots(closes: &[f64]) -> Vec<Pivot> {
    let mut tracker = PivotTracker::new();
    closes
        .iter()
        .enumerate()
        .filter_map(|(index, close)| tracker.push(index, *close))
        .collect()
}
