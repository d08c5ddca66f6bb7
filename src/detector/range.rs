//! Swing range state machine.
//!
//! Consumes confirmed pivots in emission order and keeps the widest low/high
//! swing seen since the range was last reset.

use std::collections::{VecDeque, vec_deque::Iter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{
    pivot::{Pivot, PivotKind},
    signal::Signal,
};

/// Phase of the range search.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No bound known yet.
    #[default]
    AwaitingFirstPivot,
    /// One bound known, waiting for a pivot of the opposite kind.
    AwaitingSecondPivot,
    /// Both bounds known, breakouts are armed.
    InRange,
}

/// What the next range starts from after a breakout.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Reseed {
    /// Both thresholds are cleared and the pivot search restarts from the
    /// breakout observation.
    #[default]
    Clear,
    /// The breakout close becomes the single bound of the next range: the new
    /// floor after an upward breakout, the new ceiling after a downward one.
    BreakoutBound,
}

/// Low and high breakout thresholds.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwingRange {
    low: Option<f64>,
    high: Option<f64>,
}

impl SwingRange {
    /// Creates thresholds from optional bounds.
    pub fn new(low: Option<f64>, high: Option<f64>) -> Self {
        Self { low, high }
    }

    /// Lower breakout threshold.
    pub fn low(&self) -> Option<f64> {
        self.low
    }

    /// Upper breakout threshold.
    pub fn high(&self) -> Option<f64> {
        self.high
    }

    /// Returns `true` once both bounds are known.
    pub fn is_complete(&self) -> bool {
        self.low.is_some() && self.high.is_some()
    }

    /// Returns the bound a pivot of `kind` would set.
    pub fn bound(&self, kind: PivotKind) -> Option<f64> {
        match kind {
            PivotKind::Low => self.low,
            PivotKind::High => self.high,
        }
    }

    /// Moves the bound matching the pivot's kind outward. Returns true if the
    /// bound changed.
    fn widen(&mut self, pivot: &Pivot) -> bool {
        let wider = match (pivot.kind, self.bound(pivot.kind)) {
            (_, None) => true,
            (PivotKind::Low, Some(low)) => pivot.value < low,
            (PivotKind::High, Some(high)) => pivot.value > high,
        };
        if wider {
            match pivot.kind {
                PivotKind::Low => self.low = Some(pivot.value),
                PivotKind::High => self.high = Some(pivot.value),
            }
        }
        wider
    }

    /// A pivot that reaches the opposite bound collapses the range.
    fn collapse(&self, pivot: &Pivot) -> Option<Signal> {
        match pivot.kind {
            PivotKind::Low => self.high.filter(|high| pivot.value >= *high).map(|_| Signal::Buy),
            PivotKind::High => self.low.filter(|low| pivot.value <= *low).map(|_| Signal::Sell),
        }
    }
}

/// Number of pivots a [`SwingRangeMachine`] remembers by default.
pub const PIVOT_HISTORY: usize = 64;

/// Drives [`Phase`] transitions from confirmed pivots.
///
/// The thresholds only depend on pivots of the current cycle; older pivots
/// are kept for inspection, up to a bounded history.
#[derive(Debug, Clone)]
pub struct SwingRangeMachine {
    phase: Phase,
    range: SwingRange,
    reseed: Reseed,
    history: usize,
    pivots: VecDeque<Pivot>,
}

impl Default for SwingRangeMachine {
    fn default() -> Self {
        Self::new(Reseed::default())
    }
}

impl SwingRangeMachine {
    /// Creates a machine awaiting its first pivot.
    pub fn new(reseed: Reseed) -> Self {
        Self {
            phase: Phase::default(),
            range: SwingRange::default(),
            reseed,
            history: PIVOT_HISTORY,
            pivots: VecDeque::new(),
        }
    }

    /// Sets how many pivots are remembered. The oldest are dropped first.
    pub fn pivot_history(mut self, history: usize) -> Self {
        self.history = history;
        while self.pivots.len() > history {
            self.pivots.pop_front();
        }
        self
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the current thresholds.
    pub fn range(&self) -> &SwingRange {
        &self.range
    }

    /// Returns the policy applied on [`reset`](Self::reset).
    pub fn reseed_policy(&self) -> Reseed {
        self.reseed
    }

    /// The most recent pivots, oldest first.
    pub fn pivots(&self) -> Iter<'_, Pivot> {
        self.pivots.iter()
    }

    /// Applies a confirmed pivot.
    ///
    /// ### Returns
    /// A breakout signal when the pivot equals or crosses the opposite bound.
    /// The machine is left untouched in that case; the caller decides when to
    /// [`reset`](Self::reset).
    pub fn apply(&mut self, pivot: Pivot) -> Option<Signal> {
        if self.history > 0 {
            if self.pivots.len() == self.history {
                self.pivots.pop_front();
            }
            self.pivots.push_back(pivot);
        }

        match self.phase {
            Phase::AwaitingFirstPivot => {
                self.range.widen(&pivot);
                self.phase = Phase::AwaitingSecondPivot;
                None
            }
            Phase::AwaitingSecondPivot if self.range.bound(pivot.kind).is_some() => {
                self.range.widen(&pivot);
                None
            }
            Phase::AwaitingSecondPivot => {
                if let Some(signal) = self.range.collapse(&pivot) {
                    return Some(signal);
                }
                self.range.widen(&pivot);
                self.phase = Phase::InRange;
                None
            }
            Phase::InRange => {
                if let Some(signal) = self.range.collapse(&pivot) {
                    return Some(signal);
                }
                self.range.widen(&pivot);
                None
            }
        }
    }

    /// Starts a new cycle after a breakout at `close`.
    pub fn reset(&mut self, close: f64, signal: Signal) {
        self.range = match (self.reseed, signal) {
            (Reseed::BreakoutBound, Signal::Buy) => SwingRange::new(Some(close), None),
            (Reseed::BreakoutBound, Signal::Sell) => SwingRange::new(None, Some(close)),
            _ => SwingRange::default(),
        };
        self.phase = if self.range.low.is_some() || self.range.high.is_some() {
            Phase::AwaitingSecondPivot
        } else {
            Phase::AwaitingFirstPivot
        };
    }

    /// Forgets all state, including recorded pivots.
    pub fn clear(&mut self) {
        *self = Self::new(self.reseed).pivot_history(self.history);
    }
}
