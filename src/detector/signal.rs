#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::range::{Phase, SwingRange};

/// Trading decision derived from the swing range.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Signal {
    /// No opinion: still searching for a range, or inside one.
    #[default]
    Hold = 0,
    /// Close broke above the range.
    Buy = 1,
    /// Close broke below the range.
    Sell = -1,
}

impl Signal {
    /// Returns the signal as `-1`, `0` or `1`.
    pub fn value(self) -> i8 {
        self as i8
    }

    /// Returns `true` for `Buy` and `Sell`.
    pub fn is_breakout(self) -> bool {
        !matches!(self, Signal::Hold)
    }
}

impl From<Signal> for i8 {
    fn from(value: Signal) -> Self {
        value.value()
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Hold => write!(f, "HOLD"),
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
        }
    }
}

/// Classifies `close` against the active range.
///
/// Only an established range can produce a breakout, and equality with a
/// threshold is not a breakout.
pub fn evaluate(phase: Phase, range: &SwingRange, close: f64) -> Signal {
    if phase != Phase::InRange {
        return Signal::Hold;
    }
    match (range.low(), range.high()) {
        (_, Some(high)) if close > high => Signal::Buy,
        (Some(low), _) if close < low => Signal::Sell,
        _ => Signal::Hold,
    }
}
