//! # swing-rs: swing-range breakout detection and replay
//!
//! **swing-rs** watches a price series for confirmed local lows and highs, keeps
//! the widest swing between them as a trading range, and reports when the
//! price breaks out of it. The same strategy code can then be replayed over
//! history or pointed at a live venue.
//!
//! ## Core Components
//! | Component          | Description                                                                       |
//! |--------------------|-----------------------------------------------------------------------------------|
//! | **`Observation`**  | Timestamped close, with optional OHLCV fields.                                    |
//! | **`Series`**       | Observations in non-decreasing timestamp order.                                   |
//! | **`TrendDetector`**| Stateful scanner answering `Buy`, `Sell` or `Hold`.                               |
//! | **`Market`**       | What a strategy trades through: price, executions and history.                    |
//! | **`Backtest`**     | Replays a series bar by bar with simulated fills and a wallet.                    |
//! | **`LiveMarket`**   | `Market` on top of an external `Venue`, with a dry-run mode.                      |
//! | **`Metrics`**      | Return, fees, trade count and drawdown of a replay *(feature `metrics`)*.         |
//! | **`scan_markets`** | Evaluates many markets in parallel *(feature `parallel`)*.                        |
//!
//! ## Detection
//! A pivot is confirmed when the price direction flips: a falling-then-rising
//! turn confirms a low, a rising-then-falling turn confirms a high. Flat steps
//! never flip the direction. Once both a low and a high are known, a close
//! strictly above the high is a `Buy` and strictly below the low is a `Sell`.
//! A breakout resets the range; its signal stays in effect while closes stay
//! beyond the broken bound, until a new range is established.
//!
//! ```rust
//! use swing_rs::prelude::*;
//! use chrono::{DateTime, Duration};
//!
//! let start = DateTime::from_timestamp_secs(1515151515).unwrap();
//! let closes = [9.0, 8.0, 5.0, 6.0, 7.0, 6.0, 5.0, 6.0, 11.0, 12.0, 12.0];
//! let series = Series::from_closes(start, Duration::minutes(30), &closes).unwrap();
//!
//! assert_eq!(followtrend(&series).unwrap(), Signal::Buy);
//! ```
//!
//! ## Replay
//! ```rust
//! use std::ops::ControlFlow;
//!
//! use swing_rs::prelude::*;
//! use chrono::{DateTime, Duration};
//!
//! let start = DateTime::from_timestamp_secs(1515151515).unwrap();
//! let closes = [9.0, 8.0, 5.0, 6.0, 7.0, 6.0, 5.0, 6.0, 11.0, 12.0, 10.0, 11.0, 4.0];
//! let series = Series::from_closes(start, Duration::minutes(30), &closes).unwrap();
//!
//! let config = BacktestConfig::default().warmup(2).initial_balance(1.0);
//! let mut backtest = Backtest::new("BTC_ETH", series, config).unwrap();
//! let mut detector = TrendDetector::default();
//!
//! backtest
//!     .run(|bt| {
//!         let (quote, base) = (bt.quote(), bt.base());
//!         match detector.scan(bt.window())? {
//!             Signal::Buy if quote > 0.0 => {
//!                 bt.execute(Side::Buy, quote, None)?;
//!             }
//!             Signal::Sell if base > 0.0 => {
//!                 bt.execute(Side::Sell, base, None)?;
//!             }
//!             _ => {}
//!         }
//!         Ok(ControlFlow::Continue(()))
//!     })
//!     .unwrap();
//!
//! assert_eq!(backtest.fills().count(), 2);
//! ```
//!
//! ## Fees
//! Fees are proportional and expressed in basis points (250 bps = 2.5%). They
//! are charged on what the trade receives: base units for a buy, quote units
//! for a sell.
//!
//! ## Error Handling
//! Every fallible operation returns [`errors::Result`]. Unordered input,
//! insufficient history, invalid fees and rejected executions are reported
//! as [`errors::Error`] variants.
#![warn(missing_docs)]

/// Trend-reversal signal detection: pivots, swing ranges and breakouts.
pub mod detector;

/// Price history, markets, replay and live execution.
pub mod engine;

/// Error types for the library.
pub mod errors;

/// Utility functions and helpers.
mod utils;

/// Performance metrics: return, fees, drawdown.
#[cfg(feature = "metrics")]
pub mod metrics;

/// Parallel evaluation of many markets.
#[cfg(feature = "parallel")]
pub mod scanner;

#[cfg(feature = "serde")]
pub use utils::get_data_from_file;

/// Re-exports of commonly used types and traits for convenience.
pub mod prelude {
    pub use super::*;
    pub use crate::detector::*;
    pub use crate::engine::*;
    pub use crate::errors::*;

    #[cfg(feature = "metrics")]
    pub use crate::metrics::*;

    #[cfg(feature = "parallel")]
    pub use crate::scanner::*;
}

/// Basis-point arithmetic on prices and amounts.
pub trait BasisPoints {
    /// Returns `bps` basis points of the value.
    ///
    /// ### Arguments
    /// * `bps` - Basis points (e.g., 250.0 for 2.5%).
    fn bps(self, bps: Self) -> Self;

    /// Returns the value decreased by `bps` basis points.
    fn sub_bps(self, bps: Self) -> Self;

    /// Calculates the percentage change between two values.
    ///
    /// ### Arguments
    /// * `new` - The new value to compare with.
    ///
    /// ### Returns
    /// The percentage change from the original value to the new value.
    fn change(self, new: Self) -> Self;
}

impl BasisPoints for f64 {
    fn bps(self, bps: Self) -> Self {
        self * bps / 10_000.0
    }

    fn sub_bps(self, bps: Self) -> Self {
        self - self.bps(bps)
    }

    fn change(self, new: Self) -> Self {
        (new - self) / self * 100.0
    }
}

#[cfg(test)]
mod basis_points {
    use super::*;

    #[test]
    fn bps() {
        assert_eq!(0.25, 10.0.bps(250.0))
    }

    #[test]
    fn sub_bps() {
        assert_eq!(9.75, 10.0.sub_bps(250.0))
    }

    #[test]
    fn change() {
        assert_eq!(10.0, 100.0.change(110.0))
    }
}
