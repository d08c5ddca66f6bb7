//! Execution side of the crate.
//!
//! This module provides:
//! - `Observation` and `Series`: ordered price history.
//! - `Market`: the interface strategies trade through.
//! - `Backtest`: replays a series bar by bar with simulated fills.
//! - `LiveMarket`: forwards to an external `Venue`.
//! - `Wallet` and `Fill`: simulated balances and execution records.

mod backtest;
mod fill;
mod live;
mod market;
mod observation;
mod wallet;

pub use backtest::*;
pub use fill::*;
pub use live::*;
pub use market::*;
pub use observation::*;
pub use wallet::*;
