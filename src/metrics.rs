//! Performance metrics for backtesting.
//!
//! The [`Backtest`] records an [`Event`] for every fill, every wallet change
//! and every signal change passed to [`Backtest::record_signal`]. [`Metrics`]
//! summarizes that log:
//! - Final equity and return
//! - Fees paid and trade count
//! - Max drawdown
//!
//! It needs the `metrics` feature.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::{
    detector::Signal,
    engine::{Backtest, Fill, Wallet},
};

/// Events generated during a backtest.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// A trade was executed.
    Fill(Fill),

    /// The detector changed its answer.
    Signal(DateTime<Utc>, Signal),

    /// The wallet was updated after a fill.
    WalletUpdate {
        /// Moment
        datetime: DateTime<Utc>,
        /// Quote balance.
        quote: f64,
        /// Base balance.
        base: f64,
        /// Total fees paid, in quote units.
        fees: f64,
        /// Account value at the fill price.
        equity: f64,
    },
}

impl From<(DateTime<Utc>, &Wallet, f64)> for Event {
    fn from((datetime, wallet, price): (DateTime<Utc>, &Wallet, f64)) -> Self {
        Self::WalletUpdate {
            datetime,
            quote: wallet.quote(),
            base: wallet.base(),
            fees: wallet.fees_paid(),
            equity: wallet.equity(price),
        }
    }
}

impl Backtest {
    /// Records `signal` if it differs from the last recorded one.
    pub fn record_signal(&mut self, signal: Signal) {
        let last = self
            .events()
            .rev()
            .find_map(|event| match event {
                Event::Signal(_, signal) => Some(*signal),
                _ => None,
            })
            .unwrap_or_default();
        if last == signal {
            return;
        }
        if let Ok(now) = self.now() {
            self.push_event(Event::Signal(now, signal));
        }
    }
}

/// Summary of a backtest run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Metrics {
    initial_equity: f64,
    final_equity: f64,
    fees: f64,
    events: Vec<Event>,
}

impl From<&Backtest> for Metrics {
    fn from(value: &Backtest) -> Self {
        let final_equity = value.equity().unwrap_or_else(|_| value.quote());
        Self {
            initial_equity: value.initial_quote(),
            final_equity,
            fees: value.fees_paid(),
            events: value.events().cloned().collect(),
        }
    }
}

impl Metrics {
    /// Creates a new `Metrics` instance from a list of events, the initial and final equity and the fees paid.
    pub fn new(events: Vec<Event>, initial_equity: f64, final_equity: f64, fees: f64) -> Self {
        Self {
            initial_equity,
            final_equity,
            fees,
            events,
        }
    }

    /// Returns the initial equity.
    pub fn initial_equity(&self) -> f64 {
        self.initial_equity
    }

    /// Returns the equity at the last exposed bar.
    pub fn final_equity(&self) -> f64 {
        self.final_equity
    }

    /// Returns the cumulative fees paid.
    pub fn fees(&self) -> f64 {
        self.fees
    }

    /// Returns the events.
    pub fn events(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Returns the number of fills.
    pub fn trades(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, Event::Fill(_))).count()
    }

    /// Returns the number of signal changes.
    pub fn signal_changes(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, Event::Signal(..))).count()
    }

    /// Returns the change from initial to final equity, in percent.
    pub fn return_pct(&self) -> f64 {
        use crate::BasisPoints;
        self.initial_equity.change(self.final_equity)
    }

    /// Computes the maximum drawdown of the recorded equity as a percentage.
    pub fn max_drawdown(&self) -> f64 {
        let mut max_peak = self.initial_equity;
        let mut max_drawdown = 0.0;

        for event in &self.events {
            if let Event::WalletUpdate { equity, .. } = event {
                if *equity > max_peak {
                    max_peak = *equity;
                }
                let drawdown = (max_peak - equity) / max_peak;
                if drawdown > max_drawdown {
                    max_drawdown = drawdown;
                }
            }
        }

        max_drawdown * 100.0
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Backtest Metrics ===")?;
        writeln!(f, "Initial Equity: {:.8}", self.initial_equity)?;
        writeln!(f, "Final Equity: {:.8}", self.final_equity)?;
        writeln!(f, "Return: {:.2}%", self.return_pct())?;
        writeln!(f, "Fees paid: {:.8}", self.fees)?;
        #[allow(clippy::writeln_empty_string)]
        writeln!(f, "")?;
        writeln!(f, "Trades: {}", self.trades())?;
        writeln!(f, "Signal changes: {}", self.signal_changes())?;
        writeln!(f, "Max Drawdown: {:.2}%", self.max_drawdown())
    }
}

#[cfg(test)]
fn wallet_update(equity: f64) -> Event {
    Event::WalletUpdate {
        datetime: DateTime::default(),
        quote: equity,
        base: 0.0,
        fees: 0.0,
        equity,
    }
}

#[cfg(test)]
#[test]
fn max_drawdown() {
    let events = vec![
        wallet_update(10000.0),
        wallet_update(12000.0),
        wallet_update(9000.0),
        wallet_update(11000.0),
    ];
    let metrics = Metrics::new(events, 10000.0, 11000.0, 0.0);
    assert_eq!(metrics.max_drawdown(), 25.0); // (12000 - 9000) / 12000 = 25%
}

#[cfg(test)]
#[test]
fn max_drawdown_no_events() {
    let metrics = Metrics::new(vec![], 10000.0, 10000.0, 0.0);
    assert_eq!(metrics.max_drawdown(), 0.0);
}

#[cfg(test)]
#[test]
fn return_pct() {
    let metrics = Metrics::new(vec![], 100.0, 110.0, 0.0);
    assert_eq!(metrics.return_pct(), 10.0);
}

#[cfg(test)]
#[test]
fn metrics_from_backtest() {
    use crate::engine::{BacktestConfig, Market, Series, Side};
    use chrono::Duration;

    let start = DateTime::from_timestamp_secs(1515151515).unwrap();
    let series = Series::from_closes(start, Duration::minutes(30), &[10.0, 10.0, 20.0]).unwrap();
    let config = BacktestConfig::default().warmup(1).initial_balance(100.0).fee_bps(0.0);
    let mut bt = Backtest::new("BTC_ETH", series, config).unwrap();

    bt.record_signal(Signal::Buy);
    bt.execute(Side::Buy, 100.0, None).unwrap();
    bt.advance();
    bt.record_signal(Signal::Buy);
    bt.advance();
    bt.record_signal(Signal::Hold);

    let metrics = Metrics::from(&bt);
    assert_eq!(metrics.trades(), 1);
    assert_eq!(metrics.signal_changes(), 2);
    assert_eq!(metrics.final_equity(), 200.0);
    assert_eq!(metrics.return_pct(), 100.0);
    assert_eq!(metrics.events().count(), 4);
    assert!(metrics.to_string().contains("Trades: 1"));
}
