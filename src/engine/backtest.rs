use std::{ops::ControlFlow, sync::Arc};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "metrics")]
use crate::metrics::Event;
use crate::{
    engine::{Fill, MIN_POINTS, Market, Observation, Resolution, Series, Side, Wallet, simulate_fill, validate_fee},
    errors::{Error, Result},
};

/// Backtest settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Bars exposed before the first strategy call.
    warmup: usize,
    /// Proportional fee in basis points.
    fee_bps: f64,
    /// Starting quote balance.
    initial_balance: f64,
    /// Granularity of the replayed history.
    resolution: Resolution,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            warmup: MIN_POINTS,
            fee_bps: 250.0,
            initial_balance: 1.0,
            resolution: Resolution::default(),
        }
    }
}

impl BacktestConfig {
    /// Sets the number of bars exposed before the first strategy call.
    pub fn warmup(mut self, warmup: usize) -> Self {
        self.warmup = warmup;
        self
    }

    /// Sets the fee in basis points (e.g. 250.0 for 2.5%).
    pub fn fee_bps(mut self, fee_bps: f64) -> Self {
        self.fee_bps = fee_bps;
        self
    }

    /// Sets the starting quote balance.
    pub fn initial_balance(mut self, initial_balance: f64) -> Self {
        self.initial_balance = initial_balance;
        self
    }

    /// Sets the resolution the history was recorded at.
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Returns the warm-up length, at least one bar.
    pub fn warmup_bars(&self) -> usize {
        self.warmup.max(1)
    }

    /// Returns the fee in basis points.
    pub fn fee(&self) -> f64 {
        self.fee_bps
    }

    /// Returns the starting quote balance.
    pub fn balance(&self) -> f64 {
        self.initial_balance
    }

    /// Returns the resolution of the history.
    pub fn history_resolution(&self) -> Resolution {
        self.resolution
    }

    /// Reads a configuration from a JSON file. Missing fields take their default.
    #[cfg(feature = "serde")]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }
}

/// Bar-by-bar replay of a price history.
///
/// The strategy sees the window `history[..cursor]`; the cursor starts at the
/// warm-up size and moves forward one bar per [`advance`](Self::advance).
/// Executions fill at the close of the last exposed bar unless a price is
/// given, and are booked against an internal [`Wallet`].
#[derive(Debug, Clone)]
pub struct Backtest {
    name: String,
    data: Arc<[Observation]>,
    cursor: usize,
    config: BacktestConfig,
    wallet: Wallet,
    fills: Vec<Fill>,
    #[cfg(feature = "metrics")]
    events: Vec<Event>,
}

impl std::ops::Deref for Backtest {
    type Target = Wallet;

    fn deref(&self) -> &Self::Target {
        &self.wallet
    }
}

impl Backtest {
    /// Creates a new backtest instance.
    ///
    /// ### Arguments
    /// * `name` - Market identifier reported through [`Market::name`].
    /// * `series` - Historical observations.
    /// * `config` - Warm-up, fee, balance and resolution.
    ///
    /// ### Returns
    /// The backtest, or an error if the history is empty or shorter than the
    /// warm-up, or if the fee or balance is invalid.
    ///
    /// ### Example
    /// ```rust
    /// use swing_rs::prelude::*;
    /// use chrono::{DateTime, Duration};
    ///
    /// let start = DateTime::from_timestamp_secs(1515151515).unwrap();
    /// let series = Series::from_closes(start, Duration::minutes(30), &[10.0, 11.0, 12.0]).unwrap();
    /// let config = BacktestConfig::default().warmup(2).initial_balance(100.0);
    ///
    /// let mut bt = Backtest::new("BTC_ETH", series, config).unwrap();
    /// assert_eq!(bt.current_price().unwrap(), 11.0);
    ///
    /// let fill = bt.execute(Side::Buy, 100.0, None).unwrap();
    /// assert_eq!(fill.price(), 11.0);
    /// ```
    pub fn new(name: impl Into<String>, series: Series, config: BacktestConfig) -> Result<Self> {
        if series.is_empty() {
            return Err(Error::EmptyHistory);
        }
        validate_fee(config.fee_bps)?;

        let warmup = config.warmup_bars();
        if series.len() < warmup {
            return Err(Error::InsufficientData {
                required: warmup,
                available: series.len(),
            });
        }

        let name = name.into();
        info!(
            "Backtest {}: {} bars ({} warmup, {} replayed)",
            name,
            series.len(),
            warmup,
            series.len() - warmup
        );

        Ok(Self {
            name,
            data: series.shared(),
            cursor: warmup,
            wallet: Wallet::new(config.initial_balance)?,
            config,
            fills: Vec::new(),
            #[cfg(feature = "metrics")]
            events: Vec::new(),
        })
    }

    /// Returns the settings.
    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Returns the number of exposed bars.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the bars visible to the strategy.
    pub fn window(&self) -> &[Observation] {
        &self.data[..self.cursor]
    }

    /// Returns an iterator over the full history.
    pub fn history(&self) -> std::slice::Iter<'_, Observation> {
        self.data.iter()
    }

    /// Returns the last exposed bar.
    pub fn last(&self) -> Result<&Observation> {
        self.window().last().ok_or(Error::EmptyHistory)
    }

    /// Returns the time of the last exposed bar.
    pub fn now(&self) -> Result<DateTime<Utc>> {
        self.last().map(Observation::timestamp)
    }

    /// Returns `true` once every bar is exposed.
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.data.len()
    }

    /// Returns the executed fills.
    pub fn fills(&self) -> std::slice::Iter<'_, Fill> {
        self.fills.iter()
    }

    /// Returns an iterator over the recorded events.
    #[cfg(feature = "metrics")]
    pub fn events(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Returns the account value at the current price.
    pub fn equity(&self) -> Result<f64> {
        Ok(self.wallet.equity(self.current_price()?))
    }

    /// Exposes one more bar.
    ///
    /// ### Returns
    /// `false` once the whole history is exposed.
    pub fn advance(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Runs the backtest, calling `strategy` once per exposed window.
    ///
    /// The first call sees the warm-up window; the loop ends after the call
    /// that sees the whole history, or as soon as the strategy breaks.
    ///
    /// ### Example
    /// ```rust
    /// use std::ops::ControlFlow;
    ///
    /// use swing_rs::prelude::*;
    /// use chrono::{DateTime, Duration};
    ///
    /// let start = DateTime::from_timestamp_secs(1515151515).unwrap();
    /// let closes = [1.0, 2.0, 5.0, 4.0, 3.0, 4.0, 3.0, 6.0, 7.0];
    /// let series = Series::from_closes(start, Duration::minutes(30), &closes).unwrap();
    /// let config = BacktestConfig::default().warmup(2).initial_balance(10.0);
    ///
    /// let mut bt = Backtest::new("BTC_ETH", series, config).unwrap();
    /// let mut detector = TrendDetector::default();
    /// bt.run(|bt| {
    ///     let quote = bt.quote();
    ///     if detector.scan(bt.window())? == Signal::Buy && bt.base() == 0.0 {
    ///         bt.execute(Side::Buy, quote, None)?;
    ///     }
    ///     Ok(ControlFlow::Continue(()))
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(bt.fills().count(), 1);
    /// ```
    pub fn run<S>(&mut self, mut strategy: S) -> Result<()>
    where
        S: FnMut(&mut Self) -> Result<ControlFlow<()>>,
    {
        loop {
            if strategy(self)?.is_break() {
                info!("Backtest {} stopped at bar {}", self.name, self.cursor);
                break;
            }
            if !self.advance() {
                break;
            }
        }
        info!(
            "Backtest {} finished: {} fills, {:.8} fees paid",
            self.name,
            self.fills.len(),
            self.wallet.fees_paid()
        );
        Ok(())
    }

    /// Resets the backtest to its initial state.
    pub fn reset(&mut self) {
        #[cfg(feature = "metrics")]
        {
            self.events = Vec::new();
        }

        self.cursor = self.config.warmup_bars();
        self.wallet.reset();
        self.fills = Vec::new();
    }
}

impl Market for Backtest {
    fn name(&self) -> &str {
        &self.name
    }

    fn current_price(&self) -> Result<f64> {
        self.last().map(Observation::close)
    }

    fn execute(&mut self, side: Side, amount: f64, price: Option<f64>) -> Result<Fill> {
        let bar = *self.last()?;
        let price = price.unwrap_or(bar.close());
        let fill = simulate_fill(side, amount, price, self.config.fee_bps, bar.timestamp())?;

        if let Err(err) = self.wallet.apply(&fill) {
            warn!("{side} of {amount} on {} rejected: {err}", self.name);
            return Err(err);
        }
        self.fills.push(fill);

        #[cfg(feature = "metrics")]
        {
            self.events.push(Event::Fill(fill));
            self.events.push(Event::from((bar.timestamp(), &self.wallet, price)));
        }
        Ok(fill)
    }

    /// Returns the exposed window. `start` and `end` are ignored: the
    /// replay decides which bars are visible.
    fn series(&mut self, resolution: Resolution, _start: DateTime<Utc>, _end: DateTime<Utc>) -> Result<Series> {
        if resolution != self.config.resolution {
            return Err(Error::ResolutionMismatch {
                expected: self.config.resolution.to_string(),
                requested: resolution.to_string(),
            });
        }
        Ok(Series::trusted(Arc::from(self.window())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp_secs(1515151515).unwrap()
    }

    fn get_data() -> Series {
        Series::from_closes(start(), Duration::minutes(30), &[8.0, 9.0, 10.0, 12.0, 20.0]).unwrap()
    }

    fn config() -> BacktestConfig {
        BacktestConfig::default().warmup(3).initial_balance(100.0)
    }

    #[test]
    fn window_starts_at_warmup() {
        let bt = Backtest::new("BTC_ETH", get_data(), config()).unwrap();
        assert_eq!(bt.cursor(), 3);
        assert_eq!(bt.window().len(), 3);
        assert_eq!(bt.current_price().unwrap(), 10.0);
        assert_eq!(bt.now().unwrap(), start() + Duration::minutes(60));
        assert_eq!(bt.name(), "BTC_ETH");
    }

    #[test]
    fn advance_until_end() {
        let mut bt = Backtest::new("BTC_ETH", get_data(), config()).unwrap();
        assert!(bt.advance());
        assert_eq!(bt.current_price().unwrap(), 12.0);
        assert!(bt.advance());
        assert_eq!(bt.current_price().unwrap(), 20.0);
        assert!(bt.is_finished());
        assert!(!bt.advance());
        assert_eq!(bt.cursor(), 5);
    }

    #[test]
    fn buy_with_fee() {
        let mut bt = Backtest::new("BTC_ETH", get_data(), config()).unwrap();
        let fill = bt.execute(Side::Buy, 100.0, None).unwrap();
        // 100/10 - (100/10)/100*2.5
        assert_eq!(fill.quantity(), 9.75);
        assert_eq!(fill.price(), 10.0);
        assert_eq!(fill.total(), 100.0);
        assert_eq!(fill.timestamp(), start() + Duration::minutes(60));
        assert_eq!(bt.base(), 9.75);
        assert_eq!(bt.quote(), 0.0);
    }

    #[test]
    fn sell_at_later_bar() {
        let mut bt = Backtest::new("BTC_ETH", get_data(), config().fee_bps(0.0)).unwrap();
        bt.execute(Side::Buy, 100.0, None).unwrap();
        bt.advance();
        bt.advance();
        let fill = bt.execute(Side::Sell, 10.0, None).unwrap();
        assert_eq!(fill.total(), 200.0);
        assert_eq!(bt.quote(), 200.0);
        assert_eq!(bt.equity().unwrap(), 200.0);
        assert_eq!(bt.fills().count(), 2);
    }

    #[test]
    fn explicit_price_overrides_close() {
        let mut bt = Backtest::new("BTC_ETH", get_data(), config().fee_bps(0.0)).unwrap();
        let fill = bt.execute(Side::Buy, 50.0, Some(5.0)).unwrap();
        assert_eq!(fill.price(), 5.0);
        assert_eq!(fill.quantity(), 10.0);
    }

    #[test]
    fn rejected_execution_is_not_booked() {
        let mut bt = Backtest::new("BTC_ETH", get_data(), config()).unwrap();
        let result = bt.execute(Side::Sell, 1.0, None);
        assert!(matches!(result, Err(Error::InsufficientFunds(_, _))));
        assert_eq!(bt.fills().count(), 0);
    }

    #[test]
    fn history_shorter_than_warmup() {
        let result = Backtest::new("BTC_ETH", get_data(), config().warmup(6));
        assert!(matches!(
            result,
            Err(Error::InsufficientData {
                required: 6,
                available: 5
            })
        ));
    }

    #[test]
    fn empty_history() {
        let series = Series::from_closes(start(), Duration::minutes(30), &[]).unwrap();
        let result = Backtest::new("BTC_ETH", series, config());
        assert!(matches!(result, Err(Error::EmptyHistory)));
    }

    #[test]
    fn invalid_fee() {
        let result = Backtest::new("BTC_ETH", get_data(), config().fee_bps(-5.0));
        assert!(matches!(result, Err(Error::InvalidFee(_))));
    }

    #[test]
    fn run_visits_every_window() {
        let mut bt = Backtest::new("BTC_ETH", get_data(), config()).unwrap();
        let mut seen = Vec::new();
        bt.run(|bt| {
            seen.push(bt.window().len());
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();
        assert_eq!(seen, vec![3, 4, 5]);
    }

    #[test]
    fn run_stops_on_break() {
        let mut bt = Backtest::new("BTC_ETH", get_data(), config()).unwrap();
        let mut calls = 0;
        bt.run(|bt| {
            calls += 1;
            if bt.current_price()? >= 12.0 {
                return Ok(ControlFlow::Break(()));
            }
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();
        assert_eq!(calls, 2);
        assert_eq!(bt.cursor(), 4);
        assert!(!bt.is_finished());
    }

    #[test]
    fn run_propagates_strategy_errors() {
        let mut bt = Backtest::new("BTC_ETH", get_data(), config()).unwrap();
        let result = bt.run(|bt| {
            bt.execute(Side::Sell, 1.0, None)?;
            Ok(ControlFlow::Continue(()))
        });
        assert!(matches!(result, Err(Error::InsufficientFunds(_, _))));
    }

    #[test]
    fn series_is_the_window() {
        let mut bt = Backtest::new("BTC_ETH", get_data(), config()).unwrap();
        bt.advance();
        let series = bt.series(Resolution::ThirtyMinutes, start(), start()).unwrap();
        assert_eq!(series.len(), 4);

        let result = bt.series(Resolution::OneDay, start(), start());
        assert!(matches!(result, Err(Error::ResolutionMismatch { .. })));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_from_json_file() {
        let path = std::env::temp_dir().join(format!("swing-rs-config-{}.json", crate::utils::random_id()));
        std::fs::write(&path, r#"{"warmup": 3, "fee_bps": 100.0, "resolution": "4h"}"#).unwrap();

        let config = BacktestConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(path).unwrap();

        assert_eq!(config.warmup_bars(), 3);
        assert_eq!(config.fee(), 100.0);
        assert_eq!(config.balance(), 1.0);
        assert_eq!(config.history_resolution(), Resolution::FourHours);
    }

    #[test]
    fn reset_rewinds() {
        let mut bt = Backtest::new("BTC_ETH", get_data(), config()).unwrap();
        bt.execute(Side::Buy, 100.0, None).unwrap();
        bt.advance();
        bt.reset();
        assert_eq!(bt.cursor(), 3);
        assert_eq!(bt.quote(), 100.0);
        assert_eq!(bt.fills().count(), 0);
    }
}
