//! Drives the detector through the `Market` interface, against a replay and
//! against a dry-run live market.

use std::{cell::RefCell, ops::ControlFlow};

use chrono::{DateTime, Duration, Utc};
use swing_rs::prelude::*;

fn start() -> DateTime<Utc> {
    DateTime::from_timestamp_secs(1515151515).unwrap()
}

// buys at 11, sells at 4
const CLOSES: [f64; 13] = [9.0, 8.0, 5.0, 6.0, 7.0, 6.0, 5.0, 6.0, 11.0, 12.0, 10.0, 11.0, 4.0];

/// Strategy shared by every market: all in on `Buy`, all out on `Sell`.
fn follow<M: Market>(market: &mut M, signal: Signal, quote: f64, base: f64) -> Result<Option<Fill>> {
    match signal {
        Signal::Buy if quote > 0.0 => market.execute(Side::Buy, quote, None).map(Some),
        Signal::Sell if base > 0.0 => market.execute(Side::Sell, base, None).map(Some),
        _ => Ok(None),
    }
}

#[test]
fn replay_round_trip() -> anyhow::Result<()> {
    let series = Series::from_closes(start(), Duration::minutes(30), &CLOSES)?;
    let config = BacktestConfig::default().warmup(2).initial_balance(1.0).fee_bps(0.0);
    let mut bt = Backtest::new("BTC_ETH", series, config)?;
    let mut detector = TrendDetector::default();

    bt.run(|bt| {
        let signal = detector.scan(bt.window())?;
        let (quote, base) = (bt.quote(), bt.base());
        follow(bt, signal, quote, base)?;
        Ok(ControlFlow::Continue(()))
    })?;

    let fills = bt.fills().collect::<Vec<_>>();
    assert_eq!(fills.len(), 2);
    assert_eq!((fills[0].side(), fills[0].price()), (Side::Buy, 11.0));
    assert_eq!((fills[1].side(), fills[1].price()), (Side::Sell, 4.0));
    assert_eq!(fills[1].timestamp(), start() + Duration::minutes(30 * 12));
    assert!((bt.quote() - 4.0 / 11.0).abs() < 1e-12);
    assert_eq!(bt.base(), 0.0);
    Ok(())
}

#[test]
fn fees_reduce_proceeds() -> anyhow::Result<()> {
    let series = Series::from_closes(start(), Duration::minutes(30), &CLOSES)?;
    let config = BacktestConfig::default().warmup(2).initial_balance(1.0);
    let mut bt = Backtest::new("BTC_ETH", series, config)?;
    let mut detector = TrendDetector::default();

    bt.run(|bt| {
        let signal = detector.scan(bt.window())?;
        let (quote, base) = (bt.quote(), bt.base());
        follow(bt, signal, quote, base)?;
        Ok(ControlFlow::Continue(()))
    })?;

    // 2.5% on the way in and on the way out
    let expected = 4.0 / 11.0 * 0.975 * 0.975;
    assert!((bt.quote() - expected).abs() < 1e-12);
    assert!(bt.fees_paid() > 0.0);
    Ok(())
}

#[test]
fn warmup_is_exposed_before_first_call() -> anyhow::Result<()> {
    let closes = (0..MIN_POINTS + 30).map(|i| 100.0 + (i as f64 / 5.0).sin()).collect::<Vec<_>>();
    let series = Series::from_closes(start(), Resolution::ThirtyMinutes.period(), &closes)?;
    let mut bt = Backtest::new("BTC_ETH", series, BacktestConfig::default().initial_balance(1.0))?;

    let mut windows = Vec::new();
    bt.run(|bt| {
        windows.push(bt.window().len());
        Ok(ControlFlow::Continue(()))
    })?;

    assert_eq!(windows.first(), Some(&MIN_POINTS));
    assert_eq!(windows.last(), Some(&(MIN_POINTS + 30)));
    assert_eq!(windows.len(), 31);
    Ok(())
}

#[test]
fn strategy_reads_history_through_market() -> anyhow::Result<()> {
    let series = Series::from_closes(start(), Duration::minutes(30), &CLOSES)?;
    let config = BacktestConfig::default().warmup(2).initial_balance(1.0);
    let mut bt = Backtest::new("BTC_ETH", series, config)?;
    let mut detector = TrendDetector::default();
    let mut signals = Vec::new();

    bt.run(|bt| {
        let now = bt.now()?;
        let history = bt.series(Resolution::ThirtyMinutes, now, now)?;
        signals.push(detector.detect(&history));
        Ok(ControlFlow::Continue(()))
    })?;

    // one call per window, from 2 to 13 bars
    assert_eq!(signals.len(), 12);
    assert_eq!(signals[7], Signal::Buy);
    // closes stay above the broken high 7 until 12 and 10 form a new range
    assert_eq!(signals[9], Signal::Buy);
    assert_eq!(signals[10], Signal::Hold);
    assert_eq!(signals[11], Signal::Sell);
    Ok(())
}

#[test]
fn stop_after_first_trade() -> anyhow::Result<()> {
    let series = Series::from_closes(start(), Duration::minutes(30), &CLOSES)?;
    let config = BacktestConfig::default().warmup(2).initial_balance(1.0);
    let mut bt = Backtest::new("BTC_ETH", series, config)?;
    let mut detector = TrendDetector::default();

    bt.run(|bt| {
        let signal = detector.scan(bt.window())?;
        let (quote, base) = (bt.quote(), bt.base());
        Ok(match follow(bt, signal, quote, base)? {
            Some(_) => ControlFlow::Break(()),
            None => ControlFlow::Continue(()),
        })
    })?;

    assert_eq!(bt.fills().count(), 1);
    assert_eq!(bt.current_price()?, 11.0);
    assert!(!bt.is_finished());
    Ok(())
}

#[cfg(feature = "metrics")]
#[test]
fn metrics_report() -> anyhow::Result<()> {
    let series = Series::from_closes(start(), Duration::minutes(30), &CLOSES)?;
    let config = BacktestConfig::default().warmup(2).initial_balance(1.0).fee_bps(0.0);
    let mut bt = Backtest::new("BTC_ETH", series, config)?;
    let mut detector = TrendDetector::default();

    bt.run(|bt| {
        let signal = detector.scan(bt.window())?;
        bt.record_signal(signal);
        let (quote, base) = (bt.quote(), bt.base());
        follow(bt, signal, quote, base)?;
        Ok(ControlFlow::Continue(()))
    })?;

    let metrics = Metrics::from(&bt);
    assert_eq!(metrics.trades(), 2);
    // Buy, Hold, Sell
    assert_eq!(metrics.signal_changes(), 3);
    assert!(metrics.return_pct() < 0.0);
    assert!(metrics.max_drawdown() > 0.0);
    Ok(())
}

struct ReplayVenue {
    history: Vec<Observation>,
    orders: RefCell<Vec<(Side, f64, f64)>>,
}

impl Venue for ReplayVenue {
    fn fetch_history(
        &self,
        _market: &str,
        _resolution: Resolution,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<Observation>> {
        Ok(self.history.clone())
    }

    fn place_order(&self, _market: &str, side: Side, quantity: f64, price: f64) -> Result<Fill> {
        self.orders.borrow_mut().push((side, quantity, price));
        Ok(Fill::new(side, price, quantity, quantity * price, 0.0, Utc::now()))
    }

    fn quote(&self, _market: &str) -> Result<Quote> {
        let last = self.history.last().map(Observation::close).ok_or(Error::EmptyHistory)?;
        Ok(Quote {
            best_bid: last - 0.5,
            best_ask: last + 0.5,
        })
    }
}

#[test]
fn same_strategy_on_live_market() -> anyhow::Result<()> {
    let history = Series::from_closes(start(), Duration::minutes(30), &CLOSES[..9])?.to_vec();
    let venue = ReplayVenue {
        history,
        orders: RefCell::new(Vec::new()),
    };

    let mut live = LiveMarket::new(venue, "BTC_ETH");
    let now = start() + Duration::minutes(30 * 8);
    let series = live.series(Resolution::ThirtyMinutes, now, now)?;
    let signal = TrendDetector::default().detect(&series);
    assert_eq!(signal, Signal::Buy);

    let fill = follow(&mut live, signal, 23.0, 0.0)?.expect("a buy");
    assert_eq!(fill.price(), 11.5);
    assert_eq!(*live.venue().orders.borrow(), vec![(Side::Buy, 2.0, 11.5)]);

    let mut dry = LiveMarket::new(
        ReplayVenue {
            history: series.to_vec(),
            orders: RefCell::new(Vec::new()),
        },
        "BTC_ETH",
    )
    .dry_run(true);
    let fill = follow(&mut dry, signal, 23.0, 0.0)?.expect("a simulated buy");
    assert!((fill.quantity() - 1.95).abs() < 1e-12);
    assert!(dry.venue().orders.borrow().is_empty());
    Ok(())
}
