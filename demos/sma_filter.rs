//! Breakouts confirmed by a moving average: buy only above the SMA, sell only
//! below it.

mod utils;

use std::ops::ControlFlow;

use swing_rs::prelude::*;
use ta::{Next, indicators::SimpleMovingAverage};

fn main() -> anyhow::Result<()> {
    utils::init_tracing();

    let data = utils::example_observations();
    let config = BacktestConfig::default().initial_balance(1.0).fee_bps(100.0);
    let mut bt = Backtest::new("BTC_ETH", Series::new(data)?, config)?;

    let mut detector = TrendDetector::default();
    let mut sma = SimpleMovingAverage::new(50)?;
    // prime the average on the warm-up bars
    let mut average = 0.0;
    for observation in bt.window() {
        average = sma.next(observation.close());
    }

    bt.run(|bt| {
        let close = bt.current_price()?;
        let signal = detector.scan(bt.window())?;
        let (quote, base) = (bt.quote(), bt.base());

        match signal {
            Signal::Buy if quote > 0.0 && close > average => {
                bt.execute(Side::Buy, quote, None)?;
            }
            Signal::Sell if base > 0.0 && close < average => {
                bt.execute(Side::Sell, base, None)?;
            }
            _ => {}
        }

        if !bt.is_finished() {
            // the next window adds one bar
            if let Some(next) = bt.history().nth(bt.cursor()) {
                average = sma.next(next.close());
            }
        }
        Ok(ControlFlow::Continue(()))
    })?;

    println!("trades {}", bt.fills().count());
    println!("equity {:.8}, fees {:.8}", bt.equity()?, bt.fees_paid());
    Ok(())
}
