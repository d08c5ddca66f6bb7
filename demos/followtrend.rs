mod utils;

use std::ops::ControlFlow;

use swing_rs::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    utils::init_tracing();

    let data = utils::example_observations();
    let first_price = data.first().map(Observation::close).ok_or(Error::EmptyHistory)?;
    let last_price = data.last().map(Observation::close).ok_or(Error::EmptyHistory)?;

    let initial_balance = 1.0;
    let config = BacktestConfig::default().initial_balance(initial_balance);
    let mut bt = Backtest::new("BTC_ETH", Series::new(data)?, config)?;
    let mut detector = TrendDetector::default();

    bt.run(|bt| {
        let signal = detector.scan(bt.window())?;
        #[cfg(feature = "metrics")]
        bt.record_signal(signal);

        let (quote, base) = (bt.quote(), bt.base());
        match signal {
            Signal::Buy if quote > 0.0 => {
                bt.execute(Side::Buy, quote, None)?;
            }
            Signal::Sell if base > 0.0 => {
                bt.execute(Side::Sell, base, None)?;
            }
            _ => {}
        }
        Ok(ControlFlow::Continue(()))
    })?;

    #[cfg(not(feature = "metrics"))]
    {
        println!("trades {}", bt.fills().count());

        let equity = bt.equity()?;
        let equity_perf = initial_balance.change(equity);
        println!("performance {equity:.8} ({equity_perf:.2}%), fees {:.8}", bt.fees_paid());

        let buy_and_hold = (initial_balance / first_price) * last_price;
        let buy_and_hold_perf = first_price.change(last_price);
        println!("buy and hold {buy_and_hold:.8} ({buy_and_hold_perf:.2}%)");
    }

    #[cfg(feature = "metrics")]
    {
        let _ = (first_price, last_price);
        let metrics = Metrics::from(&bt);
        println!("{metrics}");
    }

    Ok(())
}
