mod utils;

use swing_rs::prelude::*;

fn main() -> anyhow::Result<()> {
    utils::init_tracing();

    let markets = (0..64)
        .map(|seed| (format!("BTC_{seed:02}"), utils::generate_sample_observations(500, seed, 0.01)))
        .collect::<Vec<_>>();

    let results = scan_markets(markets, DetectorConfig::default());
    for (market, signal) in &results {
        match signal {
            Ok(Signal::Hold) => {}
            Ok(signal) => println!("{market}: {signal}"),
            Err(err) => eprintln!("{market}: {err}"),
        }
    }

    let breakouts = results
        .iter()
        .filter(|(_, signal)| matches!(signal, Ok(s) if s.is_breakout()))
        .count();
    println!("{breakouts}/{} markets breaking out", results.len());
    Ok(())
}
