//! Parallel evaluation of many markets.
//!
//! Every market gets its own [`TrendDetector`]; nothing is shared between
//! workers. A malformed series fails on its own and never aborts the batch.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{
    detector::{DetectorConfig, Signal, TrendDetector},
    engine::Observation,
    errors::Result,
};

/// Scans each `(market, observations)` pair with a fresh detector.
///
/// ### Arguments
/// * `markets` - Market identifiers and their histories.
/// * `config` - Detector settings shared by every market.
///
/// ### Returns
/// One result per market, in input order.
///
/// ### Example
/// ```rust
/// use swing_rs::prelude::*;
/// use chrono::{DateTime, Duration};
///
/// let start = DateTime::from_timestamp_secs(1515151515).unwrap();
/// let up = Series::from_closes(start, Duration::minutes(30), &[1.0, 2.0, 5.0, 4.0, 3.0, 4.0, 3.0, 6.0]).unwrap();
/// let flat = Series::from_closes(start, Duration::minutes(30), &[1.0, 1.0, 1.0]).unwrap();
///
/// let results = scan_markets(
///     vec![("BTC_ETH".to_string(), up.to_vec()), ("BTC_LTC".to_string(), flat.to_vec())],
///     DetectorConfig::default(),
/// );
/// assert_eq!(results[0].1.as_ref().unwrap(), &Signal::Buy);
/// assert_eq!(results[1].1.as_ref().unwrap(), &Signal::Hold);
/// ```
pub fn scan_markets(markets: Vec<(String, Vec<Observation>)>, config: DetectorConfig) -> Vec<(String, Result<Signal>)> {
    let num_cpus = num_cpus::get();
    let chunk_size = markets.len().div_ceil(num_cpus).max(1);

    debug!("scanning {} markets in chunks of {chunk_size}", markets.len());

    markets
        .par_chunks(chunk_size)
        .flat_map_iter(|chunk| {
            let mut detector = TrendDetector::new(config);
            chunk
                .iter()
                .map(|(market, observations)| {
                    let signal = detector.scan(observations);
                    match &signal {
                        Ok(signal) if signal.is_breakout() => debug!("{market}: {signal}"),
                        Ok(_) => {}
                        Err(err) => warn!("{market} skipped: {err}"),
                    }
                    (market.clone(), signal)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
