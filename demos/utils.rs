use swing_rs::engine::{Observation, ObservationBuilder};
use chrono::{DateTime, Duration};

/// Generates deterministic 30-minute bars.
#[allow(dead_code)]
pub fn generate_sample_observations(max: i32, seed: i32, base_price: f64) -> Vec<Observation> {
    let start = DateTime::from_timestamp_secs(1515151515).unwrap();

    (0..=max)
        .map(|i| {
            // Slow drift, with a swing every ~20 bars
            let drift = base_price * (1.0 + 0.002 * (i as f64 * 0.05 + seed as f64).sin());
            let swing = 0.04 * base_price * (i as f64 * 0.3 + seed as f64).sin();
            let close = drift + swing;
            let volume = 1000.0 + 500.0 * ((i as f64 * 0.2).sin()).abs();

            ObservationBuilder::builder()
                .timestamp(start + Duration::minutes(30 * i as i64))
                .close(close)
                .volume(volume)
                .build()
                .unwrap()
        })
        .collect()
}

#[allow(dead_code)]
pub fn example_observations() -> Vec<Observation> {
    generate_sample_observations(1000, 42, 0.05)
}

/// Installs a `RUST_LOG`-driven subscriber.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
