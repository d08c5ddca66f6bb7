//! Property tests for detector invariants.
//!
//! Uses proptest to verify:
//! 1. Strictly monotonic series never leave `Hold`
//! 2. A single turn is not enough to arm a breakout
//! 3. Streaming and batch scans agree, and scans are repeatable
//! 4. Closes inside an established range never break out
//! 5. Range bounds only widen while a range is in effect
//! 6. Nothing but `Hold` is reported during warm-up

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use swing_rs::prelude::*;

fn chart(closes: &[f64]) -> Vec<Observation> {
    let start: DateTime<Utc> = DateTime::from_timestamp_secs(1515151515).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| Observation::from((start + Duration::minutes(30 * i as i64), *close)))
        .collect()
}

// ── Strategies (proptest) ────────────────────────────────────────────

/// Integer-valued closes, so flat steps show up often.
fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1u32..50, 0..200).prop_map(|v| v.into_iter().map(f64::from).collect())
}

fn arb_steps() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01..10.0_f64, 1..100)
}

fn arb_reseed() -> impl Strategy<Value = Reseed> {
    prop_oneof![Just(Reseed::Clear), Just(Reseed::BreakoutBound)]
}

// ── 1-2. Not enough structure ────────────────────────────────────────

proptest! {
    #[test]
    fn monotonic_series_hold(start in 1.0..100.0_f64, steps in arb_steps(), rising in any::<bool>()) {
        let mut close = start;
        let mut closes = vec![close];
        for step in steps {
            close = if rising { close + step } else { close - step };
            closes.push(close);
        }

        let mut detector = TrendDetector::default();
        prop_assert_eq!(detector.scan(&chart(&closes)).unwrap(), Signal::Hold);
        prop_assert_eq!(detector.pivots().count(), 0);
    }

    #[test]
    fn single_turn_holds(up in arb_steps(), down in arb_steps()) {
        let mut close = 100.0;
        let mut closes = vec![close];
        for step in up {
            close += step;
            closes.push(close);
        }
        for step in down {
            close -= step;
            closes.push(close);
        }

        let mut detector = TrendDetector::default();
        prop_assert_eq!(detector.scan(&chart(&closes)).unwrap(), Signal::Hold);
        prop_assert_eq!(detector.pivots().len(), 1);
        prop_assert_eq!(detector.phase(), Phase::AwaitingSecondPivot);
    }
}

// ── 3. Repeatability ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn streaming_matches_scan(closes in arb_closes(), reseed in arb_reseed()) {
        let observations = chart(&closes);
        let config = DetectorConfig::default().reseed(reseed);

        let mut batch = TrendDetector::new(config);
        let scanned = batch.scan(&observations).unwrap();

        let mut streaming = TrendDetector::new(config);
        let mut last = Signal::Hold;
        for observation in &observations {
            last = streaming.update(observation).unwrap();
        }

        prop_assert_eq!(scanned, last);
        prop_assert_eq!(batch.range(), streaming.range());
        prop_assert_eq!(batch.phase(), streaming.phase());

        // scanning again from the same detector gives the same answer
        prop_assert_eq!(batch.scan(&observations).unwrap(), scanned);
        prop_assert_eq!(followtrend(&observations).unwrap(), TrendDetector::default().scan(&observations).unwrap());
    }
}

// ── 4-5. Range behaviour ─────────────────────────────────────────────

proptest! {
    #[test]
    fn inside_closes_never_break_out(inside in prop::collection::vec(5.01..19.99_f64, 0..100)) {
        // establishes the range [5, 20]
        let mut closes = vec![10.0, 5.0, 20.0, 15.0];
        closes.extend(inside);

        let mut detector = TrendDetector::default();
        for observation in chart(&closes) {
            prop_assert_eq!(detector.update(&observation).unwrap(), Signal::Hold);
        }
        prop_assert_eq!(detector.phase(), Phase::InRange);
        prop_assert_eq!(detector.range().low(), Some(5.0));
        prop_assert_eq!(detector.range().high(), Some(20.0));
    }

    #[test]
    fn bounds_only_widen_in_range(closes in arb_closes(), reseed in arb_reseed()) {
        let mut detector = TrendDetector::new(DetectorConfig::default().reseed(reseed));
        let mut previous: Option<SwingRange> = None;

        for observation in chart(&closes) {
            detector.update(&observation).unwrap();
            let current = (detector.phase() == Phase::InRange).then(|| *detector.range());

            if let (Some(before), Some(after)) = (previous, current) {
                prop_assert!(after.low().unwrap() <= before.low().unwrap());
                prop_assert!(after.high().unwrap() >= before.high().unwrap());
            }
            if let Some(range) = current {
                prop_assert!(range.low().unwrap() < range.high().unwrap());
            }
            previous = current;
        }
    }
}

// ── 6. Warm-up ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn hold_during_warmup(closes in arb_closes(), min_points in 2usize..50) {
        let mut detector = TrendDetector::new(DetectorConfig::default().min_points(min_points));
        for (i, observation) in chart(&closes).iter().enumerate() {
            let signal = detector.update(observation).unwrap();
            if i + 1 < min_points {
                prop_assert_eq!(signal, Signal::Hold);
            }
        }
    }
}
