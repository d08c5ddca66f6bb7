use std::sync::Arc;

use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use chrono::serde::ts_seconds;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// A single timestamped price observation.
///
/// Only `close` feeds the detector; the other prices and the volume ride along
/// for strategies that want them.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    #[cfg_attr(feature = "serde", serde(with = "ts_seconds", alias = "date"))]
    timestamp: DateTime<Utc>,
    close: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    open: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    high: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    low: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    volume: Option<f64>,
}

impl From<(DateTime<Utc>, f64)> for Observation {
    fn from((timestamp, close): (DateTime<Utc>, f64)) -> Self {
        Self {
            timestamp,
            close,
            open: None,
            high: None,
            low: None,
            volume: None,
        }
    }
}

impl Observation {
    /// Returns the observation time.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the close price.
    pub fn close(&self) -> f64 {
        self.close
    }

    /// Returns the open price, if recorded.
    pub fn open(&self) -> Option<f64> {
        self.open
    }

    /// Returns the high price, if recorded.
    pub fn high(&self) -> Option<f64> {
        self.high
    }

    /// Returns the low price, if recorded.
    pub fn low(&self) -> Option<f64> {
        self.low
    }

    /// Returns the traded volume, if recorded.
    pub fn volume(&self) -> Option<f64> {
        self.volume
    }
}

/// Builder for [`Observation`] when the OHLCV fields are available.
#[derive(Debug, Default)]
pub struct ObservationBuilder {
    timestamp: Option<DateTime<Utc>>,
    close: Option<f64>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    volume: Option<f64>,
}

impl ObservationBuilder {
    /// Starts an empty builder. `timestamp` and `close` are required.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Sets the timestamp.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the close price.
    pub fn close(mut self, close: f64) -> Self {
        self.close = Some(close);
        self
    }

    /// Sets the open price.
    pub fn open(mut self, open: f64) -> Self {
        self.open = Some(open);
        self
    }

    /// Sets the high price.
    pub fn high(mut self, high: f64) -> Self {
        self.high = Some(high);
        self
    }

    /// Sets the low price.
    pub fn low(mut self, low: f64) -> Self {
        self.low = Some(low);
        self
    }

    /// Sets the volume.
    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Builds the observation.
    ///
    /// ### Returns
    /// The observation, or an error if `timestamp` or `close` is missing or the
    /// close is not a finite number.
    pub fn build(self) -> Result<Observation> {
        let timestamp = self.timestamp.ok_or(Error::MissingField("timestamp"))?;
        let close = self.close.ok_or(Error::MissingField("close"))?;
        if !close.is_finite() {
            return Err(Error::InvalidPrice(close));
        }

        Ok(Observation {
            timestamp,
            close,
            open: self.open,
            high: self.high,
            low: self.low,
            volume: self.volume,
        })
    }
}

/// Checks that `observations` are in non-decreasing timestamp order.
pub fn ensure_ordered(observations: &[Observation]) -> Result<()> {
    for (index, pair) in observations.windows(2).enumerate() {
        let (previous, current) = (pair[0].timestamp, pair[1].timestamp);
        if current < previous {
            return Err(Error::NonMonotonicTimestamps {
                index: index + 1,
                previous,
                current,
            });
        }
    }
    Ok(())
}

/// An ordered price series.
///
/// The series never sorts or deduplicates: construction fails if the
/// observations are not already in non-decreasing timestamp order.
#[derive(Debug, Clone)]
pub struct Series {
    observations: Arc<[Observation]>,
}

impl Series {
    /// Creates a series from already ordered observations.
    pub fn new(observations: impl Into<Arc<[Observation]>>) -> Result<Self> {
        let observations = observations.into();
        ensure_ordered(&observations)?;
        Ok(Self { observations })
    }

    /// Creates a series of closes spaced `step` apart, starting at `start`.
    ///
    /// ### Returns
    /// The series, or an error if `step` is negative or a timestamp falls
    /// outside the representable range.
    pub fn from_closes(start: DateTime<Utc>, step: chrono::Duration, closes: &[f64]) -> Result<Self> {
        if step < chrono::Duration::zero() {
            return Err(Error::InvalidStep(step));
        }

        let observations = closes
            .iter()
            .enumerate()
            .map(|(i, close)| {
                let timestamp = i32::try_from(i)
                    .ok()
                    .and_then(|i| step.checked_mul(i))
                    .and_then(|offset| start.checked_add_signed(offset))
                    .ok_or(Error::InvalidStep(step))?;
                Ok(Observation::from((timestamp, *close)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            observations: Arc::from(observations),
        })
    }

    /// Returns the number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns `true` if the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Returns the most recent observation.
    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Iterates observations in time order.
    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// Returns the observations as a slice.
    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    /// Iterates the close prices.
    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(Observation::close)
    }

    /// Wraps observations whose ordering was already checked.
    pub(crate) fn trusted(observations: Arc<[Observation]>) -> Self {
        Self { observations }
    }

    pub(crate) fn shared(&self) -> Arc<[Observation]> {
        Arc::clone(&self.observations)
    }
}

impl std::ops::Deref for Series {
    type Target = [Observation];

    fn deref(&self) -> &Self::Target {
        &self.observations
    }
}
