use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    engine::{Fill, Observation, Series, Side},
    errors::{Error, Result},
};

/// Number of bars fetched ahead of the requested start so that indicators
/// computed over the series are warm from the first requested bar.
pub const MIN_POINTS: usize = 120;

/// Candle granularities supported by the venue.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// `5m`
    FiveMinutes,
    /// `15m`
    FifteenMinutes,
    /// `30m`
    #[default]
    ThirtyMinutes,
    /// `2h`
    TwoHours,
    /// `4h`
    FourHours,
    /// `24h`
    OneDay,
}

impl Resolution {
    /// All supported resolutions, finest first.
    pub const ALL: [Resolution; 6] = [
        Resolution::FiveMinutes,
        Resolution::FifteenMinutes,
        Resolution::ThirtyMinutes,
        Resolution::TwoHours,
        Resolution::FourHours,
        Resolution::OneDay,
    ];

    /// Returns the candle period in seconds.
    pub fn seconds(&self) -> i64 {
        match self {
            Resolution::FiveMinutes => 300,
            Resolution::FifteenMinutes => 900,
            Resolution::ThirtyMinutes => 1800,
            Resolution::TwoHours => 7200,
            Resolution::FourHours => 14400,
            Resolution::OneDay => 86400,
        }
    }

    /// Returns the candle period.
    pub fn period(&self) -> Duration {
        Duration::seconds(self.seconds())
    }

    /// Returns the start of a history fetch covering `bars` extra bars before `start`.
    pub fn lookback_start(&self, start: DateTime<Utc>, bars: usize) -> DateTime<Utc> {
        start - Duration::seconds(self.seconds() * bars as i64)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Resolution::FiveMinutes => "5m",
            Resolution::FifteenMinutes => "15m",
            Resolution::ThirtyMinutes => "30m",
            Resolution::TwoHours => "2h",
            Resolution::FourHours => "4h",
            Resolution::OneDay => "24h",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Resolution::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| Error::InvalidResolution(s.to_string()))
    }
}

impl TryFrom<String> for Resolution {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

/// Best bid and ask of an order book.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    /// Highest bid, the price a sell takes.
    pub best_bid: f64,
    /// Lowest ask, the price a buy takes.
    pub best_ask: f64,
}

impl Quote {
    /// Returns the midpoint between bid and ask.
    pub fn mid(&self) -> f64 {
        (self.best_bid + self.best_ask) / 2.0
    }

    /// Price a market order of `side` would take.
    pub fn price_for(&self, side: Side) -> f64 {
        match side {
            Side::Buy => self.best_ask,
            Side::Sell => self.best_bid,
        }
    }
}

/// What strategy code needs from a market: prices and a way to trade.
///
/// Implemented by [`Backtest`](crate::engine::Backtest) for replayed history and
/// by [`LiveMarket`](crate::engine::LiveMarket) on top of a [`Venue`], so the same
/// strategy runs unmodified against both.
pub trait Market {
    /// Market identifier, e.g. `BTC_ETH`.
    fn name(&self) -> &str;

    /// Returns the most recent price.
    fn current_price(&self) -> Result<f64>;

    /// Executes a trade.
    ///
    /// ### Arguments
    /// * `side` - Buy or sell.
    /// * `amount` - Quote notional for a buy, base quantity for a sell.
    /// * `price` - Limit price; the market price is used when `None`.
    fn execute(&mut self, side: Side, amount: f64, price: Option<f64>) -> Result<Fill>;

    /// Returns the price series visible to the strategy at this point.
    fn series(&mut self, resolution: Resolution, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Series>;
}

/// Boundary to an external trading venue.
///
/// Network access, authentication and retries live behind this trait; nothing
/// in this crate implements it against a real exchange.
pub trait Venue {
    /// Returns ordered bars for `market` between `start` and `end`.
    fn fetch_history(
        &self,
        market: &str,
        resolution: Resolution,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>>;

    /// Places an order of `quantity` base units at `price`.
    fn place_order(&self, market: &str, side: Side, quantity: f64, price: f64) -> Result<Fill>;

    /// Returns the top of the order book.
    fn quote(&self, market: &str) -> Result<Quote>;
}
