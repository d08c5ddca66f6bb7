use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    BasisPoints,
    errors::{Error, Result},
    utils::random_id,
};

/// Represents the side of an execution (buy or sell).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Spend quote to receive base.
    Buy,
    /// Spend base to receive quote.
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Outcome of a simulated or real execution.
///
/// `quantity` is always the base asset amount and `total` the quote amount.
/// The fee is charged on the receiving side: base units for a buy, quote
/// units for a sell.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    id: u32,
    side: Side,
    price: f64,
    quantity: f64,
    total: f64,
    fee: f64,
    timestamp: DateTime<Utc>,
}

impl Fill {
    /// Creates a fill record as reported by a venue.
    pub fn new(side: Side, price: f64, quantity: f64, total: f64, fee: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: random_id(),
            side,
            price,
            quantity,
            total,
            fee,
            timestamp,
        }
    }

    /// Returns the fill id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the side of the execution.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Returns the execution price.
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Returns the base amount traded.
    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// Returns the quote amount traded.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Returns the fee, in units of the received asset.
    pub fn fee(&self) -> f64 {
        self.fee
    }

    /// Returns the fee converted to quote units.
    pub fn fee_in_quote(&self) -> f64 {
        match self.side {
            Side::Buy => self.fee * self.price,
            Side::Sell => self.fee,
        }
    }

    /// Returns the execution time.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

pub(crate) fn validate_fee(fee_bps: f64) -> Result<f64> {
    if !fee_bps.is_finite() || !(0.0..10_000.0).contains(&fee_bps) {
        return Err(Error::InvalidFee(fee_bps));
    }
    Ok(fee_bps)
}

/// Simulates an execution with a proportional fee.
///
/// ### Arguments
/// * `side` - Buy or sell.
/// * `amount` - Quote notional to spend for a buy, base quantity to sell for a sell.
/// * `price` - Execution price.
/// * `fee_bps` - Fee in basis points (250.0 for 2.5%).
/// * `timestamp` - Time stamped on the fill.
///
/// ### Returns
/// The synthetic fill, or an error for a non-positive price or amount.
pub fn simulate_fill(side: Side, amount: f64, price: f64, fee_bps: f64, timestamp: DateTime<Utc>) -> Result<Fill> {
    if price <= 0.0 || !price.is_finite() {
        return Err(Error::InvalidPrice(price));
    }
    if amount <= 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount(amount));
    }

    let fill = match side {
        Side::Buy => {
            let gross = amount / price;
            let fee = gross.bps(fee_bps);
            Fill::new(side, price, gross - fee, amount, fee, timestamp)
        }
        Side::Sell => {
            let gross = amount * price;
            let fee = gross.bps(fee_bps);
            Fill::new(side, price, amount, gross - fee, fee, timestamp)
        }
    };
    Ok(fill)
}

#[cfg(test)]
#[test]
fn buy_fill_charges_fee_on_base() {
    let fill = simulate_fill(Side::Buy, 100.0, 10.0, 250.0, DateTime::default()).unwrap();
    assert_eq!(fill.quantity(), 9.75);
    assert_eq!(fill.total(), 100.0);
    assert_eq!(fill.fee(), 0.25);
    assert_eq!(fill.fee_in_quote(), 2.5);
    assert_eq!(fill.side(), Side::Buy);
}

#[cfg(test)]
#[test]
fn sell_fill_charges_fee_on_quote() {
    let fill = simulate_fill(Side::Sell, 2.0, 50.0, 100.0, DateTime::default()).unwrap();
    assert_eq!(fill.quantity(), 2.0);
    assert_eq!(fill.total(), 99.0);
    assert_eq!(fill.fee(), 1.0);
    assert_eq!(fill.fee_in_quote(), 1.0);
}

#[cfg(test)]
#[test]
fn zero_fee_fill() {
    let fill = simulate_fill(Side::Buy, 100.0, 4.0, 0.0, DateTime::default()).unwrap();
    assert_eq!(fill.quantity(), 25.0);
    assert_eq!(fill.fee(), 0.0);
}

#[cfg(test)]
#[test]
fn fill_rejects_bad_inputs() {
    let now = DateTime::default();
    assert!(matches!(simulate_fill(Side::Buy, 100.0, 0.0, 250.0, now), Err(Error::InvalidPrice(_))));
    assert!(matches!(simulate_fill(Side::Sell, -1.0, 10.0, 250.0, now), Err(Error::InvalidAmount(_))));
    assert!(matches!(simulate_fill(Side::Sell, 1.0, f64::INFINITY, 250.0, now), Err(Error::InvalidPrice(_))));
}

#[cfg(test)]
#[test]
fn fee_bounds() {
    assert!(validate_fee(0.0).is_ok());
    assert!(validate_fee(250.0).is_ok());
    assert!(matches!(validate_fee(-1.0), Err(Error::InvalidFee(_))));
    assert!(matches!(validate_fee(10_000.0), Err(Error::InvalidFee(_))));
    assert!(matches!(validate_fee(f64::NAN), Err(Error::InvalidFee(_))));
}

