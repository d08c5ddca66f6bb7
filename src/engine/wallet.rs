#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    engine::{Fill, Side},
    errors::{Error, Result},
};

/// Quote and base holdings of a simulated account.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Wallet {
    // Initial quote balance used for reset
    initial_quote: f64,
    // Quote currency available (e.g. BTC on a BTC_ETH market)
    quote: f64,
    // Base asset held
    base: f64,
    // Cumulative fees paid, in quote units
    fees: f64,
}

impl Wallet {
    /// Creates a new wallet holding `quote` units of the quote currency.
    /// Non-positive balances are rejected.
    pub fn new(quote: f64) -> Result<Self> {
        if quote <= 0.0 || !quote.is_finite() {
            return Err(Error::NegZeroBalance(quote));
        }

        Ok(Self {
            quote,
            base: 0.0,
            fees: 0.0,
            initial_quote: quote,
        })
    }

    /// Returns the starting quote balance.
    pub fn initial_quote(&self) -> f64 {
        self.initial_quote
    }

    /// Returns the quote balance.
    pub fn quote(&self) -> f64 {
        self.quote
    }

    /// Returns the base balance.
    pub fn base(&self) -> f64 {
        self.base
    }

    /// Returns the fees paid, in quote units.
    pub fn fees_paid(&self) -> f64 {
        self.fees
    }

    /// Returns the account value in quote units at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.quote + self.base * price
    }

    /// Checks that the wallet can fund `amount` on `side`.
    pub(crate) fn ensure_funds(&self, side: Side, amount: f64) -> Result<()> {
        let available = match side {
            Side::Buy => self.quote,
            Side::Sell => self.base,
        };
        if available < amount {
            return Err(Error::InsufficientFunds(amount, available));
        }
        Ok(())
    }

    /// Books an executed fill.
    pub(crate) fn apply(&mut self, fill: &Fill) -> Result<()> {
        match fill.side() {
            Side::Buy => {
                self.ensure_funds(Side::Buy, fill.total())?;
                self.quote -= fill.total();
                self.base += fill.quantity();
            }
            Side::Sell => {
                self.ensure_funds(Side::Sell, fill.quantity())?;
                self.base -= fill.quantity();
                self.quote += fill.total();
            }
        }
        self.fees += fill.fee_in_quote();
        Ok(())
    }

    /// Resets the wallet to its initial balance.
    pub(crate) fn reset(&mut self) {
        self.base = 0.0;
        self.fees = 0.0;
        self.quote = self.initial_quote;
    }
}
