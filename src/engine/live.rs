use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{
    engine::{Fill, MIN_POINTS, Market, Resolution, Series, Side, Venue, simulate_fill, validate_fee},
    errors::{Error, Result},
};

/// [`Market`] backed by a [`Venue`].
///
/// Buys take the best ask and sells the best bid. In dry-run mode orders are
/// never sent: fills are simulated at the quoted price with the configured fee.
#[derive(Debug)]
pub struct LiveMarket<V: Venue> {
    venue: V,
    name: String,
    dry_run: bool,
    fee_bps: f64,
}

impl<V: Venue> LiveMarket<V> {
    /// Creates a live market on `name`, sending orders to `venue`.
    pub fn new(venue: V, name: impl Into<String>) -> Self {
        Self {
            venue,
            name: name.into(),
            dry_run: false,
            fee_bps: 250.0,
        }
    }

    /// Simulates fills instead of placing orders.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the fee used for dry-run fills.
    pub fn fee_bps(mut self, fee_bps: f64) -> Result<Self> {
        self.fee_bps = validate_fee(fee_bps)?;
        Ok(self)
    }

    /// Returns `true` if orders are simulated.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns the underlying venue.
    pub fn venue(&self) -> &V {
        &self.venue
    }
}

impl<V: Venue> Market for LiveMarket<V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn current_price(&self) -> Result<f64> {
        Ok(self.venue.quote(&self.name)?.mid())
    }

    fn execute(&mut self, side: Side, amount: f64, price: Option<f64>) -> Result<Fill> {
        let price = match price {
            Some(price) => price,
            None => self.venue.quote(&self.name)?.price_for(side),
        };

        if self.dry_run {
            let fill = simulate_fill(side, amount, price, self.fee_bps, Utc::now())?;
            info!("[dry-run] {side} {} {} @ {price}", fill.quantity(), self.name);
            return Ok(fill);
        }

        if price <= 0.0 || !price.is_finite() {
            return Err(Error::InvalidPrice(price));
        }
        if amount <= 0.0 || !amount.is_finite() {
            return Err(Error::InvalidAmount(amount));
        }

        let quantity = match side {
            Side::Buy => amount / price,
            Side::Sell => amount,
        };
        match self.venue.place_order(&self.name, side, quantity, price) {
            Ok(fill) => {
                info!("{side} {} {} @ {} (order {})", fill.quantity(), self.name, fill.price(), fill.id());
                Ok(fill)
            }
            Err(err) => {
                warn!("{side} {quantity} {} @ {price} failed: {err}", self.name);
                Err(err)
            }
        }
    }

    /// Fetches history from `MIN_POINTS` bars before `start` up to `end`.
    fn series(&mut self, resolution: Resolution, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Series> {
        let from = resolution.lookback_start(start, MIN_POINTS);
        debug!("fetching {} {resolution} bars from {from} to {end}", self.name);
        let observations = self.venue.fetch_history(&self.name, resolution, from, end)?;
        Series::new(observations)
    }
}
