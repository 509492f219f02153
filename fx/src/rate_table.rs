//! Immutable exchange rate tables.

use fintrack_common::Currency;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Rates for many currencies, all quoted against the base currency (USD).
///
/// `rates[X]` is how many units of `X` buy one unit of the base currency.
/// Every stored entry is positive and finite, and the base currency, when
/// present, is quoted at exactly 1. Tables are never mutated after
/// construction; a refresh builds a new one.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RateTable {
    rates: HashMap<Currency, f64>,
}

/// Shared handle to a rate table.
pub type SharedRateTable = Arc<RateTable>;

/// Rates used when the provider cannot be reached.
const FALLBACK_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("JPY", 149.5),
    ("CAD", 1.35),
    ("AUD", 1.52),
    ("INR", 85.0),
    ("CNY", 7.24),
    ("KRW", 1331.0),
    ("SGD", 1.34),
];

impl RateTable {
    /// Build a table from raw `(code, rate)` quotes.
    ///
    /// Zero, negative and non-finite quotes are dropped; a dropped currency
    /// behaves exactly like one the provider never quoted. A base currency
    /// quote other than 1 is pinned to 1.
    pub fn from_rates<I, K>(quotes: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let mut rates = HashMap::new();
        for (code, rate) in quotes {
            let currency = Currency::new(code);
            if currency.is_base() && rate != 1.0 {
                warn!(currency = %currency, rate, "Base currency not quoted at 1, pinning");
                rates.insert(currency, 1.0);
            } else if rate.is_finite() && rate > 0.0 {
                rates.insert(currency, rate);
            } else {
                debug!(currency = %currency, rate, "Dropping unusable rate");
            }
        }
        Self { rates }
    }

    /// The static table used when a fetch fails.
    pub fn fallback() -> Self {
        Self::from_rates(FALLBACK_RATES.iter().copied())
    }

    /// Rate for a currency, if quoted.
    pub fn get(&self, currency: &Currency) -> Option<f64> {
        self.rates.get(currency).copied()
    }

    /// Whether the currency is quoted.
    pub fn contains(&self, currency: &Currency) -> bool {
        self.rates.contains_key(currency)
    }

    /// Rates for both sides of a conversion, or `None` if either is missing.
    pub fn pair(&self, from: &Currency, to: &Currency) -> Option<(f64, f64)> {
        Some((self.get(from)?, self.get(to)?))
    }

    /// Number of quoted currencies.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Whether the table has no quotes.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Quoted currencies, sorted by code.
    pub fn currencies(&self) -> Vec<Currency> {
        let mut codes: Vec<Currency> = self.rates.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Iterate over `(currency, rate)` entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Currency, f64)> {
        self.rates.iter().map(|(c, r)| (c, *r))
    }
}
