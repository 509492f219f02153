//! Conversion arithmetic over a rate table.
//!
//! All rates are "units of currency per one unit of the base currency", so
//! converting goes through the base: `amount / rate[from] * rate[to]`.
//! A currency missing from the table turns every operation into a no-op.

use fintrack_common::Currency;
use serde::{Deserialize, Serialize};

use crate::rate_table::RateTable;

/// Convert one amount using a table.
pub fn convert_amount(table: &RateTable, amount: f64, from: &Currency, to: &Currency) -> f64 {
    if from == to {
        return amount;
    }
    match table.pair(from, to) {
        Some((rate_from, rate_to)) => apply(amount, rate_from, rate_to),
        None => amount,
    }
}

/// Exchange rate to display for `from -> to`.
///
/// When `to` is the base currency the result is `rate[from]`, read as
/// "1 USD = rate[from] units of `from`", not the multiplier that converts
/// `from` into USD. Every other pair yields `rate[to] / rate[from]`.
pub fn exchange_rate(table: &RateTable, from: &Currency, to: &Currency) -> f64 {
    if from == to {
        return 1.0;
    }
    let Some((rate_from, rate_to)) = table.pair(from, to) else {
        return 1.0;
    };
    if to.is_base() {
        return rate_from;
    }
    rate_to / rate_from
}

/// Convert many amounts with one rate pair.
///
/// If either currency is unknown the whole batch comes back unchanged.
pub fn convert_batch(
    table: &RateTable,
    amounts: &[f64],
    from: &Currency,
    to: &Currency,
) -> Vec<f64> {
    if from == to {
        return amounts.to_vec();
    }
    match table.pair(from, to) {
        Some((rate_from, rate_to)) => amounts
            .iter()
            .map(|amount| apply(*amount, rate_from, rate_to))
            .collect(),
        None => amounts.to_vec(),
    }
}

fn apply(amount: f64, rate_from: f64, rate_to: f64) -> f64 {
    let amount_in_base = amount / rate_from;
    amount_in_base * rate_to
}

/// A converted amount together with the rate shown next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionQuote {
    /// Amount in the source currency.
    pub amount: f64,
    /// Source currency.
    pub from: Currency,
    /// Target currency.
    pub to: Currency,
    /// Amount in the target currency.
    pub converted_amount: f64,
    /// Rate as returned by [`exchange_rate`].
    pub exchange_rate: f64,
}

impl ConversionQuote {
    /// Quote computed against a single table.
    pub fn from_table(table: &RateTable, amount: f64, from: Currency, to: Currency) -> Self {
        Self {
            converted_amount: convert_amount(table, amount, &from, &to),
            exchange_rate: exchange_rate(table, &from, &to),
            amount,
            from,
            to,
        }
    }

    /// Quote for a same-currency request.
    pub fn identity(amount: f64, currency: Currency) -> Self {
        Self {
            amount,
            from: currency.clone(),
            to: currency,
            converted_amount: amount,
            exchange_rate: 1.0,
        }
    }

    /// Whether the conversion changed anything.
    pub fn is_identity(&self) -> bool {
        self.converted_amount == self.amount && self.exchange_rate == 1.0
    }
}
