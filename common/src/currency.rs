//! Currency codes and display metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CurrencyError;

/// ISO 4217 currency code, always stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

/// Code of the currency every rate table is expressed against.
pub const BASE_CURRENCY_CODE: &str = "USD";

/// Currencies a user can pick as their preferred display currency.
pub const SUPPORTED_CURRENCIES: &[(&str, &str)] = &[
    ("USD", "US Dollar ($)"),
    ("EUR", "Euro (€)"),
    ("GBP", "British Pound (£)"),
    ("JPY", "Japanese Yen (¥)"),
    ("CAD", "Canadian Dollar (C$)"),
    ("AUD", "Australian Dollar (A$)"),
    ("INR", "Indian Rupee (₹)"),
    ("CNY", "Chinese Yuan (¥)"),
    ("KRW", "South Korean Won (₩)"),
    ("SGD", "Singapore Dollar (S$)"),
];

impl Currency {
    /// Create a new currency from code.
    ///
    /// No validation beyond upper-casing is done here; use [`str::parse`] for
    /// user input.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// The base currency all rates are quoted against.
    pub fn base() -> Self {
        Self::new(BASE_CURRENCY_CODE)
    }

    /// Whether this is the base currency.
    pub fn is_base(&self) -> bool {
        self.0 == BASE_CURRENCY_CODE
    }

    /// Get the standard decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        match self.0.as_str() {
            "JPY" | "KRW" | "VND" | "CLP" | "ISK" => 0,
            "BHD" | "KWD" | "OMR" => 3,
            _ => 2,
        }
    }

    /// Display symbol, falling back to the code.
    pub fn symbol(&self) -> &str {
        match self.0.as_str() {
            "USD" => "$",
            "EUR" => "€",
            "GBP" => "£",
            "JPY" | "CNY" => "¥",
            "CAD" => "C$",
            "AUD" => "A$",
            "INR" => "₹",
            "KRW" => "₩",
            "SGD" => "S$",
            _ => self.0.as_str(),
        }
    }

    /// Human readable label for selection lists.
    pub fn label(&self) -> &str {
        SUPPORTED_CURRENCIES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, label)| *label)
            .unwrap_or(self.0.as_str())
    }

    /// Whether users may pick this as a preferred currency.
    pub fn is_supported(&self) -> bool {
        SUPPORTED_CURRENCIES.iter().any(|(code, _)| *code == self.0)
    }

    /// All user-selectable currencies.
    pub fn supported() -> Vec<Currency> {
        SUPPORTED_CURRENCIES
            .iter()
            .map(|(code, _)| Currency::new(*code))
            .collect()
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }

    pub fn jpy() -> Self {
        Self::new("JPY")
    }

    pub fn inr() -> Self {
        Self::new("INR")
    }

    pub fn krw() -> Self {
        Self::new("KRW")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.0
    }
}

impl TryFrom<String> for Currency {
    type Error = CurrencyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CurrencyError::InvalidCode(s.to_string()));
        }
        Ok(Self::new(code))
    }
}
