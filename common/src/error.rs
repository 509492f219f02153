//! Error types shared across fintrack crates.

use thiserror::Error;

/// Errors raised while handling currency codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// Not a three letter ISO 4217 code.
    #[error("Invalid currency code: {0:?}")]
    InvalidCode(String),
}
