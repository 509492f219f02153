//! FX error types.

use thiserror::Error;

/// Errors that can occur while acquiring exchange rates.
///
/// None of these reach callers of the conversion API: the rate cache recovers
/// from every one of them by substituting the fallback table.
#[derive(Debug, Error)]
pub enum FxError {
    /// Network failure or timeout talking to the provider.
    #[error("Rate provider transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success status.
    #[error("Rate provider returned HTTP {status}")]
    HttpStatus { status: u16 },

    /// Body was not JSON or had no `rates` object.
    #[error("Malformed rates payload: {0}")]
    Parse(String),

    /// Payload parsed but contained no usable rate.
    #[error("Rate provider returned no usable rates")]
    EmptyRateTable,

    /// Provider returned an error.
    #[error("Rate provider error: {0}")]
    ProviderError(String),
}

impl From<reqwest::Error> for FxError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL carries the API key.
        let e = e.without_url();
        if let Some(status) = e.status() {
            return FxError::HttpStatus {
                status: status.as_u16(),
            };
        }
        if e.is_decode() {
            return FxError::Parse(e.to_string());
        }
        FxError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for FxError {
    fn from(e: serde_json::Error) -> Self {
        FxError::Parse(e.to_string())
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
