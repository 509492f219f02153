//! Fintrack FX
//!
//! Exchange rate acquisition and currency conversion for fintrack.
//!
//! # Features
//!
//! - Rate table caching with a configurable TTL (24 hours by default)
//! - Single-flight refresh: concurrent callers share one provider request
//! - Static fallback rates when the provider is unavailable
//! - Single, batched and non-suspending conversions
//!
//! # Example
//!
//! ```rust,ignore
//! use fintrack_common::Currency;
//! use fintrack_fx::{ConversionService, FxServiceConfig};
//!
//! let service = ConversionService::from_config(&FxServiceConfig::from_env());
//!
//! service.prewarm(&Currency::inr()).await;
//! let inr = service.convert_currency(12.5, &Currency::usd(), &Currency::inr()).await;
//! let amounts = service.convert_multiple(&[1.0, 2.0], &Currency::usd(), &Currency::eur()).await;
//! ```

pub mod cache;
pub mod config;
pub mod conversion;
pub mod error;
pub mod provider;
pub mod rate_table;
pub mod service;

pub use cache::{CacheState, CacheStats, RateCache, RateCacheConfig};
pub use config::FxServiceConfig;
pub use conversion::ConversionQuote;
pub use error::{FxError, FxResult};
pub use provider::{OpenExchangeRatesProvider, RateProvider};
pub use rate_table::{RateTable, SharedRateTable};
pub use service::ConversionService;

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
