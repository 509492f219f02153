//! Conversion service used by views and report generators.

use std::sync::Arc;

use fintrack_common::{Currency, Money};
use tracing::{debug, instrument};

use crate::cache::{CacheState, CacheStats, RateCache, RateCacheConfig};
use crate::config::FxServiceConfig;
use crate::conversion::{convert_amount, convert_batch, exchange_rate, ConversionQuote};
use crate::provider::{OpenExchangeRatesProvider, RateProvider};
use crate::rate_table::SharedRateTable;

/// Converts amounts between currencies using cached provider rates.
///
/// No operation returns an error: an unreachable provider means fallback
/// rates, an unknown currency means the amount comes back unchanged.
#[derive(Clone)]
pub struct ConversionService {
    cache: RateCache,
}

impl ConversionService {
    /// Create a service over an existing cache.
    pub fn new(cache: RateCache) -> Self {
        Self { cache }
    }

    /// Create a service over `provider` with the given cache settings.
    pub fn with_provider(provider: Arc<dyn RateProvider>, config: RateCacheConfig) -> Self {
        Self::new(RateCache::new(provider, config))
    }

    /// Create a service talking to the configured HTTP provider.
    pub fn from_config(config: &FxServiceConfig) -> Self {
        let provider = Arc::new(OpenExchangeRatesProvider::from_config(config));
        let cache_config = RateCacheConfig {
            ttl: config.ttl,
            ..Default::default()
        };
        Self::with_provider(provider, cache_config)
    }

    /// Current rate table, fetching if the cache is not valid.
    pub async fn get_rates(&self) -> SharedRateTable {
        self.cache.get_rates().await
    }

    /// Convert one amount.
    #[instrument(skip(self, from, to), fields(from = %from, to = %to))]
    pub async fn convert_currency(&self, amount: f64, from: &Currency, to: &Currency) -> f64 {
        if from == to {
            return amount;
        }
        let rates = self.cache.get_rates().await;
        convert_amount(&rates, amount, from, to)
    }

    /// Rate to display for a pair. See [`exchange_rate`] for the convention
    /// used when `to` is USD.
    #[instrument(skip(self, from, to), fields(from = %from, to = %to))]
    pub async fn get_exchange_rate(&self, from: &Currency, to: &Currency) -> f64 {
        if from == to {
            return 1.0;
        }
        let rates = self.cache.get_rates().await;
        exchange_rate(&rates, from, to)
    }

    /// Convert a list of amounts against a single rate snapshot.
    #[instrument(
        skip(self, amounts, from, to),
        fields(from = %from, to = %to, count = amounts.len())
    )]
    pub async fn convert_multiple(
        &self,
        amounts: &[f64],
        from: &Currency,
        to: &Currency,
    ) -> Vec<f64> {
        if from == to {
            return amounts.to_vec();
        }
        let rates = self.cache.get_rates().await;
        convert_batch(&rates, amounts, from, to)
    }

    /// Convert using only the table already in memory.
    ///
    /// Never fetches and never waits. Returns `amount` unchanged when nothing
    /// has been fetched yet; an expired table is used as is.
    pub fn convert_sync(&self, amount: f64, from: &Currency, to: &Currency) -> f64 {
        if from == to {
            return amount;
        }
        match self.cache.resident() {
            Some(rates) => convert_amount(&rates, amount, from, to),
            None => amount,
        }
    }

    /// Converted amount and display rate, computed concurrently.
    ///
    /// Both halves go through the cache, so they share a single fetch.
    pub async fn quote(&self, amount: f64, from: &Currency, to: &Currency) -> ConversionQuote {
        if from == to {
            return ConversionQuote::identity(amount, from.clone());
        }
        let (converted_amount, rate) = tokio::join!(
            self.convert_currency(amount, from, to),
            self.get_exchange_rate(from, to)
        );
        ConversionQuote {
            amount,
            from: from.clone(),
            to: to.clone(),
            converted_amount,
            exchange_rate: rate,
        }
    }

    /// Convert and round for display in the target currency.
    pub async fn convert_money(&self, amount: f64, from: &Currency, to: &Currency) -> Money {
        let converted = self.convert_currency(amount, from, to).await;
        Money::from_f64(converted, to.clone()).round()
    }

    /// Warm the cache once a user's preferred currency is known.
    ///
    /// Nothing to do for USD users: their figures never need conversion.
    pub async fn prewarm(&self, preferred: &Currency) {
        if preferred.is_base() {
            return;
        }
        let rates = self.cache.get_rates().await;
        debug!(
            preferred = %preferred,
            quoted = rates.contains(preferred),
            "Rate cache warmed"
        );
    }

    /// State of the underlying cache.
    pub fn cache_state(&self) -> CacheState {
        self.cache.state()
    }

    /// Statistics of the underlying cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
