//! Rate provider trait and implementations.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::config::FxServiceConfig;
use crate::error::{FxError, FxResult};
use crate::rate_table::RateTable;

/// Source of the latest exchange rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the latest table of rates against USD.
    async fn latest_rates(&self) -> FxResult<RateTable>;
}

const PROVIDER_NAME: &str = "OPEN_EXCHANGE_RATES";

/// Response of the `latest.json` endpoint. Only `rates` is used.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[allow(dead_code)]
    #[serde(default)]
    base: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    timestamp: Option<i64>,
    rates: HashMap<String, f64>,
}

/// Parse a `latest.json` body into a rate table.
pub fn parse_latest_rates(body: &str) -> FxResult<RateTable> {
    let response: LatestRatesResponse = serde_json::from_str(body)?;
    let table = RateTable::from_rates(response.rates);
    if table.is_empty() {
        return Err(FxError::EmptyRateTable);
    }
    Ok(table)
}

/// Client for an openexchangerates.org compatible API.
pub struct OpenExchangeRatesProvider {
    client: Client,
    base_url: String,
    app_id: String,
}

impl OpenExchangeRatesProvider {
    /// Create a provider for `base_url` authenticated with `app_id`.
    pub fn new(base_url: impl Into<String>, app_id: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            app_id: app_id.into(),
        }
    }

    /// Create a provider from service configuration.
    pub fn from_config(config: &FxServiceConfig) -> Self {
        Self::new(
            config.provider_url.clone(),
            config.app_id.clone(),
            config.request_timeout,
        )
    }

    /// Request for the latest rates; the key goes in the encoded query.
    fn latest_request(&self) -> RequestBuilder {
        let url = format!("{}/latest.json", self.base_url.trim_end_matches('/'));
        self.client.get(url).query(&[("app_id", &self.app_id)])
    }
}

#[async_trait]
impl RateProvider for OpenExchangeRatesProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn latest_rates(&self) -> FxResult<RateTable> {
        let response = self.latest_request().send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let table = parse_latest_rates(&body)?;

        debug!(
            provider = PROVIDER_NAME,
            currencies = table.len(),
            "Fetched latest rates"
        );

        Ok(table)
    }
}

/// Scripted outcome of a mock fetch.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone)]
enum MockOutcome {
    Rates(RateTable),
    Failure(String),
}

/// Mock rate provider for testing.
///
/// Returns queued outcomes first, then the default table (or a failure if
/// none is set), and counts every invocation.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    queued: parking_lot::Mutex<std::collections::VecDeque<MockOutcome>>,
    default: parking_lot::Mutex<Option<RateTable>>,
    latency: Option<Duration>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a new mock provider that fails until given rates.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queued: parking_lot::Mutex::new(std::collections::VecDeque::new()),
            default: parking_lot::Mutex::new(None),
            latency: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Mock that always returns `table`.
    pub fn with_rates(table: RateTable) -> Self {
        let provider = Self::new("mock");
        provider.set_rates(table);
        provider
    }

    /// Delay every response.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Set the table returned once the queue is drained.
    pub fn set_rates(&self, table: RateTable) {
        *self.default.lock() = Some(table);
    }

    /// Queue a successful response.
    pub fn push_rates(&self, table: RateTable) {
        self.queued.lock().push_back(MockOutcome::Rates(table));
    }

    /// Queue a failed response.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.queued
            .lock()
            .push_back(MockOutcome::Failure(message.into()));
    }

    /// Number of times `latest_rates` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn latest_rates(&self) -> FxResult<RateTable> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let next = self.queued.lock().pop_front();
        let outcome = match next {
            Some(outcome) => outcome,
            None => match self.default.lock().clone() {
                Some(table) => MockOutcome::Rates(table),
                None => MockOutcome::Failure("no rates configured".to_string()),
            },
        };

        match outcome {
            MockOutcome::Rates(table) => Ok(table),
            MockOutcome::Failure(message) => Err(FxError::ProviderError(message)),
        }
    }
}
