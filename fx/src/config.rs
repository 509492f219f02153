//! Conversion service configuration.

use chrono::Duration;
use fintrack_common::constants;

/// Default rates provider.
pub const DEFAULT_PROVIDER_URL: &str = "https://openexchangerates.org/api";

/// Configuration for the conversion service.
#[derive(Debug, Clone)]
pub struct FxServiceConfig {
    /// Base URL of the rates provider; `/latest.json` is appended.
    pub provider_url: String,
    /// Provider API key, sent as `app_id`.
    pub app_id: String,
    /// How long a fetched table is trusted.
    pub ttl: Duration,
    /// Timeout for one provider request.
    pub request_timeout: std::time::Duration,
}

impl Default for FxServiceConfig {
    fn default() -> Self {
        Self {
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            app_id: String::new(),
            ttl: constants::rate_cache_ttl(),
            request_timeout: constants::provider_request_timeout(),
        }
    }
}

impl FxServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unparsable or out-of-range numbers are ignored and leave the default
    /// in place.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("FX_PROVIDER_URL") {
            config.provider_url = url;
        }

        if let Some(app_id) = lookup("FX_APP_ID") {
            config.app_id = app_id;
        }

        if let Some(ttl) = lookup("FX_CACHE_TTL_SECS") {
            if let Some(ttl) = ttl.parse::<i64>().ok().and_then(Duration::try_seconds) {
                config.ttl = ttl;
            }
        }

        if let Some(timeout) = lookup("FX_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                config.request_timeout = std::time::Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.provider_url.is_empty() {
            return Err("Provider URL cannot be empty".to_string());
        }

        if !self.provider_url.starts_with("http://") && !self.provider_url.starts_with("https://") {
            return Err(format!(
                "Provider URL must be http(s): {}",
                self.provider_url
            ));
        }

        if self.ttl <= Duration::zero() {
            return Err("Cache TTL must be positive".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = FxServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ttl, Duration::hours(24));
        assert_eq!(config.provider_url, "https://openexchangerates.org/api");
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("FX_PROVIDER_URL", "http://localhost:9000"),
            ("FX_APP_ID", "abc123"),
            ("FX_CACHE_TTL_SECS", "60"),
            ("FX_REQUEST_TIMEOUT_SECS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = FxServiceConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.provider_url, "http://localhost:9000");
        assert_eq!(config.app_id, "abc123");
        assert_eq!(config.ttl, Duration::seconds(60));
        assert_eq!(
            config.request_timeout,
            constants::provider_request_timeout()
        );
    }

    #[test]
    fn test_out_of_range_ttl_keeps_default() {
        let config = FxServiceConfig::from_lookup(|k| match k {
            "FX_CACHE_TTL_SECS" => Some("10000000000000000".to_string()),
            _ => None,
        });
        assert_eq!(config.ttl, constants::rate_cache_ttl());

        let config = FxServiceConfig::from_lookup(|k| match k {
            "FX_CACHE_TTL_SECS" => Some(i64::MIN.to_string()),
            _ => None,
        });
        assert_eq!(config.ttl, constants::rate_cache_ttl());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = FxServiceConfig::default();
        config.provider_url = "ftp://rates".to_string();
        assert!(config.validate().is_err());

        let mut config = FxServiceConfig::default();
        config.ttl = Duration::zero();
        assert!(config.validate().is_err());

        let mut config = FxServiceConfig::default();
        config.request_timeout = std::time::Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
