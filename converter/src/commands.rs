//! Subcommand handlers.
//!
//! Handlers return the text to print so they can be exercised without a
//! terminal. Conversion never fails; only output serialization can.

use fintrack_common::{Currency, Money};
use fintrack_fx::{CacheState, ConversionService};

use crate::cli::Command;

/// Run one subcommand against the service.
pub async fn run(service: &ConversionService, command: Command) -> anyhow::Result<String> {
    let output = match command {
        Command::Convert { amount, from, to } => convert(service, amount, &from, &to).await,
        Command::Rate { from, to } => rate(service, &from, &to).await,
        Command::Batch { from, to, amounts } => batch(service, &amounts, &from, &to).await,
        Command::Quote {
            amount,
            from,
            to,
            json,
        } => quote(service, amount, &from, &to, json).await?,
        Command::Rates => rates(service).await,
    };
    Ok(output)
}

async fn convert(
    service: &ConversionService,
    amount: f64,
    from: &Currency,
    to: &Currency,
) -> String {
    let converted = service.convert_money(amount, from, to).await;
    format!("{} = {}", Money::from_f64(amount, from.clone()).round(), converted)
}

/// Rates into USD read as "1 USD = n FROM"; everything else as "1 FROM = n TO".
fn describe_rate(rate: f64, from: &Currency, to: &Currency) -> String {
    if to.is_base() && from != to {
        format!("1 {} = {:.4} {}", to, rate, from)
    } else {
        format!("1 {} = {:.4} {}", from, rate, to)
    }
}

async fn rate(service: &ConversionService, from: &Currency, to: &Currency) -> String {
    let rate = service.get_exchange_rate(from, to).await;
    describe_rate(rate, from, to)
}

async fn batch(
    service: &ConversionService,
    amounts: &[f64],
    from: &Currency,
    to: &Currency,
) -> String {
    let converted = service.convert_multiple(amounts, from, to).await;
    amounts
        .iter()
        .zip(converted)
        .map(|(amount, converted)| {
            format!(
                "{} -> {}",
                Money::from_f64(*amount, from.clone()).round(),
                Money::from_f64(converted, to.clone()).round()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

async fn quote(
    service: &ConversionService,
    amount: f64,
    from: &Currency,
    to: &Currency,
    json: bool,
) -> anyhow::Result<String> {
    let quote = service.quote(amount, from, to).await;
    if json {
        return Ok(serde_json::to_string_pretty(&quote)?);
    }
    Ok(format!(
        "{} = {}\n{}",
        Money::from_f64(quote.amount, quote.from.clone()).round(),
        Money::from_f64(quote.converted_amount, quote.to.clone()).round(),
        describe_rate(quote.exchange_rate, &quote.from, &quote.to)
    ))
}

async fn rates(service: &ConversionService) -> String {
    let table = service.get_rates().await;
    let source = match service.cache_state() {
        CacheState::Populated => "live",
        _ => "fallback",
    };

    let mut lines = vec![format!("Source: {} ({} currencies)", source, table.len())];
    for currency in table.currencies() {
        if let Some(rate) = table.get(&currency) {
            lines.push(format!("{:<4}{:>14.4}", currency.code(), rate));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fintrack_fx::{MockRateProvider, RateCacheConfig, RateTable};
    use std::sync::Arc;

    fn live_service() -> ConversionService {
        let provider = Arc::new(MockRateProvider::with_rates(RateTable::from_rates(vec![
            ("USD", 1.0),
            ("EUR", 0.5),
            ("INR", 85.0),
        ])));
        ConversionService::with_provider(provider, RateCacheConfig::default())
    }

    fn offline_service() -> ConversionService {
        let provider = Arc::new(MockRateProvider::new("offline"));
        ConversionService::with_provider(provider, RateCacheConfig::default())
    }

    #[tokio::test]
    async fn test_convert_output() {
        let service = live_service();
        let command = Command::Convert {
            amount: 1234.5,
            from: Currency::usd(),
            to: Currency::inr(),
        };

        let output = run(&service, command).await.unwrap();
        assert_eq!(output, "$1,234.50 = ₹104,932.50");
    }

    #[tokio::test]
    async fn test_rate_output_follows_convention() {
        let service = live_service();

        let into_usd = run(&service, Command::Rate { from: Currency::inr(), to: Currency::usd() })
            .await
            .unwrap();
        assert_eq!(into_usd, "1 USD = 85.0000 INR");

        let cross = run(&service, Command::Rate { from: Currency::eur(), to: Currency::inr() })
            .await
            .unwrap();
        assert_eq!(cross, "1 EUR = 170.0000 INR");
    }

    #[tokio::test]
    async fn test_batch_output() {
        let service = live_service();
        let command = Command::Batch {
            from: Currency::usd(),
            to: Currency::eur(),
            amounts: vec![10.0, -4.0],
        };

        let output = run(&service, command).await.unwrap();
        assert_eq!(output, "$10.00 -> €5.00\n-$4.00 -> -€2.00");
    }

    #[tokio::test]
    async fn test_quote_json() {
        let service = live_service();
        let command = Command::Quote {
            amount: 170.0,
            from: Currency::inr(),
            to: Currency::usd(),
            json: true,
        };

        let output = run(&service, command).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["converted_amount"], 2.0);
        assert_eq!(value["exchange_rate"], 85.0);
        assert_eq!(value["to"], "USD");
    }

    #[tokio::test]
    async fn test_rates_reports_fallback_when_offline() {
        let output = run(&offline_service(), Command::Rates).await.unwrap();
        let mut lines = output.lines();

        assert_eq!(lines.next(), Some("Source: fallback (10 currencies)"));
        assert_eq!(lines.next(), Some("AUD         1.5200"));
        assert_eq!(output.lines().count(), 11);

        let output = run(&live_service(), Command::Rates).await.unwrap();
        assert!(output.starts_with("Source: live (3 currencies)"));
    }
}
