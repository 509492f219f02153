//! Command line definition.

use clap::{Parser, Subcommand};
use fintrack_common::{Currency, CurrencyError};

/// Fintrack currency converter CLI
#[derive(Parser, Debug)]
#[command(name = "fxconvert")]
#[command(about = "Convert amounts between currencies using cached exchange rates")]
pub struct Args {
    /// Rates provider API key (overrides FX_APP_ID)
    #[arg(long, global = true)]
    pub app_id: Option<String>,

    /// Rates provider base URL (overrides FX_PROVIDER_URL)
    #[arg(long, global = true)]
    pub provider_url: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Convert a single amount
    #[command(allow_negative_numbers = true)]
    Convert {
        amount: f64,
        #[arg(value_parser = parse_currency)]
        from: Currency,
        #[arg(value_parser = parse_currency)]
        to: Currency,
    },

    /// Show the exchange rate between two currencies
    Rate {
        #[arg(value_parser = parse_currency)]
        from: Currency,
        #[arg(value_parser = parse_currency)]
        to: Currency,
    },

    /// Convert several amounts with one rate snapshot
    #[command(allow_negative_numbers = true)]
    Batch {
        #[arg(value_parser = parse_currency)]
        from: Currency,
        #[arg(value_parser = parse_currency)]
        to: Currency,
        #[arg(required = true, num_args = 1..)]
        amounts: Vec<f64>,
    },

    /// Converted amount together with the displayed rate
    #[command(allow_negative_numbers = true)]
    Quote {
        amount: f64,
        #[arg(value_parser = parse_currency)]
        from: Currency,
        #[arg(value_parser = parse_currency)]
        to: Currency,
        /// Print the quote as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the active rate table
    Rates,
}

/// Currency arguments must be three-letter codes.
fn parse_currency(s: &str) -> Result<Currency, CurrencyError> {
    s.parse()
}
