//! Chooses a close price source and turns its quotes into strike units.

use crate::prompt::{Fallback, ManualEntry, Prompter};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use fx_options_core::{ClosePriceSource, ClosePrices, DefaultQuotes, Quotes, QuotesFile};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct PriceArgs {
    /// JSON file of symbol → close quote exported from the trading terminal
    #[arg(long, env = "FXOPT_PRICES_FILE")]
    pub prices_file: Option<PathBuf>,

    /// Use the built-in sample quotes without prompting
    #[arg(long, conflicts_with = "prices_file")]
    pub sample_prices: bool,
}

async fn fetch(source: &dyn ClosePriceSource) -> Result<Quotes> {
    tracing::info!(source = source.name(), "Fetching close prices");
    source
        .quotes()
        .await
        .with_context(|| format!("Price source '{}' failed", source.name()))
}

/// Resolves close prices for every instrument.
///
/// The quotes file is tried first. When it is missing or unusable the user picks
/// manual entry or the sample quotes.
///
/// # Errors
/// Returns an error when no source yields a usable quote for every instrument.
pub async fn resolve_close_prices(args: &PriceArgs) -> Result<ClosePrices> {
    let quotes = if args.sample_prices {
        fetch(&DefaultQuotes).await?
    } else {
        let primary = match &args.prices_file {
            Some(path) => fetch(&QuotesFile::new(path))
                .await
                .and_then(|quotes| validate(&quotes).map(|_| quotes)),
            None => Err(anyhow!("no terminal quotes file configured")),
        };

        match primary {
            Ok(quotes) => quotes,
            Err(e) => {
                tracing::warn!(error = %e, "Primary price source unavailable");
                let choice = tokio::task::spawn_blocking(|| Prompter::stdio().choose_fallback())
                    .await
                    .context("Prompt task failed")??;
                match choice {
                    Fallback::Manual => fetch(&ManualEntry).await?,
                    Fallback::Defaults => fetch(&DefaultQuotes).await?,
                }
            }
        }
    };

    let prices = validate(&quotes).context("No usable close prices")?;
    for (instrument, close) in prices.iter() {
        tracing::info!(
            instrument = %instrument,
            quote = ?quotes.get(instrument),
            close = %close,
            "Close price"
        );
    }
    Ok(prices)
}

fn validate(quotes: &Quotes) -> Result<ClosePrices> {
    Ok(quotes.to_close_prices()?)
}
