//! Close quotes and their conversion to strike units.

use crate::instrument::{Instrument, Quoting};
use crate::traits::ClosePriceSource;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PriceError {
    #[error("{symbol}: quote must be a positive number, got {value}")]
    NonPositive { symbol: &'static str, value: Decimal },

    #[error("{symbol}: no quote supplied")]
    Missing { symbol: &'static str },

    #[error("{symbol}: '{raw}' is not a number")]
    Invalid { symbol: String, raw: String },

    #[error("{symbol}: quote {value} is out of range")]
    OutOfRange { symbol: &'static str, value: Decimal },

    #[error("price source unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw spot quotes (e.g. EURUSD 1.0850), one per instrument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quotes {
    values: BTreeMap<Instrument, Decimal>,
}

impl Quotes {
    /// Builds quotes from values listed in [`Instrument::ALL`] order.
    #[must_use]
    pub fn from_ordered(values: [Decimal; 7]) -> Self {
        Self {
            values: Instrument::ALL.into_iter().zip(values).collect(),
        }
    }

    /// The documented fallback quote for every instrument.
    #[must_use]
    pub fn defaults() -> Self {
        Self::from_ordered(Instrument::ALL.map(Instrument::default_quote))
    }

    pub fn insert(&mut self, instrument: Instrument, quote: Decimal) {
        self.values.insert(instrument, quote);
    }

    #[must_use]
    pub fn get(&self, instrument: Instrument) -> Option<Decimal> {
        self.values.get(&instrument).copied()
    }

    /// Validates every quote and converts it to strike units.
    ///
    /// # Errors
    /// Returns an error if an instrument has no quote or a quote is not positive.
    pub fn to_close_prices(&self) -> Result<ClosePrices, PriceError> {
        let mut prices = BTreeMap::new();
        for instrument in Instrument::ALL {
            let quote = self.get(instrument).ok_or(PriceError::Missing {
                symbol: instrument.symbol(),
            })?;
            prices.insert(instrument, to_strike_units(instrument, quote)?);
        }
        Ok(ClosePrices { values: prices })
    }
}

/// Close prices in strike units, ready to compare against sheet strikes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosePrices {
    values: BTreeMap<Instrument, Decimal>,
}

impl ClosePrices {
    #[must_use]
    pub fn get(&self, instrument: Instrument) -> Option<Decimal> {
        self.values.get(&instrument).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Instrument, Decimal)> + '_ {
        self.values.iter().map(|(i, p)| (*i, *p))
    }
}

/// Converts a spot quote to the unit sheets quote strikes in.
///
/// Direct quotes are scaled; inverse quotes (USDCAD, USDJPY) are inverted first.
/// The result is rounded to a whole strike unit, half to even.
///
/// # Errors
/// Returns `PriceError::NonPositive` for zero or negative quotes and
/// `PriceError::OutOfRange` when the scaled quote does not fit a `Decimal`.
pub fn to_strike_units(instrument: Instrument, quote: Decimal) -> Result<Decimal, PriceError> {
    let symbol = instrument.symbol();
    if quote <= Decimal::ZERO {
        return Err(PriceError::NonPositive {
            symbol,
            value: quote,
        });
    }

    let base = match instrument.quoting() {
        Quoting::Direct => Some(quote),
        Quoting::Inverse => Decimal::ONE.checked_div(quote),
    };
    base.and_then(|base| base.checked_mul(instrument.strike_scale()))
        .map(|scaled| scaled.round())
        .ok_or(PriceError::OutOfRange {
            symbol,
            value: quote,
        })
}

/// Parses a user- or file-supplied quote, accepting plain or scientific notation.
///
/// # Errors
/// Returns `PriceError::Invalid` when the text is not a number.
pub fn parse_quote(symbol: &str, raw: &str) -> Result<Decimal, PriceError> {
    let text = raw.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| PriceError::Invalid {
            symbol: symbol.to_string(),
            raw: text.to_string(),
        })
}

/// Source returning the documented sample quotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultQuotes;

#[async_trait]
impl ClosePriceSource for DefaultQuotes {
    async fn quotes(&self) -> Result<Quotes, PriceError> {
        Ok(Quotes::defaults())
    }

    fn name(&self) -> &str {
        "defaults"
    }
}

/// Source reading a JSON object of symbol → quote, e.g. `{"EURUSD": 1.0850, ...}`.
///
/// Terminal exports are dropped in this shape; every instrument must be present.
#[derive(Debug, Clone)]
pub struct QuotesFile {
    path: PathBuf,
}

impl QuotesFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ClosePriceSource for QuotesFile {
    async fn quotes(&self) -> Result<Quotes, PriceError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(&content)?;

        let mut quotes = Quotes::default();
        for (symbol, value) in raw {
            let Some(instrument) = Instrument::from_symbol(&symbol) else {
                tracing::debug!(symbol = %symbol, "Ignoring quote for unknown symbol");
                continue;
            };
            let text = match value {
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            quotes.insert(instrument, parse_quote(&symbol, &text)?);
        }

        for instrument in Instrument::ALL {
            if quotes.get(instrument).is_none() {
                return Err(PriceError::Missing {
                    symbol: instrument.symbol(),
                });
            }
        }

        Ok(quotes)
    }

    fn name(&self) -> &str {
        "quotes-file"
    }
}
