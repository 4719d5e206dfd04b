//! Interactive console prompts.
//!
//! Input and output are generic so the prompts can be driven from tests. End of
//! input always selects the default answer.

use async_trait::async_trait;
use fx_options_core::price::{parse_quote, to_strike_units};
use fx_options_core::{ClosePriceSource, Instrument, PriceError, Quotes};
use rust_decimal::Decimal;
use std::io::{self, BufRead, Write};

/// What to do when the primary price source is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Manual,
    Defaults,
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `prompt` and reads one trimmed line; `None` at end of input.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Yes/no question; blank input takes `default`, anything starting with `y` is yes.
    ///
    /// # Errors
    /// Returns an error if the console cannot be read or written.
    pub fn confirm(&mut self, question: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        let answer = self.ask(&format!("{question} ({hint}): "))?;

        Ok(match answer.as_deref() {
            None | Some("") => default,
            Some(text) => text.to_ascii_lowercase().starts_with('y'),
        })
    }

    /// Offers manual entry (1) or the sample defaults (2, default) until a valid choice.
    ///
    /// # Errors
    /// Returns an error if the console cannot be read or written.
    pub fn choose_fallback(&mut self) -> io::Result<Fallback> {
        writeln!(self.output, "Price source unavailable. Choose an alternative:")?;
        writeln!(self.output, "  1. Enter prices manually")?;
        writeln!(self.output, "  2. Use sample prices")?;

        loop {
            match self.ask("Choice (1-2, default 2): ")?.as_deref() {
                None | Some("" | "2") => return Ok(Fallback::Defaults),
                Some("1") => return Ok(Fallback::Manual),
                Some(_) => writeln!(self.output, "  Invalid choice")?,
            }
        }
    }

    /// Asks for every instrument's quote, offering its default.
    ///
    /// Non-numeric and non-positive entries, and quotes too extreme to convert to
    /// strike units, are rejected and asked again.
    ///
    /// # Errors
    /// Returns an error if the console cannot be read or written.
    pub fn manual_quotes(&mut self) -> io::Result<Quotes> {
        let mut quotes = Quotes::default();

        for instrument in Instrument::ALL {
            let symbol = instrument.symbol();
            let default = instrument.default_quote();

            loop {
                let answer = self.ask(&format!("{symbol} (default {default}): "))?;
                let quote = match answer.as_deref() {
                    None | Some("") => default,
                    Some(text) => match parse_quote(symbol, text) {
                        Ok(value) => value,
                        Err(e) => {
                            writeln!(self.output, "  {e}")?;
                            continue;
                        }
                    },
                };

                if quote <= Decimal::ZERO {
                    writeln!(self.output, "  Price must be greater than zero")?;
                    continue;
                }
                if let Err(e) = to_strike_units(instrument, quote) {
                    writeln!(self.output, "  {e}")?;
                    continue;
                }

                writeln!(self.output, "  {symbol}: {quote}")?;
                quotes.insert(instrument, quote);
                break;
            }
        }

        Ok(quotes)
    }
}

/// Close prices typed in at the console.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualEntry;

#[async_trait]
impl ClosePriceSource for ManualEntry {
    async fn quotes(&self) -> Result<Quotes, PriceError> {
        tokio::task::spawn_blocking(|| Prompter::stdio().manual_quotes())
            .await
            .map_err(|e| PriceError::Unavailable(e.to_string()))?
            .map_err(PriceError::from)
    }

    fn name(&self) -> &str {
        "manual"
    }
}
