//! The seven instruments whose CME option chains are processed.
//!
//! Each instrument fixes the numbers the pipeline needs: the exchange product id
//! used to download its report, the coefficient that converts strikes to quote
//! units, the label heading its option table, and how its spot is quoted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Table heading for monthly currency options.
pub const MONTHLY_OPTIONS_LABEL: &str = "OPTION TYPE: Monthly Options";

/// Table heading for American-style metal options.
pub const AMERICAN_OPTIONS_LABEL: &str = "OPTION TYPE: American Options";

/// Whether the market quotes the instrument per dollar or dollars per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quoting {
    /// Dollars per unit (EURUSD, XAUUSD, ...).
    Direct,
    /// Units per dollar (USDCAD, USDJPY); strikes need reciprocal transforms.
    Inverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Instrument {
    Eur,
    Gbp,
    Aud,
    Cad,
    Jpy,
    Xau,
    Xag,
}

impl Instrument {
    /// All instruments in processing order. Price sources report in this order.
    pub const ALL: [Self; 7] = [
        Self::Eur,
        Self::Gbp,
        Self::Aud,
        Self::Cad,
        Self::Jpy,
        Self::Xau,
        Self::Xag,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Aud => "AUD",
            Self::Cad => "CAD",
            Self::Jpy => "JPY",
            Self::Xau => "XAU",
            Self::Xag => "XAG",
        }
    }

    /// CME product id for the volume/open-interest report.
    #[must_use]
    pub const fn product_id(self) -> u32 {
        match self {
            Self::Eur => 58,
            Self::Gbp => 42,
            Self::Aud => 37,
            Self::Cad => 48,
            Self::Jpy => 69,
            Self::Xau => 437,
            Self::Xag => 458,
        }
    }

    /// Scaling factor between exchange strikes and quote units. Always positive.
    #[must_use]
    pub fn coefficient(self) -> Decimal {
        let value: i64 = match self {
            Self::Eur | Self::Aud => 10_000,
            Self::Gbp => 1_000,
            Self::Cad => 10_000_000,
            Self::Jpy => 1_000_000,
            Self::Xau => 1,
            Self::Xag => 100,
        };
        Decimal::from(value)
    }

    #[must_use]
    pub const fn header_label(self) -> &'static str {
        match self {
            Self::Xau | Self::Xag => AMERICAN_OPTIONS_LABEL,
            _ => MONTHLY_OPTIONS_LABEL,
        }
    }

    #[must_use]
    pub const fn quoting(self) -> Quoting {
        match self {
            Self::Cad | Self::Jpy => Quoting::Inverse,
            _ => Quoting::Direct,
        }
    }

    /// Spot symbol used by price sources.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eur => "EURUSD",
            Self::Gbp => "GBPUSD",
            Self::Aud => "AUDUSD",
            Self::Cad => "USDCAD",
            Self::Jpy => "USDJPY",
            Self::Xau => "XAUUSD",
            Self::Xag => "XAGUSD",
        }
    }

    /// Documented fallback quote offered during manual entry.
    #[must_use]
    pub fn default_quote(self) -> Decimal {
        match self {
            Self::Eur => Decimal::new(10850, 4),
            Self::Gbp => Decimal::new(12650, 4),
            Self::Aud => Decimal::new(6750, 4),
            Self::Cad => Decimal::new(13650, 4),
            Self::Jpy => Decimal::new(14850, 2),
            Self::Xau => Decimal::new(205_000, 2),
            Self::Xag => Decimal::new(2450, 2),
        }
    }

    /// Multiplier taking a spot quote (or its reciprocal) to strike units.
    #[must_use]
    pub fn strike_scale(self) -> Decimal {
        let value: i64 = match self {
            Self::Eur | Self::Aud | Self::Cad => 10_000,
            Self::Gbp => 1_000,
            Self::Jpy => 1_000_000,
            Self::Xau => 1,
            Self::Xag => 100,
        };
        Decimal::from(value)
    }

    /// Looks an instrument up by its spot symbol.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let symbol = symbol.trim();
        Self::ALL
            .into_iter()
            .find(|i| i.symbol().eq_ignore_ascii_case(symbol))
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Instrument {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Self::ALL
            .into_iter()
            .find(|i| i.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| format!("Unknown instrument: '{code}'"))
    }
}
