//! Option-chain rows and the sheet regions they come from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One parsed row of an option table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRow {
    pub strike: i64,
    /// Volume / open interest at close; the weight for every mean.
    pub at_close: i64,
    pub change: i64,
}

impl OptionRow {
    #[must_use]
    pub const fn new(strike: i64, at_close: i64, change: i64) -> Self {
        Self {
            strike,
            at_close,
            change,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Calls,
    Puts,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calls => write!(f, "calls"),
            Self::Puts => write!(f, "puts"),
        }
    }
}

/// Inclusive, 1-based sheet row range holding one side's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSpec {
    pub start_row: usize,
    pub stop_row: usize,
}

impl RangeSpec {
    #[must_use]
    pub const fn new(start_row: usize, stop_row: usize) -> Self {
        Self {
            start_row,
            stop_row,
        }
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.start_row <= self.stop_row
    }

    pub fn rows(&self) -> impl Iterator<Item = usize> {
        self.start_row..=self.stop_row
    }
}

/// Call and put table regions located in one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRanges {
    pub calls: RangeSpec,
    pub puts: RangeSpec,
}

impl SheetRanges {
    #[must_use]
    pub const fn get(&self, side: Side) -> RangeSpec {
        match side {
            Side::Calls => self.calls,
            Side::Puts => self.puts,
        }
    }
}

/// Extracted rows for both sides of one instrument's chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionChain {
    pub calls: Vec<OptionRow>,
    pub puts: Vec<OptionRow>,
}

impl OptionChain {
    #[must_use]
    pub fn new(calls: Vec<OptionRow>, puts: Vec<OptionRow>) -> Self {
        Self { calls, puts }
    }

    #[must_use]
    pub fn side(&self, side: Side) -> &[OptionRow] {
        match side {
            Side::Calls => &self.calls,
            Side::Puts => &self.puts,
        }
    }
}
