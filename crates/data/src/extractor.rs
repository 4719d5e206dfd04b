//! Pulls `(strike, at_close, change)` rows out of a located table.
//!
//! Rows with an empty cell are expected near the edges of the strike range and
//! are skipped. Rows whose text does not parse are skipped too, but every skip
//! is recorded with a reason code so formatting surprises show up in the logs.

use crate::sheet::{Cell, Worksheet};
use fx_options_core::{OptionRow, RangeSpec};
use std::fmt;

/// `2^63`; the first value past `i64::MAX` that an `f64` can hold.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Strike,
    AtClose,
    Change,
}

impl Column {
    pub const ALL: [Self; 3] = [Self::Strike, Self::AtClose, Self::Change];

    /// 0-based column index in the report (A, I, J).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Strike => 0,
            Self::AtClose => 8,
            Self::Change => 9,
        }
    }

    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Strike => 'A',
            Self::AtClose => 'I',
            Self::Change => 'J',
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyCell(Column),
    Unparseable { column: Column, raw: String },
    NonFinite(Column),
    OutOfRange(Column),
}

impl SkipReason {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyCell(_) => "empty_cell",
            Self::Unparseable { .. } => "unparseable",
            Self::NonFinite(_) => "non_finite",
            Self::OutOfRange(_) => "out_of_range",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCell(column) => write!(f, "{}: column {column} is empty", self.code()),
            Self::Unparseable { column, raw } => {
                write!(f, "{}: column {column} holds '{raw}'", self.code())
            }
            Self::NonFinite(column) => {
                write!(f, "{}: column {column} is not finite", self.code())
            }
            Self::OutOfRange(column) => {
                write!(f, "{}: column {column} exceeds the integer range", self.code())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub rows: Vec<OptionRow>,
    pub skipped: Vec<SkippedRow>,
}

pub struct RowExtractor;

impl RowExtractor {
    /// Extracts every parseable row in `range` (inclusive).
    #[must_use]
    pub fn extract(sheet: &Worksheet, range: RangeSpec) -> Extraction {
        let mut extraction = Extraction::default();

        for row in range.rows() {
            match Self::parse_row(sheet, row) {
                Ok(option_row) => extraction.rows.push(option_row),
                Err(reason) => {
                    let (sheet_name, code) = (sheet.name(), reason.code());
                    if matches!(reason, SkipReason::EmptyCell(_)) {
                        tracing::debug!(sheet = %sheet_name, row, code, "Skipped row: {reason}");
                    } else {
                        tracing::warn!(sheet = %sheet_name, row, code, "Skipped row: {reason}");
                    }
                    extraction.skipped.push(SkippedRow { row, reason });
                }
            }
        }

        extraction
    }

    fn parse_row(sheet: &Worksheet, row: usize) -> Result<OptionRow, SkipReason> {
        let cells = Column::ALL.map(|column| (column, sheet.cell(row, column.index())));

        // an empty cell anywhere wins over a parse failure elsewhere
        if let Some((column, _)) = cells.iter().find(|(_, cell)| cell.is_empty()) {
            return Err(SkipReason::EmptyCell(*column));
        }

        let [strike, at_close, change] = cells;
        Ok(OptionRow {
            strike: parse_cell(strike.0, strike.1)?,
            at_close: parse_cell(at_close.0, at_close.1)?,
            change: parse_cell(change.0, change.1)?,
        })
    }
}

/// Converts one cell to an integer, truncating toward zero.
///
/// Text may carry thousands separators, stray quotes, a sign, an exponent or
/// accounting-style parentheses for negatives.
///
/// # Errors
/// Returns the reason the cell cannot be used.
#[allow(clippy::cast_possible_truncation)]
pub fn parse_cell(column: Column, cell: &Cell) -> Result<i64, SkipReason> {
    let value = match cell {
        Cell::Empty => return Err(SkipReason::EmptyCell(column)),
        Cell::Number(value) => *value,
        Cell::Text(raw) => parse_text(raw).ok_or_else(|| SkipReason::Unparseable {
            column,
            raw: raw.clone(),
        })?,
    };

    if !value.is_finite() {
        return Err(SkipReason::NonFinite(column));
    }

    let value = value.trunc();
    if !(-I64_LIMIT..I64_LIMIT).contains(&value) {
        return Err(SkipReason::OutOfRange(column));
    }
    Ok(value as i64)
}

fn parse_text(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '\'') && !c.is_whitespace())
        .collect();

    let (negative, digits) = match cleaned
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };

    let value = digits.parse::<f64>().ok()?;
    Some(if negative { -value } else { value })
}
