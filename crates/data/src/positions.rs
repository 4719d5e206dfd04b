//! Summarizes the futures-positions workbook into `FinFut.json`.

use crate::json_storage::{JsonStorage, WriteError, POSITIONS_FILE_NAME};
use crate::sheet::{Cell, SheetError, Worksheet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Market descriptions of the tracked currency futures and their codes.
pub const CURRENCY_MARKETS: [(&str, &str); 6] = [
    ("CANADIAN DOLLAR - CHICAGO MERCANTILE EXCHANGE", "CAD"),
    ("SWISS FRANC - CHICAGO MERCANTILE EXCHANGE", "CHF"),
    ("BRITISH POUND STERLING - CHICAGO MERCANTILE EXCHANGE", "GBP"),
    ("JAPANESE YEN - CHICAGO MERCANTILE EXCHANGE", "JPY"),
    ("EURO FX - CHICAGO MERCANTILE EXCHANGE", "EUR"),
    ("AUSTRALIAN DOLLAR - CHICAGO MERCANTILE EXCHANGE", "AUD"),
];

const MIN_CELLS: usize = 10;
const WORKBOOK_PREFIX: &str = "FinFut";
const WORKBOOK_EXTENSIONS: [&str; 2] = [".xls", ".xlsx"];
/// `2^63`; the first value past `i64::MAX` that an `f64` can hold.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;
const DATE_COL: usize = 1;
const LONG_COL: usize = 8;
const SHORT_COL: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuturesPosition {
    pub currency: String,
    /// Report date as `YYYY.MM.DD`.
    pub date: String,
    pub long: i64,
    pub short: i64,
}

#[derive(Error, Debug)]
pub enum PositionsError {
    #[error("no FinFut workbook in {0}")]
    NoWorkbook(PathBuf),

    #[error("sheet error: {0}")]
    Sheet(#[from] SheetError),

    #[error("no tracked currency rows in {0}")]
    Empty(PathBuf),

    #[error("write error: {0}")]
    Write(#[from] WriteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct PositionsProcessor;

impl PositionsProcessor {
    /// First `FinFut*.xls` or `FinFut*.xlsx` in `work_dir`, by name.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read.
    pub fn find_workbook(work_dir: &Path) -> std::io::Result<Option<PathBuf>> {
        let mut candidates: Vec<PathBuf> = std::fs::read_dir(work_dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(is_positions_workbook)
            })
            .collect();
        candidates.sort();
        Ok(candidates.into_iter().next())
    }

    /// Parses the workbook in `work_dir` and writes `<output_dir>/FinFut.json`.
    ///
    /// The workbook is removed once the document is written.
    ///
    /// # Errors
    /// Returns an error if no workbook is found, it cannot be read, it holds no
    /// tracked rows, or the document cannot be written.
    pub fn process(work_dir: &Path, output_dir: &Path) -> Result<PathBuf, PositionsError> {
        let workbook = Self::find_workbook(work_dir)?
            .ok_or_else(|| PositionsError::NoWorkbook(work_dir.to_path_buf()))?;
        tracing::info!(path = %workbook.display(), "Processing futures positions");

        let sheets = Worksheet::open_all(&workbook)?;
        let positions = Self::parse(&sheets);
        if positions.is_empty() {
            tracing::error!(path = %workbook.display(), "No futures positions found");
            return Err(PositionsError::Empty(workbook));
        }

        let output = output_dir.join(POSITIONS_FILE_NAME);
        JsonStorage::write_atomic(&output, &positions)?;
        tracing::info!(
            records = positions.len(),
            path = %output.display(),
            "Futures positions written"
        );

        std::fs::remove_file(&workbook)?;
        Ok(output)
    }

    /// Collects tracked-currency rows from every sheet. Malformed rows are skipped.
    #[must_use]
    pub fn parse(sheets: &[Worksheet]) -> Vec<FuturesPosition> {
        let mut positions = Vec::new();

        for sheet in sheets {
            // first row holds the column titles
            for (row, cells) in sheet.rows().skip(1) {
                if cells.len() < MIN_CELLS {
                    continue;
                }
                let Some(currency) = market_currency(&cells[0]) else {
                    continue;
                };

                match parse_position(currency, cells) {
                    Some(position) => positions.push(position),
                    None => tracing::debug!(
                        sheet = %sheet.name(),
                        row,
                        currency,
                        "Skipped malformed positions row"
                    ),
                }
            }
        }

        positions
    }
}

pub(crate) fn is_positions_workbook(name: &str) -> bool {
    name.starts_with(WORKBOOK_PREFIX)
        && WORKBOOK_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

fn market_currency(cell: &Cell) -> Option<&'static str> {
    let description = cell.text()?;
    CURRENCY_MARKETS
        .iter()
        .find(|(market, _)| description.contains(market))
        .map(|(_, code)| *code)
}

fn parse_position(currency: &str, cells: &[Cell]) -> Option<FuturesPosition> {
    let date = report_date(cell_value(&cells[DATE_COL])?)?;
    let long = contracts(&cells[LONG_COL])?;
    let short = contracts(&cells[SHORT_COL])?;

    Some(FuturesPosition {
        currency: currency.to_string(),
        date,
        long,
        short,
    })
}

fn cell_value(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Empty => None,
        Cell::Number(value) => Some(*value),
        Cell::Text(text) => text.trim().parse().ok(),
    }
}

/// `YYMMDD` as a number, e.g. `250107` → `2025.01.07`.
#[allow(clippy::cast_possible_truncation)]
fn report_date(value: f64) -> Option<String> {
    if !(0.0..1_000_000.0).contains(&value) {
        return None;
    }
    let digits = format!("20{:06}", value.trunc() as i64);
    Some(format!("{}.{}.{}", &digits[..4], &digits[4..6], &digits[6..]))
}

/// Contract count truncated toward zero; empty cells count as zero.
#[allow(clippy::cast_possible_truncation)]
fn contracts(cell: &Cell) -> Option<i64> {
    if cell.is_empty() {
        return Some(0);
    }
    cell_value(cell)
        .map(f64::trunc)
        .filter(|v| (-I64_LIMIT..I64_LIMIT).contains(v))
        .map(|v| v as i64)
}
