//! Finds the call and put tables in an exchange volume/open-interest sheet.
//!
//! The report has no fixed schema; tables are anchored on labels. Scanning is
//! row-major and each marker is only looked for after the previous one:
//!
//! 1. the option-type header; calls start 3 rows below it
//! 2. `TOTALS`; calls stop 1 row above it
//! 3. `Strike`; puts start 1 row below it
//! 4. `TOTALS`; puts stop 1 row above it, and scanning ends

use crate::sheet::Worksheet;
use fx_options_core::{RangeSpec, SheetRanges, Side};
use std::fmt;
use thiserror::Error;

pub const TOTALS_LABEL: &str = "TOTALS";
pub const STRIKE_LABEL: &str = "Strike";

const CALL_START_OFFSET: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Header,
    CallTotals,
    PutStrike,
    PutTotals,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "option-type header"),
            Self::CallTotals => write!(f, "call {TOTALS_LABEL}"),
            Self::PutStrike => write!(f, "put {STRIKE_LABEL} header"),
            Self::PutTotals => write!(f, "put {TOTALS_LABEL}"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("no ranges found: {marker} not found in sheet '{sheet}'")]
    MissingMarker { sheet: String, marker: Marker },

    #[error("no ranges found: {side} range {start}..={stop} is inverted in sheet '{sheet}'")]
    InvertedRange {
        sheet: String,
        side: Side,
        start: usize,
        stop: usize,
    },
}

pub struct RegionLocator;

impl RegionLocator {
    /// Locates both tables under `header_label`.
    ///
    /// # Errors
    /// Returns `LayoutError` when any marker is missing or a located range is inverted.
    pub fn locate(sheet: &Worksheet, header_label: &str) -> Result<SheetRanges, LayoutError> {
        let mut call_start = None;
        let mut call_stop = None;
        let mut put_start = None;
        let mut put_stop = None;

        for (row, _, cell) in sheet.cells() {
            let Some(value) = cell.text() else {
                continue;
            };

            if call_start.is_none() {
                if value == header_label {
                    call_start = Some(row + CALL_START_OFFSET);
                }
            } else if call_stop.is_none() {
                if value == TOTALS_LABEL {
                    call_stop = row.checked_sub(1);
                }
            } else if put_start.is_none() {
                if value == STRIKE_LABEL {
                    put_start = Some(row + 1);
                }
            } else if value == TOTALS_LABEL {
                put_stop = row.checked_sub(1);
                break;
            }
        }

        let missing = |marker| LayoutError::MissingMarker {
            sheet: sheet.name().to_string(),
            marker,
        };
        let calls = RangeSpec::new(
            call_start.ok_or_else(|| missing(Marker::Header))?,
            call_stop.ok_or_else(|| missing(Marker::CallTotals))?,
        );
        let puts = RangeSpec::new(
            put_start.ok_or_else(|| missing(Marker::PutStrike))?,
            put_stop.ok_or_else(|| missing(Marker::PutTotals))?,
        );

        for (side, range) in [(Side::Calls, calls), (Side::Puts, puts)] {
            if !range.is_valid() {
                return Err(LayoutError::InvertedRange {
                    sheet: sheet.name().to_string(),
                    side,
                    start: range.start_row,
                    stop: range.stop_row,
                });
            }
        }

        tracing::debug!(
            sheet = %sheet.name(),
            calls = ?calls,
            puts = ?puts,
            "Located option tables"
        );
        Ok(SheetRanges { calls, puts })
    }
}
