//! In-memory worksheet model shared by the locator, extractor and normalizer.
//!
//! Cells are resolved once, at load time, into [`Cell`]: empty, numeric or text.
//! Rows are addressed 1-based and columns 0-based (`A` = 0), matching how the
//! exchange report is laid out.

use calamine::{open_workbook_auto, Data, Reader};
use csv::{ReaderBuilder, WriterBuilder};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0} contains no worksheet")]
    NoWorksheet(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Classifies raw text: blank is empty, a plain number is numeric.
    #[must_use]
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Number(value),
            _ => Self::Text(raw.to_string()),
        }
    }

    fn from_workbook(data: &Data) -> Self {
        match data {
            Data::Empty => Self::Empty,
            Data::Int(value) => Self::Number(*value as f64),
            Data::Float(value) => Self::Number(*value),
            Data::String(text) if text.trim().is_empty() => Self::Empty,
            Data::String(text) => Self::Text(text.clone()),
            Data::Bool(value) => Self::Text(value.to_string()),
            Data::DateTime(value) => Self::Number(value.as_f64()),
            Data::DateTimeIso(text) | Data::DurationIso(text) => Self::Text(text.clone()),
            Data::Error(err) => Self::Text(err.to_string()),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Trimmed content of a text cell.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.trim()),
            _ => None,
        }
    }

    fn to_field(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Number(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worksheet {
    name: String,
    rows: Vec<Vec<Cell>>,
}

impl Worksheet {
    #[must_use]
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Builds a sheet from text rows, classifying each cell with [`Cell::from_text`].
    #[must_use]
    pub fn from_text_rows<R, C>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|c| Cell::from_text(c.as_ref())).collect())
            .collect();
        Self::new(name, rows)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell at a 1-based row and 0-based column; out-of-range cells are empty.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        row.checked_sub(1)
            .and_then(|r| self.rows.get(r))
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Rows with their 1-based row numbers.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[Cell])> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, cells)| (i + 1, cells.as_slice()))
    }

    /// All cells in row-major order as `(row, col, cell)`.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Cell)> {
        self.rows()
            .flat_map(|(row, cells)| cells.iter().enumerate().map(move |(col, c)| (row, col, c)))
    }

    /// Opens the first worksheet of a file. `.csv` files are read as normalized grids,
    /// anything else goes through the workbook reader.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or holds no worksheet.
    pub fn open(path: &Path) -> Result<Self, SheetError> {
        if is_csv(path) {
            return Self::read_csv(path);
        }

        Self::open_all(path)?
            .into_iter()
            .next()
            .ok_or_else(|| SheetError::NoWorksheet(path.to_path_buf()))
    }

    /// Opens every worksheet of a workbook, anchored at `A1`.
    ///
    /// # Errors
    /// Returns an error if the workbook cannot be read.
    pub fn open_all(path: &Path) -> Result<Vec<Self>, SheetError> {
        let mut workbook = open_workbook_auto(path)?;
        let mut sheets = Vec::new();

        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name)?;
            let (row_offset, col_offset) = range
                .start()
                .map_or((0, 0), |(r, c)| (r as usize, c as usize));

            let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
            for data_row in range.rows() {
                let mut cells = vec![Cell::Empty; col_offset];
                cells.extend(data_row.iter().map(Cell::from_workbook));
                rows.push(cells);
            }

            tracing::debug!(
                path = %path.display(),
                sheet = %name,
                rows = rows.len(),
                "Loaded worksheet"
            );
            sheets.push(Self::new(name, rows));
        }

        Ok(sheets)
    }

    /// Reads a normalized CSV grid.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn read_csv(path: &Path) -> Result<Self, SheetError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(Cell::from_text).collect());
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, rows))
    }

    /// Writes the grid as CSV, one record per sheet row, starting at `A1`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn write_csv(&self, path: &Path) -> Result<(), SheetError> {
        let mut writer = WriterBuilder::new().flexible(true).from_path(path)?;

        for row in &self.rows {
            if row.is_empty() {
                // a zero-field record would be dropped by the reader
                writer.write_record([""])?;
            } else {
                writer.write_record(row.iter().map(Cell::to_field))?;
            }
        }

        writer.flush()?;
        Ok(())
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
