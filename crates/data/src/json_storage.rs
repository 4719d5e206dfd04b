use chrono::NaiveDate;
use fx_options_core::Instrument;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Name of the futures-positions document.
pub const POSITIONS_FILE_NAME: &str = "FinFut.json";

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct JsonStorage;

impl JsonStorage {
    /// `FOB_<CODE>_<YYYY-MM-DD>.json`
    #[must_use]
    pub fn result_file_name(instrument: Instrument, date: NaiveDate) -> String {
        format!("FOB_{}_{}.json", instrument.code(), date.format("%Y-%m-%d"))
    }

    /// Writes `value` as pretty JSON (2-space indent, UTF-8 unescaped).
    ///
    /// The document is written to a temporary file beside `path` and renamed
    /// into place, so readers never observe a partial file.
    ///
    /// # Errors
    /// Returns an error if serialization or any filesystem step fails; the
    /// destination is left untouched in that case.
    pub fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), WriteError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }

        let temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;

        tracing::debug!(path = %path.display(), "Wrote JSON document");
        Ok(())
    }
}
