//! Transcodes downloaded legacy workbooks into normalized CSV grids.

use crate::sheet::{SheetError, Worksheet};
use std::fs;
use std::path::{Path, PathBuf};

const LEGACY_EXTENSIONS: [&str; 2] = ["xls", "xlsx"];
const NORMALIZED_EXTENSION: &str = "csv";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl NormalizeReport {
    /// True when at least one workbook was converted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.converted.is_empty()
    }
}

pub struct FormatNormalizer;

impl FormatNormalizer {
    /// Normalized path for a legacy workbook: `<normalized_dir>/<stem>.csv`.
    #[must_use]
    pub fn target_path(normalized_dir: &Path, legacy: &Path) -> PathBuf {
        let mut name = legacy.file_stem().unwrap_or(legacy.as_os_str()).to_os_string();
        name.push(".");
        name.push(NORMALIZED_EXTENSION);
        normalized_dir.join(name)
    }

    /// Converts every `*.xls`/`*.xlsx` in `legacy_dir`, replacing earlier sheets.
    ///
    /// A failing file is logged and left in place, and any sheet previously
    /// converted from the same stem is removed; the rest are still converted.
    ///
    /// # Errors
    /// Returns an error only if the directories themselves cannot be read or created.
    pub fn normalize_dir(
        legacy_dir: &Path,
        normalized_dir: &Path,
    ) -> std::io::Result<NormalizeReport> {
        fs::create_dir_all(normalized_dir)?;

        let mut sources: Vec<PathBuf> = fs::read_dir(legacy_dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().is_some_and(|ext| {
                        LEGACY_EXTENSIONS
                            .iter()
                            .any(|legacy| ext.eq_ignore_ascii_case(legacy))
                    })
            })
            .collect();
        sources.sort();

        let mut report = NormalizeReport::default();
        if sources.is_empty() {
            tracing::warn!(dir = %legacy_dir.display(), "No legacy workbooks to normalize");
            return Ok(report);
        }

        for source in sources {
            let target = Self::target_path(normalized_dir, &source);
            match Self::convert(&source, &target) {
                Ok(()) => {
                    tracing::info!(
                        source = %source.display(),
                        target = %target.display(),
                        "Normalized workbook"
                    );
                    report.converted.push(target);
                }
                Err(e) => {
                    tracing::error!(
                        source = %source.display(),
                        error = %e,
                        "Failed to normalize workbook"
                    );
                    if fs::remove_file(&target).is_ok() {
                        tracing::warn!(target = %target.display(), "Removed outdated sheet");
                    }
                    report.failed.push(source);
                }
            }
        }

        tracing::info!(
            converted = report.converted.len(),
            failed = report.failed.len(),
            "Normalization finished"
        );
        Ok(report)
    }

    /// Converts one workbook, overwriting `target`, and removes the source.
    ///
    /// # Errors
    /// Returns an error if the workbook cannot be read or the grid cannot be written.
    pub fn convert(source: &Path, target: &Path) -> Result<(), SheetError> {
        let sheet = Worksheet::open(source)?;
        if let Err(e) = sheet.write_csv(target) {
            // no half-written grid may be picked up by the locator
            let _ = fs::remove_file(target);
            return Err(e);
        }
        fs::remove_file(source)?;
        Ok(())
    }
}
