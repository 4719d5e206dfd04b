//! Per-instrument processing: load → locate → extract → compute → write.
//!
//! Instruments are processed sequentially in [`Instrument::ALL`] order. A failure
//! drops only that instrument; it is recorded in the [`RunReport`] with the stage
//! that failed and the run moves on. Instruments whose workbook download failed are
//! reported at the download stage and their sheets are not read.

use crate::extractor::{Extraction, RowExtractor};
use crate::json_storage::{JsonStorage, WriteError};
use crate::locator::{LayoutError, RegionLocator};
use crate::sheet::{SheetError, Worksheet};
use chrono::NaiveDate;
use fx_options_core::{
    ClosePrices, Instrument, MetricsCalculator, MetricsError, MetricsParams, OptionChain,
    Outcome, RunReport, Side, Stage,
};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sheet extensions tried in the normalized dir, in order.
const SHEET_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

#[derive(Error, Debug)]
pub enum InstrumentError {
    #[error("workbook download failed: {0}")]
    Download(String),

    #[error("no close price")]
    NoPrice,

    #[error("no sheet for {instrument} in {dir}")]
    SheetNotFound { instrument: Instrument, dir: PathBuf },

    #[error("sheet error: {0}")]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("no usable {0} rows")]
    NoRows(Side),

    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("write error: {0}")]
    Write(#[from] WriteError),
}

impl InstrumentError {
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Download(_) => Stage::Download,
            Self::NoPrice => Stage::Price,
            Self::SheetNotFound { .. } | Self::Sheet(_) => Stage::Load,
            Self::Layout(_) => Stage::Locate,
            Self::NoRows(_) => Stage::Extract,
            Self::Metrics(_) => Stage::Compute,
            Self::Write(_) => Stage::Write,
        }
    }
}

pub struct OptionsPipeline {
    normalized_dir: PathBuf,
    output_dir: PathBuf,
    failed_downloads: Vec<(Instrument, String)>,
}

impl OptionsPipeline {
    #[must_use]
    pub fn new(normalized_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            normalized_dir: normalized_dir.into(),
            output_dir: output_dir.into(),
            failed_downloads: Vec::new(),
        }
    }

    /// Marks instruments whose workbook could not be downloaded this run.
    ///
    /// They are skipped at [`Stage::Download`] even if an older sheet is on disk.
    #[must_use]
    pub fn with_failed_downloads(
        mut self,
        failed: impl IntoIterator<Item = (Instrument, String)>,
    ) -> Self {
        self.failed_downloads.extend(failed);
        self
    }

    fn download_failure(&self, instrument: Instrument) -> Option<&str> {
        self.failed_downloads
            .iter()
            .find(|(failed, _)| *failed == instrument)
            .map(|(_, reason)| reason.as_str())
    }

    /// Whether `instrument` will be read from disk: its download did not fail and a
    /// sheet exists.
    #[must_use]
    pub fn is_available(&self, instrument: Instrument) -> bool {
        self.download_failure(instrument).is_none() && self.sheet_path(instrument).is_some()
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// First existing `<CODE>.csv`, `<CODE>.xlsx` or `<CODE>.xls` in the normalized dir.
    #[must_use]
    pub fn sheet_path(&self, instrument: Instrument) -> Option<PathBuf> {
        SHEET_EXTENSIONS
            .iter()
            .map(|ext| self.normalized_dir.join(format!("{}.{ext}", instrument.code())))
            .find(|path| path.is_file())
    }

    /// Processes every instrument, writing `FOB_<CODE>_<date>.json` for each success.
    pub fn run(&self, prices: &ClosePrices, date: NaiveDate) -> RunReport {
        let mut report = RunReport::default();

        for instrument in Instrument::ALL {
            let outcome = match (self.download_failure(instrument), prices.get(instrument)) {
                (Some(reason), _) => Err(InstrumentError::Download(reason.to_string())),
                (None, Some(close)) => self.process_instrument(instrument, close, date),
                (None, None) => Err(InstrumentError::NoPrice),
            };

            match outcome {
                Ok((path, skipped_rows)) => {
                    tracing::info!(
                        instrument = %instrument,
                        path = %path.display(),
                        skipped_rows,
                        "Instrument processed"
                    );
                    report.push(instrument, Outcome::Written { path, skipped_rows });
                }
                Err(e) => {
                    let stage = e.stage();
                    tracing::error!(
                        instrument = %instrument,
                        stage = %stage,
                        error = %e,
                        "Instrument skipped"
                    );
                    report.push(
                        instrument,
                        Outcome::Skipped {
                            stage,
                            reason: e.to_string(),
                        },
                    );
                }
            }
        }

        tracing::info!(
            written = report.written(),
            total = report.total(),
            "Options processing finished"
        );
        report
    }

    /// Runs one instrument end to end.
    ///
    /// Returns the written path and the number of rows skipped during extraction.
    ///
    /// # Errors
    /// Returns the first failing stage's error; nothing is written in that case.
    pub fn process_instrument(
        &self,
        instrument: Instrument,
        close: Decimal,
        date: NaiveDate,
    ) -> Result<(PathBuf, usize), InstrumentError> {
        let path = self
            .sheet_path(instrument)
            .ok_or_else(|| InstrumentError::SheetNotFound {
                instrument,
                dir: self.normalized_dir.clone(),
            })?;
        let sheet = Worksheet::open(&path)?;

        let ranges = RegionLocator::locate(&sheet, instrument.header_label())?;

        let calls = RowExtractor::extract(&sheet, ranges.calls);
        let puts = RowExtractor::extract(&sheet, ranges.puts);
        let skipped_rows = calls.skipped.len() + puts.skipped.len();
        let chain = chain_from(calls, puts)?;
        tracing::debug!(
            instrument = %instrument,
            calls = chain.calls.len(),
            puts = chain.puts.len(),
            skipped_rows,
            "Extracted option rows"
        );

        let params = MetricsParams::for_instrument(instrument, close);
        let result = MetricsCalculator::compute(&chain, params)?;

        let output = self
            .output_dir
            .join(JsonStorage::result_file_name(instrument, date));
        JsonStorage::write_atomic(&output, &result)?;

        Ok((output, skipped_rows))
    }
}

fn chain_from(calls: Extraction, puts: Extraction) -> Result<OptionChain, InstrumentError> {
    if calls.rows.is_empty() {
        return Err(InstrumentError::NoRows(Side::Calls));
    }
    if puts.rows.is_empty() {
        return Err(InstrumentError::NoRows(Side::Puts));
    }
    Ok(OptionChain::new(calls.rows, puts.rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fx_options_core::Quotes;
    use std::fs;
    use tempfile::TempDir;

    const MONTHLY: &str = "OPTION TYPE: Monthly Options";

    fn table_row(strike: &str, at_close: &str, change: &str) -> String {
        format!("{strike},,,,,,,,{at_close},{change}")
    }

    /// EUR-style report: calls 10800/10850, one put at 10900.
    fn report_csv(label: &str, with_call_totals: bool) -> String {
        let mut lines = vec![
            "Euro FX Options".to_string(),
            label.to_string(),
            "CALLS".to_string(),
            "Strike,,,,,,,,At Close,Change".to_string(),
            table_row("10800", "10", "2"),
            table_row("10850", "5", "-1"),
        ];
        if with_call_totals {
            lines.push(table_row("TOTALS", "15", "1"));
        }
        lines.extend([
            "PUTS".to_string(),
            "Strike,,,,,,,,At Close,Change".to_string(),
            table_row("10900", "8", "3"),
            table_row("", "1", "1"),
            table_row("TOTALS", "8", "3"),
        ]);
        lines.join("\n") + "\n"
    }

    struct Fixture {
        _root: TempDir,
        normalized: PathBuf,
        output: PathBuf,
    }

    fn fixture() -> Fixture {
        let root = TempDir::new().unwrap();
        let normalized = root.path().join("new version");
        let output = root.path().join("output");
        fs::create_dir_all(&normalized).unwrap();
        Fixture {
            _root: root,
            normalized,
            output,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
    }

    #[test]
    fn test_process_instrument_writes_document() {
        let f = fixture();
        fs::write(f.normalized.join("EUR.csv"), report_csv(MONTHLY, true)).unwrap();
        let pipeline = OptionsPipeline::new(&f.normalized, &f.output);

        let close = Instrument::Eur.default_quote() * Instrument::Eur.strike_scale();
        let (path, skipped) = pipeline
            .process_instrument(Instrument::Eur, close, date())
            .unwrap();

        assert_eq!(path, f.output.join("FOB_EUR_2025-03-07.json"));
        assert_eq!(skipped, 1);

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["fob"]["opt_in_money_call_i"], 10);
        assert_eq!(value["fob"]["opt_in_money_put_i"], 8);
        assert_eq!(value["strike"]["calls"][1]["strike"], 5);
        assert_eq!(value["strike"]["calls"][1]["delta"], -1);
        let down_balance = value["sip"]["down_balance_level"].as_f64().unwrap();
        assert!((down_balance - 1.08).abs() < 1e-12);
    }

    #[test]
    fn test_missing_totals_skips_instrument_and_run_continues() {
        let f = fixture();
        fs::write(f.normalized.join("EUR.csv"), report_csv(MONTHLY, false)).unwrap();
        fs::write(f.normalized.join("GBP.csv"), report_csv(MONTHLY, true)).unwrap();
        let pipeline = OptionsPipeline::new(&f.normalized, &f.output);
        let prices = Quotes::defaults().to_close_prices().unwrap();

        let report = pipeline.run(&prices, date());

        assert_eq!(report.total(), Instrument::ALL.len());
        assert_eq!(report.written(), 1);
        assert!(f.output.join("FOB_GBP_2025-03-07.json").exists());
        assert!(!f.output.join("FOB_EUR_2025-03-07.json").exists());

        let skipped: Vec<_> = report.skipped().map(|(i, stage, _)| (i, stage)).collect();
        assert_eq!(skipped[0], (Instrument::Eur, Stage::Locate));
        assert!(skipped[1..].iter().all(|(_, stage)| *stage == Stage::Load));
    }

    #[test]
    fn test_wrong_option_type_is_a_layout_failure() {
        let f = fixture();
        fs::write(f.normalized.join("XAU.csv"), report_csv(MONTHLY, true)).unwrap();
        let pipeline = OptionsPipeline::new(&f.normalized, &f.output);

        let err = pipeline
            .process_instrument(Instrument::Xau, Decimal::from(2050), date())
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Locate);
    }

    #[test]
    fn test_side_without_rows_is_an_extract_failure() {
        let f = fixture();
        let csv = [
            MONTHLY.to_string(),
            "CALLS".to_string(),
            "Strike".to_string(),
            table_row("10800", "", "2"),
            "TOTALS".to_string(),
            "Strike".to_string(),
            table_row("10900", "8", "3"),
            "TOTALS".to_string(),
        ]
        .join("\n");
        fs::write(f.normalized.join("EUR.csv"), csv).unwrap();
        let pipeline = OptionsPipeline::new(&f.normalized, &f.output);

        let err = pipeline
            .process_instrument(Instrument::Eur, Decimal::from(10850), date())
            .unwrap_err();
        assert!(matches!(err, InstrumentError::NoRows(Side::Calls)));
        assert_eq!(err.stage(), Stage::Extract);
        assert!(!f.output.exists());
    }

    #[test]
    fn test_failed_download_is_skipped_despite_older_sheet() {
        let f = fixture();
        fs::write(f.normalized.join("EUR.csv"), report_csv(MONTHLY, true)).unwrap();
        fs::write(f.normalized.join("GBP.csv"), report_csv(MONTHLY, true)).unwrap();
        let pipeline = OptionsPipeline::new(&f.normalized, &f.output)
            .with_failed_downloads([(Instrument::Eur, "status 503".to_string())]);
        let prices = Quotes::defaults().to_close_prices().unwrap();

        assert!(!pipeline.is_available(Instrument::Eur));
        assert!(pipeline.is_available(Instrument::Gbp));

        let report = pipeline.run(&prices, date());

        assert_eq!(report.written(), 1);
        assert!(!f.output.join("FOB_EUR_2025-03-07.json").exists());
        assert!(f.output.join("FOB_GBP_2025-03-07.json").exists());
        let (instrument, stage, reason) = report.skipped().next().unwrap();
        assert_eq!((instrument, stage), (Instrument::Eur, Stage::Download));
        assert!(reason.contains("status 503"));
    }

    #[test]
    fn test_oversized_values_never_abort_the_run() {
        let f = fixture();
        let csv = [
            MONTHLY.to_string(),
            "CALLS".to_string(),
            "Strike".to_string(),
            table_row("1e30", "1e30", "1"),
            table_row("10800", "10", "2"),
            "TOTALS".to_string(),
            "Strike".to_string(),
            table_row("10900", "8", "3"),
            "TOTALS".to_string(),
        ]
        .join("\n");
        fs::write(f.normalized.join("EUR.csv"), csv).unwrap();

        let huge = "9000000000000000000";
        let csv = [
            MONTHLY.to_string(),
            "CALLS".to_string(),
            "Strike".to_string(),
            table_row(huge, huge, "1"),
            "TOTALS".to_string(),
            "Strike".to_string(),
            table_row("1200", "8", "3"),
            "TOTALS".to_string(),
        ]
        .join("\n");
        fs::write(f.normalized.join("GBP.csv"), csv).unwrap();
        let pipeline = OptionsPipeline::new(&f.normalized, &f.output);

        let (_, skipped) = pipeline
            .process_instrument(Instrument::Eur, Decimal::from(10850), date())
            .unwrap();
        assert_eq!(skipped, 1);

        let err = pipeline
            .process_instrument(Instrument::Gbp, Decimal::from(1265), date())
            .unwrap_err();
        assert!(matches!(err, InstrumentError::Metrics(MetricsError::Overflow)));
        assert_eq!(err.stage(), Stage::Compute);
        assert!(!f.output.join("FOB_GBP_2025-03-07.json").exists());
    }

    #[test]
    fn test_sheet_path_prefers_csv() {
        let f = fixture();
        fs::write(f.normalized.join("CAD.xls"), b"x").unwrap();
        let pipeline = OptionsPipeline::new(&f.normalized, &f.output);
        assert_eq!(
            pipeline.sheet_path(Instrument::Cad),
            Some(f.normalized.join("CAD.xls"))
        );

        fs::write(f.normalized.join("CAD.csv"), "x").unwrap();
        assert_eq!(
            pipeline.sheet_path(Instrument::Cad),
            Some(f.normalized.join("CAD.csv"))
        );
        assert_eq!(pipeline.sheet_path(Instrument::Jpy), None);
    }
}
