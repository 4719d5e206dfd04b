//! Downloads the exchange volume/open-interest workbook for each instrument.

use crate::client::{build_http_client, check_status, FetchError};
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Weekday};
use fx_options_core::{Instrument, SourcesConfig};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Walks back `days_back` weekdays from `today`; Saturdays and Sundays do not count.
#[must_use]
pub fn trade_date(today: NaiveDate, days_back: u32) -> NaiveDate {
    let mut date = today;
    let mut remaining = days_back;
    while remaining > 0 {
        date -= ChronoDuration::days(1);
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            remaining -= 1;
        }
    }
    date
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: Vec<Instrument>,
    pub already_present: Vec<Instrument>,
    /// Instruments whose download failed, with the error message.
    pub failed: Vec<(Instrument, String)>,
}

impl DownloadReport {
    #[must_use]
    pub fn has_failed(&self, instrument: Instrument) -> bool {
        self.failed.iter().any(|(failed, _)| *failed == instrument)
    }
}

pub struct CmeClient {
    http: Client,
    base_url: String,
}

impl CmeClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(sources: &SourcesConfig) -> Result<Self, FetchError> {
        Ok(Self {
            http: build_http_client(
                &sources.user_agent,
                Duration::from_secs(sources.request_timeout_secs),
            )?,
            base_url: sources.cme_url.clone(),
        })
    }

    /// Sets a custom export URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Downloads one workbook to `dest`.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-2xx status or a failed write.
    pub async fn download_workbook(
        &self,
        instrument: Instrument,
        trade_date: NaiveDate,
        dest: &Path,
    ) -> Result<u64, FetchError> {
        let trade_date = trade_date.format("%Y%m%d").to_string();
        let product_id = instrument.product_id().to_string();

        tracing::debug!(
            instrument = %instrument,
            trade_date = %trade_date,
            "GET {}",
            self.base_url
        );
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("media", "xls"),
                ("tradeDate", trade_date.as_str()),
                ("reportType", "P"),
                ("productId", product_id.as_str()),
            ])
            .send()
            .await?;
        check_status(&response)?;

        let body = response.bytes().await?;
        if let Err(e) = tokio::fs::write(dest, &body).await {
            let _ = tokio::fs::remove_file(dest).await;
            return Err(e.into());
        }

        Ok(body.len() as u64)
    }

    /// Downloads every instrument's workbook into `legacy_dir` as `<CODE>.xls`.
    ///
    /// An instrument whose legacy workbook is still present (downloaded but not yet
    /// converted) is skipped. A failed download is recorded in the report and the
    /// batch moves on to the next instrument.
    ///
    /// # Errors
    /// Returns an error only if `legacy_dir` cannot be created.
    pub async fn download_all(
        &self,
        trade_date: NaiveDate,
        legacy_dir: &Path,
    ) -> Result<DownloadReport, FetchError> {
        tokio::fs::create_dir_all(legacy_dir).await?;
        let mut report = DownloadReport::default();

        tracing::info!(
            trade_date = %trade_date.format("%Y%m%d"),
            "Downloading option workbooks"
        );
        for instrument in Instrument::ALL {
            let dest = legacy_workbook_path(legacy_dir, instrument);
            if dest.exists() {
                tracing::debug!(instrument = %instrument, "Workbook already present");
                report.already_present.push(instrument);
                continue;
            }

            match self.download_workbook(instrument, trade_date, &dest).await {
                Ok(bytes) => {
                    tracing::info!(instrument = %instrument, bytes, "Downloaded workbook");
                    report.downloaded.push(instrument);
                }
                Err(e) => {
                    tracing::error!(
                        instrument = %instrument,
                        error = %e,
                        "Workbook download failed"
                    );
                    report.failed.push((instrument, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}

#[must_use]
pub fn legacy_workbook_path(legacy_dir: &Path, instrument: Instrument) -> PathBuf {
    legacy_dir.join(format!("{}.xls", instrument.code()))
}
