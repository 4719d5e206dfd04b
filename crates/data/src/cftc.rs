//! Downloads and unpacks the regulator's yearly futures-positions archive.

use crate::client::{build_http_client, check_status, FetchError};
use crate::positions::is_positions_workbook;
use fx_options_core::SourcesConfig;
use reqwest::Client;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const PROGRESS_STEP: u64 = 25;

pub struct CftcClient {
    http: Client,
    sources: SourcesConfig,
}

impl CftcClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(sources: &SourcesConfig) -> Result<Self, FetchError> {
        Ok(Self {
            http: build_http_client(
                &sources.user_agent,
                Duration::from_secs(sources.archive_timeout_secs),
            )?,
            sources: sources.clone(),
        })
    }

    /// Sets a custom URL template; `{year}` is substituted (useful for testing).
    #[must_use]
    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.sources.cftc_url_template = template.into();
        self
    }

    #[must_use]
    pub fn archive_url(&self, year: i32) -> String {
        self.sources.cftc_url(year)
    }

    /// Streams the archive for `year` to `<work_dir>/fut_fin_<year>.zip`.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-2xx status or a failed write.
    pub async fn download_archive(
        &self,
        year: i32,
        work_dir: &Path,
    ) -> Result<PathBuf, FetchError> {
        let url = self.archive_url(year);
        let zip_path = work_dir.join(format!("fut_fin_{year}.zip"));

        tracing::info!(year, url = %url, "Downloading futures positions archive");
        let mut response = self.http.get(&url).send().await?;
        check_status(&response)?;

        let total = response.content_length().unwrap_or(0);
        if total > 0 {
            #[allow(clippy::cast_precision_loss)]
            let megabytes = total as f64 / (1024.0 * 1024.0);
            tracing::info!("Archive size: {megabytes:.1} MB");
        }

        let mut file = tokio::fs::File::create(&zip_path).await?;
        let mut downloaded: u64 = 0;
        let mut next_mark = PROGRESS_STEP;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if total > 0 {
                let percent = downloaded * 100 / total;
                if percent >= next_mark {
                    tracing::info!(percent, "Archive download progress");
                    while next_mark <= percent {
                        next_mark += PROGRESS_STEP;
                    }
                }
            }
        }
        file.flush().await?;

        tracing::debug!(path = %zip_path.display(), bytes = downloaded, "Archive saved");
        Ok(zip_path)
    }

    /// Downloads, validates and extracts the archive into `work_dir`, then removes it.
    ///
    /// # Errors
    /// Returns an error if the download fails or the body is not a zip archive.
    pub async fn fetch_positions_workbook(
        &self,
        year: i32,
        work_dir: &Path,
    ) -> Result<Vec<PathBuf>, FetchError> {
        let zip_path = self.download_archive(year, work_dir).await?;

        let (archive, dest) = (zip_path.clone(), work_dir.to_path_buf());
        let extracted = tokio::task::spawn_blocking(move || extract_archive(&archive, &dest))
            .await
            .map_err(|e| FetchError::Io(std::io::Error::other(e)))??;

        tokio::fs::remove_file(&zip_path).await?;
        tracing::info!(files = extracted.len(), "Futures positions archive extracted");
        Ok(extracted)
    }
}

/// Extracts every entry of a zip archive into `dest`.
///
/// # Errors
/// Returns `FetchError::NotAnArchive` if `path` is not a readable zip file.
pub fn extract_archive(path: &Path, dest: &Path) -> Result<Vec<PathBuf>, FetchError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Corrupt archive");
        FetchError::NotAnArchive(path.to_path_buf())
    })?;

    let names: Vec<PathBuf> = archive.file_names().map(|name| dest.join(name)).collect();
    archive.extract(dest)?;
    Ok(names)
}

/// Removes archive and workbook leftovers (`fut_fin*.zip`, `FinFut*.xls[x]`) from
/// `work_dir`.
///
/// Failures are logged; nothing here is fatal.
pub fn cleanup_temp_files(work_dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(work_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %work_dir.display(), error = %e, "Cleanup skipped");
            return Vec::new();
        }
    };

    let mut removed = Vec::new();
    for path in entries.filter_map(Result::ok).map(|entry| entry.path()) {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let leftover = (name.starts_with("fut_fin") && name.ends_with(".zip"))
            || is_positions_workbook(name);
        if !leftover || !path.is_file() {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Removed temporary file");
                removed.push(path);
            }
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove temporary file"
            ),
        }
    }
    removed
}
