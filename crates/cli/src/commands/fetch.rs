//! Downloads the option workbooks and normalizes them.

use crate::workspace::Workspace;
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use fx_options_core::AppConfig;
use fx_options_data::{trade_date, CmeClient, DownloadReport, FormatNormalizer, NormalizeReport};

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Trade date to request (YYYY-MM-DD); defaults to a few weekdays back
    #[arg(long)]
    pub trade_date: Option<NaiveDate>,

    /// Download only, leave the workbooks in the legacy directory
    #[arg(long)]
    pub no_normalize: bool,
}

/// Downloads every instrument's workbook that is not already waiting in the legacy
/// directory. Failed instruments are listed in the report.
///
/// # Errors
/// Returns an error if the HTTP client or the legacy directory cannot be set up.
pub async fn download_option_workbooks(
    config: &AppConfig,
    workspace: &Workspace,
    date: Option<NaiveDate>,
) -> Result<DownloadReport> {
    let date = date.unwrap_or_else(|| {
        trade_date(Local::now().date_naive(), config.sources.trading_days_back)
    });

    let client = CmeClient::new(&config.sources)?;
    let report = client
        .download_all(date, &workspace.legacy)
        .await
        .context("Option workbook download failed")?;

    tracing::info!(
        downloaded = report.downloaded.len(),
        present = report.already_present.len(),
        failed = report.failed.len(),
        "Option workbooks ready"
    );
    Ok(report)
}

/// Converts downloaded workbooks to normalized sheets.
///
/// # Errors
/// Returns an error if the directories cannot be read or created.
pub fn normalize_workbooks(workspace: &Workspace) -> Result<NormalizeReport> {
    FormatNormalizer::normalize_dir(&workspace.legacy, &workspace.normalized).with_context(|| {
        format!(
            "Failed to normalize workbooks in {}",
            workspace.legacy.display()
        )
    })
}

/// Runs the fetch command.
///
/// The workbooks that did download are still normalized when others failed.
///
/// # Errors
/// Returns an error if any workbook download failed or the normalization pass
/// cannot run.
pub async fn run_fetch(args: FetchArgs, config: &AppConfig) -> Result<()> {
    let workspace = Workspace::from_config(config);
    workspace.prepare()?;

    let downloads = download_option_workbooks(config, &workspace, args.trade_date).await?;
    println!(
        "Downloaded {} workbook(s), {} already present",
        downloads.downloaded.len(),
        downloads.already_present.len()
    );
    for (instrument, reason) in &downloads.failed {
        println!("  {instrument} download failed: {reason}");
    }

    if !args.no_normalize {
        let normalized = normalize_workbooks(&workspace)?;
        println!(
            "Normalized {} workbook(s) into {}",
            normalized.converted.len(),
            workspace.normalized.display()
        );
        for failed in &normalized.failed {
            println!("  failed: {}", failed.display());
        }
    }

    if !downloads.failed.is_empty() {
        bail!("{} workbook download(s) failed", downloads.failed.len());
    }
    Ok(())
}
