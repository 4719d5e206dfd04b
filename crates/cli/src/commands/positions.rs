//! Futures positions: archive download, workbook summary and cleanup.

use crate::workspace::Workspace;
use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::Args;
use fx_options_core::AppConfig;
use fx_options_data::{cleanup_temp_files, CftcClient, PositionsProcessor};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct PositionsArgs {
    /// Report year; defaults to the current year
    #[arg(long)]
    pub year: Option<i32>,
}

/// Downloads and unpacks the yearly archive into the base directory.
///
/// # Errors
/// Returns an error if the download fails or the body is not a zip archive.
pub async fn download_positions(
    config: &AppConfig,
    workspace: &Workspace,
    year: Option<i32>,
) -> Result<Vec<PathBuf>> {
    let year = year.unwrap_or_else(|| Local::now().year());
    let client = CftcClient::new(&config.sources)?;
    client
        .fetch_positions_workbook(year, &workspace.base)
        .await
        .with_context(|| format!("Futures positions download for {year} failed"))
}

/// Writes `FinFut.json` from the unpacked workbook.
///
/// # Errors
/// Returns an error if the workbook is missing, unreadable or has no tracked rows.
pub fn summarize_positions(workspace: &Workspace) -> Result<PathBuf> {
    PositionsProcessor::process(&workspace.base, &workspace.output)
        .context("Futures positions processing failed")
}

/// Runs the positions command.
///
/// # Errors
/// Returns an error if the download or processing fails.
pub async fn run_positions(args: PositionsArgs, config: &AppConfig) -> Result<()> {
    let workspace = Workspace::from_config(config);
    workspace.prepare()?;

    let result = async {
        download_positions(config, &workspace, args.year).await?;
        summarize_positions(&workspace)
    }
    .await;
    cleanup_temp_files(&workspace.base);

    let path = result?;
    println!("Futures positions written to {}", path.display());
    Ok(())
}
