//! The full pipeline: download, positions, normalize, prices, process, cleanup.

use super::fetch::{download_option_workbooks, normalize_workbooks};
use super::positions::{download_positions, summarize_positions};
use crate::prices::{resolve_close_prices, PriceArgs};
use crate::prompt::Prompter;
use crate::workspace::Workspace;
use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Args;
use fx_options_core::{AppConfig, Instrument, StageTimings, SummaryFormatter};
use fx_options_data::{cleanup_temp_files, OptionsPipeline};
use std::time::Instant;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub prices: PriceArgs,

    /// Download futures positions without asking
    #[arg(short, long, conflicts_with = "skip_positions")]
    pub yes: bool,

    /// Do not download futures positions
    #[arg(long)]
    pub skip_positions: bool,
}

async fn wants_positions(args: &RunArgs) -> Result<bool> {
    if args.skip_positions {
        return Ok(false);
    }
    if args.yes {
        return Ok(true);
    }
    tokio::task::spawn_blocking(|| {
        Prompter::stdio().confirm("Download futures positions?", true)
    })
    .await
    .context("Prompt task failed")?
    .map_err(Into::into)
}

/// Runs the whole pipeline.
///
/// A failed option workbook download drops only that instrument; it is reported
/// as skipped at the download stage.
///
/// # Errors
/// Returns an error if the requested futures archive cannot be downloaded, no
/// sheet is available after normalization, or no usable close prices are available.
pub async fn run_pipeline(args: RunArgs, config: &AppConfig) -> Result<()> {
    let started = Instant::now();
    let workspace = Workspace::from_config(config);
    workspace.prepare()?;
    tracing::info!(
        legacy = %workspace.legacy.display(),
        normalized = %workspace.normalized.display(),
        output = %workspace.output.display(),
        "Starting options pipeline"
    );
    let mut timings = StageTimings::default();

    let step = Instant::now();
    let downloads = download_option_workbooks(config, &workspace, None).await?;
    timings.download = step.elapsed();

    let step = Instant::now();
    let positions_ready = if wants_positions(&args).await? {
        if let Err(e) = download_positions(config, &workspace, None).await {
            cleanup_temp_files(&workspace.base);
            return Err(e);
        }
        true
    } else {
        tracing::info!("Skipping futures positions");
        false
    };
    timings.positions = step.elapsed();

    let step = Instant::now();
    normalize_workbooks(&workspace)?;
    let pipeline = OptionsPipeline::new(&workspace.normalized, &workspace.output)
        .with_failed_downloads(downloads.failed);
    let available = Instrument::ALL
        .into_iter()
        .filter(|i| pipeline.is_available(*i))
        .count();
    if available == 0 {
        bail!("No option sheets available in {}", workspace.normalized.display());
    }
    timings.convert = step.elapsed();

    let step = Instant::now();
    let prices = resolve_close_prices(&args.prices).await?;
    timings.prices = step.elapsed();

    let step = Instant::now();
    let report = pipeline.run(&prices, Local::now().date_naive());
    timings.process = step.elapsed();

    if positions_ready {
        let step = Instant::now();
        if let Err(e) = summarize_positions(&workspace) {
            tracing::error!(error = %e, "Futures positions not written");
        }
        timings.positions += step.elapsed();
    }

    cleanup_temp_files(&workspace.base);

    timings.total = started.elapsed();
    println!("{}", SummaryFormatter::format(&timings, &report, &workspace.output));
    Ok(())
}
