//! Computes SIP/FOB documents from the normalized sheets.

use crate::prices::{resolve_close_prices, PriceArgs};
use crate::workspace::Workspace;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Args;
use fx_options_core::{AppConfig, StageTimings, SummaryFormatter};
use fx_options_data::OptionsPipeline;
use std::time::Instant;

#[derive(Args, Debug, Clone)]
pub struct ProcessArgs {
    #[command(flatten)]
    pub prices: PriceArgs,

    /// Date stamped into the output file names (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Runs the process command.
///
/// # Errors
/// Returns an error if no usable close prices are available.
pub async fn run_process(args: ProcessArgs, config: &AppConfig) -> Result<()> {
    let started = Instant::now();
    let workspace = Workspace::from_config(config);
    workspace.prepare()?;
    let mut timings = StageTimings::default();

    let step = Instant::now();
    let prices = resolve_close_prices(&args.prices).await?;
    timings.prices = step.elapsed();

    let step = Instant::now();
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let report = OptionsPipeline::new(&workspace.normalized, &workspace.output).run(&prices, date);
    timings.process = step.elapsed();

    timings.total = started.elapsed();
    println!("{}", SummaryFormatter::format(&timings, &report, &workspace.output));
    Ok(())
}
