use anyhow::Context;
use clap::{Parser, Subcommand};
use fx_options_core::{AppConfig, ConfigLoader};
use std::path::{Path, PathBuf};

mod commands;
mod prices;
mod prompt;
mod workspace;

use commands::{FetchArgs, PositionsArgs, ProcessArgs, RunArgs};

#[derive(Parser)]
#[command(name = "fx-options")]
#[command(about = "CME FX option-chain SIP/FOB pipeline", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/Config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: download, positions, normalize, prices, process
    Run(RunArgs),
    /// Download and normalize the option workbooks
    Fetch(FetchArgs),
    /// Compute SIP/FOB documents from the normalized sheets
    Process(ProcessArgs),
    /// Download and summarize the futures positions archive
    Positions(PositionsArgs),
    /// Show working directories and the instrument table
    Info,
}

fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    ConfigLoader::load_from(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Run(args) => {
            commands::run_pipeline(args, &config).await?;
        }
        Commands::Fetch(args) => {
            commands::run_fetch(args, &config).await?;
        }
        Commands::Process(args) => {
            commands::run_process(args, &config).await?;
        }
        Commands::Positions(args) => {
            commands::run_positions(args, &config).await?;
        }
        Commands::Info => {
            commands::run_info(&config);
        }
    }

    Ok(())
}
