//! LegisHarvest CLI: congressional hearings and roster harvester.
//!
//! Sweeps govinfo committee hearing listings in time-boxed, resumable runs
//! and refreshes the House and Senate rosters into a local search index.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
