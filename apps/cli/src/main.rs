//! harvestdoc CLI: export a Harvest concept catalog as CSV.
//!
//! Reads concepts from a Harvest API endpoint or a local JSON file and
//! writes one CSV row per field to standard output, or serves the same
//! export over HTTP with `harvestdoc http`.

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
