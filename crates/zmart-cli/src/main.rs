//! Zmart CLI entry point.

use clap::Parser;
use zmart_cli::{logging, run, Cli};
use zmart_core::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Logging depends on the config, so load it first
    let config = Config::load_or_default(cli.config.as_deref())?;
    logging::init(&config.logging, cli.verbose);

    // Run the command
    run(cli, config).await
}
