//! Zmart command-line interface.

pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use zmart_core::Config;

/// Zmart - encrypted exchange API key vault
#[derive(Parser)]
#[command(name = "zmart")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "ZMART_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create the vault and choose its password
    Init,

    /// Show whether the vault exists and where it lives
    Status,

    /// Manage stored API keys
    Keys(commands::keys::KeysArgs),

    /// Erase the vault, including every stored key
    Reset {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Init => commands::vault::init(&config).await,
        Commands::Status => commands::vault::status(&config),
        Commands::Keys(args) => commands::keys::run(args, &config).await,
        Commands::Reset { yes } => commands::vault::reset(&config, yes),
        Commands::Config(args) => commands::config::run(args, cli.config.as_deref(), &config),
        Commands::Version => {
            println!("zmart {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
