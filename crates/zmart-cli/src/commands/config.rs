//! Configuration management commands.

use std::path::Path;

use clap::Args;
use zmart_core::config::Config;
use zmart_core::paths;

/// Config command arguments.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(clap::Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (file, defaults, and env overrides)
    Show,

    /// Write the effective configuration to the config file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration
    Validate,
}

/// Run the config command. `path` is the `--config` override, if any.
pub fn run(args: ConfigArgs, path: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    let file = match path {
        Some(p) => p.to_path_buf(),
        None => paths::config_file()?,
    };

    match args.command {
        ConfigCommand::Show => {
            let json = serde_json::to_string_pretty(config)?;
            println!("{}", json);
        }

        ConfigCommand::Init { force } => {
            if file.exists() && !force {
                anyhow::bail!(
                    "Config file already exists: {:?}. Use --force to overwrite.",
                    file
                );
            }
            config.save(&file)?;
            println!("Created config file: {:?}", file);
        }

        ConfigCommand::Path => {
            println!("{}", file.display());
        }

        ConfigCommand::Validate => match config.validate() {
            Ok(_) => println!("Configuration is valid"),
            Err(e) => anyhow::bail!("Configuration error: {}", e),
        },
    }

    Ok(())
}
