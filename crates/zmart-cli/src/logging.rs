//! Tracing subscriber setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zmart_core::config::{LogFormat, LoggingConfig};

/// Crates whose events are shown by default.
const TARGETS: [&str; 3] = ["zmart_cli", "zmart_secrets", "zmart_core"];

/// Default filter directive: `RUST_LOG` wins, then `-v` flags, then the config level.
pub fn default_directive(config: &LoggingConfig, verbose: u8) -> String {
    let level = match verbose {
        0 => config.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. Output goes to stderr so command output
/// on stdout stays clean.
pub fn init(config: &LoggingConfig, verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(config, verbose).into());
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
