use std::io::IsTerminal;

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Where and how log lines go. Passed explicitly; nothing reads it globally.
#[derive(Clone, Debug)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            ansi: std::io::stdout().is_terminal(),
        }
    }
}

/// Build a subscriber writing to `writer`. Usable with
/// `tracing::subscriber::with_default` for scoped capture.
pub fn subscriber<W>(config: &LogConfig, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    build(config, level_filter(&config.level), writer)
}

/// Install the process-wide subscriber on stdout. `RUST_LOG` takes
/// precedence over the configured level.
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(&config.level));
    let subscriber = build(config, filter, std::io::stdout);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn build<W>(config: &LogConfig, filter: EnvFilter, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(config.ansi)
        .with_target(false);

    match config.format {
        LogFormat::Text => Box::new(builder.finish()),
        LogFormat::Json => Box::new(builder.json().finish()),
    }
}
