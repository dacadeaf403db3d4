use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;
use crate::logging::{LogConfig, LogFormat};
use crate::record::DEFAULT_RECORD_PATH;
use crate::sampler::Pacing;

/// Saturate every core, sample CPU/memory/network while it runs, and
/// estimate power draw from CPU utilization.
#[derive(Parser, Debug)]
#[command(name = "stress-sampler", version, about)]
pub struct Args {
    /// Sampling phase length in seconds
    #[arg(long, default_value_t = 60.0)]
    pub duration: f64,

    /// Utilization target in percent; only used to derive the post-tick pause
    #[arg(long, default_value_t = 40.0, allow_negative_numbers = true)]
    pub utilization_target: f64,

    /// Explicit post-tick pause in seconds, overrides the derived one
    #[arg(long)]
    pub pause: Option<f64>,

    /// CPU observation window per tick, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub cpu_window_ms: u64,

    /// CSV file to write samples to (truncated at start)
    #[arg(long, default_value = DEFAULT_RECORD_PATH)]
    pub output: PathBuf,

    /// Number of stress workers [default: number of cores]
    #[arg(long)]
    pub workers: Option<usize>,

    /// Do not pin workers to cores
    #[arg(long)]
    pub no_pin: bool,

    /// Exit after the summary instead of holding load until interrupted
    #[arg(long)]
    pub no_hold: bool,

    /// Log filter (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Validated run parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub duration: Duration,
    pub pacing: Pacing,
    pub output: PathBuf,
    pub workers: usize,
    pub pin: bool,
    pub hold: bool,
}

impl Args {
    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let duration = Duration::try_from_secs_f64(self.duration)
            .map_err(|_| ConfigError::InvalidDuration(self.duration))?;

        if !self.utilization_target.is_finite() {
            return Err(ConfigError::InvalidTarget(self.utilization_target));
        }
        if let Some(pause) = self.pause {
            if !pause.is_finite() || pause < 0.0 {
                return Err(ConfigError::InvalidPause(pause));
            }
        }
        if self.cpu_window_ms == 0 {
            return Err(ConfigError::ZeroWindow);
        }

        Ok(RunConfig {
            duration,
            pacing: Pacing::from_target(
                self.utilization_target,
                self.pause,
                Duration::from_millis(self.cpu_window_ms),
            ),
            output: self.output.clone(),
            workers: self.workers.unwrap_or_else(num_cpus::get),
            pin: !self.no_pin,
            hold: !self.no_hold,
        })
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            format: self.log_format,
            ..LogConfig::default()
        }
    }
}
