use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::config::RunConfig;
use crate::cpu_stress::{self, WorkerPool};
use crate::metrics::SysinfoSource;
use crate::record::RecordWriter;
use crate::sampler::{RunReport, Sampler, SystemClock};
use crate::signal;

const IDLE_STEP: Duration = Duration::from_secs(1);

/// What a finished run leaves behind.
#[derive(Clone, Debug, PartialEq)]
pub struct RunOutcome {
    pub report: RunReport,
    pub workers_spawned: usize,
    pub workers_joined: usize,
}

/// Load every core, sample for the configured duration, report, then hold
/// the load until interrupted (unless `hold` is off).
pub fn run(config: &RunConfig) -> Result<RunOutcome> {
    println!("Starting load on {} cores.", config.workers);
    info!(workers = config.workers, pin = config.pin, "starting stress workers");

    let pool = cpu_stress::spawn_workers(config.workers, config.pin)
        .context("failed to start load generator")?;
    let workers_spawned = pool.len();

    let report = match sample(config) {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "sampling failed, stopping workers");
            stop(pool);
            return Err(e);
        }
    };

    if config.hold {
        signal::install();
        info!("holding load; press Ctrl+C to stop");
        while !signal::interrupted() {
            thread::sleep(IDLE_STEP);
        }
        println!("Terminating CPU stress tests.");
    }

    let workers_joined = stop(pool);
    Ok(RunOutcome {
        report,
        workers_spawned,
        workers_joined,
    })
}

fn sample(config: &RunConfig) -> Result<RunReport> {
    let record = RecordWriter::create(&config.output)
        .with_context(|| format!("failed to create {}", config.output.display()))?;

    let mut sampler = Sampler::new(SysinfoSource::new(), SystemClock::start(), record);
    let report = sampler
        .run(&config.pacing, config.duration)
        .context("sampling produced no summary")?;

    info!(
        samples = report.summary.sample_count,
        output = %config.output.display(),
        "sampling complete"
    );
    Ok(report)
}

fn stop(pool: WorkerPool) -> usize {
    let spawned = pool.len();
    let joined = pool.shutdown();
    info!(spawned, joined, "stress workers stopped");
    joined
}
