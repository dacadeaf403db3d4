use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::error::{SampleError, SummaryError};
use crate::metrics::MetricsSource;
use crate::model::{RunSummary, Sample};
use crate::record::RecordWriter;

/// Default CPU observation window. Also the sampler's main pacing.
pub const DEFAULT_CPU_WINDOW: Duration = Duration::from_secs(1);

/// Time as the sampler sees it.
pub trait Clock {
    /// Time since the run started.
    fn elapsed(&self) -> Duration;

    fn sleep(&self, duration: Duration);
}

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// How long each tick measures CPU for, and how long it waits afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pacing {
    pub cpu_window: Duration,
    pub pause: Duration,
}

impl Pacing {
    /// The historical derivation: pause `target / 100 - 1` seconds, floored at
    /// zero. Any target at or below 100 therefore leaves the CPU window as the
    /// only pacing. An explicit pause overrides the derivation.
    pub fn from_target(target: f64, explicit_pause: Option<f64>, cpu_window: Duration) -> Self {
        let secs = explicit_pause.unwrap_or(target / 100.0 - 1.0);
        Self {
            cpu_window,
            pause: Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub samples: Vec<Sample>,
    pub summary: RunSummary,
}

/// Single-threaded fixed-interval poller. Owns the record sink for the run.
pub struct Sampler<S, C, W: Write> {
    source: S,
    clock: C,
    record: RecordWriter<W>,
}

impl<S, C, W> Sampler<S, C, W>
where
    S: MetricsSource,
    C: Clock,
    W: Write,
{
    pub fn new(source: S, clock: C, record: RecordWriter<W>) -> Self {
        Self {
            source,
            clock,
            record,
        }
    }

    /// Sample until `duration` has elapsed on the clock, then summarize.
    ///
    /// A tick that fails to read or persist is logged and skipped; only an
    /// empty run is an error.
    pub fn run(&mut self, pacing: &Pacing, duration: Duration) -> Result<RunReport, SummaryError> {
        let mut samples = Vec::new();

        while self.clock.elapsed() < duration {
            match self.tick(pacing) {
                Ok(sample) => {
                    samples.push(sample);
                    self.clock.sleep(pacing.pause);
                }
                Err(e) => error!(error = %e, "Error: {e}"),
            }
        }

        let summary = RunSummary::from_samples(&samples)?;
        log_summary(&summary);
        Ok(RunReport { samples, summary })
    }

    /// Legacy entry point: a one-second window, pause derived from the target.
    pub fn run_with_utilization_target(
        &mut self,
        utilization_target: f64,
        duration_seconds: f64,
    ) -> Result<RunReport, SummaryError> {
        let pacing = Pacing::from_target(utilization_target, None, DEFAULT_CPU_WINDOW);
        let duration = Duration::try_from_secs_f64(duration_seconds).unwrap_or(Duration::ZERO);
        self.run(&pacing, duration)
    }

    pub fn into_parts(self) -> (S, C, RecordWriter<W>) {
        (self.source, self.clock, self.record)
    }

    fn tick(&mut self, pacing: &Pacing) -> Result<Sample, SampleError> {
        self.source.begin_window();
        self.clock.sleep(pacing.cpu_window);
        let reading = self.source.read()?;

        let sample = Sample::new(self.clock.elapsed().as_secs_f64(), reading);
        self.record.write_sample(&sample)?;

        info!(
            elapsed_secs = sample.elapsed_seconds,
            cpu_percent = sample.cpu_percent,
            memory_percent = sample.memory_percent,
            bytes_sent = sample.bytes_sent,
            bytes_received = sample.bytes_received,
            power_watts = sample.simulated_power_watts,
            // `{:?}` keeps the trailing `.0`, matching the record row
            "Time: {:.2}s | CPU Usage: {:?}% | Memory Usage: {:?}% | NIC Sent: {} bytes | NIC Received: {} bytes | Simulated Power: {:.2} W",
            sample.elapsed_seconds,
            sample.cpu_percent,
            sample.memory_percent,
            sample.bytes_sent,
            sample.bytes_received,
            sample.simulated_power_watts,
        );

        Ok(sample)
    }
}

pub fn log_summary(summary: &RunSummary) {
    info!("Average CPU Usage: {:.2}%", summary.avg_cpu_percent);
    info!("Average Memory Usage: {:.2}%", summary.avg_memory_percent);
    info!("Average NIC Sent: {:.2} bytes", summary.avg_bytes_sent);
    info!("Average NIC Received: {:.2} bytes", summary.avg_bytes_received);
    info!("Average Simulated Power Consumption: {:.2} W", summary.avg_power_watts);
}
