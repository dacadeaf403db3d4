use std::io;

use thiserror::Error;

/// A load-generation worker could not be started.
#[derive(Error, Debug)]
pub enum StressError {
    #[error("failed to spawn stress worker {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: io::Error,
    },

    #[error("worker count must be at least 1")]
    NoWorkers,
}

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("no network interfaces reported")]
    NoInterfaces,

    #[error("total memory reported as zero")]
    NoMemory,
}

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("record file i/o: {0}")]
    Io(#[from] io::Error),

    #[error("record row: {0}")]
    Csv(#[from] csv::Error),
}

/// Anything that can sink a single tick. Never fatal to a run.
#[derive(Error, Debug)]
pub enum SampleError {
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error(transparent)]
    Record(#[from] RecordError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SummaryError {
    #[error("no samples were collected; cannot compute run summary")]
    NoSamples,
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("duration must be a finite, non-negative number of seconds (got {0})")]
    InvalidDuration(f64),

    #[error("pause must be a finite, non-negative number of seconds (got {0})")]
    InvalidPause(f64),

    #[error("utilization target must be finite (got {0})")]
    InvalidTarget(f64),

    #[error("cpu window must be greater than zero")]
    ZeroWindow,
}
