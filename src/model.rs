use crate::error::SummaryError;

/// Watts drawn at 100% CPU under the linear power model.
pub const FULL_LOAD_WATTS: f64 = 50.0;

/// Placeholder power model: linear in CPU utilization, not calibrated
/// against any hardware sensor.
pub fn simulated_power(cpu_percent: f64) -> f64 {
    cpu_percent / 100.0 * FULL_LOAD_WATTS
}

/// One observation as returned by a metrics source, before it is timestamped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub elapsed_seconds: f64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub simulated_power_watts: f64,
}

impl Sample {
    pub fn new(elapsed_seconds: f64, reading: Reading) -> Self {
        Self {
            elapsed_seconds,
            cpu_percent: reading.cpu_percent,
            memory_percent: reading.memory_percent,
            bytes_sent: reading.bytes_sent,
            bytes_received: reading.bytes_received,
            simulated_power_watts: simulated_power(reading.cpu_percent),
        }
    }
}

/// Arithmetic means across every sample of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub sample_count: usize,
    pub avg_cpu_percent: f64,
    pub avg_memory_percent: f64,
    pub avg_bytes_sent: f64,
    pub avg_bytes_received: f64,
    pub avg_power_watts: f64,
}

impl RunSummary {
    pub fn from_samples(samples: &[Sample]) -> Result<Self, SummaryError> {
        if samples.is_empty() {
            return Err(SummaryError::NoSamples);
        }

        Ok(Self {
            sample_count: samples.len(),
            avg_cpu_percent: mean(samples, |s| s.cpu_percent),
            avg_memory_percent: mean(samples, |s| s.memory_percent),
            avg_bytes_sent: mean(samples, |s| s.bytes_sent as f64),
            avg_bytes_received: mean(samples, |s| s.bytes_received as f64),
            avg_power_watts: mean(samples, |s| s.simulated_power_watts),
        })
    }
}

fn mean(samples: &[Sample], field: impl Fn(&Sample) -> f64) -> f64 {
    samples.iter().map(field).sum::<f64>() / samples.len() as f64
}
