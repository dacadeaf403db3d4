use sysinfo::{CpuRefreshKind, MemoryRefreshKind, Networks, RefreshKind, System};

use crate::error::MetricsError;
use crate::model::Reading;

/// Where the sampler gets its numbers from.
///
/// A tick calls [`begin_window`](MetricsSource::begin_window), blocks for the
/// CPU observation window, then calls [`read`](MetricsSource::read). CPU
/// utilization is measured across that window; memory and network counters
/// are read at the end of it.
pub trait MetricsSource {
    fn begin_window(&mut self);

    fn read(&mut self) -> Result<Reading, MetricsError>;
}

/// System-wide counters through `sysinfo`.
pub struct SysinfoSource {
    sys: System,
    networks: Networks,
}

impl SysinfoSource {
    pub fn new() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
                .with_memory(MemoryRefreshKind::nothing().with_ram()),
        );

        Self {
            sys,
            networks: Networks::new_with_refreshed_list(),
        }
    }

    pub fn core_count(&self) -> usize {
        self.sys.cpus().len()
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for SysinfoSource {
    fn begin_window(&mut self) {
        self.sys.refresh_cpu_usage();
    }

    fn read(&mut self) -> Result<Reading, MetricsError> {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
        self.networks.refresh(true);

        let memory_percent = memory_percent(self.sys.total_memory(), self.sys.available_memory())?;
        let (bytes_sent, bytes_received) = total_bytes(&self.networks)?;

        Ok(Reading {
            cpu_percent: round_tenth(self.sys.global_cpu_usage() as f64),
            memory_percent,
            bytes_sent,
            bytes_received,
        })
    }
}

fn memory_percent(total: u64, available: u64) -> Result<f64, MetricsError> {
    if total == 0 {
        return Err(MetricsError::NoMemory);
    }
    let used = total.saturating_sub(available);
    Ok(round_tenth(used as f64 / total as f64 * 100.0))
}

/// Cumulative (sent, received) across every interface.
fn total_bytes(networks: &Networks) -> Result<(u64, u64), MetricsError> {
    if networks.list().is_empty() {
        return Err(MetricsError::NoInterfaces);
    }

    let mut tx = 0u64;
    let mut rx = 0u64;
    for data in networks.list().values() {
        tx = tx.saturating_add(data.total_transmitted());
        rx = rx.saturating_add(data.total_received());
    }
    Ok((tx, rx))
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
