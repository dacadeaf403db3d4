use std::hint::black_box;
use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::StressError;

/// One busy-spinning thread per core, all sharing a single run flag.
pub struct WorkerPool {
    running: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

/// Start `count` workers, each saturating one core until the pool is shut down.
///
/// Fails fast: if any worker cannot be spawned, the ones already running are
/// stopped and joined before the error is returned.
pub fn spawn_workers(count: usize, pin: bool) -> Result<WorkerPool, StressError> {
    if count == 0 {
        return Err(StressError::NoWorkers);
    }

    let cores = if pin { allowed_cpus() } else { Vec::new() };
    let running = Arc::new(AtomicBool::new(true));
    let mut pool = WorkerPool {
        running: Arc::clone(&running),
        handles: Vec::with_capacity(count),
    };

    for index in 0..count {
        let running = Arc::clone(&running);
        let core = core_for(index, &cores);
        let spawned = thread::Builder::new()
            .name(format!("stress-worker-{index}"))
            .spawn(move || {
                if let Some(core) = core {
                    pin_current_thread(core);
                }
                burn(&running);
            });

        match spawned {
            Ok(handle) => pool.handles.push(handle),
            Err(source) => return Err(pool.abort(index, source)),
        }
    }

    debug!(workers = count, pin, "stress workers started");
    Ok(pool)
}

fn burn(running: &AtomicBool) {
    while running.load(Ordering::Relaxed) {
        black_box((0..1_000_000u64).fold(0u64, |acc, x| acc.wrapping_add(black_box(x))));
    }
}

/// Worker `index` goes to the index-th CPU the process may run on, wrapping
/// when there are more workers than CPUs.
fn core_for(index: usize, cores: &[usize]) -> Option<usize> {
    if cores.is_empty() {
        None
    } else {
        Some(cores[index % cores.len()])
    }
}

/// CPU ids in the calling process's affinity mask.
#[cfg(target_os = "linux")]
fn allowed_cpus() -> Vec<usize> {
    // SAFETY: the set is plain bit storage, filled in by the kernel.
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        if libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set) != 0 {
            let err = std::io::Error::last_os_error();
            warn!(error = %err, "failed to read cpu affinity, running unpinned");
            return Vec::new();
        }
        (0..libc::CPU_SETSIZE as usize)
            .filter(|&cpu| libc::CPU_ISSET(cpu, &set))
            .collect()
    }
}

#[cfg(not(target_os = "linux"))]
fn allowed_cpus() -> Vec<usize> {
    debug!("core pinning not supported on this platform");
    Vec::new()
}

#[cfg(target_os = "linux")]
fn pin_current_thread(core: usize) {
    // SAFETY: cpu_set_t is plain bit storage; zeroed is the empty set.
    let rc = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };

    if rc != 0 {
        let err = std::io::Error::last_os_error();
        warn!(core, error = %err, "failed to pin stress worker, running unpinned");
    }
}

#[cfg(not(target_os = "linux"))]
fn pin_current_thread(_core: usize) {}

impl WorkerPool {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop every worker and wait for each to exit. Returns how many were joined.
    pub fn shutdown(mut self) -> usize {
        self.stop_and_join()
    }

    /// Fail-fast path for a worker that could not be spawned: nothing
    /// already running is left behind.
    fn abort(mut self, index: usize, source: std::io::Error) -> StressError {
        let joined = self.stop_and_join();
        warn!(index, joined, "stress worker failed to spawn, stopped the rest");
        StressError::Spawn { index, source }
    }

    fn stop_and_join(&mut self) -> usize {
        self.running.store(false, Ordering::SeqCst);

        let mut joined = 0;
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("stress-worker").to_string();
            match handle.join() {
                Ok(()) => joined += 1,
                Err(_) => warn!(worker = %name, "stress worker panicked"),
            }
        }
        joined
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.stop_and_join();
        }
    }
}
