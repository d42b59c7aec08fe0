use std::{
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use sysinfo::{CpuRefreshKind, MINIMUM_CPU_UPDATE_INTERVAL, RefreshKind, System};

use crate::errors;

pub const PROC_CPUINFO_PATH: &str = "/proc/cpuinfo";

#[derive(Debug)]
struct CpuState {
    system: System,
    last_refresh: Instant,
    last_usage: f64,
}

// Holds the previous CPU sample so the next reading has something to diff against.
// The lock is only held while refreshing, never while waiting.
#[derive(Debug)]
pub struct CpuSampler {
    state: Mutex<CpuState>,
}

impl Default for CpuSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuSampler {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing().with_cpu_usage()),
        );
        let last_usage = system.global_cpu_usage() as f64;

        Self {
            state: Mutex::new(CpuState {
                system,
                last_refresh: Instant::now(),
                last_usage,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CpuState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Global usage since the previous sample, in percent. Blocking.
    //
    // Sleeps out the rest of the minimum update interval when the previous sample is too fresh.
    // Callers that wake up after another caller already refreshed share that reading.
    pub fn sample(&self) -> f64 {
        let wait = MINIMUM_CPU_UPDATE_INTERVAL.saturating_sub(self.lock().last_refresh.elapsed());
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }

        let mut state = self.lock();
        if state.last_refresh.elapsed() >= MINIMUM_CPU_UPDATE_INTERVAL {
            state.system.refresh_cpu_usage();
            state.last_refresh = Instant::now();
            state.last_usage = state.system.global_cpu_usage() as f64;
        }

        state.last_usage
    }
}

pub fn parse_cpu_model(cpuinfo: &str) -> errors::Result<String> {
    cpuinfo
        .lines()
        .filter(|line| line.starts_with("model name"))
        .find_map(|line| line.split_once(':'))
        .map(|(_, model)| model.trim().to_string())
        .filter(|model| !model.is_empty())
        .ok_or(errors::Errors::CpuModelNotFound)
}

pub fn read_cpu_model_from(path: impl AsRef<Path>) -> errors::Result<String> {
    let path = path.as_ref();

    let cpuinfo = std::fs::read_to_string(path).map_err(|e| {
        errors::Errors::CpuInfoReadError(format!("Failed to read {}: {}", path.display(), e))
    })?;

    parse_cpu_model(&cpuinfo)
}

// Brand string reported by the OS for the first CPU.
fn brand_from_system(system: &System) -> errors::Result<String> {
    system
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .filter(|brand| !brand.is_empty())
        .ok_or(errors::Errors::CpuModelNotFound)
}

pub fn read_cpu_model(system: &System) -> errors::Result<String> {
    if cfg!(target_os = "linux") {
        match read_cpu_model_from(PROC_CPUINFO_PATH) {
            Ok(model) => return Ok(model),
            Err(error) => log::debug!("Falling back to sysinfo CPU brand: {}", error),
        }
    }

    brand_from_system(system)
}
