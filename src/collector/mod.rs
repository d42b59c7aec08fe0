use std::path::PathBuf;

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, Networks, RefreshKind, System};

use crate::collector::{
    cpu::{CpuSampler, read_cpu_model},
    disk::{disk_partitions, primary_partition},
    format::{bytes_to_gb, clamp_percent, format_uptime, ratio_percent},
    model::{
        HardwareInfo, LiveStatusResponse, LoadAverage, NetworkIO, StaticInfoResponse, SystemInfo,
    },
};

pub mod cpu;
pub mod disk;
pub mod format;
pub mod model;

pub const UNKNOWN: &str = "Unknown";

// Reads OS counters on demand. Nothing is cached except the CPU usage baseline.
// Every read blocks on the OS, so async callers should run these on a blocking thread.
#[derive(Debug)]
pub struct Collector {
    disk_paths: Vec<PathBuf>,
    cpu_sampler: CpuSampler,
}

impl Collector {
    pub fn new(disk_paths: Vec<PathBuf>) -> Self {
        // CpuSampler takes the baseline sample on construction.
        Self {
            disk_paths,
            cpu_sampler: CpuSampler::new(),
        }
    }

    pub fn disk_paths(&self) -> &[PathBuf] {
        &self.disk_paths
    }

    pub fn static_info(&self) -> StaticInfoResponse {
        let system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::nothing().with_ram()),
        );

        let cpu_model = read_cpu_model(&system).unwrap_or_else(|error| {
            log::warn!("Failed to read CPU model: {}", error);
            UNKNOWN.to_string()
        });

        let disk_partitions = disk_partitions(&self.disk_paths);

        let total_disk_gb = self
            .disk_paths
            .first()
            .and_then(|primary| {
                disk_partitions
                    .iter()
                    .find(|partition| partition.path == primary.display().to_string())
            })
            .map(|partition| partition.total_gb)
            .unwrap_or(0.0);

        StaticInfoResponse {
            system_info: SystemInfo {
                os: format!("{} {}", os_family(), or_unknown(System::kernel_version())),
                hostname: or_unknown(System::host_name()),
                distribution: or_unknown(System::long_os_version()),
            },
            hardware_info: HardwareInfo {
                cpu_model,
                cpu_cores: system.cpus().len(),
                total_memory_gb: bytes_to_gb(system.total_memory()),
                total_disk_gb,
                disk_partitions,
            },
        }
    }

    // Blocks for up to sysinfo's minimum CPU update interval.
    pub fn live_status(&self) -> LiveStatusResponse {
        let cpu_percent = clamp_percent(self.cpu_sampler.sample());

        let system = System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        let total_memory = system.total_memory();
        let used_memory = total_memory.saturating_sub(system.available_memory());

        let disk_percent = primary_partition(&self.disk_paths)
            .map(|partition| partition.percent)
            .unwrap_or(0.0);

        let load = System::load_average();

        LiveStatusResponse {
            uptime: format_uptime(System::uptime()),
            cpu_percent,
            memory_percent: ratio_percent(used_memory, total_memory),
            disk_percent,
            load_average: LoadAverage {
                one_min: non_negative(load.one),
                five_min: non_negative(load.five),
                fifteen_min: non_negative(load.fifteen),
            },
            network_io: network_io(),
        }
    }
}

// Cumulative counters summed over every interface, loopback included.
fn network_io() -> NetworkIO {
    let networks = Networks::new_with_refreshed_list();

    networks.list().values().fold(
        NetworkIO {
            bytes_sent_total: 0,
            bytes_recv_total: 0,
        },
        |acc, data| NetworkIO {
            bytes_sent_total: acc.bytes_sent_total.saturating_add(data.total_transmitted()),
            bytes_recv_total: acc.bytes_recv_total.saturating_add(data.total_received()),
        },
    )
}

// Kernel family as uname reports it.
fn os_family() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        "netbsd" => "NetBSD",
        "openbsd" => "OpenBSD",
        "" => UNKNOWN,
        other => other,
    }
}

fn or_unknown(value: Option<String>) -> String {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}
