use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String, // kernel family + release, e.g. "Linux 6.1.0"
    pub hostname: String,
    pub distribution: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskPartition {
    pub path: String, // configured path
    pub mount_point: String,
    pub file_system: String,
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub cpu_model: String,
    pub cpu_cores: usize, // logical cores
    pub total_memory_gb: f64,
    pub total_disk_gb: f64, // primary path only
    pub disk_partitions: Vec<DiskPartition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticInfoResponse {
    pub system_info: SystemInfo,
    pub hardware_info: HardwareInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadAverage {
    pub one_min: f64,
    pub five_min: f64,
    pub fifteen_min: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkIO {
    pub bytes_sent_total: u64,
    pub bytes_recv_total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveStatusResponse {
    pub uptime: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub load_average: LoadAverage,
    pub network_io: NetworkIO,
}
