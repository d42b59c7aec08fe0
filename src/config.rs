use std::{path::PathBuf, sync::LazyLock};

pub const HTTP_DEFAULT_HOST: &str = "0.0.0.0";
pub const HTTP_DEFAULT_PORT: u16 = 8000;
pub const DISK_DEFAULT_PATH: &str = "/";

pub static HTTP_HOST: LazyLock<String> = LazyLock::new(|| {
    std::env::var("SYSMON_HTTP_HOST")
        .ok()
        .filter(|val| !val.trim().is_empty())
        .unwrap_or_else(|| HTTP_DEFAULT_HOST.to_string())
});

pub static HTTP_PORT: LazyLock<u16> = LazyLock::new(|| {
    std::env::var("SYSMON_HTTP_PORT")
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(HTTP_DEFAULT_PORT)
});

// Filesystems reported by the collector. The first entry is the primary path.
pub static DISK_PATHS: LazyLock<Vec<PathBuf>> = LazyLock::new(|| {
    parse_disk_paths(std::env::var("SYSMON_DISK_PATHS").ok().as_deref())
});

pub fn parse_disk_paths(raw: Option<&str>) -> Vec<PathBuf> {
    let paths: Vec<PathBuf> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect();

    if paths.is_empty() {
        vec![PathBuf::from(DISK_DEFAULT_PATH)]
    } else {
        paths
    }
}
