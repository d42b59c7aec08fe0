use std::path::{Path, PathBuf};

use crate::{
    collector::{
        UNKNOWN,
        format::{bytes_to_gb, ratio_percent},
        model::DiskPartition,
    },
    errors,
};

// Byte counts for the filesystem holding a path. `free` is what unprivileged users can still
// allocate, so blocks reserved for root count as neither used nor free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

impl DiskUsage {
    pub fn from_blocks(blocks: u64, blocks_free: u64, blocks_available: u64, fragment_size: u64) -> Self {
        Self {
            total: blocks.saturating_mul(fragment_size),
            used: blocks.saturating_sub(blocks_free).saturating_mul(fragment_size),
            free: blocks_available.saturating_mul(fragment_size),
        }
    }

    // used / (used + free), so reserved blocks don't inflate the reading.
    pub fn percent(&self) -> f64 {
        ratio_percent(self.used, self.used.saturating_add(self.free))
    }
}

fn to_partition(path: &Path, mount_point: String, file_system: String, usage: DiskUsage) -> DiskPartition {
    DiskPartition {
        path: path.display().to_string(),
        mount_point,
        file_system,
        total_gb: bytes_to_gb(usage.total),
        used_gb: bytes_to_gb(usage.used),
        free_gb: bytes_to_gb(usage.free),
        percent: usage.percent(),
    }
}

#[cfg(target_os = "linux")]
pub const PROC_MOUNTS_PATH: &str = "/proc/self/mounts";

#[cfg(target_os = "linux")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub mount_point: PathBuf,
    pub file_system: String,
}

// Decodes the octal escapes (`\040` for space and so on) the kernel writes into mount fields.
#[cfg(target_os = "linux")]
fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|digit| (b'0'..=b'7').contains(digit)) {
                let value = digits
                    .iter()
                    .fold(0u16, |acc, digit| acc * 8 + u16::from(digit - b'0'));
                if let Ok(value) = u8::try_from(value) {
                    decoded.push(value);
                    i += 4;
                    continue;
                }
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(target_os = "linux")]
pub fn parse_mounts(contents: &str) -> Vec<MountEntry> {
    contents
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _device = fields.next()?;
            let mount_point = fields.next()?;
            let file_system = fields.next()?;

            Some(MountEntry {
                mount_point: PathBuf::from(unescape_mount_field(mount_point)),
                file_system: file_system.to_string(),
            })
        })
        .collect()
}

// The mount with the longest mount-point prefix of `path`. Later entries shadow earlier ones.
#[cfg(target_os = "linux")]
pub fn find_mount<'a>(mounts: &'a [MountEntry], path: &Path) -> errors::Result<&'a MountEntry> {
    mounts
        .iter()
        .filter(|mount| path.starts_with(&mount.mount_point))
        .max_by_key(|mount| mount.mount_point.components().count())
        .ok_or_else(|| errors::Errors::MountNotFound(path.display().to_string()))
}

#[cfg(target_os = "linux")]
pub fn disk_usage(path: &Path) -> errors::Result<DiskUsage> {
    use nix::{errno::Errno, sys::statvfs::statvfs};

    let stat = statvfs(path).map_err(|errno| match errno {
        Errno::ENOENT | Errno::ENOTDIR => {
            errors::Errors::PathNotFound(format!("{}: {}", path.display(), errno))
        }
        _ => errors::Errors::DiskUsageError(format!("{}: {}", path.display(), errno)),
    })?;

    Ok(DiskUsage::from_blocks(
        stat.blocks() as u64,
        stat.blocks_free() as u64,
        stat.blocks_available() as u64,
        stat.fragment_size() as u64,
    ))
}

#[cfg(target_os = "linux")]
#[derive(Debug, Default)]
pub struct MountTable {
    entries: Vec<MountEntry>,
}

#[cfg(target_os = "linux")]
impl MountTable {
    pub fn load() -> Self {
        match std::fs::read_to_string(PROC_MOUNTS_PATH) {
            Ok(contents) => Self {
                entries: parse_mounts(&contents),
            },
            Err(error) => {
                log::warn!("Failed to read {}: {}", PROC_MOUNTS_PATH, error);
                Self::default()
            }
        }
    }

    pub fn partition_for(&self, path: &Path) -> errors::Result<DiskPartition> {
        let resolved = path
            .canonicalize()
            .map_err(|e| errors::Errors::PathNotFound(format!("{}: {}", path.display(), e)))?;

        let usage = disk_usage(&resolved)?;

        let (mount_point, file_system) = match find_mount(&self.entries, &resolved) {
            Ok(mount) => (mount.mount_point.display().to_string(), mount.file_system.clone()),
            Err(error) => {
                log::debug!("No mount entry for {}: {}", resolved.display(), error);
                (UNKNOWN.to_string(), UNKNOWN.to_string())
            }
        };

        Ok(to_partition(path, mount_point, file_system, usage))
    }
}

// Elsewhere only the disks sysinfo lists can be resolved.
#[cfg(not(target_os = "linux"))]
#[derive(Debug)]
pub struct MountTable {
    disks: sysinfo::Disks,
}

#[cfg(not(target_os = "linux"))]
impl MountTable {
    pub fn load() -> Self {
        Self {
            disks: sysinfo::Disks::new_with_refreshed_list(),
        }
    }

    pub fn partition_for(&self, path: &Path) -> errors::Result<DiskPartition> {
        let resolved = path
            .canonicalize()
            .map_err(|e| errors::Errors::PathNotFound(format!("{}: {}", path.display(), e)))?;

        let disk = self
            .disks
            .list()
            .iter()
            .filter(|disk| resolved.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().components().count())
            .ok_or_else(|| errors::Errors::MountNotFound(resolved.display().to_string()))?;

        let total = disk.total_space();
        let free = disk.available_space().min(total);
        let usage = DiskUsage {
            total,
            used: total - free,
            free,
        };

        Ok(to_partition(
            path,
            disk.mount_point().display().to_string(),
            disk.file_system().to_string_lossy().into_owned(),
            usage,
        ))
    }
}

// Paths that don't exist or can't be read are skipped.
pub fn disk_partitions(paths: &[PathBuf]) -> Vec<DiskPartition> {
    let table = MountTable::load();

    paths
        .iter()
        .filter_map(|path| match table.partition_for(path) {
            Ok(partition) => Some(partition),
            Err(error) => {
                log::warn!("Skipping disk path {}: {}", path.display(), error);
                None
            }
        })
        .collect()
}

// Usage of the primary path's filesystem, if it could be resolved.
pub fn primary_partition(paths: &[PathBuf]) -> Option<DiskPartition> {
    let primary = paths.first()?;

    disk_partitions(std::slice::from_ref(primary)).into_iter().next()
}
