#[derive(Debug)]
pub enum Errors {
    CpuInfoReadError(String),
    CpuModelNotFound,
    PathNotFound(String),
    MountNotFound(String),
    DiskUsageError(String),
    SerializeError(String),
    ServerBindError(String),
    ServerError(String),
    TaskJoinError(String),
}

impl std::fmt::Display for Errors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Errors::CpuInfoReadError(msg) => write!(f, "CPU Info Read Error: {}", msg),
            Errors::CpuModelNotFound => write!(f, "CPU Model Not Found"),
            Errors::PathNotFound(msg) => write!(f, "Path Not Found: {}", msg),
            Errors::MountNotFound(msg) => write!(f, "Mount Not Found: {}", msg),
            Errors::DiskUsageError(msg) => write!(f, "Disk Usage Error: {}", msg),
            Errors::SerializeError(msg) => write!(f, "Serialize Error: {}", msg),
            Errors::ServerBindError(msg) => write!(f, "Server Bind Error: {}", msg),
            Errors::ServerError(msg) => write!(f, "Server Error: {}", msg),
            Errors::TaskJoinError(msg) => write!(f, "Task Join Error: {}", msg),
        }
    }
}

impl std::error::Error for Errors {}

pub type Result<T> = std::result::Result<T, Errors>;
