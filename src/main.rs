pub mod collector;
pub mod config;
pub mod errors;
pub mod http;
pub mod os;

use collector::Collector;
use std::sync::Arc;

#[cfg(target_os = "linux")]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    log::info!("Initializing collector...");

    // Takes the CPU usage baseline so the first live reading is meaningful.
    let collector = Arc::new(Collector::new(config::DISK_PATHS.clone()));

    for path in collector.disk_paths() {
        log::info!("Reporting disk usage for {}", path.display());
    }

    log::info!("Starting server...");

    http::run_server(collector).await?;

    log::info!("HTTP server stopped");

    Ok(())
}
