// Resolves once a shutdown signal arrives. Used for graceful server shutdown.
#[cfg(unix)]
pub async fn handle_shutdown() {
    use tokio::signal::unix::{self, SignalKind};

    let (mut sigquit_signal, mut sigterm_signal, mut sigint_signal) = match (
        unix::signal(SignalKind::quit()),
        unix::signal(SignalKind::terminate()),
        unix::signal(SignalKind::interrupt()),
    ) {
        (Ok(quit), Ok(term), Ok(int)) => (quit, term, int),
        (quit, term, int) => {
            let error = [quit.err(), term.err(), int.err()].into_iter().flatten().next();
            log::warn!(
                "Failed to install signal handlers ({:?}), falling back to Ctrl-C",
                error
            );
            wait_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigquit_signal.recv() => {
            log::info!("Received SIGQUIT signal");
        }
        _ = sigterm_signal.recv() => {
            log::info!("Received SIGTERM signal");
        }
        _ = sigint_signal.recv() => {
            log::info!("Received SIGINT signal");
        }
    };
}

#[cfg(not(unix))]
pub async fn handle_shutdown() {
    wait_ctrl_c().await;
}

async fn wait_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Received Ctrl-C"),
        Err(error) => {
            // Without any signal source, keep serving until the process is killed.
            log::error!("Failed to listen for Ctrl-C: {}", error);
            std::future::pending::<()>().await;
        }
    }
}
