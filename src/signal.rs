use std::future;
use tokio::signal;

/// Resolves on the first SIGINT or SIGTERM.
pub async fn shutdown() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Unable to listen for SIGINT: {}", e);
            future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Unable to listen for SIGTERM: {}", e);
                future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        () = interrupt => log::info!("Received SIGINT, shutting down"),
        () = terminate => log::info!("Received SIGTERM, shutting down"),
    }
}
