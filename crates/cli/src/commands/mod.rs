//! Command implementations.

mod info;
mod ingest;
mod simulate;
mod validate;

pub use info::run_info;
pub use ingest::run_ingest;
pub use simulate::run_simulate;
pub use validate::run_validate;

use tokio::sync::watch;
use tracing::warn;

/// Spawn the Ctrl+C / SIGTERM handler.
///
/// Returns a watch receiver that flips to `true` once a shutdown signal
/// arrives; components finish their current unit of work and exit.
pub(crate) fn spawn_shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        wait_for_signal().await;
        warn!("Received shutdown signal, stopping...");
        let _ = tx.send(true);
        // Keep the sender alive so receivers observe `true` rather than
        // a closed channel.
        tx.closed().await;
    });

    rx
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => {
                warn!("Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
