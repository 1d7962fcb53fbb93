//! Process lifecycle helpers.

use tokio::signal;
use tracing::{info, warn};

/// Resolve when the process is asked to stop (Ctrl+C or SIGTERM).
///
/// Used as the graceful-shutdown trigger for `axum::serve`: in-flight
/// proxied requests finish their single upstream round trip before the
/// listener closes.
///
/// If a signal handler cannot be installed, that source is logged and
/// ignored rather than aborting startup; the process then stops via the
/// remaining source or the platform's supervisor.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler unavailable, relying on SIGTERM");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable, relying on Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Ctrl+C received, draining connections"),
        () = sigterm => info!("SIGTERM received, draining connections"),
    }
}
