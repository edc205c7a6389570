use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::shutdown::{ShutdownReceiver, ShutdownSender};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Triggers shutdown on Ctrl+C (and SIGTERM on unix). Exits quietly once the
/// signal fires for any other reason.
pub fn setup_signal_shutdown_handler(shutdown_tx: &ShutdownSender) -> tokio::task::JoinHandle<()> {
    let shutdown_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        let mut shutdown_rx = shutdown_tx.subscribe();

        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        {
            tokio::select! {
                () = shutdown_rx.triggered() => {}
                _ = tokio::signal::ctrl_c() => {
                    debug!("Ctrl+C received, cancelling run");
                    shutdown_tx.trigger();
                }
                () = async {
                    if let Some(signal) = term_signal.as_mut() {
                        signal.recv().await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => {
                    debug!("SIGTERM received, cancelling run");
                    shutdown_tx.trigger();
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                () = shutdown_rx.triggered() => {}
                _ = tokio::signal::ctrl_c() => {
                    debug!("Ctrl+C received, cancelling run");
                    shutdown_tx.trigger();
                }
            }
        }
    })
}

/// Triggers shutdown once `timeout` elapses.
pub fn setup_deadline_shutdown(
    shutdown_tx: &ShutdownSender,
    timeout: Duration,
) -> tokio::task::JoinHandle<()> {
    let shutdown_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::select! {
            () = shutdown_rx.triggered() => {}
            () = sleep(timeout) => {
                debug!("Overall timeout of {:?} reached", timeout);
                shutdown_tx.trigger();
            }
        }
    })
}

/// Relays `upstream` into `downstream`, so a scoped signal (one ramp phase)
/// also fires when the run-wide one does.
pub fn forward_shutdown(
    upstream: &ShutdownReceiver,
    downstream: &ShutdownSender,
) -> tokio::task::JoinHandle<()> {
    let mut upstream = upstream.clone();
    let downstream = downstream.clone();
    tokio::spawn(async move {
        let mut downstream_rx = downstream.subscribe();
        tokio::select! {
            () = downstream_rx.triggered() => {}
            () = upstream.triggered() => downstream.trigger(),
        }
    })
}
