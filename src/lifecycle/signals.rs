//! OS signal handling.
//!
//! # Responsibilities
//! - Translate SIGINT/SIGTERM into a supervisor close
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Safe to combine with a programmatic close: close() is idempotent

use std::sync::Arc;

use crate::lifecycle::supervisor::Supervisor;

/// Spawn a task that closes the supervisor when the process receives an
/// interrupt (SIGINT, and SIGTERM on Unix).
pub fn close_on_interrupt(supervisor: Arc<Supervisor>) {
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutdown signal received");
        supervisor.close().await;
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(error) => {
            tracing::error!(%error, "Failed to install SIGTERM handler");
            return;
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(error) = result {
                tracing::error!(%error, "Failed to install Ctrl+C handler");
            }
        }
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to install Ctrl+C handler");
    }
}
