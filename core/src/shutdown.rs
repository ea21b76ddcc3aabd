use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};

async fn wait_for_signal() -> Result<&'static str> {
    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;

    Ok(tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    })
}

/// Resolves on SIGINT or SIGTERM. If signals cannot be installed it never resolves.
pub async fn shutdown_signal() {
    match wait_for_signal().await {
        Ok(signal_name) => {
            tracing::info!(target: "server", signal = signal_name, "shutdown_signal_received");
        }
        Err(err) => {
            tracing::error!(target: "server", error = %format!("{err:#}"), "shutdown_signal_unavailable");
            std::future::pending::<()>().await;
        }
    }
}
