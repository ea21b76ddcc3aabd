use std::sync::Arc;

use anyhow::{Context, Result};
use chainproof::{
    arbitration::ArbitrationEngine,
    cli::config_path_from_args,
    config::Config,
    logging::init_tracing,
    router::{build_router_client, credentials::EnvCredentialProvider},
    server::{self, AppState},
    shutdown::shutdown_signal,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args("chainproof")?;
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let logging_guard = init_tracing(&config.logging)?;

    let router = build_router_client(&config.router, &EnvCredentialProvider)
        .context("failed to construct router client")?;
    let engine = Arc::new(ArbitrationEngine::new(
        Arc::clone(&router),
        config.router.model.clone(),
        config.arbitration.clone(),
        config.alerts.webhook_url.clone(),
    ));

    let listener = TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind api server to {}", config.server.listen_addr))?;

    server::serve(
        listener,
        AppState::new(engine, router, config.router.model.clone()),
        shutdown_signal(),
    )
    .await?;

    tracing::info!(target: "server", run_id = %logging_guard.run_id(), "chainproof_stopped");
    Ok(())
}
