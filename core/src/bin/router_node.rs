use std::sync::Arc;

use anyhow::{Context, Result};
use chainproof::{
    cli::config_path_from_args,
    config::Config,
    logging::init_tracing,
    router::credentials::EnvCredentialProvider,
    router_node::{self, NodeState},
    shutdown::shutdown_signal,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args("router-node")?;
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let _logging_guard = init_tracing(&config.logging)?;

    let node_config = &config.router_node;
    let state = Arc::new(NodeState::from_config(node_config, &EnvCredentialProvider));
    let listener = TcpListener::bind(&node_config.listen_addr)
        .await
        .with_context(|| format!("failed to bind router node to {}", node_config.listen_addr))?;

    router_node::serve(listener, state, shutdown_signal()).await
}
