//! In-memory stand-in for a Cortensor router node.
//!
//! Exposes the `/v1` API the [`crate::router::HttpRouterClient`] talks to, with
//! session tracking and a fixed-delay demo inference engine.

pub mod handlers;
pub mod state;

use std::{future::Future, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::router::credentials::{CredentialProvider, CredentialRef};

pub use state::NodeState;

pub const NODE_API_KEY_ENV: &str = "API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterNodeConfig {
    #[serde(default = "default_node_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_node_model_name")]
    pub model_name: String,
    #[serde(default = "default_node_api_key")]
    pub api_key: CredentialRef,
    #[serde(default = "default_inference_delay_ms")]
    pub inference_delay_ms: u64,
}

impl Default for RouterNodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_node_listen_addr(),
            model_name: default_node_model_name(),
            api_key: default_node_api_key(),
            inference_delay_ms: default_inference_delay_ms(),
        }
    }
}

fn default_node_listen_addr() -> String {
    "0.0.0.0:5010".to_string()
}

fn default_node_model_name() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_node_api_key() -> CredentialRef {
    CredentialRef::Env {
        var: NODE_API_KEY_ENV.to_string(),
    }
}

fn default_inference_delay_ms() -> u64 {
    100
}

impl NodeState {
    /// Builds node state from config. An unresolvable key leaves the node locked.
    pub fn from_config(config: &RouterNodeConfig, credentials: &dyn CredentialProvider) -> Self {
        let api_key = match credentials.resolve(&config.api_key) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(target: "router_node", error = %err, "api_key_unresolved");
                None
            }
        };

        Self::new(
            config.model_name.clone(),
            api_key,
            Duration::from_millis(config.inference_delay_ms),
        )
    }
}

pub fn router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/v1/chat/completions", post(handlers::chat_completions))
        .route("/v1/validate", post(handlers::validate))
        .route("/v1/models", get(handlers::models))
        .route("/v1/health", get(handlers::health))
        .route("/v1/status", get(handlers::status))
        .route("/v1/sessions", get(handlers::list_sessions))
        .route("/v1/sessions/create", post(handlers::create_session))
        .route("/v1/reset", post(handlers::reset))
        .layer(axum::middleware::from_fn(handlers::log_requests))
        .with_state(state)
}

pub async fn serve(
    listener: TcpListener,
    state: Arc<NodeState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let local_addr = listener
        .local_addr()
        .context("failed to read router node listen address")?;
    tracing::info!(
        target: "router_node",
        addr = %local_addr,
        model = %state.model_name(),
        boot_time = %state.boot_iso(),
        api_key_configured = state.has_api_key(),
        "router_node_started"
    );

    let app = router(Arc::clone(&state));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("router node server failed")?;

    let counters = state.counters().await;
    tracing::info!(
        target: "router_node",
        inference_request_count = counters.inference_request_count,
        active_sessions = counters.active_session_count,
        "router_node_stopped"
    );
    Ok(())
}
