pub mod client;
pub mod credentials;
pub mod error;
pub mod http;
pub mod simulated;
pub mod types;

use std::sync::Arc;

pub use client::RouterClient;
pub use error::{RouterError, RouterErrorKind};
pub use http::HttpRouterClient;
pub use simulated::SimulatedRouterClient;
pub use types::{RouterConfig, RouterMode, RouterModeSetting};

use credentials::CredentialProvider;

/// Picks the router client for the configured mode.
///
/// `auto` falls back to the simulated client whenever the API key does not
/// resolve; `real` treats a missing key as a startup error.
pub fn build_router_client(
    config: &RouterConfig,
    credentials: &dyn CredentialProvider,
) -> Result<Arc<dyn RouterClient>, RouterError> {
    let api_key = match config.mode {
        RouterModeSetting::Simulated => None,
        RouterModeSetting::Real => Some(credentials.resolve(&config.credential)?.ok_or_else(
            || {
                RouterError::new(
                    RouterErrorKind::Authentication,
                    "router.mode is real but no API key credential is configured",
                )
                .with_retryable(false)
            },
        )?),
        RouterModeSetting::Auto => match credentials.resolve(&config.credential) {
            Ok(key) => key,
            Err(err) => {
                tracing::debug!(target: "router", error = %err, "router_credential_unresolved");
                None
            }
        },
    };

    match api_key {
        Some(api_key) => {
            let client = HttpRouterClient::new(config, api_key)?;
            tracing::info!(
                target: "router",
                endpoint = %client.base_url(),
                model = %config.model,
                "using_real_router_client"
            );
            Ok(Arc::new(client))
        }
        None => {
            tracing::info!(
                target: "router",
                latency_scale = config.simulation.latency_scale,
                seeded = config.simulation.seed.is_some(),
                "using_simulated_router_client"
            );
            Ok(Arc::new(SimulatedRouterClient::new(&config.simulation)))
        }
    }
}
