
use std::sync::Arc;

use chainproof::{
    arbitration::{ArbitrationConfig, ArbitrationEngine},
    router::{RouterClient, SimulatedRouterClient},
    server::{self, AppState},
};
use tokio::net::TcpListener;

pub async fn spawn_api_with(router: Arc<dyn RouterClient>) -> String {
    let engine = Arc::new(ArbitrationEngine::new(
        Arc::clone(&router),
        "gpt-4",
        ArbitrationConfig {
            seed: Some(21),
            ..ArbitrationConfig::default()
        },
        None,
    ));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("local addr should exist");
    tokio::spawn(server::serve(
        listener,
        AppState::new(engine, router, "gpt-4"),
        std::future::pending(),
    ));
    format!("http://{addr}")
}

pub async fn spawn_simulated_api() -> String {
    spawn_api_with(Arc::new(SimulatedRouterClient::instant(21))).await
}
