mod http_client;
mod node;
mod simulated;

use std::{sync::Arc, time::Duration};

use chainproof::router_node::{self, NodeState};
use tokio::net::TcpListener;

pub const NODE_KEY: &str = "node-test-key";
pub const NODE_MODEL: &str = "gemini-2.0-flash";

pub async fn spawn_node(api_key: Option<&str>) -> (String, Arc<NodeState>) {
    let state = Arc::new(NodeState::new(
        NODE_MODEL,
        api_key.map(str::to_string),
        Duration::ZERO,
    ));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("local addr should exist");
    tokio::spawn(router_node::serve(
        listener,
        Arc::clone(&state),
        std::future::pending(),
    ));
    (format!("http://{addr}"), state)
}

pub async fn unused_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("local addr should exist");
    drop(listener);
    format!("http://{addr}")
}
