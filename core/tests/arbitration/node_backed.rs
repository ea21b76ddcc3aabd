use std::{sync::Arc, time::Duration};

use chainproof::{
    arbitration::{AnalysisType, ArbitrationEngine},
    router::{HttpRouterClient, RouterConfig},
    router_node::{self, NodeState},
};
use tokio::net::TcpListener;

use crate::{request, seeded_config};

#[tokio::test]
async fn given_router_node_when_analyzing_then_node_sessions_back_the_evidence() {
    let node = Arc::new(NodeState::new(
        "gemini-2.0-flash",
        Some("node-key".to_string()),
        Duration::ZERO,
    ));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("local addr should exist");
    tokio::spawn(router_node::serve(
        listener,
        Arc::clone(&node),
        std::future::pending(),
    ));

    let router_config = RouterConfig {
        endpoint: format!("http://{addr}"),
        ..RouterConfig::default()
    };
    let client = HttpRouterClient::new(&router_config, "node-key").expect("client should build");
    let engine = ArbitrationEngine::new(Arc::new(client), "gpt-4", seeded_config(4), None);

    let bundle = engine
        .analyze(request("0xc0ffee staking vault", AnalysisType::ContractAudit))
        .await
        .expect("analysis should succeed");

    assert!(bundle.agent_a_result.analysis.ends_with("(Demo Response)"));
    assert_eq!(bundle.evidence.session_ids.len(), 4);
    assert!(
        bundle
            .evidence
            .session_ids
            .iter()
            .all(|id| id.starts_with("session_"))
    );
    assert_eq!(bundle.evidence.session_validations.len(), 2);
    assert!(
        bundle
            .evidence
            .session_validations
            .iter()
            .all(|validation| validation.validated)
    );

    let counters = node.counters().await;
    assert_eq!(counters.active_session_count, 4);
    assert_eq!(counters.inference_request_count, 4);
}
