use chainproof::router::{
    HttpRouterClient, RouterClient, RouterConfig, RouterErrorKind, RouterMode, RouterModeSetting,
    build_router_client,
    credentials::{CredentialRef, EnvCredentialProvider},
    types::{ChatCompletionRequest, ChatMessage, ExpectedQuality, ValidationRequest},
};

use crate::{NODE_KEY, NODE_MODEL, spawn_node, unused_endpoint};

fn config(endpoint: &str) -> RouterConfig {
    RouterConfig {
        endpoint: endpoint.to_string(),
        request_timeout_ms: 5_000,
        status_timeout_ms: 2_000,
        ..RouterConfig::default()
    }
}

fn prompt(text: &str) -> ChatCompletionRequest {
    ChatCompletionRequest::new("gpt-4", vec![ChatMessage::user(text)]).with_temperature(0.7)
}

#[tokio::test]
async fn given_valid_key_when_completing_then_node_session_and_demo_text_are_returned() {
    let (endpoint, node) = spawn_node(Some(NODE_KEY)).await;
    let client = HttpRouterClient::new(&config(&endpoint), NODE_KEY).expect("client should build");
    assert_eq!(client.mode(), RouterMode::Real);

    let outcome = client
        .chat_completion(prompt("Check 0xabc for reentrancy"))
        .await
        .expect("completion should succeed");

    assert!(outcome.session_id.starts_with("session_"));
    assert_eq!(
        outcome.response,
        "[gpt-4] Analyzed: Check 0xabc for reentrancy... (Demo Response)"
    );
    assert!(outcome.full.id.starts_with("chatcmpl_"));
    assert!(outcome.full.usage.is_some());

    let counters = node.counters().await;
    assert_eq!(counters.inference_request_count, 1);
    assert_eq!(counters.active_session_count, 1);
}

#[tokio::test]
async fn given_wrong_key_when_completing_then_authentication_error_carries_status() {
    let (endpoint, _node) = spawn_node(Some(NODE_KEY)).await;
    let client = HttpRouterClient::new(&config(&endpoint), "wrong").expect("client should build");

    let err = client
        .chat_completion(prompt("hello"))
        .await
        .expect_err("wrong key should be rejected");

    assert_eq!(err.kind, RouterErrorKind::Authentication);
    assert_eq!(err.http_status, Some(401));
    assert!(!err.retryable);
    assert!(err.to_string().contains("Invalid API key"));
}

#[tokio::test]
async fn given_node_status_shape_when_reading_status_then_it_is_normalized() {
    let (endpoint, _node) = spawn_node(Some(NODE_KEY)).await;
    let client = HttpRouterClient::new(&config(&endpoint), NODE_KEY).expect("client should build");

    let status = client.status().await.expect("status should succeed");
    assert_eq!(status.status, "operational");
    assert_eq!(status.version, "v1");
    assert!(status.uptime >= 0.0);
    assert_eq!(status.active_models, vec![NODE_MODEL.to_string()]);

    let models = client.list_models().await.expect("models should succeed");
    assert_eq!(models, vec![NODE_MODEL.to_string()]);
}

#[tokio::test]
async fn given_completed_session_when_validating_then_node_validates_it() {
    let (endpoint, _node) = spawn_node(Some(NODE_KEY)).await;
    let client = HttpRouterClient::new(&config(&endpoint), NODE_KEY).expect("client should build");
    let outcome = client
        .chat_completion(prompt("validate me"))
        .await
        .expect("completion should succeed");

    let validation = client
        .validate_session(ValidationRequest {
            session_id: outcome.session_id.clone(),
            expected_quality: ExpectedQuality::High,
        })
        .await
        .expect("validation should succeed");
    assert_eq!(validation.session_id, outcome.session_id);
    assert!(validation.validated);

    let err = client
        .validate_session(ValidationRequest {
            session_id: "session_missing".to_string(),
            expected_quality: ExpectedQuality::High,
        })
        .await
        .expect_err("unknown session should fail");
    assert_eq!(err.kind, RouterErrorKind::InvalidRequest);
    assert_eq!(err.http_status, Some(404));
}

#[tokio::test]
async fn given_unreachable_node_when_reading_status_then_transport_error_is_returned() {
    let endpoint = unused_endpoint().await;
    let client = HttpRouterClient::new(&config(&endpoint), NODE_KEY).expect("client should build");

    let err = client.status().await.expect_err("closed port should fail");
    assert!(matches!(
        err.kind,
        RouterErrorKind::Transport | RouterErrorKind::Timeout
    ));
    assert!(err.retryable);
}

#[tokio::test]
async fn given_real_mode_with_inline_key_when_building_then_http_client_reaches_node() {
    let (endpoint, _node) = spawn_node(Some(NODE_KEY)).await;
    let router_config = RouterConfig {
        mode: RouterModeSetting::Real,
        credential: CredentialRef::InlineToken {
            token: NODE_KEY.to_string(),
        },
        ..config(&endpoint)
    };

    let client =
        build_router_client(&router_config, &EnvCredentialProvider).expect("client should build");
    assert_eq!(client.mode(), RouterMode::Real);

    let outcome = client
        .chat_completion(prompt("ping"))
        .await
        .expect("completion should succeed");
    assert!(outcome.response.contains("(Demo Response)"));
}

#[test]
fn given_blank_endpoint_when_building_http_client_then_invalid_request_is_returned() {
    let err = match HttpRouterClient::new(&config("  "), NODE_KEY) {
        Ok(_) => panic!("blank endpoint should fail"),
        Err(err) => err,
    };
    assert_eq!(err.kind, RouterErrorKind::InvalidRequest);
}

async fn spawn_stub_completion(body: serde_json::Value) -> String {
    let app = axum::Router::new().route(
        "/v1/chat/completions",
        axum::routing::post(move || {
            let body = body.clone();
            async move { axum::Json(body) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("local addr should exist");
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{addr}")
}

#[tokio::test]
async fn given_reply_without_session_or_id_when_completing_then_session_id_falls_back_to_timestamp()
{
    let endpoint = spawn_stub_completion(serde_json::json!({
        "created": 1,
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "sparse reply"}}
        ]
    }))
    .await;
    let client = HttpRouterClient::new(&config(&endpoint), NODE_KEY).expect("client should build");

    let outcome = client
        .chat_completion(prompt("hello"))
        .await
        .expect("sparse reply should decode");

    assert_eq!(outcome.response, "sparse reply");
    let millis = outcome
        .session_id
        .strip_prefix("session-")
        .expect("fallback session id should be timestamped");
    assert!(!millis.is_empty() && millis.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn given_reply_with_only_id_when_completing_then_id_becomes_session_id() {
    let endpoint = spawn_stub_completion(serde_json::json!({
        "id": "chatcmpl_abc",
        "model": "gpt-4",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "ok"}}
        ]
    }))
    .await;
    let client = HttpRouterClient::new(&config(&endpoint), NODE_KEY).expect("client should build");

    let outcome = client
        .chat_completion(prompt("hello"))
        .await
        .expect("reply should decode");

    assert_eq!(outcome.session_id, "chatcmpl_abc");
}
