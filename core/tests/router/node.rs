use serde_json::{Value, json};

use crate::{NODE_KEY, NODE_MODEL, spawn_node};

#[tokio::test]
async fn given_missing_bearer_when_posting_completion_then_node_answers_401() {
    let (endpoint, node) = spawn_node(Some(NODE_KEY)).await;

    let response = reqwest::Client::new()
        .post(format!("{endpoint}/v1/chat/completions"))
        .json(&json!({"model": "gpt-4", "messages": [{"role": "user", "content": "hi"}]}))
        .send()
        .await
        .expect("request should reach node");

    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.expect("body should be json");
    assert_eq!(body["detail"], "Invalid API key");
    assert_eq!(node.counters().await.active_session_count, 0);
}

#[tokio::test]
async fn given_node_without_key_when_posting_completion_then_every_token_is_rejected() {
    let (endpoint, _node) = spawn_node(None).await;

    let response = reqwest::Client::new()
        .post(format!("{endpoint}/v1/chat/completions"))
        .bearer_auth("anything")
        .json(&json!({"model": "gpt-4", "messages": [{"role": "user", "content": "hi"}]}))
        .send()
        .await
        .expect("request should reach node");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn given_fresh_node_when_reading_health_then_boot_info_is_reported() {
    let (endpoint, _node) = spawn_node(Some(NODE_KEY)).await;

    let body: Value = reqwest::get(format!("{endpoint}/v1/health"))
        .await
        .expect("health should respond")
        .json()
        .await
        .expect("health should be json");

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["inference_engine"], "gemini-inference");
    assert_eq!(body["model_name"], NODE_MODEL);
    assert_eq!(body["inference_request_count"], 0);
    assert!(
        body["server_start_time"]
            .as_str()
            .is_some_and(|time| time.ends_with('Z'))
    );
    assert!(body["boot_timestamp_unix"].as_f64().is_some_and(|unix| unix > 0.0));
}

#[tokio::test]
async fn given_created_sessions_when_resetting_then_session_list_is_cleared() {
    let (endpoint, _node) = spawn_node(Some(NODE_KEY)).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let created: Value = client
            .post(format!("{endpoint}/v1/sessions/create"))
            .send()
            .await
            .expect("create should respond")
            .json()
            .await
            .expect("create should be json");
        assert_eq!(created["status"], "success");
        assert!(
            created["session_id"]
                .as_str()
                .is_some_and(|id| id.starts_with("session_"))
        );
    }

    let listed: Value = client
        .get(format!("{endpoint}/v1/sessions"))
        .send()
        .await
        .expect("list should respond")
        .json()
        .await
        .expect("list should be json");
    assert_eq!(listed["total_sessions"], 2);
    assert_eq!(listed["sessions"][0]["inference_count"], 0);
    assert!(listed["sessions"][0]["last_inference_time"].is_null());

    let reset: Value = client
        .post(format!("{endpoint}/v1/reset"))
        .send()
        .await
        .expect("reset should respond")
        .json()
        .await
        .expect("reset should be json");
    assert_eq!(reset["message"], "Router state reset complete");

    let status: Value = client
        .get(format!("{endpoint}/v1/status"))
        .send()
        .await
        .expect("status should respond")
        .json()
        .await
        .expect("status should be json");
    assert_eq!(status["active_session_count"], 0);
    assert_eq!(status["cache_enabled"], false);
    assert_eq!(status["api_version"], "v1");
}

#[tokio::test]
async fn given_root_path_when_requested_then_endpoint_index_is_listed() {
    let (endpoint, _node) = spawn_node(Some(NODE_KEY)).await;

    let body: Value = reqwest::get(format!("{endpoint}/"))
        .await
        .expect("root should respond")
        .json()
        .await
        .expect("root should be json");

    assert_eq!(body["name"], "Cortensor Router API");
    assert_eq!(body["endpoints"]["chat_completions"], "/v1/chat/completions");
}
