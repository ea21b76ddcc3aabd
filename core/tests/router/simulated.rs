use chainproof::router::{
    RouterClient, RouterErrorKind, RouterMode, SimulatedRouterClient,
    types::{ChatCompletionRequest, ChatMessage, ExpectedQuality, ValidationRequest},
};

#[tokio::test]
async fn given_instant_simulator_when_completing_then_sim_session_and_nominal_latency_are_reported()
{
    let client = SimulatedRouterClient::instant(7);
    assert_eq!(client.mode(), RouterMode::Simulated);

    let outcome = client
        .chat_completion(ChatCompletionRequest::new(
            "gpt-4",
            vec![ChatMessage::user("Is this token a security risk?")],
        ))
        .await
        .expect("simulated completion should succeed");

    assert!(outcome.session_id.starts_with("sim-"));
    assert!((500..=1500).contains(&outcome.latency_ms));
    assert!(outcome.response.starts_with("Based on analysis"));
    assert_eq!(outcome.full.model, "gpt-4");
    assert_eq!(outcome.full.first_content(), Some(outcome.response.as_str()));
}

#[tokio::test]
async fn given_no_messages_when_completing_then_invalid_request_is_returned() {
    let client = SimulatedRouterClient::instant(7);

    let err = client
        .chat_completion(ChatCompletionRequest::new("gpt-4", vec![]))
        .await
        .expect_err("empty conversation should fail");

    assert_eq!(err.kind, RouterErrorKind::InvalidRequest);
}

#[tokio::test]
async fn given_any_session_when_validating_then_flag_follows_score_threshold() {
    let client = SimulatedRouterClient::instant(3);

    for index in 0..20 {
        let validation = client
            .validate_session(ValidationRequest {
                session_id: format!("sim-{index}"),
                expected_quality: ExpectedQuality::High,
            })
            .await
            .expect("simulated validation should succeed");

        assert_eq!(validation.session_id, format!("sim-{index}"));
        assert!((70.0..100.0).contains(&validation.score));
        assert_eq!(validation.validated, validation.score >= 75.0);
        assert!(validation.metrics.relevance <= 100.0);
    }
}

#[tokio::test]
async fn given_simulator_when_reading_status_then_simulated_version_and_models_are_reported() {
    let client = SimulatedRouterClient::instant(1);

    let status = client.status().await.expect("status should succeed");
    assert_eq!(status.status, "simulated");
    assert_eq!(status.version, "1.0.0-sim");
    assert!(status.active_models.contains(&"gpt-4".to_string()));

    let models = client.list_models().await.expect("models should succeed");
    assert_eq!(models.len(), 4);
}
