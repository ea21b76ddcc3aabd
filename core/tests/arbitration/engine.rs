use std::sync::Arc;

use chainproof::{
    arbitration::{
        AnalysisType, ArbitrationConfig, ArbitrationEngine, ArbitrationError, DecisionTier,
        scoring::decision_tier,
        types::{ActionStatus, AgentRole, ContinuationAction, OperationalActionKind, RUBRIC_ID},
    },
    evidence::{self, DigestStatus},
    router::SimulatedRouterClient,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{UnavailableRouter, request, seeded_config, simulated_engine};

fn is_task_id(task_id: &str) -> bool {
    let mut parts = task_id.splitn(3, '-');
    parts.next() == Some("task")
        && parts
            .next()
            .is_some_and(|millis| !millis.is_empty() && millis.chars().all(|c| c.is_ascii_digit()))
        && parts.next().is_some_and(|suffix| {
            suffix.len() == 9
                && suffix
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        })
}

#[tokio::test]
async fn given_simulated_router_when_analyzing_then_bundle_carries_complete_evidence() {
    let engine = simulated_engine(11, seeded_config(11));

    let bundle = engine
        .analyze(request("0xdeadbeef token", AnalysisType::TokenSafety))
        .await
        .expect("analysis should succeed");

    assert!(is_task_id(&bundle.task_id), "unexpected task id {}", bundle.task_id);
    assert_eq!(bundle.task, "0xdeadbeef token");
    assert_eq!(bundle.agent_a_result.agent, AgentRole::RiskAnalysis);
    assert_eq!(bundle.agent_b_result.agent, AgentRole::ContractBehavior);
    assert_eq!(bundle.redundant_inference_runs, 2);

    for agent in [&bundle.agent_a_result, &bundle.agent_b_result] {
        assert!((0.0..100.0).contains(&agent.risk_score));
        assert!((0.7..=0.95).contains(&agent.confidence));
        assert!((3..=4).contains(&agent.findings.len()));
        assert!(agent.analysis.contains("0xdeadbeef token"));
        assert_eq!(agent.model_used.as_deref(), Some("gpt-4"));
    }

    let evidence = &bundle.evidence;
    assert_eq!(evidence.session_ids.len(), 4);
    assert!(evidence.session_ids.iter().all(|id| id.starts_with("sim-")));
    assert_eq!(evidence.rubric_used, RUBRIC_ID);
    assert_eq!(evidence.validator_runs, 2);
    assert_eq!(evidence.agreement_threshold, 20.0);
    assert_eq!(evidence.raw_outputs.len(), 2);
    assert_eq!(evidence.session_validations.len(), 2);
    let expected_agreement = if bundle.disagreement_analysis.agreement {
        100.0
    } else {
        45.0
    };
    assert_eq!(evidence.actual_agreement, expected_agreement);

    let avg_risk = (bundle.agent_a_result.risk_score + bundle.agent_b_result.risk_score) / 2.0;
    assert_eq!(bundle.final_decision, decision_tier(avg_risk));
    let avg_confidence =
        (bundle.agent_a_result.confidence + bundle.agent_b_result.confidence) / 2.0;
    assert!((bundle.confidence - avg_confidence).abs() < 1e-9);
    assert!(bundle.final_reasoning.is_some());
    assert_eq!(bundle.proof_metadata.proof_type, "arbitration");

    assert_eq!(
        evidence::verify_digest(&bundle).expect("digest should compute"),
        DigestStatus::Verified
    );
}

#[tokio::test]
async fn given_any_outcome_when_analyzing_then_continuation_drives_pending_actions() {
    for seed in 0..12 {
        let engine = simulated_engine(seed, seeded_config(seed));
        let bundle = engine
            .analyze(request("ERC20 transfer hook", AnalysisType::ContractAudit))
            .await
            .expect("analysis should succeed");

        let continuation = bundle
            .continuation
            .as_ref()
            .expect("continuation should be recorded");
        if !bundle.disagreement_analysis.agreement {
            assert_eq!(continuation.action, ContinuationAction::Rerun);
        }
        assert_eq!(
            continuation.should_continue,
            continuation.action != ContinuationAction::Complete
        );

        assert!(!bundle.operational_actions.is_empty());
        assert!(
            bundle
                .operational_actions
                .iter()
                .all(|action| action.triggered && action.status == ActionStatus::Pending)
        );
        if continuation.action == ContinuationAction::Complete {
            assert_eq!(bundle.operational_actions[0].kind, OperationalActionKind::Report);
        }
    }
}

#[tokio::test]
async fn given_webhook_url_when_actions_include_webhooks_then_endpoint_is_attached() {
    for seed in 0..12 {
        let engine = ArbitrationEngine::new(
            Arc::new(SimulatedRouterClient::instant(seed)),
            "gpt-4",
            seeded_config(seed),
            Some("https://hooks.example.test/chainproof".to_string()),
        );
        let bundle = engine
            .analyze(request("bridge withdrawal", AnalysisType::TransactionAnalysis))
            .await
            .expect("analysis should succeed");

        for action in &bundle.operational_actions {
            match action.kind {
                OperationalActionKind::Webhook => assert_eq!(
                    action.endpoint.as_deref(),
                    Some("https://hooks.example.test/chainproof")
                ),
                _ => assert!(action.endpoint.is_none()),
            }
        }
    }
}

#[tokio::test]
async fn given_validation_disabled_when_analyzing_then_no_session_validations_are_recorded() {
    let engine = simulated_engine(
        5,
        ArbitrationConfig {
            validate_sessions: false,
            redundant_runs: 3,
            ..seeded_config(5)
        },
    );

    let bundle = engine
        .analyze(request("liquidity pool", AnalysisType::TokenSafety))
        .await
        .expect("analysis should succeed");

    assert!(bundle.evidence.session_validations.is_empty());
    assert_eq!(bundle.redundant_inference_runs, 3);
    assert_eq!(bundle.evidence.session_ids.len(), 6);
}

#[tokio::test]
async fn given_blank_query_when_analyzing_then_invalid_request_is_returned() {
    let engine = simulated_engine(1, seeded_config(1));

    let err = match engine
        .analyze(request("   ", AnalysisType::TokenSafety))
        .await
    {
        Ok(_) => panic!("blank query should be rejected"),
        Err(err) => err,
    };

    assert!(matches!(err, ArbitrationError::InvalidRequest(_)));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn given_unavailable_router_when_analyzing_then_router_error_is_propagated() {
    let engine = ArbitrationEngine::new(
        Arc::new(UnavailableRouter),
        "gpt-4",
        seeded_config(1),
        None,
    );

    let err = match engine
        .analyze(request("0xabc", AnalysisType::TokenSafety))
        .await
    {
        Ok(_) => panic!("offline router should fail the analysis"),
        Err(err) => err,
    };

    assert!(matches!(err, ArbitrationError::Router(_)));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn given_bundle_when_serialized_then_wire_field_names_are_stable() {
    let engine = simulated_engine(2, seeded_config(2));
    let bundle = engine
        .analyze(request("0xfeed", AnalysisType::TokenSafety))
        .await
        .expect("analysis should succeed");

    let value = serde_json::to_value(&bundle).expect("bundle should serialize");

    assert!(value["taskId"].is_string());
    assert!(value["agent_a_result"]["riskScore"].is_number());
    assert!(value["agent_b_result"]["sessionId"].is_string());
    assert!(value["disagreement_analysis"]["agreementScore"].is_number());
    assert!(value["validator_score"]["criteriaRated"]["technical-depth"].is_number());
    assert!(value["evidence"]["session_ids"].is_array());
    assert!(
        value["proof_metadata"]["evidence_digest"]
            .as_str()
            .is_some_and(|digest| digest.starts_with("sha256:"))
    );
    let tier = value["final_decision"].as_str().expect("tier should be a string");
    assert!(tier.ends_with(" Risk"));
    let parsed: DecisionTier =
        serde_json::from_value(Value::String(tier.to_string())).expect("tier should parse");
    assert_eq!(parsed, bundle.final_decision);
}

#[tokio::test]
async fn given_saved_bundle_when_tampered_then_digest_mismatch_is_detected() {
    let engine = simulated_engine(9, seeded_config(9));
    let bundle = engine
        .analyze(request("0xbeef", AnalysisType::ContractAudit))
        .await
        .expect("analysis should succeed");

    let dir = std::env::temp_dir().join(format!("chainproof-arbitration-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&dir).expect("temp dir should be created");
    let path = dir.join(evidence::export_filename(&bundle.task_id));
    evidence::save_bundle(&path, &bundle).expect("bundle should save");

    let mut loaded = evidence::load_bundle(&path).expect("bundle should load");
    assert_eq!(loaded, bundle);
    assert_eq!(
        evidence::verify_digest(&loaded).expect("digest should compute"),
        DigestStatus::Verified
    );

    loaded.agent_a_result.risk_score = 1.0;
    assert!(matches!(
        evidence::verify_digest(&loaded).expect("digest should compute"),
        DigestStatus::Mismatch { .. }
    ));

    let _ = std::fs::remove_dir_all(&dir);
}
