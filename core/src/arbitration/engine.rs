use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    arbitration::{
        agents::AgentRunner,
        continuation::{ContinuationInputs, evaluate_continuation, generate_operational_actions},
        error::{ArbitrationError, internal_error, invalid_request},
        scoring::{
            DEFAULT_AGREEMENT_THRESHOLD, agreement_analysis, arbitration_decision, consistency_of,
            rubric_score,
        },
        types::{
            AgentAnalysis, AgentRole, AnalysisRequest, ArbitrationBundle, ConsistencyScores,
            Evidence, PROOF_TYPE, PROOF_VERSION, ProofMetadata, RUBRIC_ID,
        },
    },
    clock, evidence,
    router::{
        RouterClient,
        types::{ExpectedQuality, ValidationRequest, ValidationResponse},
    },
};

const AGREEING_EVIDENCE_SCORE: f64 = 100.0;
const DISAGREEING_EVIDENCE_SCORE: f64 = 45.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrationConfig {
    #[serde(default = "default_agreement_threshold")]
    pub agreement_threshold: f64,
    #[serde(default = "default_redundant_runs")]
    pub redundant_runs: u32,
    #[serde(default = "default_consistency_floor")]
    pub consistency_floor: f64,
    #[serde(default = "default_validate_sessions")]
    pub validate_sessions: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ArbitrationConfig {
    fn default() -> Self {
        Self {
            agreement_threshold: default_agreement_threshold(),
            redundant_runs: default_redundant_runs(),
            consistency_floor: default_consistency_floor(),
            validate_sessions: default_validate_sessions(),
            seed: None,
        }
    }
}

fn default_agreement_threshold() -> f64 {
    DEFAULT_AGREEMENT_THRESHOLD
}

fn default_redundant_runs() -> u32 {
    2
}

fn default_consistency_floor() -> f64 {
    0.7
}

fn default_validate_sessions() -> bool {
    true
}

/// Coordinates the two-agent arbitration for one analysis request.
pub struct ArbitrationEngine {
    router: Arc<dyn RouterClient>,
    runner: AgentRunner,
    config: ArbitrationConfig,
    webhook_url: Option<String>,
    task_rng: Mutex<StdRng>,
}

impl ArbitrationEngine {
    pub fn new(
        router: Arc<dyn RouterClient>,
        model: impl Into<String>,
        config: ArbitrationConfig,
        webhook_url: Option<String>,
    ) -> Self {
        let (agent_rng, task_rng) = match config.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (StdRng::from_entropy(), StdRng::from_entropy()),
        };

        Self {
            runner: AgentRunner::new(router.clone(), model, agent_rng),
            router,
            config,
            webhook_url: webhook_url.filter(|url| !url.trim().is_empty()),
            task_rng: Mutex::new(task_rng),
        }
    }

    pub fn config(&self) -> &ArbitrationConfig {
        &self.config
    }

    fn next_task_id(&self) -> Result<String, ArbitrationError> {
        let mut rng = self
            .task_rng
            .lock()
            .map_err(|_| internal_error("task id rng lock poisoned"))?;
        Ok(format!(
            "task-{}-{}",
            clock::unix_millis(),
            clock::base36_suffix(&mut *rng, 9)
        ))
    }

    pub async fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> Result<ArbitrationBundle, ArbitrationError> {
        if request.query.trim().is_empty() {
            return Err(invalid_request("query cannot be empty"));
        }

        let task_id = self.next_task_id()?;
        let timestamp = clock::now_iso();
        let runs = self.config.redundant_runs.max(1);

        tracing::info!(
            target: "arbitration",
            task_id = %task_id,
            analysis_type = %request.analysis_type,
            runs,
            "arbitration_started"
        );

        let (runs_a, runs_b) = tokio::try_join!(
            self.runner
                .run_redundant_inference(AgentRole::RiskAnalysis, &request, runs),
            self.runner
                .run_redundant_inference(AgentRole::ContractBehavior, &request, runs),
        )?;

        let agent_a = representative(&runs_a)?;
        let agent_b = representative(&runs_b)?;

        let session_ids: Vec<String> = runs_a
            .iter()
            .chain(runs_b.iter())
            .filter_map(|analysis| analysis.session_id.clone())
            .collect();

        let disagreement_analysis =
            agreement_analysis(&agent_a, &agent_b, self.config.agreement_threshold);
        let agreement = disagreement_analysis.agreement;

        let consistency_a = consistency_of(&runs_a);
        let consistency_b = consistency_of(&runs_b);
        let cross_run_consistency = consistency_a > self.config.consistency_floor
            && consistency_b > self.config.consistency_floor;

        let validator_score = rubric_score(&agent_a, &agent_b, agreement);
        let avg_risk = (agent_a.risk_score + agent_b.risk_score) / 2.0;
        let avg_confidence = (agent_a.confidence + agent_b.confidence) / 2.0;
        let decision = arbitration_decision(agreement, avg_risk, validator_score.overall_score);

        let continuation = evaluate_continuation(ContinuationInputs {
            agreement,
            avg_risk,
            validator_score: validator_score.overall_score,
            avg_confidence,
        });
        let operational_actions = generate_operational_actions(
            &continuation,
            &task_id,
            avg_risk,
            self.webhook_url.as_deref(),
        );

        let session_validations = if self.config.validate_sessions {
            self.validate_sessions(&task_id, [&agent_a, &agent_b])
                .await
        } else {
            Vec::new()
        };

        tracing::info!(
            target: "arbitration",
            task_id = %task_id,
            agreement,
            avg_risk,
            decision = %decision.tier,
            continuation = continuation.action.as_str(),
            "arbitration_finished"
        );

        let raw_outputs = vec![agent_a.analysis.clone(), agent_b.analysis.clone()];
        let mut bundle = ArbitrationBundle {
            task: request.query,
            task_id,
            timestamp: timestamp.clone(),
            agent_a_result: agent_a,
            agent_b_result: agent_b,
            disagreement_analysis,
            redundant_inference_runs: runs,
            cross_run_consistency,
            validator_score,
            final_decision: decision.tier,
            final_reasoning: Some(decision.reasoning),
            confidence: avg_confidence,
            evidence: Evidence {
                cross_run_consistency,
                rubric_used: RUBRIC_ID.to_string(),
                validator_runs: runs,
                agreement_threshold: self.config.agreement_threshold,
                actual_agreement: if agreement {
                    AGREEING_EVIDENCE_SCORE
                } else {
                    DISAGREEING_EVIDENCE_SCORE
                },
                session_ids,
                raw_outputs,
                consistency_scores: Some(ConsistencyScores {
                    agent_a: consistency_a,
                    agent_b: consistency_b,
                }),
                session_validations,
            },
            proof_metadata: ProofMetadata {
                proof_type: PROOF_TYPE.to_string(),
                proof_version: PROOF_VERSION.to_string(),
                proof_timestamp: timestamp,
                ipfs_hash: None,
                evidence_digest: None,
            },
            continuation: Some(continuation),
            operational_actions,
        };

        evidence::stamp_digest(&mut bundle)
            .map_err(|err| internal_error(format!("failed to digest bundle: {err}")))?;
        Ok(bundle)
    }

    async fn validate_sessions(
        &self,
        task_id: &str,
        representatives: [&AgentAnalysis; 2],
    ) -> Vec<ValidationResponse> {
        let pending = representatives
            .into_iter()
            .filter_map(|analysis| analysis.session_id.clone())
            .map(|session_id| {
                self.router.validate_session(ValidationRequest {
                    session_id,
                    expected_quality: ExpectedQuality::High,
                })
            });

        join_all(pending)
            .await
            .into_iter()
            .filter_map(|result| match result {
                Ok(validation) => Some(validation),
                Err(err) => {
                    tracing::warn!(
                        target: "arbitration",
                        task_id = %task_id,
                        error = %err,
                        "session_validation_failed"
                    );
                    None
                }
            })
            .collect()
    }
}

fn representative(runs: &[AgentAnalysis]) -> Result<AgentAnalysis, ArbitrationError> {
    runs.first()
        .cloned()
        .ok_or_else(|| internal_error("agent produced no analysis runs"))
}
