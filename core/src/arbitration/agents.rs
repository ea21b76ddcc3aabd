use std::sync::{Arc, Mutex};

use rand::{Rng, rngs::StdRng, seq::SliceRandom};

use crate::{
    arbitration::{
        error::{ArbitrationError, internal_error},
        types::{AgentAnalysis, AgentRole, AnalysisRequest, AnalysisType},
    },
    clock,
    router::{
        RouterClient,
        types::{ChatCompletionRequest, ChatMessage},
    },
};

const AGENT_TEMPERATURE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentProfile {
    pub role: AgentRole,
    pub name: &'static str,
    pub description: &'static str,
    pub keywords: &'static [&'static str],
}

const RISK_ANALYSIS: AgentProfile = AgentProfile {
    role: AgentRole::RiskAnalysis,
    name: "Risk Analysis Agent",
    description: "Specializes in identifying blockchain security risks",
    keywords: &["security", "vulnerabilities", "threats"],
};

const CONTRACT_BEHAVIOR: AgentProfile = AgentProfile {
    role: AgentRole::ContractBehavior,
    name: "Contract Behavior Agent",
    description: "Analyzes smart contract execution patterns",
    keywords: &["behavior", "execution", "state"],
};

const TRANSACTION_PATTERN: AgentProfile = AgentProfile {
    role: AgentRole::TransactionPattern,
    name: "Transaction Pattern Agent",
    description: "Detects suspicious transaction patterns",
    keywords: &["patterns", "sequences", "anomalies"],
};

pub fn profile(role: AgentRole) -> &'static AgentProfile {
    match role {
        AgentRole::RiskAnalysis => &RISK_ANALYSIS,
        AgentRole::ContractBehavior => &CONTRACT_BEHAVIOR,
        AgentRole::TransactionPattern => &TRANSACTION_PATTERN,
    }
}

/// Finding catalogue per analysis type.
///
/// Only contract audit and token safety have catalogues keyed by their own names.
/// Transaction analysis borrows the transaction-pattern agent's table so its findings
/// are never empty; a lookup by the `transaction-analysis` key alone would find nothing.
pub fn risk_factors(analysis_type: AnalysisType) -> &'static [&'static str] {
    match analysis_type {
        AnalysisType::ContractAudit => &[
            "Reentrancy vulnerabilities detected",
            "Integer overflow patterns",
            "Unchecked external calls",
            "Access control issues",
            "Logic flaws in state transitions",
        ],
        AnalysisType::TokenSafety => &[
            "Centralized minting authority",
            "Suspicious liquidity patterns",
            "Whitelisted address anomalies",
            "Hidden owner privileges",
            "Unusual fee structures",
        ],
        AnalysisType::TransactionAnalysis => &[
            "Sandwich attack indicators",
            "MEV extraction patterns",
            "Non-standard call sequences",
            "Flash loan usage",
            "Multi-hop routing anomalies",
        ],
    }
}

pub fn build_agent_prompt(
    profile: &AgentProfile,
    request: &AnalysisRequest,
    model: &str,
) -> ChatCompletionRequest {
    let system = format!(
        "You are the {}. {}. Focus areas: {}.",
        profile.name,
        profile.description,
        profile.keywords.join(", ")
    );
    let mut user = format!(
        "Perform a {} analysis for the following query: {}",
        request.analysis_type, request.query
    );
    if let Some(details) = request.details.as_deref().filter(|d| !d.trim().is_empty()) {
        user.push_str("\nAdditional details: ");
        user.push_str(details);
    }

    ChatCompletionRequest::new(model, vec![ChatMessage::system(system), ChatMessage::user(user)])
        .with_temperature(AGENT_TEMPERATURE)
}

#[derive(Debug, Clone, PartialEq)]
struct SampledAssessment {
    risk_score: f64,
    confidence: f64,
    findings: Vec<String>,
}

fn sample_assessment(rng: &mut StdRng, analysis_type: AnalysisType) -> SampledAssessment {
    let mut factors: Vec<&str> = risk_factors(analysis_type).to_vec();
    factors.shuffle(rng);
    let take = if rng.gen_bool(0.5) { 3 } else { 4 };

    SampledAssessment {
        risk_score: rng.gen_range(0.0..100.0),
        confidence: 0.7 + rng.r#gen::<f64>() * 0.25,
        findings: factors
            .into_iter()
            .take(take)
            .map(str::to_string)
            .collect(),
    }
}

/// Runs agent analyses through the router, sharing one sampling RNG.
#[derive(Clone)]
pub struct AgentRunner {
    router: Arc<dyn RouterClient>,
    model: String,
    rng: Arc<Mutex<StdRng>>,
}

impl AgentRunner {
    pub fn new(router: Arc<dyn RouterClient>, model: impl Into<String>, rng: StdRng) -> Self {
        Self {
            router,
            model: model.into(),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    fn sample(&self, analysis_type: AnalysisType) -> Result<SampledAssessment, ArbitrationError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| internal_error("agent rng lock poisoned"))?;
        Ok(sample_assessment(&mut rng, analysis_type))
    }

    pub async fn run_agent_analysis(
        &self,
        agent: AgentRole,
        request: &AnalysisRequest,
    ) -> Result<AgentAnalysis, ArbitrationError> {
        let profile = profile(agent);
        let sampled = self.sample(request.analysis_type)?;

        let outcome = self
            .router
            .chat_completion(build_agent_prompt(profile, request, &self.model))
            .await?;

        tracing::debug!(
            target: "arbitration",
            agent = %agent,
            session_id = %outcome.session_id,
            latency_ms = outcome.latency_ms,
            risk_score = sampled.risk_score,
            "agent_analysis_finished"
        );

        Ok(AgentAnalysis {
            agent,
            timestamp: clock::now_iso(),
            analysis: format!(
                "Comprehensive analysis from {} for query: \"{}\". Identified {} key risk factors. {}",
                profile.name,
                request.query,
                sampled.findings.len(),
                outcome.response
            ),
            risk_score: sampled.risk_score,
            confidence: sampled.confidence,
            findings: sampled.findings,
            session_id: Some(outcome.session_id),
            model_used: Some(outcome.full.model),
            latency_ms: Some(outcome.latency_ms),
        })
    }

    /// Repeats one agent `runs` times, one run after the other.
    pub async fn run_redundant_inference(
        &self,
        agent: AgentRole,
        request: &AnalysisRequest,
        runs: u32,
    ) -> Result<Vec<AgentAnalysis>, ArbitrationError> {
        let mut results = Vec::with_capacity(runs as usize);
        for _ in 0..runs {
            results.push(self.run_agent_analysis(agent, request).await?);
        }
        Ok(results)
    }
}
