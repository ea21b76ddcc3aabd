use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::router::types::ValidationResponse;

pub const RUBRIC_ID: &str = "risk-assessment-v1";
pub const PROOF_TYPE: &str = "arbitration";
pub const PROOF_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AgentRole {
    RiskAnalysis,
    ContractBehavior,
    TransactionPattern,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::RiskAnalysis => "risk-analysis",
            AgentRole::ContractBehavior => "contract-behavior",
            AgentRole::TransactionPattern => "transaction-pattern",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisType {
    TokenSafety,
    TransactionAnalysis,
    ContractAudit,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 3] = [
        AnalysisType::TokenSafety,
        AnalysisType::TransactionAnalysis,
        AnalysisType::ContractAudit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::TokenSafety => "token-safety",
            AnalysisType::TransactionAnalysis => "transaction-analysis",
            AnalysisType::ContractAudit => "contract-audit",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == raw.trim())
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRequest {
    pub query: String,
    #[serde(rename = "type")]
    pub analysis_type: AnalysisType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentAnalysis {
    pub agent: AgentRole,
    pub timestamp: String,
    pub analysis: String,
    pub risk_score: f64,
    pub confidence: f64,
    pub findings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgreementAnalysis {
    pub agreement: bool,
    pub agreement_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disagreement_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RubricCriteria {
    #[serde(rename = "technical-depth")]
    pub technical_depth: f64,
    pub consistency: f64,
    #[serde(rename = "confidence-level")]
    pub confidence_level: f64,
    #[serde(rename = "evidence-quality")]
    pub evidence_quality: f64,
}

impl RubricCriteria {
    pub fn mean(&self) -> f64 {
        (self.technical_depth + self.consistency + self.confidence_level + self.evidence_quality)
            / 4.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorScoring {
    pub rubric_used: String,
    pub criteria_rated: RubricCriteria,
    pub overall_score: f64,
    pub justification: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum DecisionTier {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Critical Risk")]
    Critical,
}

impl DecisionTier {
    pub fn label(&self) -> &'static str {
        match self {
            DecisionTier::Low => "Low Risk",
            DecisionTier::Medium => "Medium Risk",
            DecisionTier::High => "High Risk",
            DecisionTier::Critical => "Critical Risk",
        }
    }
}

impl fmt::Display for DecisionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationAction {
    Rerun,
    Escalate,
    Alert,
    Complete,
}

impl ContinuationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContinuationAction::Rerun => "rerun",
            ContinuationAction::Escalate => "escalate",
            ContinuationAction::Alert => "alert",
            ContinuationAction::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationTrigger {
    Disagreement,
    LowConfidence,
    HighRisk,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdExceeded {
    pub metric: String,
    pub value: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContinuationDecision {
    pub should_continue: bool,
    pub reason: String,
    pub action: ContinuationAction,
    pub triggered_by: ContinuationTrigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_exceeded: Option<ThresholdExceeded>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationalActionKind {
    Webhook,
    Alert,
    Report,
    Escalation,
}

impl OperationalActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationalActionKind::Webhook => "webhook",
            OperationalActionKind::Alert => "alert",
            OperationalActionKind::Report => "report",
            OperationalActionKind::Escalation => "escalation",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Sent,
    Failed,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Sent => "sent",
            ActionStatus::Failed => "failed",
        }
    }
}

/// Record of a follow-up workflow. These are described, never dispatched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationalAction {
    #[serde(rename = "type")]
    pub kind: OperationalActionKind,
    pub triggered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    pub timestamp: String,
    pub status: ActionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsistencyScores {
    pub agent_a: f64,
    pub agent_b: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    pub cross_run_consistency: bool,
    pub rubric_used: String,
    pub validator_runs: u32,
    pub agreement_threshold: f64,
    pub actual_agreement: f64,
    pub session_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raw_outputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_scores: Option<ConsistencyScores>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub session_validations: Vec<ValidationResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProofMetadata {
    pub proof_type: String,
    pub proof_version: String,
    pub proof_timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipfs_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_digest: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArbitrationBundle {
    pub task: String,
    #[serde(rename = "taskId")]
    pub task_id: String,
    pub timestamp: String,
    pub agent_a_result: AgentAnalysis,
    pub agent_b_result: AgentAnalysis,
    pub disagreement_analysis: AgreementAnalysis,
    pub redundant_inference_runs: u32,
    pub cross_run_consistency: bool,
    pub validator_score: ValidatorScoring,
    pub final_decision: DecisionTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_reasoning: Option<String>,
    pub confidence: f64,
    pub evidence: Evidence,
    pub proof_metadata: ProofMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation: Option<ContinuationDecision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operational_actions: Vec<OperationalAction>,
}

impl ArbitrationBundle {
    pub fn average_risk(&self) -> f64 {
        (self.agent_a_result.risk_score + self.agent_b_result.risk_score) / 2.0
    }
}
