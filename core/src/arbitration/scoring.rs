use crate::arbitration::types::{
    AgentAnalysis, AgreementAnalysis, DecisionTier, RUBRIC_ID, RubricCriteria, ValidatorScoring,
};

pub const DEFAULT_AGREEMENT_THRESHOLD: f64 = 20.0;

const AGREEING_SCORE: f64 = 95.0;
const DISAGREEING_SCORE: f64 = 45.0;
const SUBSTANTIVE_FINDING_CHARS: usize = 20;
const LOW_VALIDATOR_SCORE: f64 = 5.0;

/// Cross-run similarity in `[0, 1]`: `1 - stddev / 100`, clamped at zero.
pub fn consistency_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }

    let count = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / count;
    let variance = scores
        .iter()
        .map(|score| (score - mean).powi(2))
        .sum::<f64>()
        / count;

    (1.0 - variance.sqrt() / 100.0).max(0.0)
}

pub fn consistency_of(analyses: &[AgentAnalysis]) -> f64 {
    let scores: Vec<f64> = analyses.iter().map(|analysis| analysis.risk_score).collect();
    consistency_score(&scores)
}

pub fn assess_agreement(risk_a: f64, risk_b: f64, threshold: f64) -> bool {
    (risk_a - risk_b).abs() <= threshold
}

pub fn agreement_analysis(
    a: &AgentAnalysis,
    b: &AgentAnalysis,
    threshold: f64,
) -> AgreementAnalysis {
    let agreement = assess_agreement(a.risk_score, b.risk_score, threshold);
    let difference = (a.risk_score - b.risk_score).abs();

    AgreementAnalysis {
        agreement,
        agreement_score: if agreement {
            AGREEING_SCORE
        } else {
            DISAGREEING_SCORE
        },
        disagreement_reason: (!agreement).then(|| {
            format!(
                "Risk score difference of {difference:.1} exceeds threshold of {}",
                trim_float(threshold)
            )
        }),
    }
}

pub fn rubric_score(a: &AgentAnalysis, b: &AgentAnalysis, agreement: bool) -> ValidatorScoring {
    let avg_risk = (a.risk_score + b.risk_score) / 2.0;
    let avg_confidence = (a.confidence + b.confidence) / 2.0;

    let has_substantive_finding = |analysis: &AgentAnalysis| {
        analysis
            .findings
            .iter()
            .any(|finding| finding.chars().count() > SUBSTANTIVE_FINDING_CHARS)
    };

    let criteria = RubricCriteria {
        technical_depth: if !a.findings.is_empty() && !b.findings.is_empty() {
            9.0
        } else {
            7.0
        },
        consistency: if agreement { 10.0 } else { 6.0 },
        confidence_level: (avg_confidence * 10.0).round(),
        evidence_quality: if has_substantive_finding(a) && has_substantive_finding(b) {
            9.0
        } else {
            7.0
        },
    };

    let strength = if agreement { "strong" } else { "moderate" };
    ValidatorScoring {
        rubric_used: RUBRIC_ID.to_string(),
        criteria_rated: criteria,
        overall_score: criteria.mean(),
        justification: format!(
            "Analysis demonstrates {strength} consistency across agent runs with an average confidence of {:.1}%. Risk assessment averaged {avg_risk:.1}/100.",
            avg_confidence * 100.0
        ),
    }
}

pub fn decision_tier(avg_risk: f64) -> DecisionTier {
    if avg_risk < 25.0 {
        DecisionTier::Low
    } else if avg_risk < 50.0 {
        DecisionTier::Medium
    } else if avg_risk < 75.0 {
        DecisionTier::High
    } else {
        DecisionTier::Critical
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrationDecision {
    pub tier: DecisionTier,
    pub reasoning: String,
}

pub fn arbitration_decision(
    agreement: bool,
    avg_risk: f64,
    validator_score: f64,
) -> ArbitrationDecision {
    let tier = decision_tier(avg_risk);
    let mut reasoning = match tier {
        DecisionTier::Low => {
            "After multi-agent analysis and validation, this asset presents minimal security concerns."
        }
        DecisionTier::Medium => {
            "The analysis reveals potential vulnerabilities that warrant caution. Not recommended for high-value transactions without additional review."
        }
        DecisionTier::High => {
            "Significant security concerns identified across multiple analysis vectors. Proceed with extreme caution or avoid entirely."
        }
        DecisionTier::Critical => {
            "Critical vulnerabilities detected. This asset/transaction is not recommended for any use."
        }
    }
    .to_string();

    if !agreement {
        reasoning.push_str(" Note: Agent disagreement suggests complexity; recommend manual review.");
    }
    if validator_score < LOW_VALIDATOR_SCORE {
        reasoning.push_str(" Validator confidence is low; recommend additional analysis.");
    }

    ArbitrationDecision { tier, reasoning }
}

/// Renders `20.0` as `20` and `12.5` as `12.5`.
fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
