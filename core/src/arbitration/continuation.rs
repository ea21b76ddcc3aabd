use serde_json::json;

use crate::{
    arbitration::types::{
        ActionStatus, ContinuationAction, ContinuationDecision, ContinuationTrigger,
        OperationalAction, OperationalActionKind, ThresholdExceeded,
    },
    clock,
};

pub const MIN_VALIDATOR_SCORE: f64 = 7.0;
pub const MAX_AVERAGE_RISK: f64 = 85.0;
pub const MIN_AVERAGE_CONFIDENCE: f64 = 0.60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuationInputs {
    pub agreement: bool,
    pub avg_risk: f64,
    pub validator_score: f64,
    pub avg_confidence: f64,
}

/// Decides whether an arbitration needs a follow-up. Rules are ordered; the first match wins.
pub fn evaluate_continuation(inputs: ContinuationInputs) -> ContinuationDecision {
    if !inputs.agreement {
        return ContinuationDecision {
            should_continue: true,
            reason: "Agents disagree beyond the agreement threshold; a rerun is required."
                .to_string(),
            action: ContinuationAction::Rerun,
            triggered_by: ContinuationTrigger::Disagreement,
            threshold_exceeded: None,
        };
    }

    if inputs.validator_score < MIN_VALIDATOR_SCORE {
        return ContinuationDecision {
            should_continue: true,
            reason: format!(
                "Validator score {:.2} is below the minimum of {MIN_VALIDATOR_SCORE}; escalating for review.",
                inputs.validator_score
            ),
            action: ContinuationAction::Escalate,
            triggered_by: ContinuationTrigger::LowConfidence,
            threshold_exceeded: Some(ThresholdExceeded {
                metric: "validator_score".to_string(),
                value: inputs.validator_score,
                threshold: MIN_VALIDATOR_SCORE,
            }),
        };
    }

    if inputs.avg_risk > MAX_AVERAGE_RISK {
        return ContinuationDecision {
            should_continue: true,
            reason: format!(
                "Average risk {:.1} exceeds the alert threshold of {MAX_AVERAGE_RISK}.",
                inputs.avg_risk
            ),
            action: ContinuationAction::Alert,
            triggered_by: ContinuationTrigger::HighRisk,
            threshold_exceeded: Some(ThresholdExceeded {
                metric: "avg_risk".to_string(),
                value: inputs.avg_risk,
                threshold: MAX_AVERAGE_RISK,
            }),
        };
    }

    if inputs.avg_confidence < MIN_AVERAGE_CONFIDENCE {
        let percent = inputs.avg_confidence * 100.0;
        return ContinuationDecision {
            should_continue: true,
            reason: format!(
                "Average confidence {percent:.1}% is below the minimum of 60%; escalating for review."
            ),
            action: ContinuationAction::Escalate,
            triggered_by: ContinuationTrigger::LowConfidence,
            threshold_exceeded: Some(ThresholdExceeded {
                metric: "confidence".to_string(),
                value: percent,
                threshold: MIN_AVERAGE_CONFIDENCE * 100.0,
            }),
        };
    }

    ContinuationDecision {
        should_continue: false,
        reason: "Analysis is conclusive; no follow-up required.".to_string(),
        action: ContinuationAction::Complete,
        triggered_by: ContinuationTrigger::Manual,
        threshold_exceeded: None,
    }
}

/// Records the follow-up workflows implied by `continuation`.
///
/// Every record is `triggered` and `pending`; nothing is sent from here.
pub fn generate_operational_actions(
    continuation: &ContinuationDecision,
    task_id: &str,
    avg_risk: f64,
    webhook_url: Option<&str>,
) -> Vec<OperationalAction> {
    let timestamp = clock::now_iso();
    let record = |kind: OperationalActionKind, endpoint: Option<String>, payload| {
        OperationalAction {
            kind,
            triggered: true,
            endpoint,
            payload: Some(payload),
            timestamp: timestamp.clone(),
            status: ActionStatus::Pending,
        }
    };
    let webhook = |message: String| {
        record(
            OperationalActionKind::Webhook,
            webhook_url.map(str::to_string),
            json!({
                "task_id": task_id,
                "action": continuation.action.as_str(),
                "message": message,
                "avg_risk": avg_risk,
            }),
        )
    };

    match continuation.action {
        ContinuationAction::Rerun => vec![webhook(format!(
            "Rerun scheduled for task {task_id}: {}",
            continuation.reason
        ))],
        ContinuationAction::Escalate => vec![
            record(
                OperationalActionKind::Escalation,
                None,
                json!({
                    "task_id": task_id,
                    "requires_human_review": true,
                    "reason": continuation.reason,
                    "threshold_exceeded": continuation.threshold_exceeded,
                }),
            ),
            webhook(format!("Task {task_id} escalated for human review")),
        ],
        ContinuationAction::Alert => vec![
            record(
                OperationalActionKind::Alert,
                None,
                json!({
                    "task_id": task_id,
                    "severity": "critical",
                    "avg_risk": avg_risk,
                    "reason": continuation.reason,
                }),
            ),
            webhook(format!(
                "High risk alert for task {task_id}: average risk {avg_risk:.1}"
            )),
            record(
                OperationalActionKind::Report,
                None,
                json!({
                    "task_id": task_id,
                    "report_type": "incident",
                    "avg_risk": avg_risk,
                }),
            ),
        ],
        ContinuationAction::Complete => vec![record(
            OperationalActionKind::Report,
            None,
            json!({
                "task_id": task_id,
                "report_type": "summary",
                "avg_risk": avg_risk,
            }),
        )],
    }
}
