use std::{env, fmt::Write as _, path::PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chainproof::{
    arbitration::{AnalysisType, ArbitrationBundle},
    evidence::{self, DigestStatus},
};
use serde_json::json;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const USAGE: &str = "usage: chainproof-cli --file <bundle.json> | --task <query> [--type <token-safety|transaction-analysis|contract-audit>] [--api <url>] [--out <path>]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliMode {
    Replay {
        file: PathBuf,
    },
    Analyze {
        query: String,
        analysis_type: AnalysisType,
        api_url: String,
        out: Option<PathBuf>,
    },
}

fn cli_mode_from_args() -> Result<CliMode> {
    parse_cli_options(env::args().skip(1))
}

fn parse_cli_options<I>(mut args: I) -> Result<CliMode>
where
    I: Iterator<Item = String>,
{
    let mut file = None;
    let mut task = None;
    let mut analysis_type = AnalysisType::TokenSafety;
    let mut api_url = DEFAULT_API_URL.to_string();
    let mut out = None;

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| anyhow!("missing value for {flag}. {USAGE}"))
        };
        match arg.as_str() {
            "--file" => file = Some(PathBuf::from(value("--file")?)),
            "--task" => task = Some(value("--task")?),
            "--type" => {
                let raw = value("--type")?;
                analysis_type = AnalysisType::parse(&raw)
                    .ok_or_else(|| anyhow!("unsupported analysis type: {raw}. {USAGE}"))?;
            }
            "--api" => api_url = value("--api")?,
            "--out" => out = Some(PathBuf::from(value("--out")?)),
            other => bail!("unknown argument: {other}. {USAGE}"),
        }
    }

    if let Some(file) = file {
        return Ok(CliMode::Replay { file });
    }

    let query = task
        .filter(|task| !task.trim().is_empty())
        .ok_or_else(|| anyhow!("missing required argument --file or --task. {USAGE}"))?;
    let api_url = api_url.trim().trim_end_matches('/').to_string();
    if api_url.is_empty() {
        bail!("api url cannot be empty");
    }

    Ok(CliMode::Analyze {
        query,
        analysis_type,
        api_url,
        out,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    match cli_mode_from_args()? {
        CliMode::Replay { file } => replay(file),
        CliMode::Analyze {
            query,
            analysis_type,
            api_url,
            out,
        } => analyze(query, analysis_type, api_url, out).await.map(|_| ()),
    }
}

fn replay(file: PathBuf) -> Result<()> {
    println!("Loading evidence bundle: {}", file.display());
    let bundle = evidence::load_bundle(&file)
        .with_context(|| format!("failed to load evidence bundle {}", file.display()))?;
    print!("{}", replay_summary(&bundle));

    match evidence::verify_digest(&bundle)? {
        DigestStatus::Verified => println!("\nEvidence digest verified"),
        DigestStatus::Missing => println!("\nEvidence bundle carries no digest; skipped verification"),
        DigestStatus::Mismatch { expected, actual } => {
            bail!("evidence digest mismatch: recorded {expected}, computed {actual}")
        }
    }
    Ok(())
}

async fn analyze(
    query: String,
    analysis_type: AnalysisType,
    api_url: String,
    out: Option<PathBuf>,
) -> Result<PathBuf> {
    let endpoint = format!("{api_url}/api/analyze");
    println!("Starting multi-agent analysis");
    println!("  Query: {query}");
    println!("  Type: {analysis_type}");
    println!("  API: {endpoint}");

    let response = reqwest::Client::new()
        .post(&endpoint)
        .json(&json!({ "query": query, "type": analysis_type }))
        .send()
        .await
        .with_context(|| format!("failed to reach {endpoint}"))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("API error: {} {}", status.as_u16(), body.trim());
    }

    let bundle: ArbitrationBundle = response
        .json()
        .await
        .context("failed to decode arbitration bundle")?;
    print!("{}", analysis_summary(&bundle));

    let path = out.unwrap_or_else(|| default_output_path(&bundle.task_id));
    evidence::save_bundle(&path, &bundle)?;
    println!("\nEvidence bundle saved: {}", path.display());
    Ok(path)
}

/// `evidence-{taskId}.json` in the working directory.
fn default_output_path(task_id: &str) -> PathBuf {
    PathBuf::from(format!("evidence-{task_id}.json"))
}

fn push_session_ids(text: &mut String, bundle: &ArbitrationBundle) {
    let _ = writeln!(text, "\n  Session IDs:");
    for (index, session_id) in bundle.evidence.session_ids.iter().enumerate() {
        let _ = writeln!(text, "    {}. {session_id}", index + 1);
    }
}

fn push_actions(text: &mut String, bundle: &ArbitrationBundle) {
    if bundle.operational_actions.is_empty() {
        return;
    }
    let _ = writeln!(text, "\n  Operational actions:");
    for (index, action) in bundle.operational_actions.iter().enumerate() {
        let _ = writeln!(
            text,
            "    {}. {} - {}",
            index + 1,
            action.kind.as_str().to_uppercase(),
            action.status.as_str()
        );
    }
}

fn replay_summary(bundle: &ArbitrationBundle) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "\nEvidence bundle summary:");
    let _ = writeln!(text, "  Task ID: {}", bundle.task_id);
    let _ = writeln!(text, "  Timestamp: {}", bundle.timestamp);
    let _ = writeln!(text, "  Decision: {}", bundle.final_decision);
    let _ = writeln!(text, "  Confidence: {:.1}%", bundle.confidence * 100.0);
    push_session_ids(&mut text, bundle);

    if let Some(continuation) = &bundle.continuation {
        let _ = writeln!(text, "\n  Continuation:");
        let _ = writeln!(text, "    Should continue: {}", continuation.should_continue);
        let _ = writeln!(text, "    Action: {}", continuation.action.as_str());
        let _ = writeln!(text, "    Reason: {}", continuation.reason);
    }
    push_actions(&mut text, bundle);
    text
}

fn analysis_summary(bundle: &ArbitrationBundle) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "\nResults:");
    let _ = writeln!(text, "  Task ID: {}", bundle.task_id);
    let _ = writeln!(text, "  Decision: {}", bundle.final_decision);
    let _ = writeln!(text, "  Risk score: {:.1}/100", bundle.average_risk());
    let _ = writeln!(text, "  Confidence: {:.1}%", bundle.confidence * 100.0);
    let _ = writeln!(
        text,
        "  Agreement: {}",
        if bundle.disagreement_analysis.agreement {
            "YES"
        } else {
            "NO"
        }
    );
    let _ = writeln!(
        text,
        "  Validator score: {:.1}/10",
        bundle.validator_score.overall_score
    );
    push_session_ids(&mut text, bundle);

    let latencies = [
        ("Agent A", bundle.agent_a_result.latency_ms),
        ("Agent B", bundle.agent_b_result.latency_ms),
    ];
    if latencies.iter().any(|(_, latency)| latency.is_some()) {
        let _ = writeln!(text, "\n  Agent latencies:");
        for (label, latency) in latencies {
            if let Some(latency) = latency {
                let _ = writeln!(text, "    {label}: {latency}ms");
            }
        }
    }

    if let Some(continuation) = &bundle.continuation {
        let _ = writeln!(text, "\n  Continuation:");
        let _ = writeln!(
            text,
            "    Action: {}",
            continuation.action.as_str().to_uppercase()
        );
        let _ = writeln!(text, "    Reason: {}", continuation.reason);
        if let Some(threshold) = &continuation.threshold_exceeded {
            let _ = writeln!(
                text,
                "    Triggered: {} = {:.1} (threshold: {})",
                threshold.metric, threshold.value, threshold.threshold
            );
        }
    }
    push_actions(&mut text, bundle);
    text
}
