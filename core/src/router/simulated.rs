use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    clock,
    router::{
        client::RouterClient,
        error::{RouterError, RouterErrorKind, invalid_request},
        types::{
            ChatCompletionRequest, ChatCompletionResponse, ChatMessage, CompletionChoice,
            CompletionOutcome, RouterMode, RouterStatus, SimulationConfig, ValidationMetrics,
            ValidationRequest, ValidationResponse,
        },
    },
};

const SIMULATED_VERSION: &str = "1.0.0-sim";
const VALIDATION_DELAY_MS: f64 = 500.0;

/// Development stand-in for a router node: fabricated latencies, session ids and canned text.
pub struct SimulatedRouterClient {
    rng: Mutex<StdRng>,
    latency_scale: f64,
}

impl SimulatedRouterClient {
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
            latency_scale: config.latency_scale.max(0.0),
        }
    }

    /// Seeded client that never sleeps.
    pub fn instant(seed: u64) -> Self {
        Self::new(&SimulationConfig {
            latency_scale: 0.0,
            seed: Some(seed),
        })
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> Result<T, RouterError> {
        let mut guard = self.rng.lock().map_err(|_| {
            RouterError::new(
                RouterErrorKind::Internal,
                "simulated router rng lock poisoned",
            )
            .with_retryable(false)
        })?;
        Ok(f(&mut guard))
    }

    async fn pause(&self, nominal_ms: f64) {
        let scaled = nominal_ms * self.latency_scale;
        if scaled >= 1.0 {
            tokio::time::sleep(Duration::from_millis(scaled as u64)).await;
        }
    }
}

fn canned_response(prompt: &str, rng: &mut StdRng) -> String {
    let content = prompt.to_lowercase();

    if content.contains("risk") || content.contains("security") {
        return "Based on analysis, the contract exhibits low to medium risk. Key findings: No critical vulnerabilities detected. Standard ERC-20 implementation. Recommend additional testing for edge cases.".to_string();
    }
    if content.contains("contract") {
        return "Contract analysis complete. The smart contract follows best practices with proper access controls and event emissions. Total functions: 12. External calls are properly protected against reentrancy.".to_string();
    }
    if content.contains("transaction") || content.contains("transfer") {
        return "Transaction pattern analysis shows normal activity. No suspicious patterns detected. Average gas usage: 45,000. Execution path follows expected behavior.".to_string();
    }

    let verdict = if rng.gen_bool(0.5) {
        "No issues detected."
    } else {
        "Minor concerns identified."
    };
    format!(
        "Analysis complete. {} Confidence: {}%. Session tracking enabled for verification.",
        verdict,
        rng.gen_range(75..95)
    )
}

#[async_trait]
impl RouterClient for SimulatedRouterClient {
    fn mode(&self) -> RouterMode {
        RouterMode::Simulated
    }

    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<CompletionOutcome, RouterError> {
        let prompt = request
            .last_message()
            .map(|message| message.content.clone())
            .ok_or_else(|| invalid_request("chat completion requires at least one message"))?;

        let (nominal_latency_ms, response, suffix) = self.with_rng(|rng| {
            let latency = rng.gen_range(500.0..1500.0);
            let response = canned_response(&prompt, rng);
            let suffix = clock::base36_suffix(rng, 9);
            (latency, response, suffix)
        })?;
        self.pause(nominal_latency_ms).await;

        let session_id = format!("sim-{}-{}", clock::unix_millis(), suffix);
        let full = ChatCompletionResponse {
            id: session_id.clone(),
            object: "chat.completion".to_string(),
            created: clock::unix_seconds(),
            model: request.model.clone(),
            choices: vec![CompletionChoice {
                index: 0,
                message: ChatMessage::assistant(response.clone()),
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
            session_id: Some(session_id.clone()),
            inference_latency_ms: None,
        };

        Ok(CompletionOutcome {
            response,
            session_id,
            latency_ms: nominal_latency_ms.round() as u64,
            full,
        })
    }

    async fn validate_session(
        &self,
        request: ValidationRequest,
    ) -> Result<ValidationResponse, RouterError> {
        self.pause(VALIDATION_DELAY_MS).await;

        let (score, metrics) = self.with_rng(|rng| {
            let score = rng.gen_range(70.0..100.0);
            let metrics = ValidationMetrics {
                accuracy: rng.gen_range(80.0..100.0),
                coherence: rng.gen_range(75.0..95.0),
                relevance: rng.gen_range(85.0..105.0_f64).min(100.0),
            };
            (score, metrics)
        })?;

        Ok(ValidationResponse {
            session_id: request.session_id,
            score,
            metrics,
            validated: score >= 75.0,
        })
    }

    async fn status(&self) -> Result<RouterStatus, RouterError> {
        Ok(RouterStatus {
            status: "simulated".to_string(),
            version: SIMULATED_VERSION.to_string(),
            uptime: clock::unix_millis() as f64,
            active_models: vec![
                "gpt-4".to_string(),
                "gpt-3.5-turbo".to_string(),
                "claude-3".to_string(),
            ],
            model_name: None,
        })
    }

    async fn list_models(&self) -> Result<Vec<String>, RouterError> {
        Ok(vec![
            "gpt-4".to_string(),
            "gpt-3.5-turbo".to_string(),
            "claude-3-opus".to_string(),
            "claude-3-sonnet".to_string(),
        ])
    }
}
