use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::router::credentials::CredentialRef;

pub type SessionId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouterMode {
    Simulated,
    Real,
}

impl RouterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouterMode::Simulated => "simulated",
            RouterMode::Real => "real",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            stream: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<CompletionUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_latency_ms: Option<u64>,
}

impl ChatCompletionResponse {
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .filter(|content| !content.is_empty())
    }
}

/// Normalized result of one chat completion, independent of the client that produced it.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub response: String,
    pub session_id: SessionId,
    pub latency_ms: u64,
    pub full: ChatCompletionResponse,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedQuality {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub session_id: SessionId,
    pub expected_quality: ExpectedQuality,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationMetrics {
    pub accuracy: f64,
    pub coherence: f64,
    pub relevance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub session_id: SessionId,
    pub score: f64,
    pub metrics: ValidationMetrics,
    pub validated: bool,
}

/// Router status as reported by `/v1/status`.
///
/// Accepts both the client-facing shape (`version`, `uptime`, `activeModels`)
/// and the router node shape (`api_version`, `uptime_seconds`, `model_name`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouterStatus {
    pub status: String,
    #[serde(default, alias = "api_version")]
    pub version: String,
    #[serde(default, alias = "uptime_seconds")]
    pub uptime: f64,
    #[serde(default, alias = "active_models")]
    pub active_models: Vec<String>,
    #[serde(default, alias = "model_name", skip_serializing)]
    pub model_name: Option<String>,
}

impl RouterStatus {
    pub fn normalized(mut self) -> Self {
        if self.active_models.is_empty()
            && let Some(model_name) = self.model_name.take()
        {
            self.active_models.push(model_name);
        }
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ModelListPayload {
    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RouterModeSetting {
    /// Real client when the API key resolves, simulated otherwise.
    #[default]
    Auto,
    Simulated,
    Real,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_latency_scale")]
    pub latency_scale: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            latency_scale: default_latency_scale(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub mode: RouterModeSetting,
    #[serde(default = "default_router_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_router_credential")]
    pub credential: CredentialRef,
    #[serde(default = "default_router_model")]
    pub model: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_status_timeout_ms")]
    pub status_timeout_ms: u64,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            mode: RouterModeSetting::Auto,
            endpoint: default_router_endpoint(),
            credential: default_router_credential(),
            model: default_router_model(),
            request_timeout_ms: default_request_timeout_ms(),
            status_timeout_ms: default_status_timeout_ms(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl RouterConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms.max(1))
    }
}

pub const ROUTER_API_KEY_ENV: &str = "CORTENSOR_API_KEY";

fn default_router_endpoint() -> String {
    "http://127.0.0.1:5010".to_string()
}

fn default_router_credential() -> CredentialRef {
    CredentialRef::Env {
        var: ROUTER_API_KEY_ENV.to_string(),
    }
}

fn default_router_model() -> String {
    "gpt-4".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_status_timeout_ms() -> u64 {
    5_000
}

fn default_latency_scale() -> f64 {
    1.0
}
