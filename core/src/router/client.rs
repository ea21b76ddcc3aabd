use async_trait::async_trait;

use crate::router::{
    error::RouterError,
    types::{
        ChatCompletionRequest, CompletionOutcome, RouterMode, RouterStatus, ValidationRequest,
        ValidationResponse,
    },
};

/// Inference routing surface used by the agents and the API.
#[async_trait]
pub trait RouterClient: Send + Sync {
    fn mode(&self) -> RouterMode;

    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<CompletionOutcome, RouterError>;

    /// Scores a finished session against the validation rubric.
    async fn validate_session(
        &self,
        request: ValidationRequest,
    ) -> Result<ValidationResponse, RouterError>;

    async fn status(&self) -> Result<RouterStatus, RouterError>;

    async fn list_models(&self) -> Result<Vec<String>, RouterError>;
}
