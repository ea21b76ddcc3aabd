use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;

use crate::{
    clock,
    router::{
        client::RouterClient,
        credentials::bearer,
        error::{RouterError, invalid_request, map_http_error, map_reqwest_error},
        types::{
            ChatCompletionRequest, ChatCompletionResponse, CompletionOutcome, ModelListPayload,
            RouterConfig, RouterMode, RouterStatus, ValidationRequest, ValidationResponse,
        },
    },
};

/// Talks to a Cortensor router node over its `/v1` HTTP API.
#[derive(Clone)]
pub struct HttpRouterClient {
    client: Client,
    base_url: String,
    api_key: String,
    request_timeout: Duration,
    status_timeout: Duration,
}

impl HttpRouterClient {
    pub fn new(config: &RouterConfig, api_key: impl Into<String>) -> Result<Self, RouterError> {
        let base_url = config.endpoint.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(invalid_request("router.endpoint cannot be empty"));
        }

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| map_reqwest_error(err, "client_build"))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            request_timeout: config.request_timeout(),
            status_timeout: config.status_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(header::AUTHORIZATION, bearer(&self.api_key))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
    ) -> Result<T, RouterError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, operation))?;
        let response = ensure_success(response, operation).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| map_reqwest_error(err, operation))
    }
}

async fn ensure_success(
    response: Response,
    operation: &'static str,
) -> Result<Response, RouterError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(map_http_error(status, operation, &body))
}

#[async_trait]
impl RouterClient for HttpRouterClient {
    fn mode(&self) -> RouterMode {
        RouterMode::Real
    }

    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<CompletionOutcome, RouterError> {
        let started = Instant::now();
        let builder = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .timeout(self.request_timeout)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request);

        let full: ChatCompletionResponse = self.send_json(builder, "chat_completion").await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let response = full.first_content().unwrap_or("No response").to_string();
        let session_id = full
            .session_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| Some(full.id.clone()).filter(|id| !id.is_empty()))
            .unwrap_or_else(|| format!("session-{}", clock::unix_millis()));

        tracing::debug!(
            target: "router",
            session_id = %session_id,
            model = %full.model,
            latency_ms,
            "chat_completion_finished"
        );

        Ok(CompletionOutcome {
            response,
            session_id,
            latency_ms,
            full,
        })
    }

    async fn validate_session(
        &self,
        request: ValidationRequest,
    ) -> Result<ValidationResponse, RouterError> {
        let builder = self
            .client
            .post(format!("{}/v1/validate", self.base_url))
            .timeout(self.request_timeout)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request);
        self.send_json(builder, "validate_session").await
    }

    async fn status(&self) -> Result<RouterStatus, RouterError> {
        let builder = self
            .client
            .get(format!("{}/v1/status", self.base_url))
            .timeout(self.status_timeout);
        let status: RouterStatus = self.send_json(builder, "status").await?;
        Ok(status.normalized())
    }

    async fn list_models(&self) -> Result<Vec<String>, RouterError> {
        let builder = self
            .client
            .get(format!("{}/v1/models", self.base_url))
            .timeout(self.status_timeout);
        let payload: ModelListPayload = self.send_json(builder, "list_models").await?;
        Ok(payload.models)
    }
}
