use std::{future::Future, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::{
    arbitration::{AnalysisRequest, AnalysisType, ArbitrationEngine},
    evidence,
    router::{
        RouterClient, RouterMode,
        types::{ChatCompletionRequest, ChatMessage},
    },
};

const TEST_PROMPT_TEMPERATURE: f64 = 0.7;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ArbitrationEngine>,
    pub router: Arc<dyn RouterClient>,
    pub model: String,
}

impl AppState {
    pub fn new(
        engine: Arc<ArbitrationEngine>,
        router: Arc<dyn RouterClient>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            router,
            model: model.into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/analyze", post(analyze))
        .route("/api/download-evidence", post(download_evidence))
        .route("/api/router-status", get(router_status))
        .route("/api/test-router", post(test_router))
        .with_state(state)
}

pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let local_addr = listener
        .local_addr()
        .context("failed to read api listen address")?;
    tracing::info!(
        target: "server",
        addr = %local_addr,
        router_mode = state.router.mode().as_str(),
        "api_server_started"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("api server failed")?;

    tracing::info!(target: "server", "api_server_stopped");
    Ok(())
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn healthz() -> &'static str {
    "ok"
}

fn non_empty_str<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return error_body(StatusCode::BAD_REQUEST, "Invalid JSON body");
    };

    let (Some(query), Some(raw_type)) = (non_empty_str(&body, "query"), non_empty_str(&body, "type"))
    else {
        return error_body(
            StatusCode::BAD_REQUEST,
            "Missing required fields: query, type",
        );
    };

    let Some(analysis_type) = AnalysisType::parse(raw_type) else {
        return error_body(
            StatusCode::BAD_REQUEST,
            format!("Unsupported analysis type: {raw_type}"),
        );
    };

    let request = AnalysisRequest {
        query: query.to_string(),
        analysis_type,
        details: non_empty_str(&body, "details").map(str::to_string),
    };

    match state.engine.analyze(request).await {
        Ok(bundle) => (StatusCode::OK, Json(bundle)).into_response(),
        Err(err) if err.is_client_error() => error_body(StatusCode::BAD_REQUEST, err.to_string()),
        Err(err) => {
            tracing::error!(target: "server", error = %err, "analysis_failed");
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process analysis request",
            )
        }
    }
}

async fn download_evidence(body: Result<Json<Value>, JsonRejection>) -> Response {
    let Ok(Json(bundle)) = body else {
        return error_body(StatusCode::BAD_REQUEST, "Invalid evidence bundle");
    };
    let Ok(export) = evidence::validate_export(&bundle) else {
        return error_body(StatusCode::BAD_REQUEST, "Invalid evidence bundle");
    };

    let built = serde_json::to_string_pretty(&bundle)
        .map_err(|err| err.to_string())
        .and_then(|text| {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                evidence::export_filename(&export.task_id)
            );
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            for (name, value) in [
                (header::CONTENT_DISPOSITION, disposition.as_str()),
                (HeaderName::from_static("x-evidence-taskid"), export.task_id.as_str()),
                (HeaderName::from_static("x-evidence-timestamp"), export.timestamp.as_str()),
            ] {
                let value = HeaderValue::from_str(value).map_err(|err| err.to_string())?;
                headers.insert(name, value);
            }
            Ok((headers, text))
        });

    match built {
        Ok((headers, text)) => (StatusCode::OK, headers, text).into_response(),
        Err(err) => {
            tracing::error!(
                target: "server",
                task_id = %export.task_id,
                error = %err,
                "evidence_export_failed"
            );
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate evidence bundle",
            )
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectedStatus {
    connected: bool,
    status: String,
    version: String,
    uptime: f64,
    active_models: Vec<String>,
    mode: RouterMode,
}

async fn router_status(State(state): State<AppState>) -> Response {
    let mode = state.router.mode();
    match state.router.status().await {
        Ok(status) => Json(ConnectedStatus {
            connected: true,
            status: status.status,
            version: status.version,
            uptime: status.uptime,
            active_models: status.active_models,
            mode,
        })
        .into_response(),
        Err(err) => {
            tracing::warn!(target: "server", error = %err, "router_status_unavailable");
            Json(json!({
                "connected": false,
                "mode": mode,
                "error": err.to_string(),
            }))
            .into_response()
        }
    }
}

async fn test_router(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let invalid_prompt = || {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Invalid prompt" })),
        )
            .into_response()
    };

    let Ok(Json(body)) = body else {
        return invalid_prompt();
    };
    let Some(prompt) = body
        .get("prompt")
        .and_then(Value::as_str)
        .filter(|prompt| !prompt.is_empty())
    else {
        return invalid_prompt();
    };

    let request = ChatCompletionRequest::new(state.model.clone(), vec![ChatMessage::user(prompt)])
        .with_temperature(TEST_PROMPT_TEMPERATURE);

    match state.router.chat_completion(request).await {
        Ok(outcome) => Json(json!({
            "success": true,
            "response": outcome.response,
            "sessionId": outcome.session_id,
            "latencyMs": outcome.latency_ms,
            "mode": state.router.mode(),
        }))
        .into_response(),
        Err(err) => {
            tracing::error!(target: "server", error = %err, "router_test_failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": err.to_string() })),
            )
                .into_response()
        }
    }
}
