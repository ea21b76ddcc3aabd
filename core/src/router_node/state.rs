use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::clock;

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub session_id: String,
    pub created_at: f64,
    pub model_name: String,
    pub inference_count: u64,
    pub last_inference_time: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub created_at: String,
    pub model_name: String,
    pub inference_count: u64,
    pub last_inference_time: Option<String>,
}

impl From<&SessionRecord> for SessionView {
    fn from(record: &SessionRecord) -> Self {
        Self {
            session_id: record.session_id.clone(),
            created_at: clock::format_unix_seconds(record.created_at),
            model_name: record.model_name.clone(),
            inference_count: record.inference_count,
            last_inference_time: record.last_inference_time.map(clock::format_unix_seconds),
        }
    }
}

#[derive(Debug, Default)]
struct SessionTable {
    sessions: Vec<SessionRecord>,
    inference_request_count: u64,
    total_inference_time_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeCounters {
    pub active_session_count: usize,
    pub inference_request_count: u64,
    pub total_inference_time_ms: u64,
}

/// In-memory router node state. Boot time is fixed; sessions and counters reset.
#[derive(Debug)]
pub struct NodeState {
    model_name: String,
    api_key: Option<String>,
    inference_delay: Duration,
    booted_at: Instant,
    boot_unix: f64,
    table: Mutex<SessionTable>,
}

pub fn unix_seconds_f64() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs_f64())
        .unwrap_or_default()
}

pub fn short_hex_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &hex[..12])
}

impl NodeState {
    pub fn new(
        model_name: impl Into<String>,
        api_key: Option<String>,
        inference_delay: Duration,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            api_key: api_key.filter(|key| !key.is_empty()),
            inference_delay,
            booted_at: Instant::now(),
            boot_unix: unix_seconds_f64(),
            table: Mutex::new(SessionTable::default()),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn inference_delay(&self) -> Duration {
        self.inference_delay
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// A node without a configured key rejects every bearer token.
    pub fn authorize(&self, authorization: Option<&str>) -> bool {
        match (self.api_key.as_deref(), authorization) {
            (Some(key), Some(header)) => header
                .strip_prefix("Bearer ")
                .is_some_and(|token| token == key),
            _ => false,
        }
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.booted_at.elapsed().as_secs_f64()
    }

    pub fn boot_unix(&self) -> f64 {
        self.boot_unix
    }

    pub fn boot_iso(&self) -> String {
        clock::format_unix_seconds(self.boot_unix)
    }

    pub async fn create_session(&self) -> String {
        let session_id = short_hex_id("session");
        let mut table = self.table.lock().await;
        table.sessions.push(SessionRecord {
            session_id: session_id.clone(),
            created_at: unix_seconds_f64(),
            model_name: self.model_name.clone(),
            inference_count: 0,
            last_inference_time: None,
        });

        tracing::info!(
            target: "router_node",
            session_id = %session_id,
            active_sessions = table.sessions.len(),
            "session_created"
        );
        session_id
    }

    pub async fn record_inference(&self, session_id: &str, latency_ms: u64) {
        let mut table = self.table.lock().await;
        let Some(session) = table
            .sessions
            .iter_mut()
            .find(|session| session.session_id == session_id)
        else {
            return;
        };

        session.inference_count += 1;
        session.last_inference_time = Some(unix_seconds_f64());
        let session_total = session.inference_count;

        table.inference_request_count += 1;
        table.total_inference_time_ms += latency_ms;

        tracing::info!(
            target: "router_node",
            session_id = %session_id,
            latency_ms,
            session_total,
            "inference_recorded"
        );
    }

    pub async fn session(&self, session_id: &str) -> Option<SessionRecord> {
        self.table
            .lock()
            .await
            .sessions
            .iter()
            .find(|session| session.session_id == session_id)
            .cloned()
    }

    pub async fn sessions(&self) -> Vec<SessionView> {
        self.table
            .lock()
            .await
            .sessions
            .iter()
            .map(SessionView::from)
            .collect()
    }

    pub async fn counters(&self) -> NodeCounters {
        let table = self.table.lock().await;
        NodeCounters {
            active_session_count: table.sessions.len(),
            inference_request_count: table.inference_request_count,
            total_inference_time_ms: table.total_inference_time_ms,
        }
    }

    pub async fn reset(&self) {
        *self.table.lock().await = SessionTable::default();
        tracing::info!(target: "router_node", "session_state_reset");
    }
}
