use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterErrorKind {
    InvalidRequest,
    Authentication,
    Authorization,
    RateLimited,
    Timeout,
    Transport,
    BackendTransient,
    ProtocolViolation,
    Internal,
}

#[derive(Debug, Clone)]
pub struct RouterError {
    pub kind: RouterErrorKind,
    pub message: String,
    pub retryable: bool,
    pub operation: Option<&'static str>,
    pub http_status: Option<u16>,
}

impl RouterError {
    pub fn new(kind: RouterErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: matches!(
                kind,
                RouterErrorKind::RateLimited
                    | RouterErrorKind::Timeout
                    | RouterErrorKind::Transport
                    | RouterErrorKind::BackendTransient
            ),
            operation: None,
            http_status: None,
        }
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn with_operation(mut self, operation: &'static str) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.operation, self.http_status) {
            (Some(operation), Some(status)) => {
                write!(f, "{} failed: {} (status={})", operation, self.message, status)
            }
            (Some(operation), None) => write!(f, "{} failed: {}", operation, self.message),
            (None, Some(status)) => write!(f, "{} (status={})", self.message, status),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RouterError {}

pub fn invalid_request(message: impl Into<String>) -> RouterError {
    RouterError::new(RouterErrorKind::InvalidRequest, message).with_retryable(false)
}

pub fn map_reqwest_error(err: reqwest::Error, operation: &'static str) -> RouterError {
    let kind = if err.is_timeout() {
        RouterErrorKind::Timeout
    } else if err.is_decode() {
        RouterErrorKind::ProtocolViolation
    } else {
        RouterErrorKind::Transport
    };
    RouterError::new(kind, err.to_string()).with_operation(operation)
}

pub fn map_http_error(status: u16, operation: &'static str, body: &str) -> RouterError {
    let normalized_body = body.chars().take(240).collect::<String>();

    let mut err = if status == 401 {
        RouterError::new(RouterErrorKind::Authentication, "authentication failed")
    } else if status == 403 {
        RouterError::new(RouterErrorKind::Authorization, "authorization failed")
    } else if status == 408 || status == 429 {
        RouterError::new(
            RouterErrorKind::RateLimited,
            format!("router returned status {}", status),
        )
    } else if (400..500).contains(&status) {
        RouterError::new(
            RouterErrorKind::InvalidRequest,
            format!("router returned status {}", status),
        )
    } else {
        RouterError::new(
            RouterErrorKind::BackendTransient,
            format!("router returned status {}", status),
        )
    };

    err = err.with_operation(operation).with_http_status(status);
    if !normalized_body.is_empty() {
        err.message = format!("{}: {}", err.message, normalized_body);
    }

    err
}
