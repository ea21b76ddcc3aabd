use thiserror::Error;

use crate::router::RouterError;

#[derive(Debug, Error)]
pub enum ArbitrationError {
    #[error("invalid analysis request: {0}")]
    InvalidRequest(String),
    #[error("router call failed: {0}")]
    Router(#[from] RouterError),
    #[error("arbitration internal error: {0}")]
    Internal(String),
}

impl ArbitrationError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, ArbitrationError::InvalidRequest(_))
    }
}

pub fn invalid_request(message: impl Into<String>) -> ArbitrationError {
    ArbitrationError::InvalidRequest(message.into())
}

pub fn internal_error(message: impl Into<String>) -> ArbitrationError {
    ArbitrationError::Internal(message.into())
}
