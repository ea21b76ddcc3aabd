use std::env;

use serde::{Deserialize, Serialize};

use crate::router::error::{RouterError, RouterErrorKind, invalid_request};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialRef {
    Env { var: String },
    InlineToken { token: String },
    None,
}

pub trait CredentialProvider: Send + Sync {
    /// Resolves a credential to its raw API key. `Ok(None)` means no key is configured.
    fn resolve(&self, reference: &CredentialRef) -> Result<Option<String>, RouterError>;
}

#[derive(Default)]
pub struct EnvCredentialProvider;

impl CredentialProvider for EnvCredentialProvider {
    fn resolve(&self, reference: &CredentialRef) -> Result<Option<String>, RouterError> {
        match reference {
            CredentialRef::Env { var } => match env::var(var) {
                Ok(token) if !token.trim().is_empty() => Ok(Some(token)),
                _ => Err(RouterError::new(
                    RouterErrorKind::Authentication,
                    format!("missing credential environment variable {}", var),
                )
                .with_retryable(false)),
            },
            CredentialRef::InlineToken { token } => {
                if token.trim().is_empty() {
                    return Err(invalid_request("inline credential token cannot be empty"));
                }
                Ok(Some(token.clone()))
            }
            CredentialRef::None => Ok(None),
        }
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
