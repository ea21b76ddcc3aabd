use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::arbitration::types::ArbitrationBundle;

const DIGEST_PREFIX: &str = "sha256:";

#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("invalid evidence bundle: {0}")]
    Invalid(String),
    #[error("failed to access evidence file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode or decode evidence: {0}")]
    Json(#[from] serde_json::Error),
}

/// Identity of an exportable bundle: it must carry string `taskId` and `timestamp` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportHeader {
    pub task_id: String,
    pub timestamp: String,
}

pub fn validate_export(value: &Value) -> Result<ExportHeader, EvidenceError> {
    let field = |name: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .ok_or_else(|| EvidenceError::Invalid(format!("missing string field `{name}`")))
    };

    Ok(ExportHeader {
        task_id: field("taskId")?,
        timestamp: field("timestamp")?,
    })
}

pub fn export_filename(task_id: &str) -> String {
    format!("chainproof-evidence-{task_id}.json")
}

/// `sha256:<hex>` over the bundle's compact JSON with `evidence_digest` cleared.
pub fn compute_digest(bundle: &ArbitrationBundle) -> Result<String, EvidenceError> {
    let mut unsigned = bundle.clone();
    unsigned.proof_metadata.evidence_digest = None;
    let encoded = serde_json::to_vec(&unsigned)?;

    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    Ok(format!("{DIGEST_PREFIX}{:x}", hasher.finalize()))
}

pub fn stamp_digest(bundle: &mut ArbitrationBundle) -> Result<(), EvidenceError> {
    bundle.proof_metadata.evidence_digest = Some(compute_digest(bundle)?);
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestStatus {
    Verified,
    Missing,
    Mismatch { expected: String, actual: String },
}

pub fn verify_digest(bundle: &ArbitrationBundle) -> Result<DigestStatus, EvidenceError> {
    let Some(expected) = bundle.proof_metadata.evidence_digest.clone() else {
        return Ok(DigestStatus::Missing);
    };

    let actual = compute_digest(bundle)?;
    if actual == expected {
        Ok(DigestStatus::Verified)
    } else {
        Ok(DigestStatus::Mismatch { expected, actual })
    }
}

pub fn load_bundle(path: &Path) -> Result<ArbitrationBundle, EvidenceError> {
    let text = fs::read_to_string(path).map_err(|source| EvidenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

pub fn save_bundle(path: &Path, bundle: &ArbitrationBundle) -> Result<(), EvidenceError> {
    let text = serde_json::to_string_pretty(bundle)?;
    fs::write(path, text).map_err(|source| EvidenceError::Io {
        path: path.to_path_buf(),
        source,
    })
}
