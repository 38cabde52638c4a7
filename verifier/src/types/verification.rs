use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{VerifierError, VerifierResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Perfect,
    Partial,
    Mismatch,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationStatus::Perfect => write!(f, "perfect"),
            VerificationStatus::Partial => write!(f, "partial"),
            VerificationStatus::Mismatch => write!(f, "mismatch"),
        }
    }
}

/// Body of `POST /verify`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    #[serde(default)]
    pub address: String,
    /// The metadata document, serialized to a string. A JSON object is accepted as well.
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub chain: i64,
    #[serde(default)]
    pub compiler_version: String,
}

impl VerificationRequest {
    /// Raw metadata text, empty when absent.
    pub fn metadata_text(&self) -> VerifierResult<String> {
        match &self.metadata {
            Value::Null => Ok(String::new()),
            Value::String(text) => Ok(text.clone()),
            Value::Object(_) => Ok(self.metadata.to_string()),
            _ => Err(VerifierError::InvalidRequest("metadata must be a JSON document".to_string())),
        }
    }
}

/// Prefixes the version with `v` as solc distributions name their binaries.
pub fn normalize_compiler_version(version: &str) -> String {
    let version = version.trim();
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{}", version)
    }
}

/// Response of `POST /verify`, the same shape for every outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub verified_status: VerificationStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_bytecode_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revive_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor_args: Option<String>,
}

impl VerificationResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            verified_status: VerificationStatus::Mismatch,
            message: message.into(),
            abi: None,
            creation_bytecode_length: None,
            revive_version: None,
            constructor_args: None,
        }
    }
}

/// Data describing a successfully verified contract.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedContract {
    pub status: VerificationStatus,
    pub abi: Vec<Value>,
    /// Length of the compiled creation bytecode in hex characters
    pub creation_bytecode_length: usize,
    pub revive_version: Option<String>,
    pub constructor_args: Option<String>,
}

/// Result of a verification that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    Verified(VerifiedContract),
    Mismatch,
}

impl From<VerificationOutcome> for VerificationResponse {
    fn from(outcome: VerificationOutcome) -> Self {
        match outcome {
            VerificationOutcome::Verified(contract) => Self {
                verified_status: contract.status,
                message: "ok".to_string(),
                abi: Some(contract.abi),
                creation_bytecode_length: Some(contract.creation_bytecode_length),
                revive_version: contract.revive_version,
                constructor_args: contract.constructor_args,
            },
            VerificationOutcome::Mismatch => Self::failure("bytecode mismatch"),
        }
    }
}
