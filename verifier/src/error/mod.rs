use thiserror::Error;

use crate::core::bytecode::BytecodeError;
use crate::core::client::chain::ChainClientError;
use crate::core::compiler::CompilerError;
use crate::setup::SetupError;

/// Result type for verifier operations
pub type VerifierResult<T> = Result<T, VerifierError>;

/// Coarse classification of a failure, used to pick the HTTP status of a
/// verification response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputValidation,
    NotFound,
    CompilerUnavailable,
    CompileFailure,
    FetchFailure,
    Internal,
}

/// Error types for the verifier
#[derive(Error, Debug)]
pub enum VerifierError {
    /// Missing or malformed request fields
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid address")]
    InvalidAddress,

    /// Metadata document could not be decoded or violates the source invariants
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("address not a contract or bytecode not found")]
    BytecodeNotFound,

    #[error("Compiler error: {0}")]
    CompilerError(#[from] CompilerError),

    #[error("Chain client error: {0}")]
    ChainClientError(#[from] ChainClientError),

    #[error("Bytecode error: {0}")]
    BytecodeError(#[from] BytecodeError),

    #[error("Setup error: {0}")]
    SetupError(#[from] SetupError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl VerifierError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VerifierError::InvalidRequest(_) | VerifierError::InvalidAddress | VerifierError::InvalidMetadata(_) => {
                ErrorKind::InputValidation
            }
            VerifierError::BytecodeNotFound => ErrorKind::NotFound,
            VerifierError::CompilerError(e) => e.kind(),
            VerifierError::ChainClientError(e) => e.kind(),
            VerifierError::BytecodeError(_) => ErrorKind::CompileFailure,
            VerifierError::SetupError(_) => ErrorKind::CompilerUnavailable,
            VerifierError::ConfigError(_) | VerifierError::IoError(_) | VerifierError::JsonError(_) => {
                ErrorKind::Internal
            }
        }
    }
}
