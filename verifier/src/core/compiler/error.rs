use std::path::PathBuf;
use std::time::Duration;

use crate::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    /// The version string cannot be used as a cache file name
    #[error("invalid compiler version: {0}")]
    InvalidVersion(String),

    #[error("failed to download solc {version}: {message}")]
    Download { version: String, message: String },

    #[error("failed to download solc {version}: distribution responded with status {status}")]
    DownloadStatus { version: String, status: u16 },

    #[error("compiler cache error at {path}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("resolc binary {0} is not installed, run `verifier setup` first")]
    ToolchainNotInstalled(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write compiler input to {program}: {source}")]
    Stdin {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to collect output of {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} exited with {status}")]
    ExitStatus { program: String, status: String },

    /// Non-zero exit of the resolc wrapper, carrying its stderr
    #[error("{0}")]
    Toolchain(String),

    #[error("failed to decode compiler output: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    #[error("compilation failed: {}", .0.join("; "))]
    Diagnostics(Vec<String>),

    #[error("no compiled contract with deployed bytecode found in compiler output")]
    TargetNotFound,
}

impl CompilerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompilerError::InvalidVersion(_) => ErrorKind::InputValidation,
            CompilerError::Download { .. }
            | CompilerError::DownloadStatus { .. }
            | CompilerError::Cache { .. }
            | CompilerError::ToolchainNotInstalled(_) => ErrorKind::CompilerUnavailable,
            CompilerError::Spawn { .. }
            | CompilerError::Stdin { .. }
            | CompilerError::Wait { .. }
            | CompilerError::Timeout { .. }
            | CompilerError::ExitStatus { .. }
            | CompilerError::Toolchain(_)
            | CompilerError::MalformedOutput(_)
            | CompilerError::Diagnostics(_)
            | CompilerError::TargetNotFound => ErrorKind::CompileFailure,
        }
    }

    pub(crate) fn cache(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompilerError::Cache { path: path.into(), source }
    }
}
