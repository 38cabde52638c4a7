//! Compiler lifecycle and recompilation of submitted metadata.

pub mod backend;
pub mod cache;
pub mod error;
pub mod input;
pub mod output;

pub use backend::{CompilerBackend, Recompiler, DEFAULT_RESOLC_BINARY};
pub use cache::{default_download_base, CompilerCache, VersionState};
pub use error::CompilerError;
pub use input::{ContractMetadata, StandardJsonInput};
pub use output::{CompilationOutput, CompileTarget, ContractArtifact, CompilerOutput};
