use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::cache::{validate_version, CompilerCache};
use super::error::CompilerError;
use super::input::ContractMetadata;
use super::output::{CompilationOutput, CompilerOutput};

/// Name of the resolc binary used when the metadata does not pin a release.
pub const DEFAULT_RESOLC_BINARY: &str = "resolc";

/// How a metadata document gets compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilerBackend {
    /// `solc --standard-json`
    Solc,
    /// `resolc --solc <solc> --standard-json`, the binary picked by release tag
    Revive { tag: Option<String> },
}

struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Invocation {
    fn name(&self) -> String {
        self.program.display().to_string()
    }
}

impl CompilerBackend {
    async fn invocation(&self, cache: &CompilerCache, solc: PathBuf) -> Result<Invocation, CompilerError> {
        match self {
            CompilerBackend::Solc => Ok(Invocation { program: solc, args: vec!["--standard-json".into()] }),
            CompilerBackend::Revive { tag } => {
                let binary = tag.as_deref().unwrap_or(DEFAULT_RESOLC_BINARY);
                validate_version(binary)?;

                let program = cache.cache_dir().join(binary);
                let installed =
                    tokio::fs::try_exists(&program).await.map_err(|e| CompilerError::cache(&program, e))?;
                if !installed {
                    return Err(CompilerError::ToolchainNotInstalled(program.display().to_string()));
                }

                Ok(Invocation {
                    program,
                    args: vec!["--solc".into(), solc.into_os_string(), "--standard-json".into()],
                })
            }
        }
    }

    fn failure(&self, invocation: &Invocation, output: &Output) -> CompilerError {
        match self {
            CompilerBackend::Solc => {
                CompilerError::ExitStatus { program: invocation.name(), status: output.status.to_string() }
            }
            CompilerBackend::Revive { .. } => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                if stderr.is_empty() {
                    CompilerError::Toolchain(format!("{} exited with {}", invocation.name(), output.status))
                } else {
                    CompilerError::Toolchain(stderr)
                }
            }
        }
    }
}

/// Runs the compiler selected by a metadata document against that document.
pub struct Recompiler {
    cache: Arc<CompilerCache>,
    timeout: Duration,
}

impl Recompiler {
    pub fn new(cache: Arc<CompilerCache>, timeout: Duration) -> Self {
        Self { cache, timeout }
    }

    pub fn cache(&self) -> &CompilerCache {
        &self.cache
    }

    /// Compiles `metadata` with solc `version` and resolves the contract of interest.
    ///
    /// The solc binary is ensured first; it is needed in both modes since resolc
    /// drives solc itself.
    #[instrument(skip(self, metadata), fields(backend))]
    pub async fn recompile(
        &self,
        metadata: &ContractMetadata,
        version: &str,
    ) -> Result<CompilationOutput, CompilerError> {
        let solc = self.cache.ensure_version(version).await?;
        let backend = metadata.backend();
        tracing::Span::current().record("backend", tracing::field::debug(&backend));

        let invocation = backend.invocation(&self.cache, solc).await?;
        let input = serde_json::to_vec(&metadata.to_standard_json())?;

        debug!(program = %invocation.name(), input_len = input.len(), "Spawning compiler");
        let output = run(&invocation, &input, self.timeout).await?;
        if !output.status.success() {
            let error = backend.failure(&invocation, &output);
            warn!(error = %error, "Compiler exited unsuccessfully");
            return Err(error);
        }

        let decoded: CompilerOutput = serde_json::from_slice(&output.stdout)?;
        let tag = match &backend {
            CompilerBackend::Revive { tag } => tag.clone(),
            CompilerBackend::Solc => None,
        };
        CompilationOutput::new(decoded, metadata.compilation_target(), tag)
    }
}

/// Spawns the compiler, feeds it `input` and collects its output.
///
/// stdin is written while stdout and stderr are drained so a compiler that
/// answers before reading all its input cannot deadlock on a full pipe. When
/// the deadline passes the child is dropped, which kills it.
async fn run(invocation: &Invocation, input: &[u8], timeout: Duration) -> Result<Output, CompilerError> {
    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CompilerError::Spawn { program: invocation.name(), source })?;

    let mut stdin = child.stdin.take().ok_or_else(|| CompilerError::Stdin {
        program: invocation.name(),
        source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin was not captured"),
    })?;
    let write_input = async move {
        let written = stdin.write_all(input).await;
        // Dropping stdin closes the pipe, the compiler reads until EOF.
        drop(stdin);
        written
    };

    let (written, output) =
        match tokio::time::timeout(timeout, async { tokio::join!(write_input, child.wait_with_output()) }).await {
            Ok(result) => result,
            Err(_) => return Err(CompilerError::Timeout { program: invocation.name(), timeout }),
        };

    let output = output.map_err(|source| CompilerError::Wait { program: invocation.name(), source })?;
    // A compiler that exits early closes its stdin; the exit status is the more useful error then.
    if output.status.success() {
        written.map_err(|source| CompilerError::Stdin { program: invocation.name(), source })?;
    }

    Ok(output)
}
