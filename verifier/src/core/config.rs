use std::sync::Arc;

use tracing::info;

use crate::cli::RunCmd;
use crate::config::ChainRegistry;
use crate::core::client::chain::{ChainClient, HttpChainClient};
use crate::core::compiler::{CompilerCache, Recompiler};
use crate::error::{VerifierError, VerifierResult};
use crate::types::params::{ChainParams, CompilerParams, ServerParams};

/// The app config. Built once at startup and shared with every request
/// through an `Arc`.
pub struct Config {
    server_params: ServerParams,
    /// Supported chains
    chain_registry: Arc<ChainRegistry>,
    /// Reads contract code from the supported chains
    chain_client: Box<dyn ChainClient>,
    /// Compiles metadata with the locally cached compilers
    recompiler: Recompiler,
}

impl Config {
    pub fn new(
        server_params: ServerParams,
        chain_registry: Arc<ChainRegistry>,
        chain_client: Box<dyn ChainClient>,
        recompiler: Recompiler,
    ) -> Self {
        Self { server_params, chain_registry, chain_client, recompiler }
    }

    /// Loads the chain registry and prepares the compiler cache directory.
    /// Any failure here is fatal to the process.
    pub fn from_run_cmd(run_cmd: &RunCmd) -> VerifierResult<Self> {
        let server_params = ServerParams::from(run_cmd.server_args.clone());
        let compiler_params = CompilerParams::from(run_cmd.compiler_args.clone());
        let chain_params = ChainParams::from(run_cmd.chain_args.clone());

        let chain_registry = Arc::new(ChainRegistry::from_file(&chain_params.chains_file)?);
        info!(chains = chain_registry.len(), file = %chain_params.chains_file.display(), "Chain registry loaded");

        let http = reqwest::Client::builder()
            .timeout(chain_params.http_timeout)
            .build()
            .map_err(|e| VerifierError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        // Compiler downloads are large, only the connection is bounded.
        let download_http = reqwest::Client::builder()
            .connect_timeout(chain_params.http_timeout)
            .build()
            .map_err(|e| VerifierError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let cache = CompilerCache::new(&compiler_params.cache_dir, compiler_params.download_base, download_http)?;
        info!(cache_dir = %compiler_params.cache_dir.display(), "Compiler cache ready");

        let recompiler = Recompiler::new(Arc::new(cache), compiler_params.compile_timeout);
        let chain_client = Box::new(HttpChainClient::new(chain_registry.clone(), http));

        Ok(Self::new(server_params, chain_registry, chain_client, recompiler))
    }

    pub fn server_config(&self) -> &ServerParams {
        &self.server_params
    }

    pub fn chain_registry(&self) -> &ChainRegistry {
        &self.chain_registry
    }

    pub fn chain_client(&self) -> &dyn ChainClient {
        self.chain_client.as_ref()
    }

    pub fn recompiler(&self) -> &Recompiler {
        &self.recompiler
    }

    pub fn compiler_cache(&self) -> &CompilerCache {
        self.recompiler.cache()
    }
}
