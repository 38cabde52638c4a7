use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ChainRegistry;
use crate::core::client::chain::{ChainClient, MockChainClient};
use crate::core::compiler::{CompilerCache, Recompiler};
use crate::core::config::Config;
use crate::server::{setup_server, ServerHandle};
use crate::types::params::ServerParams;

const TEST_CHAINS: &str = r#"{"1": {"rpc": ["http://127.0.0.1:9"]}}"#;

pub struct TestConfigBuilder {
    cache_dir: PathBuf,
    chain_client: Option<Box<dyn ChainClient>>,
    download_base: String,
    compile_timeout: Duration,
    api_server: bool,
}

pub struct TestConfigBuilderReturns {
    pub config: Arc<Config>,
    pub api_server_address: Option<SocketAddr>,
    pub server_handle: Option<ServerHandle>,
}

impl TestConfigBuilder {
    /// Every component is configured with a test double unless overridden.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            chain_client: None,
            // Discard port, downloads fail unless a test points this at a mock.
            download_base: "http://127.0.0.1:9/solc-".to_string(),
            compile_timeout: Duration::from_secs(10),
            api_server: false,
        }
    }

    pub fn configure_chain_client(mut self, chain_client: MockChainClient) -> Self {
        self.chain_client = Some(Box::new(chain_client));
        self
    }

    pub fn configure_download_base(mut self, download_base: impl Into<String>) -> Self {
        self.download_base = download_base.into();
        self
    }

    pub fn configure_api_server(mut self) -> Self {
        self.api_server = true;
        self
    }

    pub async fn build(self) -> TestConfigBuilderReturns {
        let chain_registry = Arc::new(ChainRegistry::from_json_str(TEST_CHAINS).unwrap());
        let cache = CompilerCache::new(&self.cache_dir, self.download_base, reqwest::Client::new()).unwrap();
        let recompiler = Recompiler::new(Arc::new(cache), self.compile_timeout);
        let chain_client = self.chain_client.unwrap_or_else(|| Box::new(MockChainClient::new()));

        let server_params = ServerParams { host: "127.0.0.1".to_string(), port: 0 };
        let config = Arc::new(Config::new(server_params, chain_registry, chain_client, recompiler));

        let (api_server_address, server_handle) = if self.api_server {
            let (address, handle) = setup_server(config.clone()).await.unwrap();
            (Some(address), Some(handle))
        } else {
            (None, None)
        };

        TestConfigBuilderReturns { config, api_server_address, server_handle }
    }
}
