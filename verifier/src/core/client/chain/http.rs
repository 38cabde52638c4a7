use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::{ChainClient, ChainClientError};
use crate::config::chains::{ChainInfo, ChainRegistry};

/// Response of the creation bytecode indexer.
#[derive(Debug, Deserialize)]
struct IndexerResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<IndexerData>,
}

#[derive(Debug, Deserialize)]
struct IndexerData {
    #[serde(default)]
    creation_code: String,
}

/// [`ChainClient`] over the JSON-RPC endpoints and indexers of the chain registry.
pub struct HttpChainClient {
    registry: Arc<ChainRegistry>,
    http: reqwest::Client,
}

impl HttpChainClient {
    pub fn new(registry: Arc<ChainRegistry>, http: reqwest::Client) -> Self {
        Self { registry, http }
    }

    fn chain(&self, chain_id: u64) -> Result<&ChainInfo, ChainClientError> {
        self.registry.get(chain_id).ok_or(ChainClientError::UnsupportedChain(chain_id))
    }

    async fn post_json(
        &self,
        chain_id: u64,
        url: &Url,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, ChainClientError> {
        let response = self
            .http
            .post(url.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|source| ChainClientError::Request { chain_id, source })?;

        let status = response.status();
        debug!(url = %url, status = %status, "Received chain response");
        if !status.is_success() {
            return Err(ChainClientError::Status { chain_id, status: status.as_u16() });
        }

        response.json().await.map_err(|source| ChainClientError::Request { chain_id, source })
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn fetch_deployed_bytecode(&self, chain_id: u64, address: &str) -> Result<String, ChainClientError> {
        let chain = self.chain(chain_id)?;
        let rpc_url = chain.rpc_url().ok_or(ChainClientError::UnsupportedChain(chain_id))?;
        let id: u32 = rand::thread_rng().gen_range(1..=1_000_000);

        debug!(url = %rpc_url, method = "eth_getCode", "Sending RPC request");
        let json = self
            .post_json(
                chain_id,
                rpc_url,
                json!({
                    "jsonrpc": "2.0",
                    "method": "eth_getCode",
                    "params": [address, "latest"],
                    "id": id
                }),
            )
            .await?;

        if let Some(error) = json.get("error").filter(|error| !error.is_null()) {
            let message = match error.get("message").and_then(|m| m.as_str()) {
                Some(message) => message.to_string(),
                None => error.to_string(),
            };
            return Err(ChainClientError::Rpc { chain_id, message });
        }

        json["result"].as_str().map(str::to_string).ok_or_else(|| ChainClientError::Parse {
            chain_id,
            message: "missing result field in eth_getCode response".to_string(),
        })
    }

    async fn fetch_creation_bytecode(&self, chain_id: u64, address: &str) -> Result<String, ChainClientError> {
        let chain = self.chain(chain_id)?;
        let endpoint = chain.contract_fetch_address.as_ref().ok_or(ChainClientError::NoCreationEndpoint(chain_id))?;

        debug!(url = %endpoint, "Fetching creation bytecode from indexer");
        let json = self.post_json(chain_id, endpoint, json!({ "address": address })).await?;
        let response: IndexerResponse = serde_json::from_value(json)
            .map_err(|e| ChainClientError::Parse { chain_id, message: e.to_string() })?;

        if response.code != 0 {
            return Err(ChainClientError::Indexer { chain_id, message: response.message });
        }

        Ok(response.data.map(|data| data.creation_code).unwrap_or_default())
    }
}
