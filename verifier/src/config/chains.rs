use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::error::{VerifierError, VerifierResult};

/// Endpoints of one supported chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    /// JSON-RPC endpoints, only the first one is queried
    pub rpc: Vec<Url>,
    /// Indexer serving the creation transaction input of a contract
    #[serde(default)]
    pub contract_fetch_address: Option<Url>,
}

impl ChainInfo {
    pub fn rpc_url(&self) -> Option<&Url> {
        self.rpc.first()
    }
}

/// Supported chains keyed by chain id, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: BTreeMap<u64, ChainInfo>,
}

impl ChainRegistry {
    pub fn from_file(path: &Path) -> VerifierResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VerifierError::ConfigError(format!("Failed to read chains file {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> VerifierResult<Self> {
        let chains: BTreeMap<u64, ChainInfo> = serde_json::from_str(content)
            .map_err(|e| VerifierError::ConfigError(format!("Failed to parse chains file: {}", e)))?;

        if let Some((chain_id, _)) = chains.iter().find(|(_, chain)| chain.rpc.is_empty()) {
            return Err(VerifierError::ConfigError(format!("Chain {} has no rpc endpoint", chain_id)));
        }

        Ok(Self { chains })
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainInfo> {
        self.chains.get(&chain_id)
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.chains.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
