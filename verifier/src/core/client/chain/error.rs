use crate::error::ErrorKind;

#[derive(thiserror::Error, Debug)]
pub enum ChainClientError {
    #[error("network {0} not supported")]
    UnsupportedChain(u64),

    #[error("network {0} has no creation bytecode endpoint configured")]
    NoCreationEndpoint(u64),

    #[error("request to network {chain_id} failed: {source}")]
    Request {
        chain_id: u64,
        #[source]
        source: reqwest::Error,
    },

    #[error("network {chain_id} endpoint responded with status {status}")]
    Status { chain_id: u64, status: u16 },

    /// JSON-RPC error object returned by the node
    #[error("rpc error on network {chain_id}: {message}")]
    Rpc { chain_id: u64, message: String },

    /// Non-zero `code` returned by the indexer
    #[error("fetch create bytecode failed: {message}")]
    Indexer { chain_id: u64, message: String },

    #[error("unexpected response from network {chain_id}: {message}")]
    Parse { chain_id: u64, message: String },
}

impl ChainClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChainClientError::UnsupportedChain(_) => ErrorKind::NotFound,
            _ => ErrorKind::FetchFailure,
        }
    }
}
