pub mod error;
pub mod http;

use async_trait::async_trait;

pub use error::ChainClientError;
pub use http::HttpChainClient;

/// Read access to contract code on the supported chains.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Runtime code at `address` as returned by `eth_getCode`, `0x` prefixed.
    /// An address without code yields `"0x"`.
    async fn fetch_deployed_bytecode(&self, chain_id: u64, address: &str) -> Result<String, ChainClientError>;

    /// Input of the transaction that created the contract at `address`, taken
    /// from the chain's indexer.
    async fn fetch_creation_bytecode(&self, chain_id: u64, address: &str) -> Result<String, ChainClientError>;
}
