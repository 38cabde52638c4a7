// Client abstractions for the services the verifier depends on

pub mod chain;

pub use chain::{ChainClient, ChainClientError, HttpChainClient};
