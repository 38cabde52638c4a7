use std::path::PathBuf;

use clap::Args;

/// Parameters of the supported chains and the requests made to them.
#[derive(Debug, Clone, Args)]
#[group()]
pub struct ChainCliArgs {
    /// JSON file mapping chain ids to their rpc endpoints and indexer.
    #[arg(env = "VERIFIER_CHAINS_FILE", long, default_value = "chains.json")]
    pub chains_file: PathBuf,

    /// Seconds an outgoing HTTP request may take.
    #[arg(env = "VERIFIER_HTTP_TIMEOUT", long, default_value = "30")]
    pub http_timeout: u64,
}
